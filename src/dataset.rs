//! The reference data needed to run simulations: projects, tariffs, exchange rates and engine
//! parameters.
use crate::calculator::InvestmentCalculator;
use crate::exchange_rate::{ExchangeRateTable, RateProvider};
use crate::id::IDCollection;
use crate::input::exchange_rate::read_exchange_rates;
use crate::input::project::read_projects;
use crate::input::simulation::read_simulation_requests;
use crate::input::tariff::read_tariffs;
use crate::parameters::EngineParameters;
use crate::project::ProjectMap;
use crate::simulation::{SimulationRequest, SimulationResult};
use crate::tariff::TariffMap;
use crate::units::ArsPerUsd;
use anyhow::{Context, Result};
use log::info;
use std::path::{Path, PathBuf};

/// A validated data directory
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// The folder the data was read from
    pub data_dir: PathBuf,
    /// Engine constants
    pub parameters: EngineParameters,
    /// Projects, keyed by ID
    pub projects: ProjectMap,
    /// Tariff categories, keyed by ID
    pub tariffs: TariffMap,
    /// Exchange rate quotes
    pub exchange_rates: ExchangeRateTable,
}

impl Dataset {
    /// Read a dataset from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `data_dir` - Folder containing the input data
    pub fn from_path<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        let parameters = EngineParameters::from_path(data_dir)?;
        let projects = read_projects(data_dir)?;
        let tariffs = read_tariffs(data_dir)?;
        let exchange_rates = read_exchange_rates(data_dir, parameters.default_exchange_rate)?;

        info!(
            "Loaded {} projects and {} tariff categories from {}",
            projects.len(),
            tariffs.len(),
            data_dir.display()
        );

        Ok(Self {
            data_dir: data_dir.to_path_buf(),
            parameters,
            projects,
            tariffs,
            exchange_rates,
        })
    }

    /// The rate new calculators will use
    pub fn latest_exchange_rate(&self) -> ArsPerUsd {
        self.exchange_rates.latest_rate()
    }

    /// Create a calculator for the given project and tariff.
    ///
    /// Fails with [`crate::simulation::SimulationError::MissingReferenceData`] if either ID is
    /// unknown.
    pub fn calculator(&self, project_id: &str, tariff_id: &str) -> Result<InvestmentCalculator<'_>> {
        let project = self.projects.get_by_str("project", project_id)?;
        let tariff = self.tariffs.get_by_str("tariff", tariff_id)?;

        Ok(InvestmentCalculator::new(
            project,
            tariff,
            &self.parameters,
            &self.exchange_rates,
        ))
    }

    /// Read the requests stored in the data directory's `simulations.csv`
    pub fn read_simulation_requests(&self) -> Result<Vec<SimulationRequest>> {
        read_simulation_requests(&self.data_dir, &self.projects, &self.tariffs)
    }

    /// Run a batch of requests, stopping at the first failure
    pub fn simulate_requests(&self, requests: &[SimulationRequest]) -> Result<Vec<SimulationResult>> {
        requests
            .iter()
            .enumerate()
            .map(|(idx, request)| {
                self.calculator(&request.project_id.0, &request.tariff_id.0)?
                    .simulate_request(request)
                    .with_context(|| format!("Simulation {} failed", idx + 1))
            })
            .collect()
    }
}
