//! Code for reading solar projects from a CSV file.
use crate::input::{collect_id_map, input_err_msg, read_csv};
use crate::project::{PricingBasis, Project, ProjectID, ProjectMap};
use crate::units::{Capacity, Usd, UsdPerWatt, Watts};
use anyhow::{Context, Result, bail, ensure};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;

const PROJECTS_FILE_NAME: &str = "projects.csv";

#[derive(PartialEq, Debug, Deserialize)]
struct ProjectRaw {
    id: ProjectID,
    name: String,
    panel_power_wp: Decimal,
    price_per_panel_usd: Option<Decimal>,
    price_per_wp_usd: Option<Decimal>,
    available_power_kw: Decimal,
}

impl ProjectRaw {
    /// Work out how panels are priced.
    ///
    /// A positive per-panel price takes precedence over a per-watt price.
    fn pricing(&self) -> Result<PricingBasis> {
        let positive = |price: Option<Decimal>| price.filter(|price| *price > Decimal::ZERO);

        if let Some(price) = positive(self.price_per_panel_usd) {
            return Ok(PricingBasis::PerPanel(Usd(price)));
        }
        if let Some(price) = positive(self.price_per_wp_usd) {
            return Ok(PricingBasis::PerWatt(UsdPerWatt(price)));
        }

        bail!(
            "Project {} must have a positive price_per_panel_usd or price_per_wp_usd",
            self.id
        )
    }

    fn into_project(self) -> Result<Project> {
        ensure!(
            self.panel_power_wp > Decimal::ZERO,
            "Project {}: panel_power_wp must be greater than zero",
            self.id
        );
        ensure!(
            self.available_power_kw >= Decimal::ZERO,
            "Project {}: available_power_kw cannot be negative",
            self.id
        );
        let pricing = self.pricing()?;

        Ok(Project {
            id: self.id,
            name: self.name,
            panel_power_wp: Watts(self.panel_power_wp),
            pricing,
            available_power_kw: Capacity(self.available_power_kw),
        })
    }
}

/// Read projects from the specified data directory.
///
/// # Arguments
///
/// * `data_dir` - Folder containing the input data
///
/// # Returns
///
/// The projects, keyed by ID, or an error.
pub fn read_projects(data_dir: &Path) -> Result<ProjectMap> {
    let file_path = data_dir.join(PROJECTS_FILE_NAME);
    let iter = read_csv::<ProjectRaw>(&file_path)?;
    read_projects_from_iter(iter).with_context(|| input_err_msg(&file_path))
}

fn read_projects_from_iter<I>(iter: I) -> Result<ProjectMap>
where
    I: Iterator<Item = ProjectRaw>,
{
    let projects: Vec<_> = iter.map(ProjectRaw::into_project).collect::<Result<_>>()?;
    collect_id_map(projects)
}
