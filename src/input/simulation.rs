//! Code for reading stored simulation requests from a CSV file.
use crate::input::{input_err_msg, read_csv};
use crate::project::{ProjectID, ProjectMap};
use crate::simulation::{Demand, SimulationMode, SimulationRequest};
use crate::tariff::{TariffID, TariffMap};
use anyhow::{Context, Result, ensure};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;

pub const SIMULATIONS_FILE_NAME: &str = "simulations.csv";

#[derive(PartialEq, Debug, Deserialize)]
struct SimulationRequestRaw {
    project_id: ProjectID,
    tariff_id: TariffID,
    #[serde(default)]
    monthly_bill_ars: Option<Decimal>,
    #[serde(default)]
    monthly_consumption_kwh: Option<Decimal>,
    coverage_percentage: Option<Decimal>,
    number_of_panels: Option<u32>,
    investment_amount_usd: Option<Decimal>,
    user_email: Option<String>,
}

impl SimulationRequestRaw {
    fn into_request(self, projects: &ProjectMap, tariffs: &TariffMap) -> Result<SimulationRequest> {
        ensure!(
            projects.contains_key(&self.project_id),
            "Unknown project ID {}",
            self.project_id
        );
        ensure!(
            tariffs.contains_key(&self.tariff_id),
            "Unknown tariff ID {}",
            self.tariff_id
        );
        let demand = Demand::from_fields(self.monthly_bill_ars, self.monthly_consumption_kwh)?;
        let mode = SimulationMode::from_fields(
            self.coverage_percentage,
            self.number_of_panels,
            self.investment_amount_usd,
        )?;

        Ok(SimulationRequest {
            project_id: self.project_id,
            tariff_id: self.tariff_id,
            demand,
            mode,
            user_email: self.user_email,
        })
    }
}

/// Read stored simulation requests from the specified data directory.
///
/// # Arguments
///
/// * `data_dir` - Folder containing the input data
/// * `projects` - Known projects
/// * `tariffs` - Known tariff categories
///
/// # Returns
///
/// The requests in file order, or an error if any request is invalid.
pub fn read_simulation_requests(
    data_dir: &Path,
    projects: &ProjectMap,
    tariffs: &TariffMap,
) -> Result<Vec<SimulationRequest>> {
    let file_path = data_dir.join(SIMULATIONS_FILE_NAME);
    read_csv::<SimulationRequestRaw>(&file_path)?
        .enumerate()
        .map(|(idx, raw)| {
            raw.into_request(projects, tariffs)
                .with_context(|| format!("Invalid simulation request on row {}", idx + 1))
        })
        .collect::<Result<_>>()
        .with_context(|| input_err_msg(&file_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_error, projects, tariffs};
    use crate::simulation::SimulationError;
    use crate::units::{Ars, Dimensionless, Energy, Usd};
    use rstest::{fixture, rstest};
    use rust_decimal_macros::dec;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[fixture]
    fn raw() -> SimulationRequestRaw {
        SimulationRequestRaw {
            project_id: "mendoza_norte".into(),
            tariff_id: "RES".into(),
            monthly_bill_ars: Some(dec!(50000)),
            monthly_consumption_kwh: None,
            coverage_percentage: Some(dec!(50)),
            number_of_panels: None,
            investment_amount_usd: None,
            user_email: None,
        }
    }

    #[rstest]
    fn test_into_request(raw: SimulationRequestRaw, projects: ProjectMap, tariffs: TariffMap) {
        assert_eq!(
            raw.into_request(&projects, &tariffs).unwrap(),
            SimulationRequest {
                project_id: "mendoza_norte".into(),
                tariff_id: "RES".into(),
                demand: Demand::Bill(Ars(dec!(50000))),
                mode: SimulationMode::BillCoverage(Dimensionless(dec!(50))),
                user_email: None,
            }
        );
    }

    #[rstest]
    fn test_into_request_unknown_ids(
        mut raw: SimulationRequestRaw,
        projects: ProjectMap,
        tariffs: TariffMap,
    ) {
        raw.tariff_id = "COM".into();
        assert_error!(
            raw.into_request(&projects, &tariffs),
            "Unknown tariff ID COM"
        );
    }

    #[rstest]
    fn test_into_request_two_modes(
        mut raw: SimulationRequestRaw,
        projects: ProjectMap,
        tariffs: TariffMap,
    ) {
        raw.investment_amount_usd = Some(dec!(5000));
        let err = raw.into_request(&projects, &tariffs).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SimulationError>(),
            Some(SimulationError::InvalidInput(_))
        ));
    }

    #[rstest]
    #[case::neither(None, None)]
    #[case::both(Some(dec!(50000)), Some(dec!(350)))]
    fn test_into_request_bad_demand(
        mut raw: SimulationRequestRaw,
        projects: ProjectMap,
        tariffs: TariffMap,
        #[case] bill: Option<Decimal>,
        #[case] consumption: Option<Decimal>,
    ) {
        raw.monthly_bill_ars = bill;
        raw.monthly_consumption_kwh = consumption;
        assert_error!(
            raw.into_request(&projects, &tariffs),
            "Invalid input: exactly one of monthly_bill_ars or monthly_consumption_kwh must be \
            provided"
        );
    }

    #[rstest]
    fn test_into_request_negative_bill(
        mut raw: SimulationRequestRaw,
        projects: ProjectMap,
        tariffs: TariffMap,
    ) {
        raw.monthly_bill_ars = Some(dec!(-1));
        assert_error!(
            raw.into_request(&projects, &tariffs),
            "Invalid input: monthly bill cannot be negative, got -1"
        );
    }

    #[rstest]
    fn test_read_simulation_requests(projects: ProjectMap, tariffs: TariffMap) {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(SIMULATIONS_FILE_NAME)).unwrap();
            writeln!(
                file,
                "project_id,tariff_id,monthly_bill_ars,monthly_consumption_kwh,coverage_percentage,number_of_panels,investment_amount_usd,user_email
mendoza_norte,RES,50000,,50,,,
mendoza_norte,RES,80000,,,12,,ana@example.com
mendoza_norte,RES,80000,,,,5000,
mendoza_norte,RES,,350,50,,,"
            )
            .unwrap();
        }

        let requests = read_simulation_requests(dir.path(), &projects, &tariffs).unwrap();
        assert_eq!(
            requests.iter().map(|r| r.mode).collect::<Vec<_>>(),
            [
                SimulationMode::BillCoverage(Dimensionless(dec!(50))),
                SimulationMode::Panels(12),
                SimulationMode::Investment(Usd(dec!(5000))),
                SimulationMode::BillCoverage(Dimensionless(dec!(50))),
            ]
        );
        assert_eq!(requests[1].user_email.as_deref(), Some("ana@example.com"));
        assert_eq!(requests[0].demand, Demand::Bill(Ars(dec!(50000))));
        assert_eq!(requests[3].demand, Demand::Consumption(Energy(dec!(350))));
    }

    #[rstest]
    fn test_read_simulation_requests_bad_row(projects: ProjectMap, tariffs: TariffMap) {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(SIMULATIONS_FILE_NAME)).unwrap();
            writeln!(
                file,
                "project_id,tariff_id,monthly_bill_ars,coverage_percentage,number_of_panels,investment_amount_usd,user_email
mendoza_norte,RES,50000,50,,,
mendoza_norte,RES,50000,,0,,"
            )
            .unwrap();
        }

        let err = read_simulation_requests(dir.path(), &projects, &tariffs).unwrap_err();
        let messages: Vec<_> = err.chain().map(ToString::to_string).collect();
        assert_eq!(
            messages[1..],
            [
                "Invalid simulation request on row 2".to_string(),
                "Invalid input: number of panels must be at least 1".to_string()
            ]
        );
    }
}
