//! Fixtures for tests

use crate::calculator::InvestmentCalculator;
use crate::exchange_rate::{ExchangeRate, ExchangeRateTable};
use crate::parameters::EngineParameters;
use crate::project::{PricingBasis, Project, ProjectMap};
use crate::simulation::SimulationResult;
use crate::tariff::{TariffCategory, TariffMap};
use crate::units::{Ars, ArsPerKwh, ArsPerUsd, Capacity, Dimensionless, Usd, Watts};
use indexmap::indexmap;
use rstest::fixture;
use rust_decimal_macros::dec;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

#[fixture]
pub fn project() -> Project {
    Project {
        id: "mendoza_norte".into(),
        name: "Parque Solar Mendoza Norte".into(),
        panel_power_wp: Watts(dec!(550)),
        pricing: PricingBasis::PerPanel(Usd(dec!(700))),
        available_power_kw: Capacity(dec!(400)),
    }
}

#[fixture]
pub fn projects(project: Project) -> ProjectMap {
    indexmap! { project.id.clone() => project }
}

#[fixture]
pub fn tariff() -> TariffCategory {
    TariffCategory {
        id: "RES".into(),
        name: "Residencial".into(),
        energy_charge_peak: ArsPerKwh(dec!(170)),
        energy_charge_valley: ArsPerKwh(dec!(120)),
        fixed_charge_monthly: Ars(dec!(4500)),
        peak_percentage: Dimensionless(dec!(30)),
    }
}

#[fixture]
pub fn tariffs(tariff: TariffCategory) -> TariffMap {
    indexmap! { tariff.id.clone() => tariff }
}

#[fixture]
pub fn parameters() -> EngineParameters {
    EngineParameters::default()
}

#[fixture]
pub fn exchange_rates() -> ExchangeRateTable {
    ExchangeRateTable::new(
        vec![ExchangeRate {
            date: "2025-06-03".parse().unwrap(),
            source: "Manual".into(),
            rate: ArsPerUsd(dec!(1330)),
        }],
        ArsPerUsd(dec!(1000)),
    )
    .unwrap()
}

/// Half of a 50,000 ARS bill at 1330 ARS/USD, which comes out at three panels
#[fixture]
pub fn result(
    project: Project,
    tariff: TariffCategory,
    parameters: EngineParameters,
    exchange_rates: ExchangeRateTable,
) -> SimulationResult {
    InvestmentCalculator::new(&project, &tariff, &parameters, &exchange_rates)
        .simulate_by_bill_coverage(Ars(dec!(50000)), Dimensionless(dec!(50)))
        .unwrap()
}
