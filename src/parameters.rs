//! Defines the `EngineParameters` struct, which represents the contents of `engine.toml`.
use crate::input::{input_err_msg, read_toml};
use crate::pricing::{PriceTier, check_price_tiers, default_price_tiers};
use crate::savings::SavingsModel;
use crate::units::{
    ArsPerUsd, Capacity, Dimensionless, EnergyPerCapacity, UsdPerKwh, Years,
};
use anyhow::{Context, Result, ensure};
use log::warn;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::path::Path;

const ENGINE_PARAMETERS_FILE_NAME: &str = "engine.toml";

macro_rules! define_unit_param_default {
    ($name:ident, $type: ty, $value: expr) => {
        fn $name() -> $type {
            <$type>::new($value)
        }
    };
}

macro_rules! define_param_default {
    ($name:ident, $type: ty, $value: expr) => {
        fn $name() -> $type {
            $value
        }
    };
}

define_unit_param_default!(default_annual_generation_factor, EnergyPerCapacity, dec!(1500));
define_unit_param_default!(default_performance_ratio, Dimensionless, dec!(0.85));
define_unit_param_default!(default_energy_price_usd_per_kwh, UsdPerKwh, dec!(0.10));
define_unit_param_default!(default_flat_panel_power_kw, Capacity, dec!(0.66));
define_unit_param_default!(default_flat_capacity_factor, Dimensionless, dec!(0.19));
define_unit_param_default!(default_exchange_rate, ArsPerUsd, dec!(1000));
define_unit_param_default!(default_payback_sentinel_years, Years, dec!(999));
define_param_default!(default_flat_hours_per_month, Decimal, dec!(720));

/// The constants used by the investment calculator.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EngineParameters {
    /// Energy produced per kWp installed per year, before losses
    #[serde(default = "default_annual_generation_factor")]
    pub annual_generation_factor: EnergyPerCapacity,
    /// Fraction of the nominal generation actually delivered
    #[serde(default = "default_performance_ratio")]
    pub performance_ratio: Dimensionless,
    /// The value of one self-generated kWh, independent of the customer's tariff
    #[serde(default = "default_energy_price_usd_per_kwh")]
    pub energy_price_usd_per_kwh: UsdPerKwh,
    /// How savings are calculated
    #[serde(default)]
    pub savings_model: SavingsModel,
    /// Price schedule for the coverage and panel-count simulations
    #[serde(default = "default_price_tiers")]
    pub price_tiers: Vec<PriceTier>,
    /// Nominal power per panel for the `panel_count_flat` savings model
    #[serde(default = "default_flat_panel_power_kw")]
    pub flat_panel_power_kw: Capacity,
    /// Capacity factor for the `panel_count_flat` savings model
    #[serde(default = "default_flat_capacity_factor")]
    pub flat_capacity_factor: Dimensionless,
    /// Hours in a month for the `panel_count_flat` savings model
    #[serde(default = "default_flat_hours_per_month")]
    pub flat_hours_per_month: Decimal,
    /// Exchange rate used when no quotes are available
    #[serde(default = "default_exchange_rate")]
    pub default_exchange_rate: ArsPerUsd,
    /// Payback period reported when an installation never pays for itself
    #[serde(default = "default_payback_sentinel_years")]
    pub payback_sentinel_years: Years,
}

impl Default for EngineParameters {
    fn default() -> Self {
        Self {
            annual_generation_factor: default_annual_generation_factor(),
            performance_ratio: default_performance_ratio(),
            energy_price_usd_per_kwh: default_energy_price_usd_per_kwh(),
            savings_model: SavingsModel::default(),
            price_tiers: default_price_tiers(),
            flat_panel_power_kw: default_flat_panel_power_kw(),
            flat_capacity_factor: default_flat_capacity_factor(),
            flat_hours_per_month: default_flat_hours_per_month(),
            default_exchange_rate: default_exchange_rate(),
            payback_sentinel_years: default_payback_sentinel_years(),
        }
    }
}

/// Check that the `performance_ratio` parameter is valid
fn check_performance_ratio(value: Dimensionless) -> Result<()> {
    ensure!(
        value > Dimensionless::ZERO && value <= Dimensionless(Decimal::ONE),
        "performance_ratio must be greater than zero and no more than one"
    );

    Ok(())
}

/// Check that the flat-yield parameters are valid
fn check_flat_yield(params: &EngineParameters) -> Result<()> {
    ensure!(
        params.flat_panel_power_kw >= Capacity::ZERO
            && params.flat_capacity_factor >= Dimensionless::ZERO
            && params.flat_hours_per_month >= Decimal::ZERO,
        "flat_panel_power_kw, flat_capacity_factor and flat_hours_per_month cannot be negative"
    );

    Ok(())
}

impl EngineParameters {
    /// Read the engine parameters from the specified data directory.
    ///
    /// If `engine.toml` is not present, default values will be used.
    ///
    /// # Arguments
    ///
    /// * `data_dir` - Folder containing the input data
    ///
    /// # Returns
    ///
    /// The file contents as an [`EngineParameters`] struct or an error if the file is invalid
    pub fn from_path<P: AsRef<Path>>(data_dir: P) -> Result<EngineParameters> {
        let file_path = data_dir.as_ref().join(ENGINE_PARAMETERS_FILE_NAME);
        if !file_path.is_file() {
            return Ok(EngineParameters::default());
        }

        let params: EngineParameters = read_toml(&file_path)?;
        params
            .validate()
            .with_context(|| input_err_msg(&file_path))?;

        Ok(params)
    }

    /// Validate parameters after reading in file
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.annual_generation_factor > EnergyPerCapacity::ZERO,
            "annual_generation_factor must be greater than zero"
        );
        check_performance_ratio(self.performance_ratio)?;
        ensure!(
            self.energy_price_usd_per_kwh > UsdPerKwh::ZERO,
            "energy_price_usd_per_kwh must be greater than zero"
        );
        check_price_tiers(&self.price_tiers)?;
        check_flat_yield(self)?;
        ensure!(
            self.default_exchange_rate > ArsPerUsd::ZERO,
            "default_exchange_rate must be greater than zero"
        );
        ensure!(
            self.payback_sentinel_years > Years::ZERO,
            "payback_sentinel_years must be greater than zero"
        );

        if self.savings_model == SavingsModel::PanelCountFlat {
            warn!(
                "The savings model is set to 'panel_count_flat'. Savings will not depend on the \
                modelled generation or the project's panel rating."
            );
        }

        Ok(())
    }

    /// Generation per kWp per year after losses
    pub fn effective_yield(&self) -> EnergyPerCapacity {
        self.annual_generation_factor * self.performance_ratio
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use rstest::rstest;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_engine_params_from_path_no_file() {
        let dir = tempdir().unwrap();
        assert_eq!(
            EngineParameters::from_path(dir.path()).unwrap(),
            EngineParameters::default()
        );
    }

    #[test]
    fn test_engine_params_from_path() {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(ENGINE_PARAMETERS_FILE_NAME)).unwrap();
            writeln!(
                file,
                "energy_price_usd_per_kwh = \"0.12\"
savings_model = \"tariff_based\"

[[price_tiers]]
price_per_panel = \"650\""
            )
            .unwrap();
        }

        let params = EngineParameters::from_path(dir.path()).unwrap();
        assert_eq!(params.energy_price_usd_per_kwh, UsdPerKwh(dec!(0.12)));
        assert_eq!(params.savings_model, SavingsModel::TariffBased);
        assert_eq!(
            params.price_tiers,
            [PriceTier {
                size: None,
                price_per_panel: crate::units::Usd(dec!(650))
            }]
        );
        assert_eq!(params.performance_ratio, Dimensionless(dec!(0.85)));
    }

    #[test]
    fn test_engine_params_unknown_field() {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(ENGINE_PARAMETERS_FILE_NAME)).unwrap();
            writeln!(file, "energy_price = \"0.12\"").unwrap();
        }

        assert!(EngineParameters::from_path(dir.path()).is_err());
    }

    #[test]
    fn test_effective_yield() {
        assert_eq!(
            EngineParameters::default().effective_yield(),
            EnergyPerCapacity(dec!(1275))
        );
    }

    #[rstest]
    #[case(dec!(0.85), true)]
    #[case(dec!(1), true)]
    #[case(dec!(0.0001), true)]
    #[case(dec!(0), false)]
    #[case(dec!(1.01), false)]
    #[case(dec!(-0.5), false)]
    fn test_check_performance_ratio(#[case] value: Decimal, #[case] expected_valid: bool) {
        assert_eq!(
            check_performance_ratio(Dimensionless(value)).is_ok(),
            expected_valid
        );
    }

    #[test]
    fn test_validate() {
        assert!(EngineParameters::default().validate().is_ok());

        let params = EngineParameters {
            energy_price_usd_per_kwh: UsdPerKwh::ZERO,
            ..Default::default()
        };
        assert_error!(
            params.validate(),
            "energy_price_usd_per_kwh must be greater than zero"
        );

        let params = EngineParameters {
            default_exchange_rate: ArsPerUsd::ZERO,
            ..Default::default()
        };
        assert_error!(
            params.validate(),
            "default_exchange_rate must be greater than zero"
        );

        let params = EngineParameters {
            flat_capacity_factor: Dimensionless(dec!(-0.19)),
            ..Default::default()
        };
        assert_error!(
            params.validate(),
            "flat_panel_power_kw, flat_capacity_factor and flat_hours_per_month cannot be negative"
        );

        let params = EngineParameters {
            price_tiers: Vec::new(),
            ..Default::default()
        };
        assert_error!(params.validate(), "price_tiers cannot be empty");
    }
}
