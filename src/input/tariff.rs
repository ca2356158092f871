//! Code for reading tariff categories from a CSV file.
use crate::input::{collect_id_map, input_err_msg, read_csv};
use crate::tariff::{TariffCategory, TariffID, TariffMap};
use crate::units::{Ars, ArsPerKwh, Dimensionless};
use anyhow::{Context, Result, ensure};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::path::Path;

const TARIFFS_FILE_NAME: &str = "tariffs.csv";

/// Share of consumption assumed to fall in peak hours if not given
const DEFAULT_PEAK_PERCENTAGE: Decimal = dec!(30);

#[derive(PartialEq, Debug, Deserialize)]
struct TariffCategoryRaw {
    id: TariffID,
    name: String,
    energy_charge_peak: Decimal,
    energy_charge_valley: Decimal,
    fixed_charge_monthly: Decimal,
    peak_percentage: Option<Decimal>,
}

impl TariffCategoryRaw {
    fn into_tariff(self) -> Result<TariffCategory> {
        ensure!(
            self.energy_charge_peak >= Decimal::ZERO
                && self.energy_charge_valley >= Decimal::ZERO
                && self.fixed_charge_monthly >= Decimal::ZERO,
            "Tariff {}: charges cannot be negative",
            self.id
        );

        let peak_percentage = self.peak_percentage.unwrap_or(DEFAULT_PEAK_PERCENTAGE);
        ensure!(
            (Decimal::ZERO..=Decimal::ONE_HUNDRED).contains(&peak_percentage),
            "Tariff {}: peak_percentage must be between 0 and 100",
            self.id
        );

        Ok(TariffCategory {
            id: self.id,
            name: self.name,
            energy_charge_peak: ArsPerKwh(self.energy_charge_peak),
            energy_charge_valley: ArsPerKwh(self.energy_charge_valley),
            fixed_charge_monthly: Ars(self.fixed_charge_monthly),
            peak_percentage: Dimensionless(peak_percentage),
        })
    }
}

/// Read tariff categories from the specified data directory.
///
/// # Arguments
///
/// * `data_dir` - Folder containing the input data
///
/// # Returns
///
/// The tariffs, keyed by ID, or an error.
pub fn read_tariffs(data_dir: &Path) -> Result<TariffMap> {
    let file_path = data_dir.join(TARIFFS_FILE_NAME);
    let iter = read_csv::<TariffCategoryRaw>(&file_path)?;
    read_tariffs_from_iter(iter).with_context(|| input_err_msg(&file_path))
}

fn read_tariffs_from_iter<I>(iter: I) -> Result<TariffMap>
where
    I: Iterator<Item = TariffCategoryRaw>,
{
    let tariffs: Vec<_> = iter
        .map(TariffCategoryRaw::into_tariff)
        .collect::<Result<_>>()?;
    collect_id_map(tariffs)
}
