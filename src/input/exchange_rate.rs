//! Code for reading exchange rate quotes from a CSV file.
use crate::exchange_rate::{DEFAULT_RATE_SOURCE, ExchangeRate, ExchangeRateTable};
use crate::input::{input_err_msg, read_csv_optional};
use crate::units::ArsPerUsd;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::warn;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;

const EXCHANGE_RATES_FILE_NAME: &str = "exchange_rates.csv";

#[derive(PartialEq, Debug, Deserialize)]
struct ExchangeRateRaw {
    date: NaiveDate,
    source: Option<String>,
    rate: Decimal,
}

impl From<ExchangeRateRaw> for ExchangeRate {
    fn from(raw: ExchangeRateRaw) -> Self {
        Self {
            date: raw.date,
            source: raw.source.unwrap_or_else(|| DEFAULT_RATE_SOURCE.into()),
            rate: ArsPerUsd(raw.rate),
        }
    }
}

/// Read exchange rate quotes from the specified data directory.
///
/// The file is optional. If it is missing or has no quotes, `fallback` will be used for every
/// simulation.
///
/// # Arguments
///
/// * `data_dir` - Folder containing the input data
/// * `fallback` - The rate to use if there are no quotes
pub fn read_exchange_rates(data_dir: &Path, fallback: ArsPerUsd) -> Result<ExchangeRateTable> {
    let file_path = data_dir.join(EXCHANGE_RATES_FILE_NAME);
    let rates = read_csv_optional::<ExchangeRateRaw>(&file_path)?
        .map(ExchangeRate::from)
        .collect();
    let table = ExchangeRateTable::new(rates, fallback).with_context(|| input_err_msg(&file_path))?;

    if table.is_empty() {
        warn!("No exchange rates found. Using the default rate of {fallback} ARS/USD.");
    }

    Ok(table)
}
