//! Common functionality for solarinvest.
#![warn(missing_docs)]
use std::path::PathBuf;

pub mod calculator;
pub mod cli;
pub mod comparison;
pub mod dataset;
pub mod exchange_rate;
pub mod finance;
pub mod id;
pub mod input;
pub mod log;
pub mod output;
pub mod parameters;
pub mod pricing;
pub mod project;
pub mod savings;
pub mod settings;
pub mod simulation;
pub mod tariff;
pub mod units;

#[cfg(test)]
mod fixture;

/// Get the config dir for the program (e.g. `~/.config/solarinvest` on Linux)
pub fn get_solarinvest_config_dir() -> PathBuf {
    let Some(mut config_dir) = dirs::config_dir() else {
        // No config dir on this platform, so use the working directory
        return PathBuf::default();
    };
    config_dir.push("solarinvest");

    config_dir
}
