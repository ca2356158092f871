//! Exchange rates between the US dollar and the Argentine peso.
use crate::units::ArsPerUsd;
use anyhow::{Result, bail, ensure};
use chrono::NaiveDate;
use itertools::Itertools;

/// Something which can supply the current ARS/USD exchange rate
pub trait RateProvider {
    /// The most recent rate available
    fn latest_rate(&self) -> ArsPerUsd;
}

/// A fixed rate, mostly useful for tests and one-off calculations
impl RateProvider for ArsPerUsd {
    fn latest_rate(&self) -> ArsPerUsd {
        *self
    }
}

/// The source recorded for quotes entered by hand
pub const DEFAULT_RATE_SOURCE: &str = "Manual";

/// A dated exchange rate quote
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeRate {
    /// The date the quote applies to
    pub date: NaiveDate,
    /// Where the quote came from
    pub source: String,
    /// Pesos per dollar
    pub rate: ArsPerUsd,
}

/// A validated collection of exchange rate quotes with a fallback for when there are none
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeRateTable {
    /// Quotes ordered from most to least recent
    rates: Vec<ExchangeRate>,
    fallback: ArsPerUsd,
}

impl ExchangeRateTable {
    /// Create a new table.
    ///
    /// # Arguments
    ///
    /// * `rates` - Quotes in any order. There can be at most one per (date, source) pair.
    /// * `fallback` - The rate to report if `rates` is empty
    pub fn new(rates: Vec<ExchangeRate>, fallback: ArsPerUsd) -> Result<Self> {
        ensure!(
            fallback > ArsPerUsd::ZERO,
            "Fallback exchange rate must be greater than zero"
        );

        for rate in &rates {
            ensure!(
                rate.rate > ArsPerUsd::ZERO,
                "Exchange rate for {} ({}) must be greater than zero",
                rate.date,
                rate.source
            );
        }

        if let Some(dup) = rates.iter().duplicates_by(|r| (r.date, r.source.clone())).next() {
            bail!(
                "More than one exchange rate given for {} from source {}",
                dup.date,
                dup.source
            );
        }

        let rates = rates
            .into_iter()
            .sorted_by(|a, b| (b.date, &b.source).cmp(&(a.date, &a.source)))
            .collect();

        Ok(Self { rates, fallback })
    }

    /// Iterate over the quotes, most recent first
    pub fn iter(&self) -> impl Iterator<Item = &ExchangeRate> {
        self.rates.iter()
    }

    /// Whether the table has no quotes (and will therefore report the fallback)
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

impl RateProvider for ExchangeRateTable {
    fn latest_rate(&self) -> ArsPerUsd {
        self.rates.first().map_or(self.fallback, |r| r.rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use rust_decimal_macros::dec;

    fn quote(date: &str, source: &str, rate: ArsPerUsd) -> ExchangeRate {
        ExchangeRate {
            date: date.parse().unwrap(),
            source: source.into(),
            rate,
        }
    }

    #[test]
    fn test_latest_rate_is_most_recent() {
        let table = ExchangeRateTable::new(
            vec![
                quote("2025-06-01", "Manual", ArsPerUsd(dec!(1321))),
                quote("2025-06-03", "Manual", ArsPerUsd(dec!(1330))),
                quote("2025-06-02", "Manual", ArsPerUsd(dec!(1327))),
            ],
            ArsPerUsd(dec!(1000)),
        )
        .unwrap();
        assert_eq!(table.latest_rate(), ArsPerUsd(dec!(1330)));
        assert_eq!(
            table.iter().map(|r| r.date.to_string()).collect::<Vec<_>>(),
            ["2025-06-03", "2025-06-02", "2025-06-01"]
        );
    }

    #[test]
    fn test_latest_rate_fallback() {
        let table = ExchangeRateTable::new(Vec::new(), ArsPerUsd(dec!(1000))).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.latest_rate(), ArsPerUsd(dec!(1000)));
    }

    #[test]
    fn test_same_date_different_sources() {
        let table = ExchangeRateTable::new(
            vec![
                quote("2025-06-03", "BNA", ArsPerUsd(dec!(1310))),
                quote("2025-06-03", "Manual", ArsPerUsd(dec!(1330))),
            ],
            ArsPerUsd(dec!(1000)),
        )
        .unwrap();
        assert_eq!(table.latest_rate(), ArsPerUsd(dec!(1330)));
    }

    #[test]
    fn test_duplicate_rates() {
        assert_error!(
            ExchangeRateTable::new(
                vec![
                    quote("2025-06-03", "Manual", ArsPerUsd(dec!(1330))),
                    quote("2025-06-03", "Manual", ArsPerUsd(dec!(1331))),
                ],
                ArsPerUsd(dec!(1000)),
            ),
            "More than one exchange rate given for 2025-06-03 from source Manual"
        );
    }

    #[test]
    fn test_non_positive_rates() {
        assert_error!(
            ExchangeRateTable::new(
                vec![quote("2025-06-03", "Manual", ArsPerUsd(dec!(0)))],
                ArsPerUsd(dec!(1000)),
            ),
            "Exchange rate for 2025-06-03 (Manual) must be greater than zero"
        );
        assert_error!(
            ExchangeRateTable::new(Vec::new(), ArsPerUsd(dec!(-1))),
            "Fallback exchange rate must be greater than zero"
        );
    }

    #[test]
    fn test_fixed_rate_provider() {
        assert_eq!(ArsPerUsd(dec!(1330)).latest_rate(), ArsPerUsd(dec!(1330)));
    }
}
