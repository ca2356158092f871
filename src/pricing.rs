//! Tiered panel pricing, where the unit price drops for larger orders.
use crate::units::{CheckedMul, Dimensionless, Usd};
use anyhow::{Result, ensure};
use rust_decimal_macros::dec;
use serde::Deserialize;

/// A band of panels sold at the same unit price.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PriceTier {
    /// How many panels fall in this tier. `None` means the tier is unbounded.
    pub size: Option<u32>,
    /// Price of each panel within the tier
    pub price_per_panel: Usd,
}

/// The default tiers: panels 1-9 at 700, 10-99 at 500 and 100+ at 400
pub fn default_price_tiers() -> Vec<PriceTier> {
    vec![
        PriceTier {
            size: Some(9),
            price_per_panel: Usd(dec!(700)),
        },
        PriceTier {
            size: Some(90),
            price_per_panel: Usd(dec!(500)),
        },
        PriceTier {
            size: None,
            price_per_panel: Usd(dec!(400)),
        },
    ]
}

/// Check that a tier schedule covers every possible order size
pub fn check_price_tiers(tiers: &[PriceTier]) -> Result<()> {
    let Some((last, rest)) = tiers.split_last() else {
        anyhow::bail!("price_tiers cannot be empty");
    };

    ensure!(
        last.size.is_none(),
        "The last entry in price_tiers must not have a size"
    );

    for tier in rest {
        ensure!(
            tier.size.is_some_and(|size| size > 0),
            "Every entry in price_tiers except the last must have a size greater than zero"
        );
    }

    ensure!(
        tiers.iter().all(|tier| tier.price_per_panel >= Usd::ZERO),
        "Prices in price_tiers cannot be negative"
    );

    Ok(())
}

/// Total price of `panels` panels.
///
/// Each panel is charged at the price of the tier it falls in, so 12 panels with the default
/// tiers cost 9 * 700 + 3 * 500 rather than 12 * 500. Returns `None` if the total is too large to
/// represent.
pub fn tiered_price(tiers: &[PriceTier], panels: u32) -> Option<Usd> {
    let (total, _) = tiers
        .iter()
        .try_fold((Usd::ZERO, panels), |(total, remaining), tier| {
            let in_tier = tier.size.map_or(remaining, |size| remaining.min(size));
            let cost = tier
                .price_per_panel
                .checked_mul(Dimensionless::from(in_tier))?;
            Some((
                Usd(total.value().checked_add(cost.value())?),
                remaining - in_tier,
            ))
        })?;

    Some(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use rstest::rstest;
    use rust_decimal::Decimal;

    #[rstest]
    #[case(0, dec!(0))]
    #[case(1, dec!(700))]
    #[case(9, dec!(6300))]
    #[case(10, dec!(6800))]
    #[case(12, dec!(7800))] // 9*700 + 3*500, not 12*500
    #[case(99, dec!(51300))]
    #[case(100, dec!(51700))]
    #[case(150, dec!(71700))]
    fn test_tiered_price(#[case] panels: u32, #[case] expected: Decimal) {
        assert_eq!(
            tiered_price(&default_price_tiers(), panels),
            Some(Usd(expected))
        );
    }

    #[test]
    fn test_tiered_price_monotonic() {
        let tiers = default_price_tiers();
        let prices: Vec<_> = (0..=250).map(|n| tiered_price(&tiers, n)).collect();
        assert!(prices.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_single_flat_tier() {
        let tiers = [PriceTier {
            size: None,
            price_per_panel: Usd(dec!(612.5)),
        }];
        assert_eq!(tiered_price(&tiers, 4), Some(Usd(dec!(2450))));
    }

    #[test]
    fn test_tiered_price_too_large() {
        let tiers = [PriceTier {
            size: None,
            price_per_panel: Usd(Decimal::MAX),
        }];
        assert_eq!(tiered_price(&tiers, 1), Some(Usd(Decimal::MAX)));
        assert_eq!(tiered_price(&tiers, 2), None);
    }

    #[test]
    fn test_check_price_tiers() {
        assert!(check_price_tiers(&default_price_tiers()).is_ok());

        assert_error!(check_price_tiers(&[]), "price_tiers cannot be empty");

        let mut tiers = default_price_tiers();
        tiers[2].size = Some(10);
        assert_error!(
            check_price_tiers(&tiers),
            "The last entry in price_tiers must not have a size"
        );

        let mut tiers = default_price_tiers();
        tiers[0].size = Some(0);
        assert_error!(
            check_price_tiers(&tiers),
            "Every entry in price_tiers except the last must have a size greater than zero"
        );

        let mut tiers = default_price_tiers();
        tiers[1].price_per_panel = Usd(dec!(-1));
        assert_error!(
            check_price_tiers(&tiers),
            "Prices in price_tiers cannot be negative"
        );
    }
}
