//! General functions related to finance.
//!
//! All of these are total over their domain: a zero or negative denominator gives a documented
//! fallback rather than a division fault. `None` means the result is too large to represent.
use crate::units::{Ars, CheckedDiv, CheckedMul, Dimensionless, Years};
use rust_decimal::Decimal;

const ONE_HUNDRED: Dimensionless = Dimensionless(Decimal::ONE_HUNDRED);

/// Simple (undiscounted) payback period.
///
/// Returns `sentinel` if the installation never pays for itself (`annual_savings` <= 0).
pub fn payback_period(total_investment: Ars, annual_savings: Ars, sentinel: Years) -> Option<Years> {
    if annual_savings <= Ars::ZERO {
        return Some(sentinel);
    }

    total_investment
        .checked_div(annual_savings)
        .map(|years| Years::new(years.value()))
}

/// Annual return on investment as a percentage, or zero if nothing was invested
pub fn annual_roi(annual_savings: Ars, total_investment: Ars) -> Option<Dimensionless> {
    if total_investment <= Ars::ZERO {
        return Some(Dimensionless::ZERO);
    }

    annual_savings.checked_div(total_investment)?.checked_mul(ONE_HUNDRED)
}

/// Percentage of `total` represented by `part`, or zero if `total` is not positive
pub fn percentage_of<T>(part: T, total: T) -> Option<Dimensionless>
where
    T: Copy + Default + PartialOrd + CheckedDiv<T, Output = Dimensionless>,
{
    if total <= T::default() {
        return Some(Dimensionless::ZERO);
    }

    part.checked_div(total)?.checked_mul(ONE_HUNDRED)
}
