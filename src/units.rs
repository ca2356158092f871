#![allow(missing_docs)]

//! This module defines the unit types used by the engine and the conversions between them.
//!
//! Every quantity wraps an exact [`Decimal`] so that chained conversions (USD to ARS, kW to kWh,
//! etc.) never accumulate floating-point drift.
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Represents a dimensionless quantity (ratios, factors and percentages).
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Add,
    derive_more::Sub,
    derive_more::Display,
)]
#[serde(transparent)]
pub struct Dimensionless(pub Decimal);

impl std::ops::Mul for Dimensionless {
    type Output = Dimensionless;

    fn mul(self, rhs: Dimensionless) -> Self::Output {
        Dimensionless(self.0 * rhs.0)
    }
}

impl std::ops::Div for Dimensionless {
    type Output = Dimensionless;

    fn div(self, rhs: Dimensionless) -> Self::Output {
        Dimensionless(self.0 / rhs.0)
    }
}

/// Multiplication which returns `None` instead of panicking if the result doesn't fit
pub trait CheckedMul<Rhs = Self> {
    type Output;
    fn checked_mul(self, rhs: Rhs) -> Option<Self::Output>;
}

/// Division which returns `None` instead of panicking on overflow or a zero divisor
pub trait CheckedDiv<Rhs = Self> {
    type Output;
    fn checked_div(self, rhs: Rhs) -> Option<Self::Output>;
}

impl CheckedMul for Dimensionless {
    type Output = Dimensionless;

    fn checked_mul(self, rhs: Dimensionless) -> Option<Dimensionless> {
        self.0.checked_mul(rhs.0).map(Dimensionless)
    }
}

impl CheckedDiv for Dimensionless {
    type Output = Dimensionless;

    fn checked_div(self, rhs: Dimensionless) -> Option<Dimensionless> {
        self.0.checked_div(rhs.0).map(Dimensionless)
    }
}

impl Dimensionless {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(val: Decimal) -> Self {
        Self(val)
    }

    pub fn value(self) -> Decimal {
        self.0
    }

    /// Round half away from zero to a whole number, returning `None` if it doesn't fit a `u32`
    pub fn round_half_up_u32(self) -> Option<u32> {
        self.0
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_u32()
    }

    /// Truncate towards zero, returning `None` if the result doesn't fit a `u32`
    pub fn floor_u32(self) -> Option<u32> {
        self.0.floor().to_u32()
    }
}

impl From<Decimal> for Dimensionless {
    fn from(val: Decimal) -> Self {
        Self(val)
    }
}

impl From<u32> for Dimensionless {
    fn from(val: u32) -> Self {
        Self(Decimal::from(val))
    }
}

macro_rules! unit_struct {
    ($name:ident) => {
        /// Represents a type of quantity.
        #[derive(
            Debug,
            Clone,
            Copy,
            Default,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Serialize,
            Deserialize,
            derive_more::Add,
            derive_more::Sub,
            derive_more::Display,
        )]
        #[serde(transparent)]
        pub struct $name(pub Decimal);

        impl $name {
            /// The zero value for this unit
            pub const ZERO: Self = Self(Decimal::ZERO);

            /// Creates a new instance of the unit type from a decimal value.
            pub fn new(val: Decimal) -> Self {
                Self(val)
            }

            /// Returns the value of the unit type as a decimal.
            pub fn value(self) -> Decimal {
                self.0
            }

            /// Rounds the value to the given number of decimal places (half away from zero)
            pub fn round_dp(self, dp: u32) -> Self {
                Self(
                    self.0
                        .round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero),
                )
            }
        }

        impl std::ops::Mul<Dimensionless> for $name {
            type Output = $name;
            fn mul(self, rhs: Dimensionless) -> $name {
                $name(self.0 * rhs.0)
            }
        }

        impl std::ops::Mul<$name> for Dimensionless {
            type Output = $name;
            fn mul(self, rhs: $name) -> $name {
                $name(self.0 * rhs.0)
            }
        }

        impl std::ops::Div<Dimensionless> for $name {
            type Output = $name;
            fn div(self, rhs: Dimensionless) -> $name {
                $name(self.0 / rhs.0)
            }
        }

        impl std::ops::Div<$name> for $name {
            type Output = Dimensionless;
            fn div(self, rhs: $name) -> Dimensionless {
                Dimensionless(self.0 / rhs.0)
            }
        }

        impl CheckedMul<Dimensionless> for $name {
            type Output = $name;
            fn checked_mul(self, rhs: Dimensionless) -> Option<$name> {
                self.0.checked_mul(rhs.0).map($name)
            }
        }

        impl CheckedDiv<Dimensionless> for $name {
            type Output = $name;
            fn checked_div(self, rhs: Dimensionless) -> Option<$name> {
                self.0.checked_div(rhs.0).map($name)
            }
        }

        impl CheckedDiv<$name> for $name {
            type Output = Dimensionless;
            fn checked_div(self, rhs: $name) -> Option<Dimensionless> {
                self.0.checked_div(rhs.0).map(Dimensionless)
            }
        }
    };
}

macro_rules! impl_mul {
    ($Lhs:ty, $Rhs:ty, $Out:ty) => {
        impl std::ops::Mul<$Rhs> for $Lhs {
            type Output = $Out;
            fn mul(self, rhs: $Rhs) -> $Out {
                <$Out>::new(self.0 * rhs.0)
            }
        }
        impl std::ops::Mul<$Lhs> for $Rhs {
            type Output = $Out;
            fn mul(self, lhs: $Lhs) -> $Out {
                <$Out>::new(self.0 * lhs.0)
            }
        }
        impl CheckedMul<$Rhs> for $Lhs {
            type Output = $Out;
            fn checked_mul(self, rhs: $Rhs) -> Option<$Out> {
                self.0.checked_mul(rhs.0).map(<$Out>::new)
            }
        }
    };
}

macro_rules! impl_div {
    ($Lhs:ty, $Rhs:ty, $Out:ty) => {
        impl std::ops::Div<$Rhs> for $Lhs {
            type Output = $Out;
            fn div(self, rhs: $Rhs) -> $Out {
                <$Out>::new(self.0 / rhs.0)
            }
        }
        impl CheckedDiv<$Rhs> for $Lhs {
            type Output = $Out;
            fn checked_div(self, rhs: $Rhs) -> Option<$Out> {
                self.0.checked_div(rhs.0).map(<$Out>::new)
            }
        }
    };
}

// Base quantities
unit_struct!(Usd);
unit_struct!(Ars);
unit_struct!(Watts);
unit_struct!(Capacity);
unit_struct!(Energy);
unit_struct!(Years);

// Derived quantities
unit_struct!(ArsPerUsd);
unit_struct!(UsdPerKwh);
unit_struct!(ArsPerKwh);
unit_struct!(UsdPerWatt);
unit_struct!(EnergyPerCapacity);

// Division rules
impl_div!(Ars, ArsPerUsd, Usd);
impl_div!(Ars, ArsPerKwh, Energy);
impl_div!(Usd, UsdPerWatt, Watts);
impl_div!(Energy, EnergyPerCapacity, Capacity);

// Multiplication rules
impl_mul!(Usd, ArsPerUsd, Ars);
impl_mul!(UsdPerKwh, ArsPerUsd, ArsPerKwh);
impl_mul!(Energy, ArsPerKwh, Ars);
impl_mul!(Watts, UsdPerWatt, Usd);
impl_mul!(Capacity, EnergyPerCapacity, Energy);

impl Watts {
    /// Convert a power in watts to kilowatts
    pub fn to_capacity(self) -> Capacity {
        Capacity(self.0 / Decimal::ONE_THOUSAND)
    }
}

impl Capacity {
    /// Convert a power in kilowatts to watts
    pub fn to_watts(self) -> Watts {
        Watts(self.0 * Decimal::ONE_THOUSAND)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(dec!(3.2166), Some(3))]
    #[case(dec!(3.5), Some(4))] // Half rounds up
    #[case(dec!(2.5), Some(3))] // ...even when the integer part is even
    #[case(dec!(0.49), Some(0))]
    #[case(dec!(-1), None)]
    fn test_round_half_up_u32(#[case] value: Decimal, #[case] expected: Option<u32>) {
        assert_eq!(Dimensionless(value).round_half_up_u32(), expected);
    }

    #[rstest]
    #[case(dec!(3.9999), Some(3))]
    #[case(dec!(4), Some(4))]
    #[case(dec!(0.2), Some(0))]
    fn test_floor_u32(#[case] value: Decimal, #[case] expected: Option<u32>) {
        assert_eq!(Dimensionless(value).floor_u32(), expected);
    }

    #[test]
    fn test_checked_arithmetic() {
        let rate = ArsPerUsd(dec!(1330));
        assert_eq!(Usd(dec!(2100)).checked_mul(rate), Some(Ars(dec!(2793000))));
        assert_eq!(Ars(dec!(2793000)).checked_div(rate), Some(Usd(dec!(2100))));
        assert_eq!(Ars::ZERO.checked_div(ArsPerUsd::ZERO), None);
        assert_eq!(Ars(Decimal::MAX).checked_mul(Dimensionless(dec!(2))), None);
        assert_eq!(Ars(dec!(23316)).checked_div(Ars(Decimal::new(1, 28))), None);
        assert_eq!(
            Energy(dec!(175)).checked_div(Energy(dec!(350))),
            Some(Dimensionless(dec!(0.5)))
        );
    }

    #[test]
    fn test_currency_conversion() {
        let rate = ArsPerUsd(dec!(1330));
        assert_eq!(Usd(dec!(2100)) * rate, Ars(dec!(2793000)));
        assert_eq!(Ars(dec!(2793000)) / rate, Usd(dec!(2100)));
        assert_eq!(UsdPerKwh(dec!(0.10)) * rate, ArsPerKwh(dec!(133)));
    }

    #[test]
    fn test_power_conversion() {
        assert_eq!(Watts(dec!(550)).to_capacity(), Capacity(dec!(0.55)));
        assert_eq!(Capacity(dec!(1.65)).to_watts(), Watts(dec!(1650)));
        assert_eq!(
            Capacity(dec!(1.65)) * EnergyPerCapacity(dec!(1275)),
            Energy(dec!(2103.75))
        );
    }

    #[test]
    fn test_round_dp() {
        assert_eq!(Ars(dec!(23316.5625)).round_dp(2), Ars(dec!(23316.56)));
        assert_eq!(Ars(dec!(0.125)).round_dp(2), Ars(dec!(0.13)));
    }
}
