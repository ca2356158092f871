//! Electricity tariff categories.
use crate::id::{define_id_getter, define_id_type};
use crate::units::{Ars, ArsPerKwh, Dimensionless, Energy};
use indexmap::IndexMap;
use rust_decimal::Decimal;

define_id_type! {TariffID}

/// A map of [`TariffCategory`]s, keyed by tariff ID
pub type TariffMap = IndexMap<TariffID, TariffCategory>;

/// A tariff category with a fixed monthly charge and time-of-use energy charges
#[derive(Debug, Clone, PartialEq)]
pub struct TariffCategory {
    /// A unique identifier for the tariff (e.g. "RES")
    pub id: TariffID,
    /// A human-readable name
    pub name: String,
    /// Energy charge during peak hours
    pub energy_charge_peak: ArsPerKwh,
    /// Energy charge outside peak hours
    pub energy_charge_valley: ArsPerKwh,
    /// Charge applied every month regardless of consumption
    pub fixed_charge_monthly: Ars,
    /// Percentage (0-100) of consumption that falls in peak hours
    pub peak_percentage: Dimensionless,
}
define_id_getter! {TariffCategory, TariffID}

impl TariffCategory {
    /// Fraction of consumption in peak hours
    fn peak_fraction(&self) -> Dimensionless {
        self.peak_percentage / Dimensionless(Decimal::ONE_HUNDRED)
    }

    /// Fraction of consumption in valley hours. Peak and valley always sum to one.
    fn valley_fraction(&self) -> Dimensionless {
        Dimensionless(Decimal::ONE) - self.peak_fraction()
    }

    /// The average energy charge for consumption split between peak and valley
    pub fn blended_energy_charge(&self) -> ArsPerKwh {
        self.energy_charge_peak * self.peak_fraction()
            + self.energy_charge_valley * self.valley_fraction()
    }

    /// Cost of a month's consumption including the fixed charge
    pub fn monthly_cost(&self, monthly_kwh: Energy) -> Ars {
        let peak_kwh = monthly_kwh * self.peak_fraction();
        let valley_kwh = monthly_kwh * self.valley_fraction();

        peak_kwh * self.energy_charge_peak
            + valley_kwh * self.energy_charge_valley
            + self.fixed_charge_monthly
    }
}
