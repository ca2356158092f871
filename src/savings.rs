//! Models for valuing the energy produced by a customer's panels.
//!
//! Exactly one model is selected in `engine.toml` and it is used for every simulation in a run.
use crate::parameters::EngineParameters;
use crate::tariff::TariffCategory;
use crate::units::{Ars, ArsPerKwh, ArsPerUsd, CheckedMul, Dimensionless, Energy};
use serde_string_enum::{DeserializeLabeledStringEnum, SerializeLabeledStringEnum};

/// How monthly savings are derived from an installation
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    SerializeLabeledStringEnum,
    DeserializeLabeledStringEnum,
)]
pub enum SavingsModel {
    /// Generation valued at the tariff's blended peak/valley energy charge
    #[string = "tariff_based"]
    TariffBased,
    /// A flat yield per panel, independent of the modelled generation
    #[string = "panel_count_flat"]
    PanelCountFlat,
    /// Generation valued at a fixed USD price per kWh
    #[default]
    #[string = "generation_fixed_price"]
    GenerationFixedPrice,
}

/// Everything a savings model may need to value an installation
pub struct SavingsContext<'a> {
    /// Engine constants (fixed energy price, flat-yield factors)
    pub parameters: &'a EngineParameters,
    /// The customer's tariff
    pub tariff: &'a TariffCategory,
    /// The rate snapshotted by the calculator
    pub exchange_rate: ArsPerUsd,
}

impl SavingsContext<'_> {
    /// The fixed energy price converted to pesos
    fn fixed_price_ars(&self) -> Option<ArsPerKwh> {
        self.parameters
            .energy_price_usd_per_kwh
            .checked_mul(self.exchange_rate)
    }
}

impl SavingsModel {
    /// The value in pesos of one self-generated kWh under this model.
    ///
    /// This is what a target saving is divided by to get the generation required to reach it.
    /// Returns `None` if the value is too large to represent.
    pub fn energy_value(self, ctx: &SavingsContext) -> Option<ArsPerKwh> {
        match self {
            Self::TariffBased => Some(ctx.tariff.blended_energy_charge()),
            Self::PanelCountFlat | Self::GenerationFixedPrice => ctx.fixed_price_ars(),
        }
    }

    /// Monthly savings for an installation of `number_of_panels` producing `monthly_generation`.
    ///
    /// Returns `None` if the savings are too large to represent.
    pub fn monthly_savings(
        self,
        ctx: &SavingsContext,
        number_of_panels: u32,
        monthly_generation: Energy,
    ) -> Option<Ars> {
        match self {
            Self::TariffBased | Self::GenerationFixedPrice => {
                monthly_generation.checked_mul(self.energy_value(ctx)?)
            }
            Self::PanelCountFlat => {
                let params = ctx.parameters;
                let yield_per_panel = Energy::new(
                    params
                        .flat_panel_power_kw
                        .value()
                        .checked_mul(params.flat_hours_per_month)?,
                )
                .checked_mul(params.flat_capacity_factor)?;

                yield_per_panel
                    .checked_mul(Dimensionless::from(number_of_panels))?
                    .checked_mul(ctx.fixed_price_ars()?)
            }
        }
    }
}
