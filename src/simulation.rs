//! Simulation requests, their results and the errors that can arise when running them.
use crate::project::ProjectID;
use crate::savings::SavingsModel;
use crate::tariff::TariffID;
use crate::units::{Ars, ArsPerUsd, Capacity, Dimensionless, Energy, Usd, Years};
use anyhow::Result;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Domain errors raised by the engine.
///
/// These are carried inside [`anyhow::Error`]s so callers can recover the kind with
/// [`anyhow::Error::downcast_ref`].
#[derive(Debug, Clone, PartialEq, derive_more::Display)]
pub enum SimulationError {
    /// A magnitude is out of range or the wrong number of simulation modes was given
    #[display("Invalid input: {_0}")]
    InvalidInput(String),
    /// A project or tariff referenced by ID does not exist
    #[display("Missing reference data: {_0}")]
    MissingReferenceData(String),
}

impl std::error::Error for SimulationError {}

/// Return early with a [`SimulationError::InvalidInput`] unless the condition holds
macro_rules! ensure_valid {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            return Err($crate::simulation::SimulationError::InvalidInput(format!($($arg)+)).into());
        }
    };
}
pub(crate) use ensure_valid;

/// The kind of target a simulation was sized against
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SimulationType {
    /// A percentage of the monthly bill to offset
    Coverage,
    /// A fixed number of panels
    Panels,
    /// An amount of money to invest
    Investment,
}

/// The target of a simulation. Exactly one is chosen per request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimulationMode {
    /// Percentage of the monthly bill to cover (0-100)
    BillCoverage(Dimensionless),
    /// Number of panels to buy
    Panels(u32),
    /// Amount to invest
    Investment(Usd),
}

impl SimulationMode {
    /// Build a mode from the three optional input fields, checking that exactly one is provided
    pub fn from_fields(
        coverage_percentage: Option<Decimal>,
        number_of_panels: Option<u32>,
        investment_amount_usd: Option<Decimal>,
    ) -> Result<Self> {
        let mode = match (coverage_percentage, number_of_panels, investment_amount_usd) {
            (Some(pct), None, None) => Self::BillCoverage(Dimensionless(pct)),
            (None, Some(panels), None) => Self::Panels(panels),
            (None, None, Some(usd)) => Self::Investment(Usd(usd)),
            _ => {
                return Err(SimulationError::InvalidInput(
                    "exactly one of coverage_percentage, number_of_panels or \
                    investment_amount_usd must be provided"
                        .into(),
                )
                .into());
            }
        };
        mode.validate()?;

        Ok(mode)
    }

    /// Check the mode-specific parameter is within range
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::BillCoverage(pct) => ensure_valid!(
                pct >= Dimensionless::ZERO && pct <= Dimensionless(Decimal::ONE_HUNDRED),
                "coverage percentage must be between 0 and 100, got {pct}"
            ),
            Self::Panels(panels) => {
                ensure_valid!(panels >= 1, "number of panels must be at least 1");
            }
            Self::Investment(usd) => ensure_valid!(
                usd >= Usd::ZERO,
                "investment amount cannot be negative, got {usd}"
            ),
        }

        Ok(())
    }

    /// The type tag for this mode
    pub fn simulation_type(&self) -> SimulationType {
        match self {
            Self::BillCoverage(_) => SimulationType::Coverage,
            Self::Panels(_) => SimulationType::Panels,
            Self::Investment(_) => SimulationType::Investment,
        }
    }

    /// The mode's parameter as a plain number
    pub fn parameter(&self) -> Decimal {
        match *self {
            Self::BillCoverage(pct) => pct.value(),
            Self::Panels(panels) => Decimal::from(panels),
            Self::Investment(usd) => usd.value(),
        }
    }
}

/// The baseline a customer's coverage is measured against: what they pay, or what they use
#[derive(Debug, Clone, Copy, PartialEq, derive_more::Display)]
pub enum Demand {
    /// The monthly electricity bill
    #[display("a monthly bill of {_0} ARS")]
    Bill(Ars),
    /// Monthly electricity consumption
    #[display("a monthly consumption of {_0} kWh")]
    Consumption(Energy),
}

impl From<Ars> for Demand {
    fn from(bill: Ars) -> Self {
        Self::Bill(bill)
    }
}

impl From<Energy> for Demand {
    fn from(consumption: Energy) -> Self {
        Self::Consumption(consumption)
    }
}

impl Demand {
    /// Build a demand from the two optional input fields, checking that exactly one is provided
    pub fn from_fields(
        monthly_bill_ars: Option<Decimal>,
        monthly_consumption_kwh: Option<Decimal>,
    ) -> Result<Self> {
        let demand = match (monthly_bill_ars, monthly_consumption_kwh) {
            (Some(bill), None) => Self::Bill(Ars(bill)),
            (None, Some(kwh)) => Self::Consumption(Energy(kwh)),
            _ => {
                return Err(SimulationError::InvalidInput(
                    "exactly one of monthly_bill_ars or monthly_consumption_kwh must be provided"
                        .into(),
                )
                .into());
            }
        };
        demand.validate()?;

        Ok(demand)
    }

    /// Check the demand is not negative
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::Bill(bill) => ensure_valid!(
                bill >= Ars::ZERO,
                "monthly bill cannot be negative, got {bill}"
            ),
            Self::Consumption(kwh) => ensure_valid!(
                kwh >= Energy::ZERO,
                "monthly consumption cannot be negative, got {kwh}"
            ),
        }

        Ok(())
    }

    /// The monthly bill, if that is what coverage is measured against
    pub fn monthly_bill(&self) -> Option<Ars> {
        match *self {
            Self::Bill(bill) => Some(bill),
            Self::Consumption(_) => None,
        }
    }

    /// The monthly consumption, if that is what coverage is measured against
    pub fn monthly_consumption(&self) -> Option<Energy> {
        match *self {
            Self::Bill(_) => None,
            Self::Consumption(kwh) => Some(kwh),
        }
    }
}

/// A fully specified request to simulate one scenario
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationRequest {
    /// The project to invest in
    pub project_id: ProjectID,
    /// The customer's tariff category
    pub tariff_id: TariffID,
    /// The customer's monthly bill or consumption
    pub demand: Demand,
    /// What to size the installation against
    pub mode: SimulationMode,
    /// Optional contact address for the customer
    pub user_email: Option<String>,
}

/// The outcome of one simulation.
///
/// Created once by the calculator and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationResult {
    /// Which entry point produced this result
    pub simulation_type: SimulationType,
    /// The project invested in
    pub project_id: ProjectID,
    /// The customer's tariff category
    pub tariff_id: TariffID,
    /// Contact address carried over from the request
    pub user_email: Option<String>,
    /// The customer's monthly bill (bill-based simulations only)
    pub monthly_bill_ars: Option<Ars>,
    /// The customer's monthly consumption (consumption-based simulations only)
    pub monthly_consumption_kwh: Option<Energy>,
    /// Requested bill coverage (coverage simulations only)
    pub coverage_percentage: Option<Dimensionless>,
    /// Requested investment (investment simulations only)
    pub investment_amount_usd: Option<Usd>,
    /// Whole panels bought
    pub number_of_panels: u32,
    /// Price of the panels
    pub total_investment_usd: Usd,
    /// Price of the panels in pesos
    pub total_investment_ars: Ars,
    /// Nominal power of the installation
    pub installed_power_kw: Capacity,
    /// Expected generation after losses
    pub annual_generation_kwh: Energy,
    /// Annual generation spread evenly over twelve months
    pub monthly_generation_kwh: Energy,
    /// Value of the monthly generation under the savings model
    pub monthly_savings_ars: Ars,
    /// Twelve months of savings
    pub annual_savings_ars: Ars,
    /// Years of savings needed to repay the investment, or the sentinel if it never is
    pub payback_period_years: Years,
    /// Percentage of the bill actually offset, which can differ from the requested coverage
    /// because panel counts are whole numbers
    pub coverage_achieved: Dimensionless,
    /// Annual savings as a percentage of the investment
    pub roi_annual: Dimensionless,
    /// The rate snapshotted by the calculator
    pub exchange_rate_used: ArsPerUsd,
    /// How savings were valued
    pub savings_model: SavingsModel,
}

impl SimulationResult {
    /// Monthly savings converted to USD at the rate used for the simulation
    pub fn monthly_savings_usd(&self) -> Usd {
        to_usd(self.monthly_savings_ars, self.exchange_rate_used)
    }

    /// Annual savings converted to USD at the rate used for the simulation
    pub fn annual_savings_usd(&self) -> Usd {
        to_usd(self.annual_savings_ars, self.exchange_rate_used)
    }

    /// A copy of this result with every quantity rounded to `dp` decimal places, for display
    pub fn rounded(&self, dp: u32) -> Self {
        let round = |d: Dimensionless| {
            Dimensionless(
                d.value()
                    .round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero),
            )
        };
        Self {
            monthly_bill_ars: self.monthly_bill_ars.map(|bill| bill.round_dp(dp)),
            monthly_consumption_kwh: self.monthly_consumption_kwh.map(|kwh| kwh.round_dp(dp)),
            coverage_percentage: self.coverage_percentage.map(round),
            investment_amount_usd: self.investment_amount_usd.map(|u| u.round_dp(dp)),
            total_investment_usd: self.total_investment_usd.round_dp(dp),
            total_investment_ars: self.total_investment_ars.round_dp(dp),
            installed_power_kw: self.installed_power_kw.round_dp(dp.max(3)),
            annual_generation_kwh: self.annual_generation_kwh.round_dp(dp),
            monthly_generation_kwh: self.monthly_generation_kwh.round_dp(dp),
            monthly_savings_ars: self.monthly_savings_ars.round_dp(dp),
            annual_savings_ars: self.annual_savings_ars.round_dp(dp),
            payback_period_years: self.payback_period_years.round_dp(dp),
            coverage_achieved: round(self.coverage_achieved),
            roi_annual: round(self.roi_annual),
            exchange_rate_used: self.exchange_rate_used.round_dp(dp),
            ..self.clone()
        }
    }
}

fn to_usd(amount: Ars, rate: ArsPerUsd) -> Usd {
    if rate <= ArsPerUsd::ZERO {
        return Usd::ZERO;
    }

    amount / rate
}
