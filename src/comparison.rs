//! Run a batch of scenarios for one customer so they can be compared side by side.
use crate::calculator::InvestmentCalculator;
use crate::simulation::{Demand, SimulationMode, SimulationResult, SimulationType, ensure_valid};
use crate::units::{Dimensionless, Usd, Years};
use anyhow::Result;
use itertools::chain;
use log::info;
use rust_decimal::Decimal;
use serde::Serialize;

/// The scenarios to compare. Each list may be empty, but not all of them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComparisonRequest {
    /// Percentages of the bill (or consumption) to cover
    pub coverage_percentages: Vec<Dimensionless>,
    /// Numbers of panels to buy
    pub panel_quantities: Vec<u32>,
    /// Amounts to invest
    pub investment_amounts: Vec<Usd>,
}

impl ComparisonRequest {
    /// Check that at least one scenario was requested
    pub fn validate(&self) -> Result<()> {
        ensure_valid!(
            !(self.coverage_percentages.is_empty()
                && self.panel_quantities.is_empty()
                && self.investment_amounts.is_empty()),
            "at least one coverage percentage, panel quantity or investment amount must be given"
        );

        Ok(())
    }

    /// Total number of scenarios requested
    pub fn len(&self) -> usize {
        self.coverage_percentages.len() + self.panel_quantities.len() + self.investment_amounts.len()
    }

    /// Whether no scenarios were requested
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The scenarios as modes: coverage first, then panels, then investments
    pub fn modes(&self) -> impl Iterator<Item = SimulationMode> + '_ {
        chain!(
            self.coverage_percentages
                .iter()
                .copied()
                .map(SimulationMode::BillCoverage),
            self.panel_quantities
                .iter()
                .copied()
                .map(SimulationMode::Panels),
            self.investment_amounts
                .iter()
                .copied()
                .map(SimulationMode::Investment)
        )
    }
}

/// One scenario in a comparison, tagged with what it was sized against
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonEntry {
    /// The kind of scenario
    pub kind: SimulationType,
    /// The scenario's parameter (percentage, panel count or USD amount)
    pub parameter: Decimal,
    /// The outcome
    pub simulation: SimulationResult,
}

/// Averages over a set of comparison entries
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComparisonSummary {
    /// Number of entries
    pub count: usize,
    /// Mean total investment
    pub average_investment_usd: Usd,
    /// Mean payback period, including any sentinel values
    pub average_payback_years: Years,
    /// Mean annual ROI
    pub average_roi_annual: Dimensionless,
}

/// Run every scenario in `request` with the same calculator (and hence the same exchange rate).
///
/// Fails on the first invalid scenario, so either all entries are returned or none are.
pub fn compare(
    calculator: &InvestmentCalculator,
    demand: impl Into<Demand>,
    request: &ComparisonRequest,
) -> Result<Vec<ComparisonEntry>> {
    request.validate()?;
    let demand = demand.into();

    info!(
        "Comparing {} scenarios for project {}",
        request.len(),
        calculator.project().id
    );
    request
        .modes()
        .map(|mode| {
            Ok(ComparisonEntry {
                kind: mode.simulation_type(),
                parameter: mode.parameter(),
                simulation: calculator.simulate(demand, mode)?,
            })
        })
        .collect()
}

/// Summarise a set of entries. All averages are zero if there are no entries.
pub fn summarise(entries: &[ComparisonEntry]) -> ComparisonSummary {
    let count = entries.len();
    if count == 0 {
        return ComparisonSummary {
            count,
            average_investment_usd: Usd::ZERO,
            average_payback_years: Years::ZERO,
            average_roi_annual: Dimensionless::ZERO,
        };
    }

    let (investment, payback, roi) = entries.iter().map(|entry| &entry.simulation).fold(
        (Usd::ZERO, Years::ZERO, Dimensionless::ZERO),
        |(investment, payback, roi), result| {
            (
                investment + result.total_investment_usd,
                payback + result.payback_period_years,
                roi + result.roi_annual,
            )
        },
    );
    let n = Dimensionless(Decimal::from(count));

    ComparisonSummary {
        count,
        average_investment_usd: investment / n,
        average_payback_years: payback / n,
        average_roi_annual: roi / n,
    }
}
