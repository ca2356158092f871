//! The investment calculator, which sizes an installation and works out its financial returns.
//!
//! There are three entry points, one per [`SimulationMode`]. Each reduces its target to a whole
//! number of panels and then hands over to the same code to derive power, generation, savings,
//! payback and ROI, so equal panel counts always give equal outputs.
use crate::exchange_rate::RateProvider;
use crate::finance::{annual_roi, payback_period, percentage_of};
use crate::parameters::EngineParameters;
use crate::pricing::tiered_price;
use crate::project::Project;
use crate::savings::SavingsContext;
use crate::simulation::{
    Demand, SimulationError, SimulationMode, SimulationRequest, SimulationResult, ensure_valid,
};
use crate::tariff::TariffCategory;
use crate::units::{
    Ars, ArsPerKwh, ArsPerUsd, Capacity, CheckedDiv, CheckedMul, Dimensionless, Energy,
    EnergyPerCapacity, Usd,
};
use anyhow::Result;
use log::debug;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

const MONTHS_PER_YEAR: Decimal = dec!(12);
const ONE_HUNDRED: Dimensionless = Dimensionless(Decimal::ONE_HUNDRED);

/// The largest installation a single simulation can describe
pub const MAX_PANELS: u32 = 1_000_000;

/// The intermediate values used to size an installation for a bill coverage target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverageSizing {
    /// The monthly saving needed to cover the requested share of the bill
    pub target_monthly_savings: Ars,
    /// Generation needed each month to reach the target
    pub required_monthly_generation: Energy,
    /// Generation needed each year to reach the target
    pub required_annual_generation: Energy,
    /// Installed power needed to reach the target
    pub required_power_kw: Capacity,
    /// The required power rounded (half up) to whole panels
    pub number_of_panels: u32,
}

/// Whether a project has enough spare capacity for an installation.
///
/// This is advisory only: simulations are never blocked by it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CapacityReport {
    /// True if the required power fits within what the project has available
    pub has_capacity: bool,
    /// Power needed by the installation
    pub required_power_kw: Capacity,
    /// Power the project has available
    pub available_power_kw: Capacity,
    /// Required power as a percentage of available power (zero if none is available)
    pub utilization_pct: Dimensionless,
}

/// Calculates investment scenarios for one project and tariff.
///
/// The exchange rate is read once on construction, so every scenario calculated by the same
/// instance uses the same rate.
#[derive(Debug, Clone)]
pub struct InvestmentCalculator<'a> {
    project: &'a Project,
    tariff: &'a TariffCategory,
    parameters: &'a EngineParameters,
    exchange_rate: ArsPerUsd,
}

/// Unwrap the result of checked arithmetic, failing with [`SimulationError::InvalidInput`] if it
/// overflowed
fn representable<T>(value: Option<T>, quantity: &str) -> Result<T> {
    value.ok_or_else(|| {
        SimulationError::InvalidInput(format!("{quantity} is too large to represent")).into()
    })
}

/// Check a panel count is within range. `None` means it didn't fit in a `u32`.
fn checked_panel_count(number_of_panels: Option<u32>) -> Result<u32> {
    match number_of_panels {
        Some(n) if n <= MAX_PANELS => Ok(n),
        _ => Err(SimulationError::InvalidInput(format!(
            "number of panels cannot be more than {MAX_PANELS}"
        ))
        .into()),
    }
}

impl<'a> InvestmentCalculator<'a> {
    /// Create a new calculator, taking a snapshot of the latest exchange rate
    pub fn new<R: RateProvider + ?Sized>(
        project: &'a Project,
        tariff: &'a TariffCategory,
        parameters: &'a EngineParameters,
        rates: &R,
    ) -> Self {
        Self {
            project,
            tariff,
            parameters,
            exchange_rate: rates.latest_rate(),
        }
    }

    /// The exchange rate used for every calculation
    pub fn exchange_rate(&self) -> ArsPerUsd {
        self.exchange_rate
    }

    /// The project being invested in
    pub fn project(&self) -> &'a Project {
        self.project
    }

    /// The customer's tariff
    pub fn tariff(&self) -> &'a TariffCategory {
        self.tariff
    }

    fn savings_context(&self) -> SavingsContext<'a> {
        SavingsContext {
            parameters: self.parameters,
            tariff: self.tariff,
            exchange_rate: self.exchange_rate,
        }
    }

    /// The value of one self-generated kWh under the configured savings model
    fn energy_value(&self) -> Result<ArsPerKwh> {
        representable(
            self.parameters
                .savings_model
                .energy_value(&self.savings_context()),
            "energy value",
        )
    }

    /// Work out how many panels are needed to cover `coverage` percent of the customer's demand.
    ///
    /// For a bill, the target is a saving and the generation needed to reach it depends on the
    /// savings model. For a consumption, the target is the generation itself.
    ///
    /// Fails with [`SimulationError::InvalidInput`] if more than [`MAX_PANELS`] panels would be
    /// needed or an intermediate value is too large to represent.
    pub fn size_for_bill_coverage(
        &self,
        demand: impl Into<Demand>,
        coverage: Dimensionless,
    ) -> Result<CoverageSizing> {
        let demand = demand.into();
        demand.validate()?;
        SimulationMode::BillCoverage(coverage).validate()?;

        let share = coverage / ONE_HUNDRED;
        let energy_value = self.energy_value()?;
        let (target_monthly_savings, required_monthly_generation) = match demand {
            Demand::Bill(bill) => {
                let target = representable(bill.checked_mul(share), "target monthly saving")?;
                let generation = if energy_value > ArsPerKwh::ZERO {
                    representable(
                        target.checked_div(energy_value),
                        "required monthly generation",
                    )?
                } else {
                    Energy::ZERO
                };
                (target, generation)
            }
            Demand::Consumption(consumption) => {
                let generation = representable(
                    consumption.checked_mul(share),
                    "required monthly generation",
                )?;
                let target =
                    representable(generation.checked_mul(energy_value), "target monthly saving")?;
                (target, generation)
            }
        };
        let required_annual_generation = representable(
            required_monthly_generation.checked_mul(Dimensionless(MONTHS_PER_YEAR)),
            "required annual generation",
        )?;

        let effective_yield = self.parameters.effective_yield();
        let required_power_kw = if effective_yield > EnergyPerCapacity::ZERO {
            representable(
                required_annual_generation.checked_div(effective_yield),
                "required power",
            )?
        } else {
            Capacity::ZERO
        };

        let panel_power_kw = self.project.panel_power_kw();
        let panels = if panel_power_kw > Capacity::ZERO {
            representable(
                required_power_kw.checked_div(panel_power_kw),
                "number of panels",
            )?
        } else {
            Dimensionless::ZERO
        };
        let number_of_panels = checked_panel_count(panels.round_half_up_u32())?;

        Ok(CoverageSizing {
            target_monthly_savings,
            required_monthly_generation,
            required_annual_generation,
            required_power_kw,
            number_of_panels,
        })
    }

    /// Simulate an installation sized to cover `coverage` percent of the customer's bill or
    /// consumption.
    ///
    /// Because panels are whole, the coverage achieved will usually differ a little from what was
    /// requested. Fails with [`SimulationError::InvalidInput`] if more than [`MAX_PANELS`] panels
    /// would be needed.
    pub fn simulate_by_bill_coverage(
        &self,
        demand: impl Into<Demand>,
        coverage: Dimensionless,
    ) -> Result<SimulationResult> {
        let demand = demand.into();
        let sizing = self.size_for_bill_coverage(demand, coverage)?;
        let investment = representable(
            tiered_price(&self.parameters.price_tiers, sizing.number_of_panels),
            "total investment",
        )?;

        self.build_result(
            SimulationMode::BillCoverage(coverage),
            demand,
            sizing.number_of_panels,
            investment,
        )
    }

    /// Simulate an installation with a fixed number of panels.
    ///
    /// Zero panels is allowed and gives a degenerate result (no savings, sentinel payback). More
    /// than [`MAX_PANELS`] panels fails with [`SimulationError::InvalidInput`].
    pub fn simulate_by_panels(
        &self,
        demand: impl Into<Demand>,
        number_of_panels: u32,
    ) -> Result<SimulationResult> {
        let demand = demand.into();
        demand.validate()?;
        checked_panel_count(Some(number_of_panels))?;
        let investment = representable(
            tiered_price(&self.parameters.price_tiers, number_of_panels),
            "total investment",
        )?;

        self.build_result(
            SimulationMode::Panels(number_of_panels),
            demand,
            number_of_panels,
            investment,
        )
    }

    /// Simulate spending up to `amount` on as many whole panels as it will buy.
    ///
    /// Panels are priced on the project's own basis (per panel or per watt), not with the tiered
    /// schedule used by the other entry points, so the leftover part of `amount` is not spent.
    /// Fails with [`SimulationError::InvalidInput`] if `amount` would buy more than
    /// [`MAX_PANELS`] panels.
    pub fn simulate_by_investment(
        &self,
        demand: impl Into<Demand>,
        amount: Usd,
    ) -> Result<SimulationResult> {
        let demand = demand.into();
        demand.validate()?;
        SimulationMode::Investment(amount).validate()?;

        let unit_price = self.project.price_per_panel();
        ensure_valid!(
            unit_price > Usd::ZERO,
            "project {} has no positive price per panel",
            self.project.id
        );
        let panels = representable(amount.checked_div(unit_price), "number of panels")?;
        let number_of_panels = checked_panel_count(panels.floor_u32())?;
        debug!(
            "Pricing {number_of_panels} panels at {unit_price} USD each for project {} (price \
            tiers do not apply to investment simulations)",
            self.project.id
        );
        let investment = representable(
            unit_price.checked_mul(Dimensionless::from(number_of_panels)),
            "total investment",
        )?;

        self.build_result(
            SimulationMode::Investment(amount),
            demand,
            number_of_panels,
            investment,
        )
    }

    /// Run whichever entry point matches `mode`
    pub fn simulate(
        &self,
        demand: impl Into<Demand>,
        mode: SimulationMode,
    ) -> Result<SimulationResult> {
        match mode {
            SimulationMode::BillCoverage(coverage) => {
                self.simulate_by_bill_coverage(demand, coverage)
            }
            SimulationMode::Panels(panels) => self.simulate_by_panels(demand, panels),
            SimulationMode::Investment(amount) => self.simulate_by_investment(demand, amount),
        }
    }

    /// Run a stored request against this calculator's project and tariff
    pub fn simulate_request(&self, request: &SimulationRequest) -> Result<SimulationResult> {
        ensure_valid!(
            request.project_id == self.project.id && request.tariff_id == self.tariff.id,
            "request for project {} and tariff {} given to a calculator for project {} and \
            tariff {}",
            request.project_id,
            request.tariff_id,
            self.project.id,
            self.tariff.id
        );

        let result = self.simulate(request.demand, request.mode)?;
        Ok(SimulationResult {
            user_email: request.user_email.clone(),
            ..result
        })
    }

    /// Check whether the project can supply `required_power_kw`
    pub fn capacity_check(&self, required_power_kw: Capacity) -> CapacityReport {
        let available_power_kw = self.project.available_power_kw;
        let utilization_pct = percentage_of(required_power_kw, available_power_kw)
            .unwrap_or(Dimensionless(Decimal::MAX));

        CapacityReport {
            has_capacity: required_power_kw <= available_power_kw,
            required_power_kw,
            available_power_kw,
            utilization_pct,
        }
    }

    /// Derive the outputs shared by all entry points from a whole number of panels
    fn build_result(
        &self,
        mode: SimulationMode,
        demand: Demand,
        number_of_panels: u32,
        total_investment_usd: Usd,
    ) -> Result<SimulationResult> {
        let installed_power_kw = representable(
            self.project
                .panel_power_kw()
                .checked_mul(Dimensionless::from(number_of_panels)),
            "installed power",
        )?;
        let annual_generation_kwh = representable(
            installed_power_kw.checked_mul(self.parameters.effective_yield()),
            "annual generation",
        )?;
        let monthly_generation_kwh = annual_generation_kwh / Dimensionless(MONTHS_PER_YEAR);

        let total_investment_ars = representable(
            total_investment_usd.checked_mul(self.exchange_rate),
            "total investment",
        )?;

        let savings_model = self.parameters.savings_model;
        let monthly_savings_ars = representable(
            savings_model.monthly_savings(
                &self.savings_context(),
                number_of_panels,
                monthly_generation_kwh,
            ),
            "monthly saving",
        )?;
        let annual_savings_ars = representable(
            monthly_savings_ars.checked_mul(Dimensionless(MONTHS_PER_YEAR)),
            "annual saving",
        )?;

        let payback_period_years = representable(
            payback_period(
                total_investment_ars,
                annual_savings_ars,
                self.parameters.payback_sentinel_years,
            ),
            "payback period",
        )?;
        let roi_annual = representable(
            annual_roi(annual_savings_ars, total_investment_ars),
            "annual return on investment",
        )?;
        let coverage_achieved = representable(
            match demand {
                Demand::Bill(bill) => percentage_of(monthly_savings_ars, bill),
                Demand::Consumption(consumption) => {
                    percentage_of(monthly_generation_kwh, consumption)
                }
            },
            "coverage achieved",
        )?;

        debug!(
            "Simulated {} {} for project {}: {number_of_panels} panels, {total_investment_usd} \
            USD, payback {payback_period_years} years",
            mode.simulation_type(),
            mode.parameter(),
            self.project.id
        );

        Ok(SimulationResult {
            simulation_type: mode.simulation_type(),
            project_id: self.project.id.clone(),
            tariff_id: self.tariff.id.clone(),
            user_email: None,
            monthly_bill_ars: demand.monthly_bill(),
            monthly_consumption_kwh: demand.monthly_consumption(),
            coverage_percentage: match mode {
                SimulationMode::BillCoverage(coverage) => Some(coverage),
                _ => None,
            },
            investment_amount_usd: match mode {
                SimulationMode::Investment(amount) => Some(amount),
                _ => None,
            },
            number_of_panels,
            total_investment_usd,
            total_investment_ars,
            installed_power_kw,
            annual_generation_kwh,
            monthly_generation_kwh,
            monthly_savings_ars,
            annual_savings_ars,
            payback_period_years,
            coverage_achieved,
            roi_annual,
            exchange_rate_used: self.exchange_rate,
            savings_model,
        })
    }
}
