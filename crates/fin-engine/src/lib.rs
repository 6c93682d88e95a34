#![deny(warnings)]

//! Financial projection and context computation.
//!
//! Pure functions from `SimulationInputs` + `OrgProfile` to projection
//! results. The projection and the advisory context share one revenue and
//! expense computation so the two can never disagree; the organization
//! multiplier is applied exactly once, when deriving the assumed quantity.

use fin_core::{FinancialContext, FinancialData, OrgProfile, Runway, SimulationInputs, TimeSeriesPoint};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Assumed growth rate reported in the advisory context, in percent.
///
/// A placeholder signal, not derived from the chart history; kept constant
/// until product decides otherwise.
pub const GROWTH_RATE_PCT: u32 = 15;

/// Planning horizon reported in the advisory context, in months.
pub const TIME_HORIZON_MONTHS: u32 = 12;

/// Base transaction volume scaled by the organization multiplier.
const BASE_QUANTITY: Decimal = Decimal::ONE_HUNDRED;

/// Derive scaling constants from an organization-type tag.
///
/// Unknown or absent tags are valid and map to the default row; this
/// function never fails.
pub fn resolve_profile(tag: Option<&str>) -> OrgProfile {
    match tag {
        Some("startup") => OrgProfile {
            quantity_multiplier: Decimal::new(12, 1),
            base_salary: Decimal::new(70_000, 0),
            base_fixed_cost: Decimal::new(300_000, 0),
        },
        Some("event") => OrgProfile {
            quantity_multiplier: Decimal::new(8, 1),
            base_salary: Decimal::new(60_000, 0),
            base_fixed_cost: Decimal::new(200_000, 0),
        },
        _ => OrgProfile {
            quantity_multiplier: Decimal::ONE,
            base_salary: Decimal::new(60_000, 0),
            base_fixed_cost: Decimal::new(300_000, 0),
        },
    }
}

/// Notional units sold in the period: `floor(100 * quantity_multiplier)`.
///
/// The multiplier is consumed here and must not be applied again anywhere
/// downstream.
pub fn assumed_quantity(profile: &OrgProfile) -> u64 {
    (BASE_QUANTITY * profile.quantity_multiplier)
        .floor()
        .to_u64()
        .unwrap_or(0)
}

/// Revenue, expenses, net profit and margin for one period.
///
/// Single source of truth shared by [`project`] and [`build_context`].
struct PeriodFigures {
    revenue: Decimal,
    expenses: Decimal,
    net_profit: Decimal,
    profit_margin: Decimal,
}

fn period_figures(inputs: &SimulationInputs, profile: &OrgProfile) -> PeriodFigures {
    let quantity = Decimal::from(assumed_quantity(profile));
    let revenue = inputs.product_price * quantity;
    let expenses = profile.base_fixed_cost
        + profile.base_salary * Decimal::from(inputs.employees)
        + inputs.marketing_spend
        + inputs.misc_expenses;
    let net_profit = revenue - expenses;
    let profit_margin = if revenue > Decimal::ZERO {
        net_profit / revenue * Decimal::ONE_HUNDRED
    } else {
        Decimal::ZERO
    };
    PeriodFigures {
        revenue,
        expenses,
        net_profit,
        profit_margin,
    }
}

/// Compute one financial projection. Pure; the caller owns side effects
/// such as counters and persistence.
pub fn project(inputs: &SimulationInputs, profile: &OrgProfile) -> FinancialData {
    let fig = period_figures(inputs, profile);
    let runway = if fig.expenses > Decimal::ZERO {
        let months = (inputs.current_funds / fig.expenses)
            .floor()
            .to_u64()
            .unwrap_or(u64::MAX);
        Runway::Months(months)
    } else {
        Runway::Unbounded
    };
    FinancialData {
        revenue: fig.revenue,
        expenses: fig.expenses,
        net_profit: fig.net_profit,
        runway,
        profit_margin: fig.profit_margin,
    }
}

/// Build the advisory snapshot from the current inputs and the latest
/// chart point. Safe to call at any time; mutates nothing.
pub fn build_context(
    inputs: &SimulationInputs,
    profile: &OrgProfile,
    latest: &TimeSeriesPoint,
) -> FinancialContext {
    let fig = period_figures(inputs, profile);
    FinancialContext {
        current_revenue: latest.revenue,
        projected_revenue: fig.revenue,
        expenses: fig.expenses,
        growth_rate: Decimal::from(GROWTH_RATE_PCT),
        time_horizon_months: TIME_HORIZON_MONTHS,
        cash_flow: latest.revenue - latest.expenses,
        profit_margin: fig.profit_margin,
    }
}
