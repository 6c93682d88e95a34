#![deny(warnings)]

//! Core domain models and invariants for the financial projection engine.
//!
//! This crate defines the serializable types exchanged between the engine
//! and its collaborators (input editor, chart, advisory consumer, storage)
//! together with validation helpers for the basic non-negativity invariants.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A user-defined key/value pair carried on [`SimulationInputs`].
///
/// The engine never inspects these; they are threaded through unchanged so
/// that an input editor can round-trip its own extensions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomParameter {
    /// Parameter name as entered by the user.
    pub key: String,
    /// Opaque value; the engine assigns it no meaning.
    pub value: String,
}

/// Organization parameters driving a projection.
///
/// Owned and mutated wholesale by the caller; the engine only reads it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationInputs {
    /// Headcount (>= 0 by type).
    pub employees: u32,
    /// Marketing spend per period in USD (>= 0).
    pub marketing_spend: Decimal,
    /// Unit price of the product in USD (>= 0).
    pub product_price: Decimal,
    /// Miscellaneous expenses per period in USD (>= 0).
    pub misc_expenses: Decimal,
    /// Cash on hand in USD (>= 0).
    pub current_funds: Decimal,
    /// Order-preserving opaque passthrough, unused by the engine.
    pub custom_parameters: Vec<CustomParameter>,
}

/// Scaling constants derived from an organization's declared type.
///
/// Derived, never persisted: recomputed from the type tag on every
/// projection or context request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrgProfile {
    /// Scales the assumed transaction volume for the period.
    pub quantity_multiplier: Decimal,
    /// Average annual salary per employee in USD.
    pub base_salary: Decimal,
    /// Fixed cost floor per period in USD.
    pub base_fixed_cost: Decimal,
}

/// Number of periods current funds cover expenses at the current burn rate.
///
/// `Unbounded` is the sentinel for zero expenses; callers displaying or
/// serializing a runway must special-case it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Runway {
    /// Whole months of runway remaining.
    Months(u64),
    /// Expenses are zero; funds last indefinitely.
    Unbounded,
}

impl Runway {
    /// True for the zero-expense sentinel.
    pub fn is_unbounded(&self) -> bool {
        matches!(self, Runway::Unbounded)
    }
}

impl fmt::Display for Runway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Runway::Months(n) => write!(f, "{n} months"),
            Runway::Unbounded => write!(f, "unbounded"),
        }
    }
}

/// Result of one projection run. Immutable once produced.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FinancialData {
    /// Projected revenue for the period in USD.
    pub revenue: Decimal,
    /// Projected expenses for the period in USD.
    pub expenses: Decimal,
    /// Revenue minus expenses; may be negative.
    pub net_profit: Decimal,
    /// Months of funds remaining at this burn rate.
    pub runway: Runway,
    /// Net profit as a percentage of revenue; zero when revenue is zero.
    pub profit_margin: Decimal,
}

/// One month on the illustrative chart series.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    /// Month label; never changes after seeding.
    pub month: String,
    /// Illustrative revenue in USD (>= 0).
    pub revenue: Decimal,
    /// Illustrative expenses in USD (>= 0).
    pub expenses: Decimal,
}

/// Read-only snapshot briefing an advisory consumer.
///
/// Revenue, expenses and margin come from the same computation as
/// [`FinancialData`]; `current_revenue` and `cash_flow` come from the
/// latest chart point instead of the projection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FinancialContext {
    /// Latest chart-point revenue in USD.
    pub current_revenue: Decimal,
    /// Projected revenue for the period in USD.
    pub projected_revenue: Decimal,
    /// Projected expenses for the period in USD.
    pub expenses: Decimal,
    /// Assumed growth rate in percent (placeholder constant).
    pub growth_rate: Decimal,
    /// Planning horizon in months (constant).
    pub time_horizon_months: u32,
    /// Latest chart-point revenue minus expenses in USD.
    pub cash_flow: Decimal,
    /// Net profit as a percentage of revenue; zero when revenue is zero.
    pub profit_margin: Decimal,
}

/// Monotonic usage counters, bumped by the session on external triggers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageStats {
    /// Completed simulation runs.
    pub simulations: u64,
    /// Completed exports.
    pub exports: u64,
}

impl UsageStats {
    /// Count one simulation run.
    pub fn record_simulation(&mut self) {
        self.simulations += 1;
    }

    /// Count one export.
    pub fn record_export(&mut self) {
        self.exports += 1;
    }
}

/// Validation errors for domain invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Monetary inputs must be non-negative.
    #[error("negative monetary value in field `{0}`")]
    NegativeMoney(&'static str),
    /// Series points must keep non-negative values.
    #[error("negative value in time series at position {0}")]
    NegativeSeriesValue(usize),
    /// Series labels must be non-empty.
    #[error("empty month label in time series at position {0}")]
    EmptyMonthLabel(usize),
}

/// Validate the non-negativity invariants on simulation inputs.
///
/// Zero values are valid everywhere; only negative money is rejected.
pub fn validate_inputs(inputs: &SimulationInputs) -> Result<(), ValidationError> {
    for (name, value) in [
        ("marketing_spend", inputs.marketing_spend),
        ("product_price", inputs.product_price),
        ("misc_expenses", inputs.misc_expenses),
        ("current_funds", inputs.current_funds),
    ] {
        if value < Decimal::ZERO {
            return Err(ValidationError::NegativeMoney(name));
        }
    }
    Ok(())
}

/// Validate a chart series: non-negative values, non-empty labels.
pub fn validate_series(points: &[TimeSeriesPoint]) -> Result<(), ValidationError> {
    for (i, p) in points.iter().enumerate() {
        if p.month.trim().is_empty() {
            return Err(ValidationError::EmptyMonthLabel(i));
        }
        if p.revenue < Decimal::ZERO || p.expenses < Decimal::ZERO {
            return Err(ValidationError::NegativeSeriesValue(i));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn inputs() -> SimulationInputs {
        SimulationInputs {
            employees: 5,
            marketing_spend: Decimal::new(200_000, 0),
            product_price: Decimal::new(2999, 0),
            misc_expenses: Decimal::new(150_000, 0),
            current_funds: Decimal::new(5_000_000, 0),
            custom_parameters: vec![CustomParameter {
                key: "region".to_string(),
                value: "emea".to_string(),
            }],
        }
    }

    #[test]
    fn serde_roundtrip_inputs() {
        let i = inputs();
        let s = serde_json::to_string(&i).unwrap();
        let back: SimulationInputs = serde_json::from_str(&s).unwrap();
        assert_eq!(back, i);
        // Opaque parameters survive with order intact.
        assert_eq!(back.custom_parameters[0].key, "region");
    }

    #[test]
    fn runway_serde_shapes() {
        let m = serde_json::to_string(&Runway::Months(5)).unwrap();
        assert!(m.contains("months"));
        let u = serde_json::to_string(&Runway::Unbounded).unwrap();
        let back: Runway = serde_json::from_str(&u).unwrap();
        assert!(back.is_unbounded());
    }

    #[test]
    fn runway_display() {
        assert_eq!(Runway::Months(5).to_string(), "5 months");
        assert_eq!(Runway::Unbounded.to_string(), "unbounded");
    }

    #[test]
    fn negative_money_is_rejected() {
        let mut i = inputs();
        i.marketing_spend = Decimal::new(-1, 0);
        assert_eq!(
            validate_inputs(&i),
            Err(ValidationError::NegativeMoney("marketing_spend"))
        );
    }

    #[test]
    fn zero_inputs_are_valid() {
        let mut i = inputs();
        i.marketing_spend = Decimal::ZERO;
        i.product_price = Decimal::ZERO;
        i.misc_expenses = Decimal::ZERO;
        i.current_funds = Decimal::ZERO;
        assert!(validate_inputs(&i).is_ok());
    }

    #[test]
    fn series_validation_flags_bad_points() {
        let good = TimeSeriesPoint {
            month: "Jan".to_string(),
            revenue: Decimal::new(450_000, 0),
            expenses: Decimal::new(380_000, 0),
        };
        assert!(validate_series(&[good.clone()]).is_ok());

        let mut blank = good.clone();
        blank.month = "  ".to_string();
        assert_eq!(
            validate_series(&[good.clone(), blank]),
            Err(ValidationError::EmptyMonthLabel(1))
        );

        let mut neg = good.clone();
        neg.expenses = Decimal::new(-1, 0);
        assert_eq!(
            validate_series(&[neg]),
            Err(ValidationError::NegativeSeriesValue(0))
        );
    }

    #[test]
    fn usage_stats_are_monotonic() {
        let mut s = UsageStats::default();
        s.record_simulation();
        s.record_simulation();
        s.record_export();
        assert_eq!(s.simulations, 2);
        assert_eq!(s.exports, 1);
    }

    proptest! {
        #[test]
        fn non_negative_inputs_always_validate(
            employees in 0u32..10_000,
            marketing in 0i64..100_000_000,
            price in 0i64..10_000_000,
            misc in 0i64..100_000_000,
            funds in 0i64..1_000_000_000,
        ) {
            let i = SimulationInputs {
                employees,
                marketing_spend: Decimal::new(marketing, 0),
                product_price: Decimal::new(price, 0),
                misc_expenses: Decimal::new(misc, 0),
                current_funds: Decimal::new(funds, 0),
                custom_parameters: vec![],
            };
            prop_assert!(validate_inputs(&i).is_ok());
        }
    }
}
