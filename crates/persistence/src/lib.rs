#![deny(warnings)]

//! SQLite-backed store for simulation runs.
//!
//! The stored record uses the snake_case shape the storage collaborator
//! expects: funds and per-month revenue/expense figures next to the raw
//! inputs, keyed by an opaque user id and a timestamp-derived name.
//! Monetary values are persisted as TEXT to keep decimal exactness.

use chrono::{DateTime, Utc};
use fin_core::{FinancialData, SimulationInputs};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use thiserror::Error;
use tracing::info;

/// Returns the default SQLite URL used for local saves.
pub fn default_sqlite_url() -> &'static str {
    "sqlite://./saves/simulations.db"
}

/// Errors from the store.
#[derive(Debug, Error)]
pub enum PersistError {
    /// Underlying database failure.
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
    /// A stored monetary value failed to parse back into a decimal.
    #[error("corrupt stored value: {0}")]
    Corrupt(#[from] rust_decimal::Error),
}

/// Record shape expected by the storage collaborator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SavedSimulation {
    pub current_funds: Decimal,
    pub monthly_revenue: Decimal,
    pub monthly_expenses: Decimal,
    pub employees: u32,
    pub marketing_spend: Decimal,
    pub product_price: Decimal,
    pub misc_expenses: Decimal,
}

/// Build the persistence payload from inputs and a finished projection.
/// The projection figures are per period; the store wants monthly.
pub fn payload_from(inputs: &SimulationInputs, data: &FinancialData) -> SavedSimulation {
    let months = Decimal::from(12);
    SavedSimulation {
        current_funds: inputs.current_funds,
        monthly_revenue: data.revenue / months,
        monthly_expenses: data.expenses / months,
        employees: inputs.employees,
        marketing_spend: inputs.marketing_spend,
        product_price: inputs.product_price,
        misc_expenses: inputs.misc_expenses,
    }
}

/// Human-readable simulation name derived from the trigger timestamp.
pub fn simulation_name(at: DateTime<Utc>) -> String {
    format!("Simulation {}", at.format("%Y-%m-%d %H:%M"))
}

const CREATE_TABLE_SQL: &str = "\
CREATE TABLE IF NOT EXISTS simulations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    name TEXT NOT NULL,
    created_at TEXT NOT NULL,
    current_funds TEXT NOT NULL,
    monthly_revenue TEXT NOT NULL,
    monthly_expenses TEXT NOT NULL,
    employees INTEGER NOT NULL,
    marketing_spend TEXT NOT NULL,
    product_price TEXT NOT NULL,
    misc_expenses TEXT NOT NULL
)";

/// Connect and ensure the schema exists.
pub async fn init_db(url: &str) -> Result<SqlitePool, PersistError> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(url)
        .await?;
    sqlx::query(CREATE_TABLE_SQL).execute(&pool).await?;
    info!(url, "simulation store ready");
    Ok(pool)
}

/// Insert one saved simulation for a user; returns the new row id.
pub async fn save_simulation(
    pool: &SqlitePool,
    user_id: &str,
    name: &str,
    payload: &SavedSimulation,
) -> Result<i64, PersistError> {
    let res = sqlx::query(
        "INSERT INTO simulations (
            user_id, name, created_at,
            current_funds, monthly_revenue, monthly_expenses,
            employees, marketing_spend, product_price, misc_expenses
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(user_id)
    .bind(name)
    .bind(Utc::now().to_rfc3339())
    .bind(payload.current_funds.to_string())
    .bind(payload.monthly_revenue.to_string())
    .bind(payload.monthly_expenses.to_string())
    .bind(payload.employees as i64)
    .bind(payload.marketing_spend.to_string())
    .bind(payload.product_price.to_string())
    .bind(payload.misc_expenses.to_string())
    .execute(pool)
    .await?;
    Ok(res.last_insert_rowid())
}

/// Load a user's saved simulations, newest first.
pub async fn load_simulations(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Vec<(String, SavedSimulation)>, PersistError> {
    let rows = sqlx::query(
        "SELECT name, current_funds, monthly_revenue, monthly_expenses,
                employees, marketing_spend, product_price, misc_expenses
         FROM simulations WHERE user_id = ? ORDER BY id DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let name: String = row.try_get("name")?;
        let payload = SavedSimulation {
            current_funds: decimal_col(&row, "current_funds")?,
            monthly_revenue: decimal_col(&row, "monthly_revenue")?,
            monthly_expenses: decimal_col(&row, "monthly_expenses")?,
            employees: row.try_get::<i64, _>("employees")? as u32,
            marketing_spend: decimal_col(&row, "marketing_spend")?,
            product_price: decimal_col(&row, "product_price")?,
            misc_expenses: decimal_col(&row, "misc_expenses")?,
        };
        out.push((name, payload));
    }
    Ok(out)
}

fn decimal_col(row: &sqlx::sqlite::SqliteRow, col: &str) -> Result<Decimal, PersistError> {
    let text: String = row.try_get(col)?;
    Ok(text.parse::<Decimal>()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use fin_core::Runway;

    fn sample() -> (SimulationInputs, FinancialData) {
        let inputs = SimulationInputs {
            employees: 5,
            marketing_spend: Decimal::new(200_000, 0),
            product_price: Decimal::new(2999, 0),
            misc_expenses: Decimal::new(150_000, 0),
            current_funds: Decimal::new(5_000_000, 0),
            custom_parameters: vec![],
        };
        let data = FinancialData {
            revenue: Decimal::new(359_880, 0),
            expenses: Decimal::new(1_000_000, 0),
            net_profit: Decimal::new(-640_120, 0),
            runway: Runway::Months(5),
            profit_margin: Decimal::new(-1779, 1),
        };
        (inputs, data)
    }

    #[test]
    fn payload_divides_period_figures_by_twelve() {
        let (inputs, data) = sample();
        let p = payload_from(&inputs, &data);
        assert_eq!(p.monthly_revenue, Decimal::new(29_990, 0));
        assert_eq!(p.monthly_expenses.round_dp(2), Decimal::new(8_333_333, 2));
        assert_eq!(p.current_funds, inputs.current_funds);
        assert_eq!(p.employees, 5);
    }

    #[test]
    fn payload_serializes_snake_case() {
        let (inputs, data) = sample();
        let v = serde_json::to_value(payload_from(&inputs, &data)).unwrap();
        for key in [
            "current_funds",
            "monthly_revenue",
            "monthly_expenses",
            "employees",
            "marketing_spend",
            "product_price",
            "misc_expenses",
        ] {
            assert!(v.get(key).is_some(), "missing field {key}");
        }
    }

    #[test]
    fn name_derives_from_timestamp() {
        let at = Utc.with_ymd_and_hms(2026, 8, 29, 14, 5, 0).unwrap();
        assert_eq!(simulation_name(at), "Simulation 2026-08-29 14:05");
    }

    #[tokio::test]
    async fn save_and_load_roundtrip() {
        let pool = init_db("sqlite::memory:").await.unwrap();
        let (inputs, data) = sample();
        let payload = payload_from(&inputs, &data);

        let id = save_simulation(&pool, "user-1", "Simulation A", &payload)
            .await
            .unwrap();
        assert!(id > 0);
        save_simulation(&pool, "user-1", "Simulation B", &payload)
            .await
            .unwrap();
        save_simulation(&pool, "user-2", "Simulation C", &payload)
            .await
            .unwrap();

        let mine = load_simulations(&pool, "user-1").await.unwrap();
        assert_eq!(mine.len(), 2);
        // Newest first.
        assert_eq!(mine[0].0, "Simulation B");
        assert_eq!(mine[0].1, payload);

        let theirs = load_simulations(&pool, "user-2").await.unwrap();
        assert_eq!(theirs.len(), 1);
        assert!(load_simulations(&pool, "nobody").await.unwrap().is_empty());
    }
}
