#![deny(warnings)]

//! Session runtime: owns the simulation inputs, the usage counters and the
//! synthetic chart series.
//!
//! The series generator is the only component with a scheduling concern: one
//! periodic tick task per session, spawned on demand and aborted exactly once
//! on teardown. Everything else here is synchronous glue over `fin-engine`.

use fin_core::{FinancialContext, FinancialData, SimulationInputs, TimeSeriesPoint, UsageStats};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use sqlx::SqlitePool;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Points on the chart; labels and length are fixed for the session.
pub const SERIES_LEN: usize = 8;

/// Per-tick revenue perturbation is uniform in `[-62_500, +62_500)` USD.
const REVENUE_JITTER_USD: f64 = 62_500.0;

/// Per-tick expense perturbation is uniform in `[-37_500, +37_500)` USD.
const EXPENSE_JITTER_USD: f64 = 37_500.0;

/// Chart generator configuration.
#[derive(Clone, Copy, Debug)]
pub struct SeriesConfig {
    /// How often the periodic task perturbs the series.
    pub cadence: Duration,
    /// Seed for the deterministic perturbation stream.
    pub rng_seed: u64,
}

impl Default for SeriesConfig {
    fn default() -> Self {
        Self {
            cadence: Duration::from_secs(45),
            rng_seed: 42,
        }
    }
}

fn point(month: &str, revenue: i64, expenses: i64) -> TimeSeriesPoint {
    TimeSeriesPoint {
        month: month.to_string(),
        revenue: Decimal::new(revenue, 0),
        expenses: Decimal::new(expenses, 0),
    }
}

/// Fixed baseline the chart starts from: eight consecutive months with a
/// gentle revenue ramp, sized so the per-tick jitter reads as live data.
pub fn baseline_series() -> [TimeSeriesPoint; SERIES_LEN] {
    [
        point("Jan", 420_000, 400_000),
        point("Feb", 445_000, 402_000),
        point("Mar", 470_000, 405_000),
        point("Apr", 505_000, 418_000),
        point("May", 540_000, 430_000),
        point("Jun", 580_000, 445_000),
        point("Jul", 615_000, 460_000),
        point("Aug", 650_000, 475_000),
    ]
}

/// Bounded random walk over the chart points.
///
/// Single writer; readers only ever see cloned snapshots. Knows nothing
/// about `SimulationInputs`; it exists purely to make the chart look live.
pub struct SeriesGenerator {
    points: [TimeSeriesPoint; SERIES_LEN],
    rng: ChaCha8Rng,
}

impl SeriesGenerator {
    /// Seeded generator over the fixed baseline.
    pub fn new(seed: u64) -> Self {
        Self {
            points: baseline_series(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Perturb every point independently, clamping each field at zero.
    /// Labels never change.
    pub fn tick(&mut self) {
        for p in &mut self.points {
            let d_rev = self.rng.gen_range(-REVENUE_JITTER_USD..REVENUE_JITTER_USD);
            let d_exp = self.rng.gen_range(-EXPENSE_JITTER_USD..EXPENSE_JITTER_USD);
            let d_rev = Decimal::from_f64(d_rev).unwrap_or(Decimal::ZERO);
            let d_exp = Decimal::from_f64(d_exp).unwrap_or(Decimal::ZERO);
            p.revenue = (p.revenue + d_rev).max(Decimal::ZERO);
            p.expenses = (p.expenses + d_exp).max(Decimal::ZERO);
        }
    }

    /// Consistent copy of the whole series for chart consumers.
    pub fn snapshot(&self) -> Vec<TimeSeriesPoint> {
        self.points.to_vec()
    }

    /// The most recent month on the chart.
    pub fn latest(&self) -> TimeSeriesPoint {
        self.points[SERIES_LEN - 1].clone()
    }
}

fn lock_series(series: &Mutex<SeriesGenerator>) -> MutexGuard<'_, SeriesGenerator> {
    series.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// One user session: inputs, counters, chart and its tick task.
///
/// The caller mutates inputs wholesale via [`Session::set_inputs`]; the
/// engine never rewrites them, and `custom_parameters` pass through opaque.
pub struct Session {
    org_tag: Option<String>,
    inputs: SimulationInputs,
    stats: UsageStats,
    series: Arc<Mutex<SeriesGenerator>>,
    cadence: Duration,
    ticker: Option<JoinHandle<()>>,
    last_run: Option<FinancialData>,
}

impl Session {
    pub fn new(org_tag: Option<String>, inputs: SimulationInputs, cfg: SeriesConfig) -> Self {
        Self {
            org_tag,
            inputs,
            stats: UsageStats::default(),
            series: Arc::new(Mutex::new(SeriesGenerator::new(cfg.rng_seed))),
            cadence: cfg.cadence,
            ticker: None,
            last_run: None,
        }
    }

    pub fn inputs(&self) -> &SimulationInputs {
        &self.inputs
    }

    /// Replace the inputs wholesale (form submit semantics).
    pub fn set_inputs(&mut self, inputs: SimulationInputs) {
        self.inputs = inputs;
    }

    /// Spawn the periodic chart task. Restarting never leaves two timers:
    /// any previous task is aborted first. Must run inside a tokio runtime.
    pub fn start_chart(&mut self) {
        self.stop_chart();
        let series = Arc::clone(&self.series);
        let cadence = self.cadence;
        self.ticker = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(cadence);
            // An interval yields immediately on its first tick; the chart
            // should only move after a full cadence has elapsed.
            interval.tick().await;
            loop {
                interval.tick().await;
                lock_series(&series).tick();
            }
        }));
    }

    /// Cancel the periodic chart task. Idempotent; the task never fires
    /// after this returns.
    pub fn stop_chart(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
            debug!("chart tick task cancelled");
        }
    }

    /// True while the periodic task is registered.
    pub fn chart_running(&self) -> bool {
        self.ticker.is_some()
    }

    /// Advance the chart by one tick synchronously (headless consumers).
    pub fn advance_chart(&self) {
        lock_series(&self.series).tick();
    }

    /// Consistent copy of the chart series.
    pub fn chart_snapshot(&self) -> Vec<TimeSeriesPoint> {
        lock_series(&self.series).snapshot()
    }

    /// Run one projection: resolve the profile from the session's
    /// organization tag, compute, and count the run.
    pub fn run_simulation(&mut self) -> FinancialData {
        let profile = fin_engine::resolve_profile(self.org_tag.as_deref());
        let data = fin_engine::project(&self.inputs, &profile);
        self.stats.record_simulation();
        debug!(
            revenue = %data.revenue,
            expenses = %data.expenses,
            runway = %data.runway,
            "simulation run complete"
        );
        self.last_run = Some(data.clone());
        data
    }

    /// Count one export trigger.
    pub fn record_export(&mut self) {
        self.stats.record_export();
    }

    pub fn usage(&self) -> UsageStats {
        self.stats
    }

    pub fn last_run(&self) -> Option<&FinancialData> {
        self.last_run.as_ref()
    }

    /// Fresh advisory snapshot; callable at any time, also between runs.
    pub fn financial_context(&self) -> FinancialContext {
        let profile = fin_engine::resolve_profile(self.org_tag.as_deref());
        let latest = lock_series(&self.series).latest();
        fin_engine::build_context(&self.inputs, &profile, &latest)
    }

    /// Hand the last run to the store on a detached task.
    ///
    /// Fire-and-forget: a failed write is logged and swallowed, never
    /// affecting the already-returned projection. Returns the task handle
    /// so callers that want to wait (tests, CLI before exit) can.
    pub fn save_last(&self, pool: &SqlitePool, user_id: &str) -> Option<JoinHandle<()>> {
        let data = self.last_run.clone()?;
        let payload = persistence::payload_from(&self.inputs, &data);
        let name = persistence::simulation_name(chrono::Utc::now());
        let pool = pool.clone();
        let user = user_id.to_string();
        Some(tokio::spawn(async move {
            match persistence::save_simulation(&pool, &user, &name, &payload).await {
                Ok(id) => debug!(id, name = %name, "simulation saved"),
                Err(e) => warn!(error = %e, "simulation save failed; result already delivered"),
            }
        }))
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.stop_chart();
    }
}
