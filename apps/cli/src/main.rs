#![deny(warnings)]

//! Headless CLI: run one projection, advance the illustrative chart, and
//! print the advisory context for inspection.

use anyhow::Result;
use fin_core::{validate_inputs, SimulationInputs};
use fin_runtime::{SeriesConfig, Session};
use rust_decimal::Decimal;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

struct Args {
    org_type: Option<String>,
    employees: u32,
    marketing_spend: Decimal,
    product_price: Decimal,
    misc_expenses: Decimal,
    current_funds: Decimal,
    ticks: u32,
    export: bool,
    save: bool,
    user: String,
    db_url: Option<String>,
    version: bool,
}

fn parse_args() -> Args {
    let mut args = Args {
        org_type: None,
        employees: 5,
        marketing_spend: Decimal::new(200_000, 0),
        product_price: Decimal::new(2999, 0),
        misc_expenses: Decimal::new(150_000, 0),
        current_funds: Decimal::new(5_000_000, 0),
        ticks: 0,
        export: false,
        save: false,
        user: "local".to_string(),
        db_url: None,
        version: false,
    };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--org-type" => args.org_type = it.next(),
            "--employees" => {
                if let Some(v) = it.next().and_then(|s| s.parse().ok()) {
                    args.employees = v;
                }
            }
            "--marketing" => {
                if let Some(v) = it.next().and_then(|s| s.parse().ok()) {
                    args.marketing_spend = v;
                }
            }
            "--price" => {
                if let Some(v) = it.next().and_then(|s| s.parse().ok()) {
                    args.product_price = v;
                }
            }
            "--misc" => {
                if let Some(v) = it.next().and_then(|s| s.parse().ok()) {
                    args.misc_expenses = v;
                }
            }
            "--funds" => {
                if let Some(v) = it.next().and_then(|s| s.parse().ok()) {
                    args.current_funds = v;
                }
            }
            "--ticks" => {
                if let Some(v) = it.next().and_then(|s| s.parse().ok()) {
                    args.ticks = v;
                }
            }
            "--export" => args.export = true,
            "--save" => args.save = true,
            "--user" => {
                if let Some(v) = it.next() {
                    args.user = v;
                }
            }
            "--db" => args.db_url = it.next(),
            "--version" => args.version = true,
            _ => {}
        }
    }
    args
}

fn ensure_sqlite_file(url: &str) {
    let path = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"));
    if let Some(path) = path {
        if let Some(parent) = std::path::Path::new(path).parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let _ = std::fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .append(true)
            .open(path);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .init();

    let args = parse_args();
    if args.version {
        println!("venturesim {} ({})", env!("CARGO_PKG_VERSION"), env!("GIT_SHA"));
        return Ok(());
    }
    info!(org_type = ?args.org_type, ticks = args.ticks, "starting CLI");

    let inputs = SimulationInputs {
        employees: args.employees,
        marketing_spend: args.marketing_spend,
        product_price: args.product_price,
        misc_expenses: args.misc_expenses,
        current_funds: args.current_funds,
        custom_parameters: vec![],
    };
    validate_inputs(&inputs)?;

    let mut session = Session::new(args.org_type.clone(), inputs, SeriesConfig::default());
    let data = session.run_simulation();
    println!(
        "Projection | revenue: ${} | expenses: ${} | net: ${} | runway: {} | margin: {}%",
        data.revenue,
        data.expenses,
        data.net_profit,
        data.runway,
        data.profit_margin.round_dp(1)
    );

    for _ in 0..args.ticks {
        session.advance_chart();
    }
    let ctx = session.financial_context();
    println!("Context | {}", serde_json::to_string_pretty(&ctx)?);

    if args.export {
        session.record_export();
    }

    if args.save {
        let url = args
            .db_url
            .clone()
            .unwrap_or_else(|| persistence::default_sqlite_url().to_string());
        ensure_sqlite_file(&url);
        let pool = persistence::init_db(&url).await?;
        // Fire-and-forget in the app; awaited here so the process does not
        // exit before the write lands.
        if let Some(handle) = session.save_last(&pool, &args.user) {
            let _ = handle.await;
        }
    }

    let usage = session.usage();
    println!(
        "Usage | simulations: {} | exports: {}",
        usage.simulations, usage.exports
    );

    Ok(())
}
