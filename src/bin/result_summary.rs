//! Result Summary Binary
//!
//! Prints one JSON line per event name with whole-run success/failure statistics.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --bin result_summary > summary.jsonl
//! ```
//!
//! ## Environment Variables
//!
//! - BENCHFLOW_DB_PATH - Result database (default: data/benchflow.db)
//! - CHART_ONLY - Only include chartable results (default: true)
//! - RUST_LOG - Logging level (optional, default: info)

use benchflow::config::ReportConfig;
use benchflow::results_core::{collate_summaries, SqliteResultStore};
use std::io::{self, Write};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    dotenv::dotenv().ok();

    let config = ReportConfig::from_env()?;
    let store = SqliteResultStore::open_read_only(&config.db_path)?;

    log::info!(
        "📊 {}: {} results ({} succeeded, {} failed)",
        store.data_location(),
        store.count_results()?,
        store.count_results_by_success()?,
        store.count_results_by_failure()?
    );

    let summaries = collate_summaries(&store, config.chart_only)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for summary in summaries.values() {
        writeln!(out, "{}", serde_json::to_string(&summary.to_row())?)?;
    }
    out.flush()?;

    log::info!("✅ Summarised {} event names", summaries.len());
    Ok(())
}
