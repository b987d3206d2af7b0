//! Window Report Binary - Sliding-Window Result Statistics
//!
//! Scans the event results in the SQLite result store and writes one report per
//! closed reporting window.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --bin window_report -- --backend jsonl
//! cargo run --release --bin window_report -- --backend sqlite
//! ```
//!
//! ## Environment Variables
//!
//! - BENCHFLOW_DB_PATH - Result database (default: data/benchflow.db)
//! - WINDOW_SIZE_MS - Width of each reported window (default: 60000)
//! - REPORT_PERIOD_MS - Step between consecutive reports (default: 10000)
//! - REPORT_START_TIME_MS - Ignore results before this time (default: 0)
//! - CHART_ONLY - Only aggregate chartable results (default: true)
//! - REPORT_OUTPUT_PATH - JSONL file, or SQLite database with --backend sqlite
//!   (default: reports/windows.jsonl, or BENCHFLOW_DB_PATH for sqlite)
//! - REPORT_TIMEOUT_SECS - Stop reporting after this many seconds (optional)
//! - RUST_LOG - Logging level (optional, default: info)

use benchflow::config::ReportConfig;
use benchflow::report::{StoppableHandler, WindowWriter};
use benchflow::results_core::{AggregationError, AggregationParams, RunSummary, SqliteResultStore, WindowedAggregator};
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    dotenv::dotenv().ok();

    let config = ReportConfig::from_env()?;

    log::info!("🚀 Starting Window Report");
    log::info!("   Result store: {}", config.db_path.display());
    log::info!("   Window size: {}ms", config.window_size_ms);
    log::info!("   Report period: {}ms", config.report_period_ms);
    log::info!("   Start time: {}", config.start_time_ms);
    log::info!("   Chart only: {}", config.chart_only);
    log::info!("   Output: {}", config.output_path.display());

    let params = AggregationParams::new(
        config.start_time_ms,
        config.window_size_ms,
        config.report_period_ms,
        config.chart_only,
    );
    params.validate()?;

    let store = SqliteResultStore::open_read_only(&config.db_path)?;
    let writer = WindowWriter::new(config.backend, config.output_path.clone())?;

    log::info!("📊 Backend: {}", writer.backend_type());

    let stop = Arc::new(AtomicBool::new(false));
    let mut handler = StoppableHandler::new(writer, stop.clone());
    if let Some(timeout) = config.timeout {
        log::info!("   Timeout: {}s", timeout.as_secs());
        handler = handler.with_deadline(Instant::now() + timeout);
    }

    let started_at = Utc::now();

    // The scan is synchronous; keep it off the runtime so Ctrl-C stays responsive
    let mut scan = tokio::task::spawn_blocking(
        move || -> Result<(RunSummary, WindowWriter), AggregationError> {
            let aggregator = WindowedAggregator::new(store);
            let summary = aggregator.run(&mut handler, &params)?;
            Ok((summary, handler.into_inner()))
        },
    );

    let joined = tokio::select! {
        result = &mut scan => result,
        _ = tokio::signal::ctrl_c() => {
            log::warn!("🛑 Ctrl-C received, stopping at the next window");
            stop.store(true, Ordering::Relaxed);
            scan.await
        }
    };

    let (summary, mut writer) = joined??;
    writer.flush()?;

    let elapsed = Utc::now().signed_duration_since(started_at);
    log::info!(
        "✅ Report complete: {} windows, {} results aggregated ({} scanned) in {}ms",
        summary.windows_reported,
        summary.records_aggregated,
        summary.records_scanned,
        elapsed.num_milliseconds()
    );
    if summary.handler_errors > 0 {
        log::warn!("⚠️  {} windows failed to write", summary.handler_errors);
    }
    if summary.stopped_by_handler {
        log::warn!("⚠️  Report stopped before reaching the last result");
    }

    Ok(())
}
