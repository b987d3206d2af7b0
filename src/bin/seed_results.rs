//! Seed Results Binary
//!
//! Fills the result store with synthetic event results, or imports them from a
//! JSONL file (one `EventRecord` per line).
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --bin seed_results
//! cargo run --release --bin seed_results -- --import results.jsonl
//! ```
//!
//! ## Environment Variables
//!
//! - BENCHFLOW_DB_PATH - Result database (default: data/benchflow.db)
//! - SEED_EVENT_COUNT - Number of synthetic results (default: 1000)
//! - SEED_INTERVAL_MS - Start-time step between results (default: 10)
//! - SEED_EVENT_NAMES - Comma-separated event names (default: login,search,logout)

use benchflow::config::{arg_value, SeedConfig};
use benchflow::results_core::{EventRecord, SqliteResultStore};
use chrono::Utc;
use rand::Rng;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    dotenv::dotenv().ok();

    let config = SeedConfig::from_env()?;
    let mut store = SqliteResultStore::open(&config.db_path)?;

    let records = match arg_value("--import") {
        Some(path) => {
            log::info!("📖 Importing results from {}", path);
            read_jsonl(Path::new(&path))?
        }
        None => {
            log::info!(
                "🎲 Generating {} results every {}ms for {:?}",
                config.event_count,
                config.interval_ms,
                config.event_names
            );
            generate(&config)
        }
    };

    let written = store.record_results(&records)?;
    log::info!(
        "✅ Wrote {} results to {} ({} total)",
        written,
        store.data_location(),
        store.count_results()?
    );

    Ok(())
}

fn read_jsonl(path: &Path) -> Result<Vec<EventRecord>, Box<dyn std::error::Error>> {
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = EventRecord::from_jsonl(&line)
            .map_err(|e| format!("{}:{}: {}", path.display(), idx + 1, e))?;
        records.push(record);
    }

    Ok(records)
}

fn generate(config: &SeedConfig) -> Vec<EventRecord> {
    let mut rng = rand::thread_rng();
    let base_time = Utc::now().timestamp_millis();

    (0..config.event_count)
        .map(|i| {
            let event_name = &config.event_names[rng.gen_range(0..config.event_names.len())];
            let start_time = base_time + i as i64 * config.interval_ms;
            let success = rng.gen_bool(0.95);
            let duration = if success {
                rng.gen_range(5..1_500)
            } else {
                rng.gen_range(1_000..30_000)
            };

            let record = EventRecord::new(event_name.clone(), start_time, duration, success)
                .with_chart(rng.gen_bool(0.9))
                .with_driver(format!("driver-{}", rng.gen_range(1..=4)));
            if success {
                record
            } else {
                record.with_warning("Simulated failure")
            }
        })
        .collect()
}
