//! SQLite writer for closed windows
//!
//! Each window becomes one row per event name in `result_windows`.

use super::writer_backend::{ReportWriterError, WindowRecord};
use crate::results_core::{HandlerError, HandlerFlow, ResultHandler, WindowReport};
use crate::sqlite_pragma::apply_optimized_pragmas;
use rusqlite::{params, Connection};
use std::path::Path;

pub struct SqliteWindowWriter {
    conn: Connection,
    rows_written: u64,
}

impl SqliteWindowWriter {
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self, ReportWriterError> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path)?;
        apply_optimized_pragmas(&conn)?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS result_windows (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                window_start INTEGER NOT NULL,
                window_end INTEGER NOT NULL,
                event_name TEXT NOT NULL,
                count INTEGER NOT NULL,
                min_ms REAL,
                max_ms REAL,
                mean_ms REAL,
                stddev_ms REAL NOT NULL,
                failures INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_windows_event_start ON result_windows(event_name, window_start);",
        )?;

        log::info!("✅ SQLite window writer initialized: {}", db_path.display());

        Ok(Self {
            conn,
            rows_written: 0,
        })
    }

    pub fn write_window(&mut self, report: &WindowReport) -> Result<(), ReportWriterError> {
        let record = WindowRecord::from(report);
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO result_windows
                    (window_start, window_end, event_name, count,
                     min_ms, max_ms, mean_ms, stddev_ms, failures)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            for event in &record.events {
                stmt.execute(params![
                    record.window_start,
                    record.window_end,
                    event.event_name,
                    event.count as i64,
                    event.min_ms,
                    event.max_ms,
                    event.mean_ms,
                    event.stddev_ms,
                    event.failures as i64,
                ])?;
            }
        }
        tx.commit()?;

        self.rows_written += record.events.len() as u64;
        log::debug!(
            "✅ Window [{}, {}) written ({} events)",
            record.window_start,
            record.window_end,
            record.events.len()
        );
        Ok(())
    }

    /// Writes are committed per window, so there is nothing buffered
    pub fn flush(&mut self) -> Result<(), ReportWriterError> {
        Ok(())
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }
}

impl ResultHandler for SqliteWindowWriter {
    fn process_result(&mut self, report: &WindowReport) -> Result<HandlerFlow, HandlerError> {
        self.write_window(report)?;
        Ok(HandlerFlow::Continue)
    }
}
