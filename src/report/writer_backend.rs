//! Shared types for window report writers

use crate::results_core::WindowReport;
use serde::Serialize;

#[derive(Debug)]
pub enum ReportWriterError {
    Io(std::io::Error),
    Serialization(serde_json::Error),
    Database(rusqlite::Error),
}

impl From<std::io::Error> for ReportWriterError {
    fn from(err: std::io::Error) -> Self {
        ReportWriterError::Io(err)
    }
}

impl From<serde_json::Error> for ReportWriterError {
    fn from(err: serde_json::Error) -> Self {
        ReportWriterError::Serialization(err)
    }
}

impl From<rusqlite::Error> for ReportWriterError {
    fn from(err: rusqlite::Error) -> Self {
        ReportWriterError::Database(err)
    }
}

impl std::fmt::Display for ReportWriterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportWriterError::Io(e) => write!(f, "IO error: {}", e),
            ReportWriterError::Serialization(e) => write!(f, "Serialization error: {}", e),
            ReportWriterError::Database(e) => write!(f, "Database error: {}", e),
        }
    }
}

impl std::error::Error for ReportWriterError {}

/// Statistics of one event within a window, as persisted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventWindowStats {
    pub event_name: String,
    pub count: u64,
    pub min_ms: Option<f64>,
    pub max_ms: Option<f64>,
    pub mean_ms: Option<f64>,
    pub stddev_ms: f64,
    pub failures: u64,
}

/// One closed window, as persisted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowRecord {
    pub window_start: i64,
    pub window_end: i64,
    pub events: Vec<EventWindowStats>,
}

impl From<&WindowReport> for WindowRecord {
    fn from(report: &WindowReport) -> Self {
        let events = report
            .stats_by_event_name
            .iter()
            .map(|(event_name, stats)| EventWindowStats {
                event_name: event_name.clone(),
                count: stats.count(),
                min_ms: stats.min(),
                max_ms: stats.max(),
                mean_ms: stats.mean(),
                stddev_ms: stats.stddev(),
                failures: report.failures(event_name).unwrap_or(0),
            })
            .collect();

        Self {
            window_start: report.window_start,
            window_end: report.window_end,
            events,
        }
    }
}
