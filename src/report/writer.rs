//! Unified writer interface for window reports
//!
//! Routes writes to either JSONL or SQLite backend based on configuration.

use super::jsonl_writer::JsonlWindowWriter;
use super::sqlite_writer::SqliteWindowWriter;
use super::writer_backend::ReportWriterError;
use crate::config::BackendType;
use crate::results_core::{HandlerError, HandlerFlow, ResultHandler, WindowReport};
use std::path::PathBuf;

/// Unified writer that routes to either JSONL or SQLite backend
pub enum WindowWriter {
    Jsonl(JsonlWindowWriter),
    Sqlite(SqliteWindowWriter),
}

impl WindowWriter {
    /// Create a new window writer based on backend type
    pub fn new(backend: BackendType, output_path: PathBuf) -> Result<Self, ReportWriterError> {
        match backend {
            BackendType::Jsonl => Ok(WindowWriter::Jsonl(JsonlWindowWriter::new(output_path)?)),
            BackendType::Sqlite => Ok(WindowWriter::Sqlite(SqliteWindowWriter::new(output_path)?)),
        }
    }

    pub fn write_window(&mut self, report: &WindowReport) -> Result<(), ReportWriterError> {
        match self {
            WindowWriter::Jsonl(w) => w.write_window(report),
            WindowWriter::Sqlite(w) => w.write_window(report),
        }
    }

    /// Flush pending writes to storage
    pub fn flush(&mut self) -> Result<(), ReportWriterError> {
        match self {
            WindowWriter::Jsonl(w) => w.flush(),
            WindowWriter::Sqlite(w) => w.flush(),
        }
    }

    /// Get backend type for logging
    pub fn backend_type(&self) -> &'static str {
        match self {
            WindowWriter::Jsonl(_) => "JSONL",
            WindowWriter::Sqlite(_) => "SQLite",
        }
    }
}

impl ResultHandler for WindowWriter {
    fn process_result(&mut self, report: &WindowReport) -> Result<HandlerFlow, HandlerError> {
        self.write_window(report)?;
        Ok(HandlerFlow::Continue)
    }
}
