//! JSONL writer for closed windows - one line per window

use super::writer_backend::{ReportWriterError, WindowRecord};
use crate::results_core::{HandlerError, HandlerFlow, ResultHandler, WindowReport};
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::{Duration, Instant};

pub struct JsonlWindowWriter {
    writer: BufWriter<std::fs::File>,
    last_flush: Instant,
    windows_written: u64,
}

impl JsonlWindowWriter {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, ReportWriterError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        log::info!("📝 Writing window reports to: {}", path.display());

        Ok(Self {
            writer: BufWriter::new(file),
            last_flush: Instant::now(),
            windows_written: 0,
        })
    }

    pub fn write_window(&mut self, report: &WindowReport) -> Result<(), ReportWriterError> {
        let record = WindowRecord::from(report);
        let json = serde_json::to_string(&record)?;
        writeln!(self.writer, "{}", json)?;
        self.windows_written += 1;

        // Flush every 5 seconds
        if self.last_flush.elapsed() > Duration::from_secs(5) {
            self.flush()?;
        }

        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), ReportWriterError> {
        self.writer.flush()?;
        self.last_flush = Instant::now();
        Ok(())
    }

    pub fn windows_written(&self) -> u64 {
        self.windows_written
    }
}

impl Drop for JsonlWindowWriter {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}

impl ResultHandler for JsonlWindowWriter {
    fn process_result(&mut self, report: &WindowReport) -> Result<HandlerFlow, HandlerError> {
        self.write_window(report)?;
        Ok(HandlerFlow::Continue)
    }
}
