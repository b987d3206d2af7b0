//! Cooperative cancellation for long report runs
//!
//! The aggregator can only be stopped by its handler, so external signals
//! (Ctrl-C, a deadline) are turned into [`HandlerFlow::Stop`] here.

use crate::results_core::{HandlerError, HandlerFlow, ResultHandler, WindowReport};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

pub struct StoppableHandler<H> {
    inner: H,
    stop: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl<H: ResultHandler> StoppableHandler<H> {
    pub fn new(inner: H, stop: Arc<AtomicBool>) -> Self {
        Self {
            inner,
            stop,
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn into_inner(self) -> H {
        self.inner
    }

    fn should_stop(&self) -> bool {
        if self.stop.load(Ordering::Relaxed) {
            return true;
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                self.stop.store(true, Ordering::Relaxed);
                true
            }
            _ => false,
        }
    }
}

impl<H: ResultHandler> ResultHandler for StoppableHandler<H> {
    fn process_result(&mut self, report: &WindowReport) -> Result<HandlerFlow, HandlerError> {
        if self.should_stop() {
            log::warn!(
                "⚠️  Stop requested, window [{}, {}) not written",
                report.window_start,
                report.window_end
            );
            return Ok(HandlerFlow::Stop);
        }
        self.inner.process_result(report)
    }
}
