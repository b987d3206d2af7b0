//! Callback contract for closed reporting windows

use super::statistics::Statistics;
use std::collections::BTreeMap;

/// Error type handlers may return; the aggregator logs it and carries on
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Whether the scan should continue after a window has been handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerFlow {
    Continue,
    Stop,
}

impl HandlerFlow {
    pub fn is_stop(&self) -> bool {
        matches!(self, HandlerFlow::Stop)
    }
}

/// Statistics for one closed reporting window
///
/// `window_start` is inclusive and `window_end` exclusive. Every event name seen
/// so far in the run has an entry in both maps, even if the window saw no results
/// for it (count of zero).
#[derive(Debug, Clone, PartialEq)]
pub struct WindowReport {
    pub window_start: i64,
    pub window_end: i64,
    pub stats_by_event_name: BTreeMap<String, Statistics>,
    pub failures_by_event_name: BTreeMap<String, u64>,
}

impl WindowReport {
    pub fn stats(&self, event_name: &str) -> Option<&Statistics> {
        self.stats_by_event_name.get(event_name)
    }

    pub fn failures(&self, event_name: &str) -> Option<u64> {
        self.failures_by_event_name.get(event_name).copied()
    }

    /// Total number of results across all events in the window
    pub fn total_count(&self) -> u64 {
        self.stats_by_event_name.values().map(Statistics::count).sum()
    }
}

/// Receives each closed window in order
///
/// Errors returned here never abort the scan: they are logged and treated as
/// [`HandlerFlow::Continue`]. Return [`HandlerFlow::Stop`] to end the scan.
pub trait ResultHandler {
    fn process_result(&mut self, report: &WindowReport) -> Result<HandlerFlow, HandlerError>;
}

impl<H: ResultHandler + ?Sized> ResultHandler for &mut H {
    fn process_result(&mut self, report: &WindowReport) -> Result<HandlerFlow, HandlerError> {
        (**self).process_result(report)
    }
}

/// Handler backed by a closure, see [`from_fn`]
pub struct FnHandler<F>(F);

impl<F> ResultHandler for FnHandler<F>
where
    F: FnMut(&WindowReport) -> Result<HandlerFlow, HandlerError>,
{
    fn process_result(&mut self, report: &WindowReport) -> Result<HandlerFlow, HandlerError> {
        (self.0)(report)
    }
}

/// Wrap a closure as a [`ResultHandler`]
pub fn from_fn<F>(f: F) -> FnHandler<F>
where
    F: FnMut(&WindowReport) -> Result<HandlerFlow, HandlerError>,
{
    FnHandler(f)
}
