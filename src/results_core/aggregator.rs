//! Windowed aggregation of event results
//!
//! Scans the result store in coarse query ranges and keeps, per event name, a
//! ring of sub-window statistics one report period wide. Each time the scan
//! crosses a report period boundary, the oldest sub-window (which has seen every
//! result of the whole reporting window) is handed to the [`ResultHandler`].

use super::handler::{HandlerFlow, ResultHandler, WindowReport};
use super::record::EventRecord;
use super::ring::WindowRing;
use super::store::{ResultStore, StoreError};
use std::collections::{BTreeMap, HashMap};

/// Results fetched per store query
pub const QUERY_PAGE_SIZE: usize = 10_000;
/// Smallest span of a single query range (one minute)
pub const MIN_QUERY_WINDOW_MS: i64 = 60_000;
/// Largest span of a single query range (one hour)
pub const MAX_QUERY_WINDOW_MS: i64 = 60 * 60_000;

#[derive(Debug)]
pub enum AggregationError {
    InvalidArgument(String),
    Store(StoreError),
    /// A known event name had no open sub-window to report; a bookkeeping bug
    RingUnderflow(String),
}

impl From<StoreError> for AggregationError {
    fn from(err: StoreError) -> Self {
        AggregationError::Store(err)
    }
}

impl std::fmt::Display for AggregationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AggregationError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            AggregationError::Store(e) => write!(f, "Result store error: {}", e),
            AggregationError::RingUnderflow(name) => write!(
                f,
                "Event '{}' did not have statistics for the reporting period",
                name
            ),
        }
    }
}

impl std::error::Error for AggregationError {}

/// Parameters of one aggregation run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregationParams {
    /// Results before this time (epoch ms) are not queried
    pub start_time: i64,
    /// Width of the sliding reporting window (ms)
    pub window_size: i64,
    /// Step of the reporting window and width of one sub-window (ms)
    pub report_period: i64,
    /// Only aggregate chartable results
    pub chart_only: bool,
}

impl AggregationParams {
    pub fn new(start_time: i64, window_size: i64, report_period: i64, chart_only: bool) -> Self {
        Self {
            start_time,
            window_size,
            report_period,
            chart_only,
        }
    }

    pub fn validate(&self) -> Result<(), AggregationError> {
        if self.window_size <= 0 {
            return Err(AggregationError::InvalidArgument(
                "'window_size' must be a non-zero, positive number".to_string(),
            ));
        }
        if self.report_period <= 0 {
            return Err(AggregationError::InvalidArgument(
                "'report_period' must be a non-zero, positive number".to_string(),
            ));
        }
        if self.report_period > self.window_size {
            return Err(AggregationError::InvalidArgument(
                "'report_period' cannot be more than the 'window_size'".to_string(),
            ));
        }
        if self.window_size % self.report_period != 0 {
            return Err(AggregationError::InvalidArgument(
                "'window_size' must be a multiple of 'report_period'".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of sub-windows per reporting window
    pub fn window_multiple(&self) -> usize {
        (self.window_size / self.report_period) as usize
    }
}

/// Counters describing a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub windows_reported: u64,
    pub records_scanned: u64,
    pub records_aggregated: u64,
    pub handler_errors: u64,
    pub stopped_by_handler: bool,
}

/// Per-run window state: one ring per event name
#[derive(Debug)]
pub(crate) struct WindowState {
    window_multiple: usize,
    rings: HashMap<String, WindowRing>,
}

impl WindowState {
    pub(crate) fn new(window_multiple: usize) -> Self {
        Self {
            window_multiple,
            rings: HashMap::with_capacity(13),
        }
    }

    pub(crate) fn record(&mut self, record: &EventRecord) {
        let window_multiple = self.window_multiple;
        self.rings
            .entry(record.event_name.clone())
            .or_insert_with(|| WindowRing::seeded(window_multiple))
            .record(record.duration, record.success);
    }

    /// Report the oldest sub-window of every event and open a fresh one
    pub(crate) fn cycle(
        &mut self,
        window_start: i64,
        window_end: i64,
    ) -> Result<WindowReport, AggregationError> {
        let mut stats_by_event_name = BTreeMap::new();
        let mut failures_by_event_name = BTreeMap::new();

        for (event_name, ring) in self.rings.iter_mut() {
            let oldest = ring
                .cycle()
                .ok_or_else(|| AggregationError::RingUnderflow(event_name.clone()))?;
            stats_by_event_name.insert(event_name.clone(), oldest.stats);
            failures_by_event_name.insert(event_name.clone(), oldest.failures.get());
        }

        Ok(WindowReport {
            window_start,
            window_end,
            stats_by_event_name,
            failures_by_event_name,
        })
    }

    #[cfg(test)]
    pub(crate) fn max_depth(&self) -> usize {
        self.rings.values().map(WindowRing::len).max().unwrap_or(0)
    }
}

/// Drives a windowed scan over a [`ResultStore`]
pub struct WindowedAggregator<S> {
    store: S,
    page_size: usize,
}

impl<S: ResultStore> WindowedAggregator<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            page_size: QUERY_PAGE_SIZE,
        }
    }

    /// Use a different query page size (mainly to exercise paging in tests)
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Scan all results and call `handler` for each closed reporting window
    ///
    /// Windows are aligned to multiples of `report_period` and always span
    /// `window_size`. Handler errors are logged and ignored; returning
    /// [`HandlerFlow::Stop`] ends the scan. Store errors are returned as-is.
    pub fn run<H>(&self, handler: &mut H, params: &AggregationParams) -> Result<RunSummary, AggregationError>
    where
        H: ResultHandler + ?Sized,
    {
        params.validate()?;

        let mut summary = RunSummary::default();

        let first_record = match self.store.first_record()? {
            Some(record) => record,
            None => {
                log::debug!("No results recorded, nothing to aggregate");
                return Ok(summary);
            }
        };
        // Snapshot of the last result; results appended later may be missed
        let last_start_time = match self.store.last_record()? {
            Some(record) => record.start_time,
            None => first_record.start_time,
        };
        let first_start_time = first_record.start_time;

        let query_window_size = (last_start_time - first_start_time)
            .clamp(MIN_QUERY_WINDOW_MS, MAX_QUERY_WINDOW_MS);
        let mut query_start = first_start_time.max(params.start_time);
        let mut query_end = query_start + query_window_size;

        // Rebase the reporting window onto a report period boundary past the first result
        let mut window_end = (first_start_time + params.report_period)
            .div_euclid(params.report_period)
            * params.report_period;
        let mut window_start = window_end - params.window_size;

        log::info!(
            "📊 Aggregating results: window={}ms period={}ms chart_only={} first={} last={} query_window={}ms",
            params.window_size,
            params.report_period,
            params.chart_only,
            first_start_time,
            last_start_time,
            query_window_size
        );

        let mut state = WindowState::new(params.window_multiple());
        let mut skip = 0usize;
        let mut unreported_results = false;

        'scan: loop {
            let page = self.store.query_range(
                query_start,
                query_end,
                params.chart_only,
                skip,
                self.page_size,
            )?;

            if page.is_empty() {
                if query_end > last_start_time {
                    // The query range has passed the last known result
                    if unreported_results {
                        let flow = self.report_and_cycle(
                            &mut state,
                            window_start,
                            window_end,
                            handler,
                            &mut summary,
                        )?;
                        summary.stopped_by_handler = flow.is_stop();
                    }
                    break 'scan;
                }
                query_start = query_end;
                query_end += query_window_size;
                skip = 0;
                continue;
            }

            log::debug!(
                "Fetched {} results in [{}, {}) at skip={}",
                page.len(),
                query_start,
                query_end,
                skip
            );

            for record in &page {
                while record.start_time >= window_end {
                    let flow = self.report_and_cycle(
                        &mut state,
                        window_start,
                        window_end,
                        handler,
                        &mut summary,
                    )?;
                    unreported_results = false;
                    window_start += params.report_period;
                    window_end += params.report_period;
                    if flow.is_stop() {
                        summary.stopped_by_handler = true;
                        break 'scan;
                    }
                }

                skip += 1;
                summary.records_scanned += 1;

                if params.chart_only && !record.chart {
                    continue;
                }

                unreported_results = true;
                state.record(record);
                summary.records_aggregated += 1;
            }
        }

        log::info!(
            "✅ Aggregation finished: {} windows, {} results aggregated ({} scanned){}",
            summary.windows_reported,
            summary.records_aggregated,
            summary.records_scanned,
            if summary.stopped_by_handler { ", stopped by handler" } else { "" }
        );

        Ok(summary)
    }

    fn report_and_cycle<H>(
        &self,
        state: &mut WindowState,
        window_start: i64,
        window_end: i64,
        handler: &mut H,
        summary: &mut RunSummary,
    ) -> Result<HandlerFlow, AggregationError>
    where
        H: ResultHandler + ?Sized,
    {
        let report = state.cycle(window_start, window_end)?;
        summary.windows_reported += 1;

        match handler.process_result(&report) {
            Ok(flow) => Ok(flow),
            Err(e) => {
                // Handler failures never abort the scan
                summary.handler_errors += 1;
                log::error!(
                    "Exception while making callback for window [{}, {}): {}",
                    window_start,
                    window_end,
                    e
                );
                Ok(HandlerFlow::Continue)
            }
        }
    }
}
