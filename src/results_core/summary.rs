//! Whole-run summary per event name

use super::aggregator::QUERY_PAGE_SIZE;
use super::statistics::Statistics;
use super::store::{ResultStore, StoreError};
use serde::Serialize;
use std::collections::BTreeMap;

const SUMMARY_QUERY_WINDOW_MS: i64 = 60 * 60_000;

/// Success and failure statistics for one event name
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSummary {
    pub event_name: String,
    success: Statistics,
    failure: Statistics,
}

impl ResultSummary {
    pub fn new(event_name: impl Into<String>) -> Self {
        Self {
            event_name: event_name.into(),
            success: Statistics::new(),
            failure: Statistics::new(),
        }
    }

    pub fn add_sample(&mut self, success: bool, duration: i64) {
        if success {
            self.success.add(duration as f64);
        } else {
            self.failure.add(duration as f64);
        }
    }

    pub fn stats(&self, success: bool) -> &Statistics {
        if success {
            &self.success
        } else {
            &self.failure
        }
    }

    pub fn total_results(&self) -> u64 {
        self.success.count() + self.failure.count()
    }

    /// Percentage of successful results, zero when there are none
    pub fn success_percentage(&self) -> f64 {
        let total = self.total_results();
        if total == 0 {
            return 0.0;
        }
        self.success.count() as f64 * 100.0 / total as f64
    }

    /// Flattened view for JSON output; timings cover successful results only
    pub fn to_row(&self) -> SummaryRow {
        SummaryRow {
            event_name: self.event_name.clone(),
            total_count: self.total_results(),
            success_count: self.success.count(),
            failure_count: self.failure.count(),
            success_rate_pct: self.success_percentage(),
            min_ms: self.success.min(),
            max_ms: self.success.max(),
            mean_ms: self.success.mean(),
            stddev_ms: self.success.stddev(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub event_name: String,
    pub total_count: u64,
    pub success_count: u64,
    pub failure_count: u64,
    pub success_rate_pct: f64,
    pub min_ms: Option<f64>,
    pub max_ms: Option<f64>,
    pub mean_ms: Option<f64>,
    pub stddev_ms: f64,
}

/// Scan every result in the store and summarise it per event name
pub fn collate_summaries<S>(
    store: &S,
    chart_only: bool,
) -> Result<BTreeMap<String, ResultSummary>, StoreError>
where
    S: ResultStore + ?Sized,
{
    let mut summaries = BTreeMap::new();

    let first = match store.first_record()? {
        Some(record) => record,
        None => return Ok(summaries),
    };
    let last_start_time = store
        .last_record()?
        .map(|r| r.start_time)
        .unwrap_or(first.start_time);

    let mut query_start = first.start_time;
    let mut query_end = query_start + SUMMARY_QUERY_WINDOW_MS;
    let mut skip = 0;

    loop {
        let page = store.query_range(query_start, query_end, chart_only, skip, QUERY_PAGE_SIZE)?;
        if page.is_empty() {
            if query_end > last_start_time {
                break;
            }
            query_start = query_end;
            query_end += SUMMARY_QUERY_WINDOW_MS;
            skip = 0;
            continue;
        }

        for record in page {
            skip += 1;
            summaries
                .entry(record.event_name.clone())
                .or_insert_with(|| ResultSummary::new(record.event_name.clone()))
                .add_sample(record.success, record.duration);
        }
    }

    log::debug!("Collated summaries for {} event names", summaries.len());
    Ok(summaries)
}
