//! Event result records as written by benchmark drivers

use serde::{Deserialize, Serialize};
use std::error::Error;

/// A single timed event result
///
/// Only `event_name`, `start_time`, `duration`, `success` and `chart` take part
/// in aggregation; the remaining fields are carried through the stores untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub event_name: String,
    /// Epoch milliseconds at which the event started
    pub start_time: i64,
    /// Elapsed milliseconds
    pub duration: i64,
    pub success: bool,
    #[serde(default = "default_chart")]
    pub chart: bool,
    #[serde(default)]
    pub driver_id: Option<String>,
    #[serde(default)]
    pub processed_by: Option<String>,
    #[serde(default)]
    pub start_delay: i64,
    #[serde(default)]
    pub warning: Option<String>,
}

fn default_chart() -> bool {
    true
}

impl EventRecord {
    /// Chartable record with no driver metadata
    pub fn new(event_name: impl Into<String>, start_time: i64, duration: i64, success: bool) -> Self {
        Self {
            event_name: event_name.into(),
            start_time,
            duration,
            success,
            chart: true,
            driver_id: None,
            processed_by: None,
            start_delay: 0,
            warning: None,
        }
    }

    pub fn with_chart(mut self, chart: bool) -> Self {
        self.chart = chart;
        self
    }

    pub fn with_driver(mut self, driver_id: impl Into<String>) -> Self {
        self.driver_id = Some(driver_id.into());
        self
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warning = Some(warning.into());
        self
    }

    /// Parse a record from a JSONL line
    pub fn from_jsonl(line: &str) -> Result<Self, Box<dyn Error>> {
        let record: EventRecord = serde_json::from_str(line)?;
        Ok(record)
    }

    pub fn is_failure(&self) -> bool {
        !self.success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_jsonl() {
        let line = r#"{"event_name":"login","start_time":1700000000000,"duration":123,"success":false}"#;

        let record = EventRecord::from_jsonl(line).unwrap();
        assert_eq!(record.event_name, "login");
        assert_eq!(record.start_time, 1700000000000);
        assert_eq!(record.duration, 123);
        assert!(record.is_failure());
        // Missing chart flag means chartable
        assert!(record.chart);
        assert_eq!(record.driver_id, None);
        assert_eq!(record.start_delay, 0);
    }

    #[test]
    fn test_parse_full_jsonl() {
        let line = r#"{"event_name":"search","start_time":5,"duration":950,"success":true,"chart":false,"driver_id":"driver-1","processed_by":"searchProcessor","start_delay":12,"warning":"Execution time was greater than 900ms"}"#;

        let record = EventRecord::from_jsonl(line).unwrap();
        assert!(!record.chart);
        assert_eq!(record.driver_id.as_deref(), Some("driver-1"));
        assert_eq!(record.processed_by.as_deref(), Some("searchProcessor"));
        assert_eq!(record.start_delay, 12);
        assert!(record.warning.is_some());
    }

    #[test]
    fn test_malformed_jsonl() {
        assert!(EventRecord::from_jsonl(r#"{"event_name": "x""#).is_err());
        assert!(EventRecord::from_jsonl(r#"{"event_name": "x"}"#).is_err());
    }
}
