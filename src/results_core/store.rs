//! Result store interface and an in-memory implementation

use super::record::EventRecord;
use std::sync::RwLock;

#[derive(Debug)]
pub enum StoreError {
    Database(rusqlite::Error),
    Serialization(serde_json::Error),
    Io(std::io::Error),
    InvalidRecord(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Database(err)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err)
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err)
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Database(e) => write!(f, "Database error: {}", e),
            StoreError::Serialization(e) => write!(f, "Serialization error: {}", e),
            StoreError::Io(e) => write!(f, "IO error: {}", e),
            StoreError::InvalidRecord(msg) => write!(f, "Invalid record: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

/// Append-only store of event results, queried in `start_time` order
pub trait ResultStore {
    /// Earliest result by start time, `None` if the store is empty
    fn first_record(&self) -> Result<Option<EventRecord>, StoreError>;

    /// Latest result by start time, `None` if the store is empty
    fn last_record(&self) -> Result<Option<EventRecord>, StoreError>;

    /// A page of results with `start_time` in `[start_time, end_time)`
    ///
    /// Results are ordered by start time, ties in insertion order. With
    /// `chart_only` set, only chartable results are returned (and counted by `skip`).
    fn query_range(
        &self,
        start_time: i64,
        end_time: i64,
        chart_only: bool,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<EventRecord>, StoreError>;
}

impl<S: ResultStore + ?Sized> ResultStore for &S {
    fn first_record(&self) -> Result<Option<EventRecord>, StoreError> {
        (**self).first_record()
    }

    fn last_record(&self) -> Result<Option<EventRecord>, StoreError> {
        (**self).last_record()
    }

    fn query_range(
        &self,
        start_time: i64,
        end_time: i64,
        chart_only: bool,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<EventRecord>, StoreError> {
        (**self).query_range(start_time, end_time, chart_only, skip, limit)
    }
}

pub(crate) fn validate_record(record: &EventRecord) -> Result<(), StoreError> {
    if record.event_name.trim().is_empty() {
        return Err(StoreError::InvalidRecord(
            "event_name cannot be empty".to_string(),
        ));
    }
    if record.duration < 0 {
        return Err(StoreError::InvalidRecord(format!(
            "duration must not be negative, got {} for '{}'",
            record.duration, record.event_name
        )));
    }
    Ok(())
}

/// In-memory result store
///
/// Records are kept sorted by start time; a record sharing a start time with
/// existing ones is placed after them.
#[derive(Debug, Default)]
pub struct MemoryResultStore {
    records: RwLock<Vec<EventRecord>>,
}

impl MemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = EventRecord>) -> Result<Self, StoreError> {
        let store = Self::new();
        for record in records {
            store.record_result(record)?;
        }
        Ok(store)
    }

    pub fn record_result(&self, record: EventRecord) -> Result<(), StoreError> {
        validate_record(&record)?;
        let mut records = self
            .records
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let index = records.partition_point(|r| r.start_time <= record.start_time);
        records.insert(index, record);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<EventRecord>> {
        self.records
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ResultStore for MemoryResultStore {
    fn first_record(&self) -> Result<Option<EventRecord>, StoreError> {
        Ok(self.read().first().cloned())
    }

    fn last_record(&self) -> Result<Option<EventRecord>, StoreError> {
        Ok(self.read().last().cloned())
    }

    fn query_range(
        &self,
        start_time: i64,
        end_time: i64,
        chart_only: bool,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<EventRecord>, StoreError> {
        let records = self.read();
        let from = records.partition_point(|r| r.start_time < start_time);
        let to = records.partition_point(|r| r.start_time < end_time);
        if from >= to {
            return Ok(Vec::new());
        }

        Ok(records[from..to]
            .iter()
            .filter(|r| !chart_only || r.chart)
            .skip(skip)
            .take(limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_store() {
        let store = MemoryResultStore::new();
        assert!(store.first_record().unwrap().is_none());
        assert!(store.last_record().unwrap().is_none());
        assert!(store.query_range(0, i64::MAX, false, 0, 10).unwrap().is_empty());
    }

    #[test]
    fn test_records_sorted_with_stable_ties() {
        let store = MemoryResultStore::new();
        store.record_result(EventRecord::new("b", 200, 1, true)).unwrap();
        store.record_result(EventRecord::new("a", 100, 1, true)).unwrap();
        store.record_result(EventRecord::new("c", 200, 1, true)).unwrap();

        let names: Vec<String> = store
            .query_range(0, 1000, false, 0, 10)
            .unwrap()
            .into_iter()
            .map(|r| r.event_name)
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(store.first_record().unwrap().unwrap().event_name, "a");
        assert_eq!(store.last_record().unwrap().unwrap().event_name, "c");
    }

    #[test]
    fn test_range_bounds_and_paging() {
        let store = MemoryResultStore::from_records(
            (0..10).map(|i| EventRecord::new("e", i * 10, 5, true)),
        )
        .unwrap();

        // Start inclusive, end exclusive
        let page = store.query_range(20, 50, false, 0, 10).unwrap();
        let times: Vec<i64> = page.iter().map(|r| r.start_time).collect();
        assert_eq!(times, vec![20, 30, 40]);

        let page = store.query_range(0, 100, false, 4, 3).unwrap();
        let times: Vec<i64> = page.iter().map(|r| r.start_time).collect();
        assert_eq!(times, vec![40, 50, 60]);
    }

    #[test]
    fn test_chart_only_filter() {
        let store = MemoryResultStore::from_records(vec![
            EventRecord::new("e", 1, 5, true),
            EventRecord::new("e", 2, 5, true).with_chart(false),
            EventRecord::new("e", 3, 5, true),
        ])
        .unwrap();

        assert_eq!(store.query_range(0, 10, false, 0, 10).unwrap().len(), 3);
        let charted = store.query_range(0, 10, true, 0, 10).unwrap();
        assert_eq!(charted.len(), 2);
        // Skip counts only chartable results
        let charted = store.query_range(0, 10, true, 1, 10).unwrap();
        assert_eq!(charted.len(), 1);
        assert_eq!(charted[0].start_time, 3);
    }

    #[test]
    fn test_invalid_records_rejected() {
        let store = MemoryResultStore::new();
        assert!(matches!(
            store.record_result(EventRecord::new("", 1, 1, true)),
            Err(StoreError::InvalidRecord(_))
        ));
        assert!(matches!(
            store.record_result(EventRecord::new("e", 1, -1, true)),
            Err(StoreError::InvalidRecord(_))
        ));
        assert!(store.is_empty());
    }
}
