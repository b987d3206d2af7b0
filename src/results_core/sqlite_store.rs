//! SQLite-backed result store
//!
//! Drivers append to the `event_results` table; reporters page through it by
//! start time. Indexes cover the start-time scans used by the aggregator as well
//! as the per-event and per-outcome lookups.

use super::record::EventRecord;
use super::store::{validate_record, ResultStore, StoreError};
use crate::sqlite_pragma::apply_optimized_pragmas;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Row};
use std::path::{Path, PathBuf};

const SELECT_COLUMNS: &str = "event_name, start_time, duration, success, chart,
                    driver_id, processed_by, start_delay, warning";

pub struct SqliteResultStore {
    conn: Connection,
    location: PathBuf,
}

impl SqliteResultStore {
    /// Open (or create) a result database, creating the schema if needed
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path)?;
        apply_optimized_pragmas(&conn)?;
        Self::create_schema(&conn)?;

        log::info!("✅ Result store opened: {}", db_path.display());

        Ok(Self {
            conn,
            location: db_path.to_path_buf(),
        })
    }

    /// Open an existing result database for reporting only
    ///
    /// Fails if the database file does not exist.
    pub fn open_read_only(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db_path = db_path.as_ref();
        let conn = Connection::open_with_flags(
            db_path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        apply_optimized_pragmas(&conn)?;
        // Ensure the table exists before locking writes out
        Self::create_schema(&conn)?;
        conn.execute_batch("PRAGMA query_only = ON")?;

        log::info!("📥 Result store opened read-only: {}", db_path.display());

        Ok(Self {
            conn,
            location: db_path.to_path_buf(),
        })
    }

    fn create_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS event_results (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                event_name TEXT NOT NULL,
                start_time INTEGER NOT NULL,
                duration INTEGER NOT NULL,
                success INTEGER NOT NULL,
                chart INTEGER NOT NULL DEFAULT 1,
                driver_id TEXT,
                processed_by TEXT,
                start_delay INTEGER NOT NULL DEFAULT 0,
                warning TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_results_start ON event_results(start_time, id);
            CREATE INDEX IF NOT EXISTS idx_results_event_name_start ON event_results(event_name, start_time);
            CREATE INDEX IF NOT EXISTS idx_results_success_start ON event_results(success, start_time);",
        )?;
        Ok(())
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<EventRecord> {
        Ok(EventRecord {
            event_name: row.get(0)?,
            start_time: row.get(1)?,
            duration: row.get(2)?,
            success: row.get(3)?,
            chart: row.get(4)?,
            driver_id: row.get(5)?,
            processed_by: row.get(6)?,
            start_delay: row.get(7)?,
            warning: row.get(8)?,
        })
    }

    fn insert(conn: &Connection, record: &EventRecord) -> Result<(), StoreError> {
        validate_record(record)?;
        let mut stmt = conn.prepare_cached(
            "INSERT INTO event_results
                (event_name, start_time, duration, success, chart,
                 driver_id, processed_by, start_delay, warning)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )?;
        stmt.execute(params![
            record.event_name,
            record.start_time,
            record.duration,
            record.success,
            record.chart,
            record.driver_id,
            record.processed_by,
            record.start_delay,
            record.warning,
        ])?;
        Ok(())
    }

    /// Store a single result
    pub fn record_result(&self, record: &EventRecord) -> Result<(), StoreError> {
        Self::insert(&self.conn, record)?;
        log::trace!("Recorded result: {:?}", record);
        Ok(())
    }

    /// Store a batch of results in one transaction; nothing is stored if any is invalid
    pub fn record_results(&mut self, records: &[EventRecord]) -> Result<usize, StoreError> {
        let tx = self.conn.transaction()?;
        for record in records {
            Self::insert(&tx, record)?;
        }
        tx.commit()?;

        log::debug!("✅ Recorded {} results", records.len());
        Ok(records.len())
    }

    fn boundary_record(&self, order: &str) -> Result<Option<EventRecord>, StoreError> {
        let sql = format!(
            "SELECT {} FROM event_results ORDER BY start_time {order}, id {order} LIMIT 1",
            SELECT_COLUMNS,
            order = order
        );
        let record = self
            .conn
            .query_row(&sql, [], Self::map_row)
            .optional()?;
        Ok(record)
    }

    /// Page through the results of one event, oldest first
    ///
    /// `None` pages through the results of every event.
    pub fn query_by_event_name(
        &self,
        event_name: Option<&str>,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<EventRecord>, StoreError> {
        let sql = format!(
            "SELECT {} FROM event_results
             WHERE (?1 IS NULL OR event_name = ?1)
             ORDER BY start_time ASC, id ASC
             LIMIT ?2 OFFSET ?3",
            SELECT_COLUMNS
        );
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let rows = stmt.query_map(
            params![event_name, limit as i64, skip as i64],
            Self::map_row,
        )?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    /// Distinct event names, sorted
    pub fn event_names(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT DISTINCT event_name FROM event_results ORDER BY event_name")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(names)
    }

    pub fn count_results(&self) -> Result<u64, StoreError> {
        self.count("SELECT COUNT(*) FROM event_results", params![])
    }

    pub fn count_results_by_event_name(&self, event_name: &str) -> Result<u64, StoreError> {
        self.count(
            "SELECT COUNT(*) FROM event_results WHERE event_name = ?1",
            params![event_name],
        )
    }

    pub fn count_results_by_success(&self) -> Result<u64, StoreError> {
        self.count(
            "SELECT COUNT(*) FROM event_results WHERE success = 1",
            params![],
        )
    }

    pub fn count_results_by_failure(&self) -> Result<u64, StoreError> {
        self.count(
            "SELECT COUNT(*) FROM event_results WHERE success = 0",
            params![],
        )
    }

    fn count(&self, sql: &str, params: &[&dyn rusqlite::ToSql]) -> Result<u64, StoreError> {
        let count: i64 = self.conn.query_row(sql, params, |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Where the raw results live
    pub fn data_location(&self) -> String {
        self.location.display().to_string()
    }
}

impl ResultStore for SqliteResultStore {
    fn first_record(&self) -> Result<Option<EventRecord>, StoreError> {
        self.boundary_record("ASC")
    }

    fn last_record(&self) -> Result<Option<EventRecord>, StoreError> {
        self.boundary_record("DESC")
    }

    fn query_range(
        &self,
        start_time: i64,
        end_time: i64,
        chart_only: bool,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<EventRecord>, StoreError> {
        let sql = format!(
            "SELECT {} FROM event_results
             WHERE start_time >= ?1 AND start_time < ?2
               AND (?3 = 0 OR chart = 1)
             ORDER BY start_time ASC, id ASC
             LIMIT ?4 OFFSET ?5",
            SELECT_COLUMNS
        );
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let rows = stmt.query_map(
            params![start_time, end_time, chart_only, limit as i64, skip as i64],
            Self::map_row,
        )?;

        let mut records = Vec::with_capacity(limit.min(1024));
        for row in rows {
            records.push(row?);
        }

        log::trace!(
            "Found {} results in [{}, {}) chart_only={} skip={} limit={}",
            records.len(),
            start_time,
            end_time,
            chart_only,
            skip,
            limit
        );
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store_with_records(records: &[EventRecord]) -> (tempfile::TempDir, SqliteResultStore) {
        let dir = tempdir().unwrap();
        let mut store = SqliteResultStore::open(dir.path().join("results.db")).unwrap();
        store.record_results(records).unwrap();
        (dir, store)
    }

    #[test]
    fn test_empty_store() {
        let (_dir, store) = store_with_records(&[]);
        assert!(store.first_record().unwrap().is_none());
        assert!(store.last_record().unwrap().is_none());
        assert_eq!(store.count_results().unwrap(), 0);
        assert_eq!(store.count_results_by_failure().unwrap(), 0);
        assert_eq!(store.count_results_by_success().unwrap(), 0);
        assert_eq!(store.count_results_by_event_name("e.1").unwrap(), 0);
        assert!(store.query_range(0, i64::MAX, false, 0, 5).unwrap().is_empty());
        assert!(store.query_by_event_name(Some("e.1"), 0, 5).unwrap().is_empty());
    }

    #[test]
    fn test_round_trip_all_fields() {
        let record = EventRecord::new("login", 1_700_000_000_000, 950, false)
            .with_chart(false)
            .with_driver("driver-7")
            .with_warning("Execution time was greater than 900ms");
        let (_dir, store) = store_with_records(std::slice::from_ref(&record));

        let found = store.first_record().unwrap().unwrap();
        assert_eq!(found, record);
    }

    #[test]
    fn test_first_and_last_by_start_time() {
        let (_dir, store) = store_with_records(&[
            EventRecord::new("b", 300, 1, true),
            EventRecord::new("a", 100, 1, true),
            EventRecord::new("c", 200, 1, true),
        ]);

        assert_eq!(store.first_record().unwrap().unwrap().event_name, "a");
        assert_eq!(store.last_record().unwrap().unwrap().event_name, "b");
    }

    #[test]
    fn test_query_range_paging_and_chart_filter() {
        let records: Vec<EventRecord> = (0..100)
            .map(|i| EventRecord::new("e", i * 10, i, i % 2 == 0).with_chart(i % 4 != 0))
            .collect();
        let (_dir, store) = store_with_records(&records);

        let mut total = 0;
        let mut charted = 0;
        let limit = 7;
        let mut skip = 0;
        loop {
            let page = store.query_range(0, i64::MAX, false, skip, limit).unwrap();
            total += page.len();
            if page.len() < limit {
                break;
            }
            skip += limit;
        }
        skip = 0;
        loop {
            let page = store.query_range(0, i64::MAX, true, skip, limit).unwrap();
            assert!(page.iter().all(|r| r.chart));
            charted += page.len();
            if page.len() < limit {
                break;
            }
            skip += limit;
        }
        assert_eq!(total, 100);
        assert_eq!(charted, 75);

        // End time is exclusive
        let page = store.query_range(100, 200, false, 0, 100).unwrap();
        assert_eq!(page.first().unwrap().start_time, 100);
        assert_eq!(page.last().unwrap().start_time, 190);

        // Nothing past the last result
        assert!(store.query_range(1_000, 2_000, false, 0, 100).unwrap().is_empty());
    }

    #[test]
    fn test_counts_and_event_names() {
        let (_dir, store) = store_with_records(&[
            EventRecord::new("search", 1, 1, true),
            EventRecord::new("login", 2, 1, false),
            EventRecord::new("search", 3, 1, false),
            EventRecord::new("logout", 4, 1, true),
        ]);

        assert_eq!(store.count_results().unwrap(), 4);
        assert_eq!(store.count_results_by_success().unwrap(), 2);
        assert_eq!(store.count_results_by_failure().unwrap(), 2);
        assert_eq!(store.count_results_by_event_name("search").unwrap(), 2);
        assert_eq!(store.event_names().unwrap(), vec!["login", "logout", "search"]);

        let searches = store.query_by_event_name(Some("search"), 0, 10).unwrap();
        assert_eq!(searches.len(), 2);
        assert!(searches.iter().all(|r| r.event_name == "search"));
        assert!(store.query_by_event_name(Some("BOB"), 0, 1).unwrap().is_empty());

        // No event name pages through everything in start time order
        let first_page = store.query_by_event_name(None, 0, 3).unwrap();
        let names: Vec<&str> = first_page.iter().map(|r| r.event_name.as_str()).collect();
        assert_eq!(names, vec!["search", "login", "search"]);
        let second_page = store.query_by_event_name(None, 3, 3).unwrap();
        assert_eq!(second_page.len(), 1);
        assert_eq!(second_page[0].event_name, "logout");
    }

    #[test]
    fn test_batch_rejected_atomically() {
        let dir = tempdir().unwrap();
        let mut store = SqliteResultStore::open(dir.path().join("results.db")).unwrap();

        let result = store.record_results(&[
            EventRecord::new("ok", 1, 1, true),
            EventRecord::new("", 2, 1, true),
        ]);
        assert!(matches!(result, Err(StoreError::InvalidRecord(_))));
        assert_eq!(store.count_results().unwrap(), 0);
    }

    #[test]
    fn test_read_only_rejects_writes() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("results.db");
        {
            let store = SqliteResultStore::open(&db_path).unwrap();
            store.record_result(&EventRecord::new("e", 1, 1, true)).unwrap();
        }

        let store = SqliteResultStore::open_read_only(&db_path).unwrap();
        assert_eq!(store.count_results().unwrap(), 1);
        assert!(store.record_result(&EventRecord::new("e", 2, 1, true)).is_err());
        assert!(store.data_location().ends_with("results.db"));
    }

    #[test]
    fn test_read_only_requires_existing_database() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("typo.db");

        assert!(SqliteResultStore::open_read_only(&db_path).is_err());
        assert!(!db_path.exists());
    }
}
