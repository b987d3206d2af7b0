//! End-to-end reporting over a SQLite result store
//!
//! Seeds a result database, then runs the aggregator with the JSONL and SQLite
//! window writers and the whole-run summary.

#[cfg(test)]
mod sqlite_reporting_tests {
    use benchflow::config::BackendType;
    use benchflow::report::WindowWriter;
    use benchflow::results_core::{
        collate_summaries, AggregationParams, EventRecord, ResultStore, SqliteResultStore,
        WindowedAggregator,
    };
    use rusqlite::Connection;
    use std::path::Path;
    use tempfile::tempdir;

    fn seed(db_path: &Path) {
        let mut store = SqliteResultStore::open(db_path).unwrap();
        let mut records: Vec<EventRecord> = (0..5)
            .map(|i| EventRecord::new("login", i * 60_000, 100, true).with_driver("driver-1"))
            .collect();
        records.push(EventRecord::new("login", 300_000, 2_000, false).with_warning("timeout"));
        records.push(EventRecord::new("login", 30_000, 9_999, true).with_chart(false));
        assert_eq!(store.record_results(&records).unwrap(), 7);
    }

    fn params() -> AggregationParams {
        AggregationParams::new(0, 300_000, 60_000, true)
    }

    #[test]
    fn test_jsonl_report_from_sqlite_store() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("data").join("results.db");
        seed(&db_path);

        let store = SqliteResultStore::open_read_only(&db_path).unwrap();
        assert_eq!(store.first_record().unwrap().unwrap().start_time, 0);
        assert_eq!(store.last_record().unwrap().unwrap().start_time, 300_000);

        let output = dir.path().join("reports").join("windows.jsonl");
        let mut writer = WindowWriter::new(BackendType::Jsonl, output.clone()).unwrap();
        let summary = WindowedAggregator::new(&store)
            .run(&mut writer, &params())
            .unwrap();
        writer.flush().unwrap();

        assert_eq!(summary.windows_reported, 6);
        assert_eq!(summary.records_aggregated, 6);
        assert_eq!(summary.handler_errors, 0);

        let content = std::fs::read_to_string(&output).unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 6);

        let counts: Vec<u64> = lines
            .iter()
            .map(|l| l["events"][0]["count"].as_u64().unwrap())
            .collect();
        assert_eq!(counts, vec![1, 2, 3, 4, 5, 5]);
        assert_eq!(lines[5]["window_start"], 60_000);
        assert_eq!(lines[5]["window_end"], 360_000);
        assert_eq!(lines[5]["events"][0]["failures"], 1);
        assert_eq!(lines[5]["events"][0]["max_ms"], 2_000.0);
    }

    #[test]
    fn test_sqlite_report_into_result_database() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("results.db");
        seed(&db_path);

        let store = SqliteResultStore::open_read_only(&db_path).unwrap();
        let mut writer = WindowWriter::new(BackendType::Sqlite, db_path.clone()).unwrap();
        assert_eq!(writer.backend_type(), "SQLite");

        WindowedAggregator::new(&store)
            .run(&mut writer, &params())
            .unwrap();
        drop(writer);

        let conn = Connection::open(&db_path).unwrap();
        let (rows, failures): (i64, i64) = conn
            .query_row(
                "SELECT COUNT(*), SUM(failures) FROM result_windows WHERE event_name = 'login'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(rows, 6);
        assert_eq!(failures, 1);

        let last_count: i64 = conn
            .query_row(
                "SELECT count FROM result_windows ORDER BY window_start DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(last_count, 5);
    }

    #[test]
    fn test_summary_from_sqlite_store() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("results.db");
        seed(&db_path);

        let store = SqliteResultStore::open_read_only(&db_path).unwrap();
        assert_eq!(store.count_results().unwrap(), 7);
        assert_eq!(store.count_results_by_failure().unwrap(), 1);

        let charted = collate_summaries(&store, true).unwrap();
        let login = charted["login"].to_row();
        assert_eq!(login.total_count, 6);
        assert_eq!(login.failure_count, 1);
        assert_eq!(login.mean_ms, Some(100.0));

        let all = collate_summaries(&store, false).unwrap();
        assert_eq!(all["login"].total_results(), 7);
        assert_eq!(all["login"].to_row().max_ms, Some(9_999.0));
    }
}
