//! Sinks writing into SQLite tables on disk.

use std::sync::Arc;

use itersink_connectors::{open_target, ConnectorError, SqliteTable, TableOptions};
use itersink_core::{args, create_sink, SinkError, SinkOutput, TableHandle};

fn db_uri(dir: &tempfile::TempDir, params: &str) -> (String, String) {
    let path = dir.path().join("runs.db");
    let path = path.to_str().unwrap().to_string();
    (format!("sqlite://{}?{}", path, params), path)
}

#[test]
fn test_sink_appends_rows_with_extra_columns() {
    let dir = tempfile::tempdir().unwrap();
    let (uri, path) = db_uri(&dir, "table=runs&create=true");

    {
        let mut sink = create_sink(open_target(&uri).unwrap(), args![run = "r1"]).unwrap();
        for step in 0..3_i64 {
            let out = sink
                .call(args![step = step, x = 0.5 * step as f64])
                .unwrap();
            assert!(matches!(out, SinkOutput::Written));
        }
        let handle = sink.call(args![]).unwrap().into_handle().unwrap();
        assert_eq!(handle.table_name(), "runs");
        assert!(handle.connection().ends_with("runs.db"));
    }

    let table = SqliteTable::connect(&path, "runs", TableOptions::default()).unwrap();
    let rows: Vec<(i64, f64, String)> = table
        .block_on(sqlx::query_as("SELECT step, x, run FROM runs ORDER BY step").fetch_all(table.pool()))
        .unwrap();
    assert_eq!(
        rows,
        vec![
            (0, 0.0, "r1".to_string()),
            (1, 0.5, "r1".to_string()),
            (2, 1.0, "r1".to_string()),
        ]
    );
}

#[test]
fn test_recycled_batch_is_one_insert() {
    let dir = tempfile::tempdir().unwrap();
    let (_, path) = db_uri(&dir, "");
    let options = TableOptions {
        create_if_missing: true,
        ..Default::default()
    };
    let table = Arc::new(SqliteTable::connect(&path, "grid", options).unwrap());
    let handle: Arc<dyn TableHandle> = table.clone();

    let mut sink = create_sink(handle, args![]).unwrap();
    sink.call(args![a = 7, b = vec![1, 2, 3, 4]]).unwrap();

    let rows: Vec<(i64, i64)> = table
        .block_on(sqlx::query_as("SELECT a, b FROM grid ORDER BY b").fetch_all(table.pool()))
        .unwrap();
    assert_eq!(rows, vec![(7, 1), (7, 2), (7, 3), (7, 4)]);
}

#[test]
fn test_missing_table_is_write_failed() {
    let dir = tempfile::tempdir().unwrap();
    let (uri, _) = db_uri(&dir, "table=absent");

    let mut sink = create_sink(open_target(&uri).unwrap(), args![]).unwrap();
    let err = sink.call(args![a = 1]).unwrap_err();
    match err {
        SinkError::WriteFailed { target, .. } => assert!(target.contains("absent")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_database_uri_without_table_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let (uri, _) = db_uri(&dir, "create=true");
    assert!(matches!(
        open_target(&uri),
        Err(ConnectorError::ConfigError(_))
    ));
}

#[test]
fn test_unsupported_scheme_is_rejected() {
    assert!(matches!(
        open_target("mongodb://localhost/runs"),
        Err(ConnectorError::Target(SinkError::UnsupportedTargetKind(kind))) if kind == "mongodb"
    ));
}
