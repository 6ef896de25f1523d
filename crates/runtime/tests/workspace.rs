//! Workspace integration tests: files in, SQL through the router, files out.

use flatql_common::config::HttpConfig;
use flatql_common::file::File;
use flatql_common::models::Record;
use flatql_connectors::sources::file::FormatReader;
use flatql_error::ErrorCode;
use flatql_runtime::ingest::WorkspaceOptions;
use flatql_runtime::{ExecutionPolicy, Workspace};
use std::path::Path;

fn fixture(dir: &Path, name: &str, contents: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path.to_string_lossy().into_owned()
}

fn workspace() -> Workspace {
    Workspace::new(WorkspaceOptions::default()).unwrap()
}

#[tokio::test]
async fn test_load_and_join_two_files() {
    let dir = tempfile::tempdir().unwrap();
    let users = fixture(dir.path(), "users.csv", "id,name\n1,Gina\n2,Yulia\n");
    let orders = fixture(dir.path(), "orders.tsv", "user_id\ttotal\n1\t10\n1\t5\n2\t7\n");

    let mut ws = workspace();
    let names = ws.load_files(&[users, orders]).await.unwrap();
    assert_eq!(names, ["users", "orders"]);
    assert_eq!(ws.tables(), ["users", "orders"]);

    let router = ws.router();
    assert_eq!(router.policy(), ExecutionPolicy::Local);

    let output = router
        .execute(
            "SELECT u.name, SUM(o.total) AS total
             FROM users u JOIN orders o ON o.user_id = u.id
             GROUP BY u.name ORDER BY u.name",
        )
        .await
        .unwrap();
    let table = output.into_table().unwrap();
    assert_eq!(table.name(), "users");
    assert_eq!(&table.header()[..], ["name", "total"]);
    assert_eq!(
        table.records(),
        &[Record::from(vec!["Gina", "15"]), Record::from(vec!["Yulia", "7"])]
    );
}

#[tokio::test]
async fn test_statements_report_rows_affected() {
    let dir = tempfile::tempdir().unwrap();
    let users = fixture(dir.path(), "users.csv", "id,name\n1,Gina\n2,Yulia\n");

    let mut ws = workspace();
    ws.load_file(&users).await.unwrap();
    let router = ws.router();

    let output = router.execute("DELETE FROM users WHERE id = '1'").await.unwrap();
    assert!(!output.has_table());
    assert_eq!(output.rows_affected(), Some(1));

    // The embedded engine takes WITH down the statement path.
    let output = router
        .execute("WITH c AS (SELECT * FROM users) SELECT * FROM c")
        .await
        .unwrap();
    assert!(!output.has_table());
    assert_eq!(output.rows_affected(), Some(0));
}

#[tokio::test]
async fn test_read_failure_loads_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let users = fixture(dir.path(), "users.csv", "id,name\n1,Gina\n");
    let missing = dir.path().join("missing.csv").to_string_lossy().into_owned();

    let mut ws = workspace();
    let err = ws.load_files(&[users, missing]).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::FileOpenFailed);
    assert!(ws.tables().is_empty());
    assert!(ws.bridge().get_tables().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_duplicate_base_names_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let csv = fixture(dir.path(), "users.csv", "id,name\n1,Gina\n");
    let tsv = fixture(dir.path(), "users.tsv", "id\tname\n2\tYulia\n");

    let mut ws = workspace();
    let err = ws.load_files(&[csv, tsv]).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::EngineFailure);
    assert_eq!(ws.tables(), ["users"]);
}

#[tokio::test]
async fn test_header_only_file_is_not_loaded() {
    let dir = tempfile::tempdir().unwrap();
    let empty = fixture(dir.path(), "empty.csv", "id,name\n");

    let mut ws = workspace();
    let err = ws.load_file(&empty).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::EmptyRecords);
}

#[tokio::test]
async fn test_export_query_result() {
    let dir = tempfile::tempdir().unwrap();
    let users = fixture(dir.path(), "users.csv", "id,name\n1,Gina\n2,Yulia\n3,Hana\n");
    let out = dir.path().join("subset.ltsv.gz").to_string_lossy().into_owned();

    let mut ws = workspace();
    ws.load_file(&users).await.unwrap();
    let written = ws
        .export("SELECT id, name FROM users WHERE id <> '2' ORDER BY id", &out)
        .await
        .unwrap();
    assert_eq!(written, 2);

    let table = FormatReader::new(&HttpConfig::default())
        .unwrap()
        .read(&File::new(&out).unwrap())
        .await
        .unwrap();
    assert_eq!(table.name(), "subset");
    assert_eq!(
        table.records(),
        &[Record::from(vec!["1", "Gina"]), Record::from(vec!["3", "Hana"])]
    );
}
