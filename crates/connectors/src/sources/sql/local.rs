//! Bridge between in-memory [`Table`]s and the embedded engine.
//!
//! All operations share one connection. Each call runs on the blocking pool,
//! opens its own transaction and commits or rolls back before returning.

use super::engine::SharedConnection;
use super::extract_table_name;
use flatql_common::models::{ddl_table, ColumnDescription, Header, Record, Table};
use flatql_common::telemetry::QUERY_TARGET;
use flatql_error::{ErrorCode, FlatqlError, Result};
use rusqlite::types::ValueRef;
use rusqlite::{Batch, Connection, Statement, Transaction};

const LIST_TABLES: &str =
    "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name";
const TABLE_INFO: &str =
    "SELECT name, type, \"notnull\", dflt_value, pk FROM pragma_table_info(?1) ORDER BY cid";

/// Double-quotes an identifier, doubling embedded quotes.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Single-quotes a literal, doubling embedded quotes.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// `CREATE TABLE "t" ("a" TEXT, "b" TEXT)`
pub fn create_table_statement(table: &Table) -> String {
    let columns = table
        .header()
        .iter()
        .map(|c| format!("{} TEXT", quote_identifier(c)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("CREATE TABLE {} ({})", quote_identifier(table.name()), columns)
}

/// `INSERT INTO "t" VALUES ('1', 'x')`
pub fn insert_statement(table_name: &str, record: &Record) -> String {
    let values = record
        .iter()
        .map(|v| quote_literal(v))
        .collect::<Vec<_>>()
        .join(", ");
    format!("INSERT INTO {} VALUES ({})", quote_identifier(table_name), values)
}

/// Renders any SQLite value as text. NULL becomes the empty string.
pub(crate) fn value_to_string(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) | ValueRef::Blob(t) => String::from_utf8_lossy(t).into_owned(),
    }
}

fn begin(conn: &mut Connection) -> Result<Transaction<'_>> {
    conn.transaction().map_err(|e| {
        FlatqlError::new(
            ErrorCode::TransactionFailed,
            format!("failed to begin transaction: {}", e),
        )
    })
}

fn commit(tx: Transaction<'_>) -> Result<()> {
    tx.commit().map_err(|e| {
        FlatqlError::new(
            ErrorCode::TransactionFailed,
            format!("failed to commit transaction: {}", e),
        )
    })
}

fn create_in(tx: &Transaction<'_>, table: &Table) -> Result<()> {
    let ddl = create_table_statement(table);
    tracing::debug!(target: QUERY_TARGET, sql = %ddl, "create table");
    tx.execute(&ddl, [])
        .map_err(|e| FlatqlError::from(e).for_table("create_table", table.name()))?;
    Ok(())
}

fn insert_in(tx: &Transaction<'_>, table: &Table) -> Result<()> {
    for record in table.records() {
        let dml = insert_statement(table.name(), record);
        tx.execute(&dml, [])
            .map_err(|e| FlatqlError::from(e).for_table("insert_records", table.name()))?;
    }
    tracing::debug!(
        target: QUERY_TARGET,
        table = table.name(),
        records = table.records().len(),
        "insert records"
    );
    Ok(())
}

/// Prepares the only statement in `sql`.
///
/// Anything after the first statement other than whitespace or comments is
/// rejected so that nothing is silently skipped.
fn prepare_single<'conn>(tx: &'conn Transaction<'_>, sql: &str) -> Result<Statement<'conn>> {
    let mut batch = Batch::new(tx, sql);
    let stmt = batch
        .next()
        .map_err(|e| FlatqlError::from(e).for_query("query", sql))?
        .ok_or_else(|| FlatqlError::new(ErrorCode::EmptyQuery, "query has no statement"))?;

    if !matches!(batch.next(), Ok(None)) {
        return Err(FlatqlError::new(
            ErrorCode::MultipleStatements,
            "query contains more than one statement",
        )
        .for_query("query", sql)
        .with_hint("run additional statements through the statement path"));
    }
    Ok(stmt)
}

/// Runs a row-returning statement inside a transaction.
pub(crate) fn query_blocking(conn: &mut Connection, sql: &str) -> Result<(Header, Vec<Record>)> {
    tracing::debug!(target: QUERY_TARGET, sql = %sql, "query");
    let on_err = |e: rusqlite::Error| FlatqlError::from(e).for_query("query", sql);

    let tx = begin(conn)?;
    let result = {
        let mut stmt = prepare_single(&tx, sql)?;
        let column_count = stmt.column_count();
        if column_count == 0 {
            return Err(FlatqlError::new(
                ErrorCode::NoColumns,
                "query returned no columns",
            )
            .for_query("query", sql)
            .with_hint("use a statement path for INSERT, UPDATE, DELETE and DDL"));
        }

        let header = Header::new(stmt.column_names().into_iter().map(String::from).collect());
        let mut rows = stmt.query([]).map_err(on_err)?;
        let mut records = Vec::new();
        while let Some(row) = rows.next().map_err(on_err)? {
            let mut values = Vec::with_capacity(column_count);
            for i in 0..column_count {
                values.push(value_to_string(row.get_ref(i).map_err(on_err)?));
            }
            records.push(Record::new(values));
        }
        (header, records)
    };
    commit(tx)?;
    Ok(result)
}

/// Runs every statement in `sql` inside one transaction and returns the total
/// rows affected.
///
/// A statement that produces rows is stepped to completion and counts zero.
pub(crate) fn execute_blocking(conn: &mut Connection, sql: &str) -> Result<u64> {
    tracing::debug!(target: QUERY_TARGET, sql = %sql, "execute");
    let on_err = |e: rusqlite::Error| FlatqlError::from(e).for_query("execute_statement", sql);

    let tx = begin(conn)?;
    let mut affected = 0u64;
    {
        let mut batch = Batch::new(&tx, sql);
        while let Some(mut stmt) = batch.next().map_err(on_err)? {
            if stmt.column_count() > 0 {
                let mut rows = stmt.query([]).map_err(on_err)?;
                while rows.next().map_err(on_err)?.is_some() {}
            } else {
                affected += stmt.execute([]).map_err(on_err)? as u64;
            }
        }
    }
    commit(tx)?;
    Ok(affected)
}

pub(crate) fn list_tables_blocking(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(LIST_TABLES)?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(names)
}

pub(crate) fn describe_blocking(conn: &Connection, table: &str) -> Result<Vec<ColumnDescription>> {
    let mut stmt = conn.prepare(TABLE_INFO)?;
    let columns = stmt
        .query_map([table], |row| {
            Ok(ColumnDescription {
                name: row.get(0)?,
                data_type: row.get(1)?,
                precision: 0,
                nullable: row.get::<_, i64>(2)? == 0,
                default_value: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                primary_key: row.get::<_, i64>(4)? > 0,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| FlatqlError::from(e).for_table("get_table_ddl", table))?;
    Ok(columns)
}

/// Schema-only tables (header, no records) for every base table.
pub(crate) fn tables_blocking(conn: &Connection) -> Result<Vec<Table>> {
    list_tables_blocking(conn)?
        .into_iter()
        .map(|name| {
            let header: Vec<String> = describe_blocking(conn, &name)?
                .into_iter()
                .map(|c| c.name)
                .collect();
            Ok(Table::new(name, header, Vec::new()))
        })
        .collect()
}

/// Loads tables into, and queries, the shared embedded engine.
#[derive(Clone)]
pub struct LocalEngineBridge {
    conn: SharedConnection,
}

impl LocalEngineBridge {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    async fn run<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| {
                FlatqlError::new(ErrorCode::InternalPanic, "engine connection lock poisoned")
            })?;
            op(&mut guard)
        })
        .await
        .map_err(|e| FlatqlError::new(ErrorCode::InternalPanic, e.to_string()))?
    }

    /// Creates one TEXT column per header entry.
    pub async fn create_table(&self, table: &Table) -> Result<()> {
        table.valid()?;
        let table = table.clone();
        self.run(move |conn| {
            let tx = begin(conn)?;
            create_in(&tx, &table)?;
            commit(tx)
        })
        .await
    }

    /// Inserts every record in one transaction; any failure rolls back the batch.
    pub async fn insert_records(&self, table: &Table) -> Result<()> {
        table.valid()?;
        let table = table.clone();
        self.run(move |conn| {
            let tx = begin(conn)?;
            if let Err(e) = insert_in(&tx, &table) {
                tracing::warn!(table = table.name(), "Rolling back insert: {}", e);
                return Err(e);
            }
            commit(tx)
        })
        .await
    }

    /// Creates the table and inserts its records atomically.
    pub async fn load_table(&self, table: &Table) -> Result<()> {
        table.valid()?;
        let table = table.clone();
        self.run(move |conn| {
            let tx = begin(conn)?;
            if let Err(e) = create_in(&tx, &table).and_then(|_| insert_in(&tx, &table)) {
                tracing::warn!(table = table.name(), "Rolling back load: {}", e);
                return Err(e);
            }
            commit(tx)?;
            tracing::info!(
                table = table.name(),
                records = table.records().len(),
                "Loaded table into engine"
            );
            Ok(())
        })
        .await
    }

    /// Runs a row-returning statement. The result is named after the table in
    /// its FROM clause and is not subject to [`Table::valid`].
    pub async fn query(&self, sql: &str) -> Result<Table> {
        let owned = sql.to_string();
        let (header, records) = self.run(move |conn| query_blocking(conn, &owned)).await?;
        Ok(Table::new(extract_table_name(sql), header, records))
    }

    /// Runs a statement and returns the rows affected.
    pub async fn execute_statement(&self, sql: &str) -> Result<u64> {
        let sql = sql.to_string();
        self.run(move |conn| execute_blocking(conn, &sql)).await
    }

    pub fn extract_table_name(&self, sql: &str) -> String {
        extract_table_name(sql)
    }

    pub async fn get_tables(&self) -> Result<Vec<Table>> {
        self.run(|conn| tables_blocking(conn)).await
    }

    pub async fn get_table_ddl(&self, table_name: &str) -> Result<Table> {
        let name = table_name.to_string();
        self.run(move |conn| Ok(ddl_table(&name, describe_blocking(conn, &name)?)))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::sql::engine::EngineFactory;

    fn bridge() -> LocalEngineBridge {
        LocalEngineBridge::new(EngineFactory::shared(EngineFactory::in_memory().unwrap()))
    }

    fn sample() -> Table {
        Table::new(
            "sample",
            vec!["id", "name", "email"],
            vec![
                Record::from(vec!["1", "Gina", "gina@example.com"]),
                Record::from(vec!["2", "Yulia", "yulia@example.com"]),
                Record::from(vec!["3", "O'Brien", "ob@example.com"]),
            ],
        )
    }

    #[test]
    fn test_generated_statements() {
        let table = Table::new("my \"t\"", vec!["a", "b"], vec![Record::from(vec!["x", "it's"])]);
        assert_eq!(
            create_table_statement(&table),
            r#"CREATE TABLE "my ""t""" ("a" TEXT, "b" TEXT)"#
        );
        assert_eq!(
            insert_statement(table.name(), &table.records()[0]),
            r#"INSERT INTO "my ""t""" VALUES ('x', 'it''s')"#
        );
    }

    #[tokio::test]
    async fn test_create_insert_query() {
        let bridge = bridge();
        let table = sample();
        bridge.create_table(&table).await.unwrap();
        bridge.insert_records(&table).await.unwrap();

        let result = bridge.query("SELECT * FROM sample").await.unwrap();
        assert_eq!(result, table);
    }

    #[tokio::test]
    async fn test_invalid_table_is_rejected_before_engine() {
        let bridge = bridge();
        let empty = Table::new("empty", vec!["a"], vec![]);
        let err = bridge.create_table(&empty).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::EmptyRecords);
        assert!(bridge.get_tables().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_table_is_all_or_nothing() {
        let bridge = bridge();
        let broken = Table::new(
            "broken",
            vec!["a", "b"],
            vec![Record::from(vec!["1", "2"]), Record::from(vec!["3"])],
        );
        assert!(bridge.load_table(&broken).await.is_err());
        assert!(bridge.get_tables().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_insert_rolls_back_whole_batch() {
        let bridge = bridge();
        bridge.load_table(&sample()).await.unwrap();

        let bad = Table::new(
            "sample",
            vec!["id", "name", "email"],
            vec![Record::from(vec!["4", "Ken", "k@example.com"]), Record::from(vec!["5"])],
        );
        assert!(bridge.insert_records(&bad).await.is_err());

        let result = bridge.query("SELECT id FROM sample").await.unwrap();
        assert_eq!(result.records().len(), 3);
    }

    #[tokio::test]
    async fn test_statement_without_columns_is_not_a_query() {
        let bridge = bridge();
        bridge.load_table(&sample()).await.unwrap();

        let err = bridge
            .query("UPDATE sample SET name = 'x' WHERE id = '1'")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NoColumns);

        let affected = bridge
            .execute_statement("UPDATE sample SET name = 'x' WHERE id <> '1'")
            .await
            .unwrap();
        assert_eq!(affected, 2);
    }

    #[tokio::test]
    async fn test_statement_runs_every_statement() {
        let bridge = bridge();
        let affected = bridge
            .execute_statement(
                "CREATE TABLE a (x TEXT); INSERT INTO a VALUES ('1'); INSERT INTO a VALUES ('2');",
            )
            .await
            .unwrap();
        assert_eq!(affected, 2);

        let result = bridge.query("SELECT count(*) FROM a").await.unwrap();
        assert_eq!(result.records()[0], Record::from(vec!["2"]));
    }

    #[tokio::test]
    async fn test_failing_later_statement_rolls_back_earlier_ones() {
        let bridge = bridge();
        bridge.load_table(&sample()).await.unwrap();

        let err = bridge
            .execute_statement("DELETE FROM sample; INSERT INTO missing VALUES ('x')")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::EngineFailure);

        let result = bridge.query("SELECT id FROM sample").await.unwrap();
        assert_eq!(result.records().len(), 3);
    }

    #[tokio::test]
    async fn test_query_rejects_trailing_statements() {
        let bridge = bridge();
        bridge.load_table(&sample()).await.unwrap();

        let err = bridge.query("SELECT 1; DROP TABLE sample").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::MultipleStatements);
        assert_eq!(bridge.get_tables().await.unwrap().len(), 1);

        let result = bridge.query("SELECT id FROM sample; -- trailing comment\n").await.unwrap();
        assert_eq!(result.records().len(), 3);
    }

    #[tokio::test]
    async fn test_values_become_text() {
        let bridge = bridge();
        let result = bridge.query("SELECT 1 AS i, 1.5 AS f, NULL AS n, 'x' AS s").await.unwrap();
        assert_eq!(result.records()[0], Record::from(vec!["1", "1.5", "", "x"]));
        assert_eq!(result.name(), "");
    }

    #[tokio::test]
    async fn test_get_tables_and_ddl() {
        let bridge = bridge();
        bridge.load_table(&sample()).await.unwrap();

        let tables = bridge.get_tables().await.unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].name(), "sample");
        assert_eq!(&tables[0].header()[..], ["id", "name", "email"]);
        assert!(tables[0].is_empty_records());

        let ddl = bridge.get_table_ddl("sample").await.unwrap();
        assert_eq!(ddl.records().len(), 3);
        assert_eq!(ddl.records()[0], Record::from(vec!["id", "TEXT", "0", "YES", "", ""]));
    }

    #[tokio::test]
    async fn test_ddl_reports_keys_and_defaults() {
        let bridge = bridge();
        bridge
            .execute_statement(
                "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL DEFAULT 'anon')",
            )
            .await
            .unwrap();

        let ddl = bridge.get_table_ddl("users").await.unwrap();
        assert_eq!(ddl.records()[0], Record::from(vec!["id", "INTEGER", "0", "YES", "", "PRI"]));
        assert_eq!(
            ddl.records()[1],
            Record::from(vec!["name", "TEXT", "0", "NO", "'anon'", ""])
        );
    }
}
