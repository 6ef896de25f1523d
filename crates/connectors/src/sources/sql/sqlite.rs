use super::engine::EngineFactory;
use super::local::{describe_blocking, execute_blocking, list_tables_blocking, query_blocking};
use super::remote::{connection_context, Dialect, DialectStrategy};
use async_trait::async_trait;
use flatql_common::config::ConnectionConfig;
use flatql_common::models::{ColumnDescription, Header, Record};
use flatql_error::{ErrorCode, FlatqlError, Result};
use rusqlite::Connection;
use std::path::PathBuf;

/// A file-backed SQLite database. `database` is the path of an existing file.
pub struct SqliteStrategy {
    config: ConnectionConfig,
    path: PathBuf,
}

impl SqliteStrategy {
    pub fn new(config: &ConnectionConfig) -> Self {
        Self {
            config: config.clone(),
            path: PathBuf::from(&config.database),
        }
    }

    /// Opens the database for one operation on the blocking pool.
    async fn with_connection<T, F>(&self, operation: &'static str, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    {
        let path = self.path.clone();
        let context = connection_context(operation, &self.config);
        tokio::task::spawn_blocking(move || {
            let mut conn = EngineFactory::open_existing(&path)?;
            op(&mut conn)
        })
        .await
        .map_err(|e| FlatqlError::new(ErrorCode::InternalPanic, e.to_string()))?
        .map_err(|e| match e.context {
            Some(_) => e,
            None => e.with_context(context),
        })
    }
}

#[async_trait]
impl DialectStrategy for SqliteStrategy {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        self.with_connection("list_tables", |conn| list_tables_blocking(conn))
            .await
    }

    async fn describe_columns(&self, table: &str) -> Result<Vec<ColumnDescription>> {
        let table = table.to_string();
        self.with_connection("describe_columns", move |conn| describe_blocking(conn, &table))
            .await
    }

    async fn query(&self, sql: &str) -> Result<(Header, Vec<Record>)> {
        let sql = sql.to_string();
        self.with_connection("query", move |conn| query_blocking(conn, &sql))
            .await
    }

    async fn execute(&self, sql: &str) -> Result<u64> {
        let sql = sql.to_string();
        self.with_connection("execute", move |conn| execute_blocking(conn, &sql))
            .await
    }
}
