//! Uniform access to remote databases.
//!
//! A [`RemoteEngineAdapter`] picks one [`DialectStrategy`] when it is built.
//! Strategies own their catalog SQL and bind order; the adapter projects every
//! result into [`Table`]s.

use super::extract_table_name;
use async_trait::async_trait;
use flatql_common::config::ConnectionConfig;
use flatql_common::models::{ddl_table, ColumnDescription, Header, Record, Table};
use flatql_error::{find_closest_match, ErrorCode, ErrorContext, FlatqlError, Result};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Sqlite,
    MySql,
    Postgres,
    SqlServer,
}

impl Dialect {
    pub const NAMES: [&'static str; 4] = ["sqlite", "mysql", "postgres", "sqlserver"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Sqlite => "sqlite",
            Dialect::MySql => "mysql",
            Dialect::Postgres => "postgres",
            Dialect::SqlServer => "sqlserver",
        }
    }

    /// Accepts the canonical names plus common aliases, case-insensitively.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "sqlite" | "sqlite3" => Some(Dialect::Sqlite),
            "mysql" => Some(Dialect::MySql),
            "postgres" | "postgresql" => Some(Dialect::Postgres),
            "sqlserver" | "mssql" => Some(Dialect::SqlServer),
            _ => None,
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = FlatqlError;

    fn from_str(s: &str) -> Result<Self> {
        Dialect::parse(s).ok_or_else(|| unsupported_dialect(s))
    }
}

fn unsupported_dialect(name: &str) -> FlatqlError {
    let known: Vec<String> = Dialect::NAMES.iter().map(|n| n.to_string()).collect();
    let err = FlatqlError::new(
        ErrorCode::UnsupportedDialect,
        format!("unsupported dialect: {}", name),
    );
    match find_closest_match(&name.to_ascii_lowercase(), &known) {
        Some(close) => err.with_hint(format!("Did you mean '{}'?", close)),
        None => err.with_hint(format!("supported dialects: {}", Dialect::NAMES.join(", "))),
    }
}

/// Error context naming the backend an operation ran against.
pub(crate) fn connection_context(operation: &str, config: &ConnectionConfig) -> ErrorContext {
    ErrorContext::Connection {
        operation: operation.to_string(),
        dialect: config.dialect.clone(),
        host: (!config.host.is_empty()).then(|| config.host.clone()),
        port: config.port.or_else(|| match config.port_or_default() {
            0 => None,
            p => Some(p),
        }),
    }
}

/// Backend-specific catalog queries and execution.
///
/// `query` and `execute` each run inside one transaction.
#[async_trait]
pub trait DialectStrategy: Send + Sync {
    fn dialect(&self) -> Dialect;

    /// Base table names visible to the connection.
    async fn list_tables(&self) -> Result<Vec<String>>;

    /// Catalog metadata for every column of `table`, in ordinal order.
    async fn describe_columns(&self, table: &str) -> Result<Vec<ColumnDescription>>;

    async fn list_columns(&self, table: &str) -> Result<Vec<String>> {
        Ok(self
            .describe_columns(table)
            .await?
            .into_iter()
            .map(|c| c.name)
            .collect())
    }

    /// Runs a row-returning statement; values are rendered as text.
    async fn query(&self, sql: &str) -> Result<(Header, Vec<Record>)>;

    /// Runs a statement and returns the rows affected.
    async fn execute(&self, sql: &str) -> Result<u64>;
}

fn build_strategy(dialect: Dialect, config: &ConnectionConfig) -> Result<Arc<dyn DialectStrategy>> {
    let strategy: Arc<dyn DialectStrategy> = match dialect {
        Dialect::Sqlite => Arc::new(super::sqlite::SqliteStrategy::new(config)),
        Dialect::MySql => Arc::new(super::mysql::MySqlStrategy::new(config)),
        Dialect::Postgres => Arc::new(super::postgres::PostgresStrategy::new(config)?),
        Dialect::SqlServer => Arc::new(super::sqlserver::SqlServerStrategy::new(config)),
    };
    Ok(strategy)
}

/// Runs the four remote operations against one configured connection.
#[derive(Clone)]
pub struct RemoteEngineAdapter {
    dialect_name: String,
    strategy: Option<Arc<dyn DialectStrategy>>,
}

impl RemoteEngineAdapter {
    /// Picks the strategy for `config.dialect`.
    ///
    /// No connection is opened here. An unknown dialect still yields an
    /// adapter; its operations all fail with `UnsupportedDialect`.
    pub fn new(config: &ConnectionConfig) -> Result<Self> {
        let strategy = match Dialect::parse(&config.dialect) {
            Some(dialect) => {
                tracing::info!(
                    connection = %config.name,
                    dialect = %dialect,
                    host = %config.host,
                    "Configured remote connection"
                );
                Some(build_strategy(dialect, config)?)
            }
            None => {
                tracing::warn!(
                    connection = %config.name,
                    dialect = %config.dialect,
                    "Unsupported dialect"
                );
                None
            }
        };

        Ok(Self {
            dialect_name: config.dialect.clone(),
            strategy,
        })
    }

    pub fn with_strategy(strategy: Arc<dyn DialectStrategy>) -> Self {
        Self {
            dialect_name: strategy.dialect().to_string(),
            strategy: Some(strategy),
        }
    }

    pub fn dialect(&self) -> Option<Dialect> {
        self.strategy.as_ref().map(|s| s.dialect())
    }

    fn strategy(&self) -> Result<&dyn DialectStrategy> {
        self.strategy
            .as_deref()
            .ok_or_else(|| unsupported_dialect(&self.dialect_name))
    }

    /// One schema-only table (header, no records) per base table.
    pub async fn get_tables(&self) -> Result<Vec<Table>> {
        let strategy = self.strategy()?;
        let mut tables = Vec::new();
        for name in strategy.list_tables().await? {
            let columns = strategy.list_columns(&name).await?;
            tables.push(Table::new(name, columns, Vec::new()));
        }
        Ok(tables)
    }

    pub async fn get_table_ddl(&self, table_name: &str) -> Result<Table> {
        let columns = self.strategy()?.describe_columns(table_name).await?;
        Ok(ddl_table(table_name, columns))
    }

    /// Runs a row-returning statement; the result is named after its FROM table.
    pub async fn execute_query(&self, sql: &str) -> Result<Table> {
        let (header, records) = self.strategy()?.query(sql).await?;
        Ok(Table::new(extract_table_name(sql), header, records))
    }

    pub async fn execute_statement(&self, sql: &str) -> Result<u64> {
        self.strategy()?.execute(sql).await
    }

    pub fn extract_table_name(&self, sql: &str) -> String {
        extract_table_name(sql)
    }
}
