use super::remote::{connection_context, Dialect, DialectStrategy};
use async_trait::async_trait;
use flatql_common::config::ConnectionConfig;
use flatql_common::models::{ColumnDescription, Header, Record};
use flatql_error::{ErrorCode, FlatqlError, Result};
use mysql_async::prelude::Queryable;
use mysql_async::{OptsBuilder, Pool, Row, TxOpts, Value};
use secrecy::ExposeSecret;

const LIST_TABLES: &str = "
    SELECT TABLE_NAME FROM information_schema.tables
    WHERE table_schema = ? AND TABLE_TYPE = 'BASE TABLE'
    ORDER BY TABLE_NAME";

const DESCRIBE_COLUMNS: &str = "
    SELECT COLUMN_NAME, DATA_TYPE, CAST(IFNULL(CHARACTER_MAXIMUM_LENGTH, 0) AS SIGNED),
           IS_NULLABLE, IFNULL(COLUMN_DEFAULT, ''), COLUMN_KEY
    FROM information_schema.columns
    WHERE table_schema = ? AND table_name = ?
    ORDER BY ORDINAL_POSITION";

/// MySQL over a lazily connecting `mysql_async` pool.
pub struct MySqlStrategy {
    config: ConnectionConfig,
    pool: Pool,
}

impl MySqlStrategy {
    pub fn new(config: &ConnectionConfig) -> Self {
        let opts = OptsBuilder::default()
            .ip_or_hostname(config.host.clone())
            .tcp_port(config.port_or_default())
            .user(Some(config.user.clone()))
            .pass(Some(config.password.expose_secret().to_string()))
            .db_name(Some(config.database.clone()))
            .init(vec!["SET NAMES utf8mb4 COLLATE utf8mb4_unicode_ci"]);

        Self {
            config: config.clone(),
            pool: Pool::new(opts),
        }
    }

    fn err(&self, operation: &str, e: impl std::fmt::Display) -> FlatqlError {
        FlatqlError::new(ErrorCode::EngineFailure, e.to_string())
            .with_context(connection_context(operation, &self.config))
    }

    async fn conn(&self, operation: &str) -> Result<mysql_async::Conn> {
        self.pool.get_conn().await.map_err(|e| {
            FlatqlError::new(ErrorCode::ConnectionFailed, e.to_string())
                .with_context(connection_context(operation, &self.config))
        })
    }
}

/// Renders a MySQL value as text. NULL becomes the empty string.
fn value_to_string(value: &Value) -> String {
    match value {
        Value::NULL => String::new(),
        Value::Bytes(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        Value::Int(i) => i.to_string(),
        Value::UInt(u) => u.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Double(d) => d.to_string(),
        Value::Date(y, mo, d, h, mi, s, us) => {
            if *us > 0 {
                format!("{:04}-{:02}-{:02} {:02}:{:02}:{:02}.{:06}", y, mo, d, h, mi, s, us)
            } else {
                format!("{:04}-{:02}-{:02} {:02}:{:02}:{:02}", y, mo, d, h, mi, s)
            }
        }
        Value::Time(neg, days, h, mi, s, us) => {
            let hours = *days * 24 + u32::from(*h);
            let sign = if *neg { "-" } else { "" };
            if *us > 0 {
                format!("{}{:02}:{:02}:{:02}.{:06}", sign, hours, mi, s, us)
            } else {
                format!("{}{:02}:{:02}:{:02}", sign, hours, mi, s)
            }
        }
    }
}

fn row_to_record(row: &Row) -> Record {
    Record::new(
        (0..row.len())
            .map(|i| row.as_ref(i).map(value_to_string).unwrap_or_default())
            .collect(),
    )
}

#[async_trait]
impl DialectStrategy for MySqlStrategy {
    fn dialect(&self) -> Dialect {
        Dialect::MySql
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        let mut conn = self.conn("list_tables").await?;
        conn.exec(LIST_TABLES, (self.config.database.as_str(),))
            .await
            .map_err(|e| self.err("list_tables", e))
    }

    async fn describe_columns(&self, table: &str) -> Result<Vec<ColumnDescription>> {
        let mut conn = self.conn("describe_columns").await?;
        let rows: Vec<(String, String, i64, String, String, String)> = conn
            .exec(DESCRIBE_COLUMNS, (self.config.database.as_str(), table))
            .await
            .map_err(|e| self.err("describe_columns", e))?;

        Ok(rows
            .into_iter()
            .map(|(name, data_type, precision, nullable, default_value, key)| ColumnDescription {
                name,
                data_type,
                precision,
                nullable: nullable.eq_ignore_ascii_case("YES"),
                default_value,
                primary_key: key == "PRI",
            })
            .collect())
    }

    async fn query(&self, sql: &str) -> Result<(Header, Vec<Record>)> {
        let mut conn = self.conn("query").await?;
        let mut tx = conn
            .start_transaction(TxOpts::default())
            .await
            .map_err(|e| self.err("begin", e))?;

        let (columns, rows) = {
            let mut result = tx.query_iter(sql).await.map_err(|e| self.err("query", e))?;
            let columns: Vec<String> = result
                .columns()
                .map(|cols| cols.iter().map(|c| c.name_str().into_owned()).collect())
                .unwrap_or_default();
            let rows: Vec<Row> = result.collect().await.map_err(|e| self.err("query", e))?;
            (columns, rows)
        };

        if columns.is_empty() {
            tx.rollback().await.map_err(|e| self.err("rollback", e))?;
            return Err(FlatqlError::new(ErrorCode::NoColumns, "query returned no columns")
                .for_query("query", sql));
        }

        tx.commit().await.map_err(|e| self.err("commit", e))?;
        Ok((Header::new(columns), rows.iter().map(row_to_record).collect()))
    }

    async fn execute(&self, sql: &str) -> Result<u64> {
        let mut conn = self.conn("execute").await?;
        let mut tx = conn
            .start_transaction(TxOpts::default())
            .await
            .map_err(|e| self.err("begin", e))?;

        let affected = {
            let result = tx.query_iter(sql).await.map_err(|e| self.err("execute", e))?;
            let affected = result.affected_rows();
            result.drop_result().await.map_err(|e| self.err("execute", e))?;
            affected
        };

        tx.commit().await.map_err(|e| self.err("commit", e))?;
        Ok(affected)
    }
}
