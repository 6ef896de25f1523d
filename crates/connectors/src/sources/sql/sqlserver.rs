use super::remote::{connection_context, Dialect, DialectStrategy};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use flatql_common::config::ConnectionConfig;
use flatql_common::models::{ColumnDescription, Header, Record};
use flatql_error::{ErrorCode, FlatqlError, Result};
use secrecy::ExposeSecret;
use tiberius::{AuthMethod, Client, ColumnData, Config, FromSql, Row};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

type SqlClient = Client<Compat<TcpStream>>;

const LIST_TABLES: &str = "
    SELECT TABLE_NAME FROM INFORMATION_SCHEMA.TABLES
    WHERE TABLE_CATALOG = @P1 AND TABLE_TYPE = 'BASE TABLE'
    ORDER BY TABLE_NAME";

const DESCRIBE_COLUMNS: &str = "
    SELECT c.COLUMN_NAME, c.DATA_TYPE, CAST(ISNULL(c.CHARACTER_MAXIMUM_LENGTH, 0) AS BIGINT),
           c.IS_NULLABLE, ISNULL(c.COLUMN_DEFAULT, ''),
           CASE WHEN EXISTS (
               SELECT 1
               FROM INFORMATION_SCHEMA.TABLE_CONSTRAINTS tc
               JOIN INFORMATION_SCHEMA.KEY_COLUMN_USAGE kcu
                 ON tc.CONSTRAINT_NAME = kcu.CONSTRAINT_NAME
                AND tc.TABLE_SCHEMA = kcu.TABLE_SCHEMA
               WHERE tc.CONSTRAINT_TYPE = 'PRIMARY KEY'
                 AND tc.TABLE_SCHEMA = c.TABLE_SCHEMA
                 AND tc.TABLE_NAME = c.TABLE_NAME
                 AND kcu.COLUMN_NAME = c.COLUMN_NAME
           ) THEN 1 ELSE 0 END
    FROM INFORMATION_SCHEMA.COLUMNS c
    WHERE c.TABLE_CATALOG = @P1 AND c.TABLE_NAME = @P2
    ORDER BY c.ORDINAL_POSITION";

/// SQL Server over `tiberius`, one connection per operation.
pub struct SqlServerStrategy {
    config: ConnectionConfig,
}

impl SqlServerStrategy {
    pub fn new(config: &ConnectionConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    fn err(&self, operation: &str, e: impl std::fmt::Display) -> FlatqlError {
        FlatqlError::new(ErrorCode::EngineFailure, e.to_string())
            .with_context(connection_context(operation, &self.config))
    }

    async fn connect(&self, operation: &str) -> Result<SqlClient> {
        let connect_err = |e: &dyn std::fmt::Display| {
            FlatqlError::new(ErrorCode::ConnectionFailed, e.to_string())
                .with_context(connection_context(operation, &self.config))
        };

        let mut config = Config::new();
        config.host(&self.config.host);
        config.port(self.config.port_or_default());
        config.database(&self.config.database);
        config.authentication(AuthMethod::sql_server(
            &self.config.user,
            self.config.password.expose_secret(),
        ));
        config.trust_cert();

        let tcp = TcpStream::connect(config.get_addr())
            .await
            .map_err(|e| connect_err(&e))?;
        tcp.set_nodelay(true).map_err(|e| connect_err(&e))?;

        Client::connect(config, tcp.compat_write())
            .await
            .map_err(|e| connect_err(&e))
    }

    async fn batch(&self, client: &mut SqlClient, statement: &str) -> Result<()> {
        client
            .simple_query(statement)
            .await
            .map_err(|e| self.err(statement, &e))?
            .into_results()
            .await
            .map_err(|e| self.err(statement, &e))?;
        Ok(())
    }

    /// Ends a `BEGIN TRAN` block: commits on success, rolls back on error.
    async fn finish<T>(
        &self,
        client: &mut SqlClient,
        result: Result<T>,
    ) -> Result<T> {
        match result {
            Ok(value) => {
                self.batch(client, "COMMIT").await?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = self.batch(client, "ROLLBACK").await {
                    tracing::warn!("Rollback failed: {}", rollback);
                }
                Err(e)
            }
        }
    }

    async fn run_query(&self, client: &mut SqlClient, sql: &str) -> Result<(Header, Vec<Record>)> {
        let mut stream = client
            .simple_query(sql)
            .await
            .map_err(|e| self.err("query", &e))?;

        let header: Vec<String> = stream
            .columns()
            .await
            .map_err(|e| self.err("query", &e))?
            .map(|cols| cols.iter().map(|c| c.name().to_string()).collect())
            .unwrap_or_default();

        let rows = stream
            .into_first_result()
            .await
            .map_err(|e| self.err("query", &e))?;

        if header.is_empty() {
            return Err(FlatqlError::new(ErrorCode::NoColumns, "query returned no columns")
                .for_query("query", sql));
        }

        Ok((Header::new(header), rows.into_iter().map(row_to_record).collect()))
    }
}

/// Renders a temporal value through its `chrono` type.
fn temporal_to_string<'a, T>(data: &'a ColumnData<'static>) -> String
where
    T: FromSql<'a> + std::fmt::Display,
{
    match T::from_sql(data) {
        Ok(value) => value.map(|v| v.to_string()).unwrap_or_default(),
        Err(e) => {
            tracing::warn!("Unreadable temporal value: {}", e);
            String::new()
        }
    }
}

/// Renders a SQL Server value as text. NULL becomes the empty string.
fn column_to_string(data: ColumnData<'static>) -> String {
    match data {
        ColumnData::U8(v) => v.map(|v| v.to_string()).unwrap_or_default(),
        ColumnData::I16(v) => v.map(|v| v.to_string()).unwrap_or_default(),
        ColumnData::I32(v) => v.map(|v| v.to_string()).unwrap_or_default(),
        ColumnData::I64(v) => v.map(|v| v.to_string()).unwrap_or_default(),
        ColumnData::F32(v) => v.map(|v| v.to_string()).unwrap_or_default(),
        ColumnData::F64(v) => v.map(|v| v.to_string()).unwrap_or_default(),
        ColumnData::Bit(v) => v.map(|v| u8::from(v).to_string()).unwrap_or_default(),
        ColumnData::String(v) => v.map(|v| v.into_owned()).unwrap_or_default(),
        ColumnData::Guid(v) => v.map(|v| v.to_string()).unwrap_or_default(),
        ColumnData::Numeric(v) => v.map(|v| v.to_string()).unwrap_or_default(),
        ColumnData::Binary(v) => v
            .map(|v| String::from_utf8_lossy(&v).into_owned())
            .unwrap_or_default(),
        ColumnData::Xml(v) => v.map(|v| v.to_string()).unwrap_or_default(),
        ColumnData::Date(_) => temporal_to_string::<NaiveDate>(&data),
        ColumnData::Time(_) => temporal_to_string::<NaiveTime>(&data),
        ColumnData::DateTime(_) | ColumnData::SmallDateTime(_) | ColumnData::DateTime2(_) => {
            temporal_to_string::<NaiveDateTime>(&data)
        }
        ColumnData::DateTimeOffset(_) => temporal_to_string::<DateTime<FixedOffset>>(&data),
    }
}

fn row_to_record(row: Row) -> Record {
    Record::new(row.into_iter().map(column_to_string).collect())
}

#[async_trait]
impl DialectStrategy for SqlServerStrategy {
    fn dialect(&self) -> Dialect {
        Dialect::SqlServer
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        let mut client = self.connect("list_tables").await?;
        let rows = client
            .query(LIST_TABLES, &[&self.config.database.as_str()])
            .await
            .map_err(|e| self.err("list_tables", &e))?
            .into_first_result()
            .await
            .map_err(|e| self.err("list_tables", &e))?;

        Ok(rows
            .iter()
            .filter_map(|row| row.get::<&str, _>(0).map(str::to_string))
            .collect())
    }

    async fn describe_columns(&self, table: &str) -> Result<Vec<ColumnDescription>> {
        let mut client = self.connect("describe_columns").await?;
        let rows = client
            .query(DESCRIBE_COLUMNS, &[&self.config.database.as_str(), &table])
            .await
            .map_err(|e| self.err("describe_columns", &e))?
            .into_first_result()
            .await
            .map_err(|e| self.err("describe_columns", &e))?;

        rows.iter()
            .map(|row| {
                let text = |i: usize| -> std::result::Result<String, tiberius::error::Error> {
                    Ok(row.try_get::<&str, _>(i)?.unwrap_or_default().to_string())
                };
                let column = || -> std::result::Result<ColumnDescription, tiberius::error::Error> {
                    Ok(ColumnDescription {
                        name: text(0)?,
                        data_type: text(1)?,
                        precision: row.try_get::<i64, _>(2)?.unwrap_or_default(),
                        nullable: text(3)? == "YES",
                        default_value: text(4)?,
                        primary_key: row.try_get::<i32, _>(5)?.unwrap_or_default() == 1,
                    })
                };
                column().map_err(|e| self.err("describe_columns", &e))
            })
            .collect()
    }

    async fn query(&self, sql: &str) -> Result<(Header, Vec<Record>)> {
        let mut client = self.connect("query").await?;
        self.batch(&mut client, "BEGIN TRAN").await?;
        let result = self.run_query(&mut client, sql).await;
        self.finish(&mut client, result).await
    }

    async fn execute(&self, sql: &str) -> Result<u64> {
        let mut client = self.connect("execute").await?;
        self.batch(&mut client, "BEGIN TRAN").await?;
        let result = client
            .execute(sql, &[])
            .await
            .map(|r| r.total())
            .map_err(|e| self.err("execute", &e));
        self.finish(&mut client, result).await
    }
}
