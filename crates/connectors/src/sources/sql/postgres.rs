use super::remote::{connection_context, Dialect, DialectStrategy};
use async_trait::async_trait;
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use flatql_common::config::ConnectionConfig;
use flatql_common::models::{ColumnDescription, Header, Record};
use flatql_error::{ErrorCode, FlatqlError, Result};
use secrecy::ExposeSecret;
use tokio_postgres::config::SslMode;
use tokio_postgres::{NoTls, SimpleQueryMessage};

// Tables in the user's schema plus `public`.
const LIST_TABLES: &str = "
    SELECT table_name::text
    FROM information_schema.tables
    WHERE (table_schema = $1 OR table_schema = 'public') AND table_type = 'BASE TABLE'
    ORDER BY table_name";

const DESCRIBE_COLUMNS: &str = "
    SELECT c.column_name::text,
           c.data_type::text,
           COALESCE(c.character_maximum_length, 0)::bigint,
           c.is_nullable::text,
           COALESCE(c.column_default, '')::text,
           EXISTS (
               SELECT 1
               FROM information_schema.table_constraints tc
               JOIN information_schema.key_column_usage kcu
                 ON tc.constraint_name = kcu.constraint_name
                AND tc.table_schema = kcu.table_schema
               WHERE tc.constraint_type = 'PRIMARY KEY'
                 AND tc.table_schema = c.table_schema
                 AND tc.table_name = c.table_name
                 AND kcu.column_name = c.column_name
           )
    FROM information_schema.columns c
    WHERE (c.table_schema = $1 OR c.table_schema = 'public') AND c.table_name = $2
    ORDER BY c.ordinal_position";

const DEFAULT_POOL_SIZE: usize = 4;

/// PostgreSQL over a `deadpool-postgres` pool. TLS is disabled.
pub struct PostgresStrategy {
    config: ConnectionConfig,
    pool: Pool,
}

impl PostgresStrategy {
    pub fn new(config: &ConnectionConfig) -> Result<Self> {
        let mut pg = tokio_postgres::Config::new();
        pg.host(&config.host)
            .port(config.port_or_default())
            .user(&config.user)
            .password(config.password.expose_secret())
            .dbname(&config.database)
            .ssl_mode(SslMode::Disable);

        let manager = Manager::from_config(
            pg,
            NoTls,
            ManagerConfig {
                recycling_method: RecyclingMethod::Fast,
            },
        );
        let pool = Pool::builder(manager)
            .max_size(DEFAULT_POOL_SIZE)
            .build()
            .map_err(|e| {
                FlatqlError::new(ErrorCode::InvalidConfig, e.to_string())
                    .with_context(connection_context("build_pool", config))
            })?;

        Ok(Self {
            config: config.clone(),
            pool,
        })
    }

    fn err(&self, operation: &str, e: impl std::fmt::Display) -> FlatqlError {
        FlatqlError::new(ErrorCode::EngineFailure, e.to_string())
            .with_context(connection_context(operation, &self.config))
    }

    async fn client(&self, operation: &str) -> Result<deadpool_postgres::Object> {
        self.pool.get().await.map_err(|e| {
            FlatqlError::new(ErrorCode::ConnectionFailed, e.to_string())
                .with_context(connection_context(operation, &self.config))
        })
    }
}

#[async_trait]
impl DialectStrategy for PostgresStrategy {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        let client = self.client("list_tables").await?;
        let rows = client
            .query(LIST_TABLES, &[&self.config.user])
            .await
            .map_err(|e| self.err("list_tables", e))?;

        rows.iter()
            .map(|row| row.try_get(0).map_err(|e| self.err("list_tables", e)))
            .collect()
    }

    async fn describe_columns(&self, table: &str) -> Result<Vec<ColumnDescription>> {
        let client = self.client("describe_columns").await?;
        let rows = client
            .query(DESCRIBE_COLUMNS, &[&self.config.user, &table])
            .await
            .map_err(|e| self.err("describe_columns", e))?;

        rows.iter()
            .map(|row| {
                let column = || -> std::result::Result<ColumnDescription, tokio_postgres::Error> {
                    Ok(ColumnDescription {
                        name: row.try_get(0)?,
                        data_type: row.try_get(1)?,
                        precision: row.try_get(2)?,
                        nullable: row.try_get::<_, String>(3)? == "YES",
                        default_value: row.try_get(4)?,
                        primary_key: row.try_get(5)?,
                    })
                };
                column().map_err(|e| self.err("describe_columns", e))
            })
            .collect()
    }

    async fn query(&self, sql: &str) -> Result<(Header, Vec<Record>)> {
        let mut client = self.client("query").await?;
        let tx = client
            .transaction()
            .await
            .map_err(|e| self.err("begin", e))?;

        // The simple protocol returns every value as text.
        let messages = tx
            .simple_query(sql)
            .await
            .map_err(|e| self.err("query", e))?;

        let mut header: Vec<String> = Vec::new();
        let mut records = Vec::new();
        for message in messages {
            match message {
                SimpleQueryMessage::RowDescription(columns) => {
                    header = columns.iter().map(|c| c.name().to_string()).collect();
                }
                SimpleQueryMessage::Row(row) => {
                    if header.is_empty() {
                        header = row.columns().iter().map(|c| c.name().to_string()).collect();
                    }
                    records.push(Record::new(
                        (0..row.len())
                            .map(|i| row.get(i).unwrap_or_default().to_string())
                            .collect(),
                    ));
                }
                _ => {}
            }
        }

        if header.is_empty() {
            tx.rollback().await.map_err(|e| self.err("rollback", e))?;
            return Err(FlatqlError::new(ErrorCode::NoColumns, "query returned no columns")
                .for_query("query", sql));
        }

        tx.commit().await.map_err(|e| self.err("commit", e))?;
        Ok((Header::new(header), records))
    }

    async fn execute(&self, sql: &str) -> Result<u64> {
        let mut client = self.client("execute").await?;
        let tx = client
            .transaction()
            .await
            .map_err(|e| self.err("begin", e))?;

        let affected = tx
            .execute(sql, &[])
            .await
            .map_err(|e| self.err("execute", e))?;

        tx.commit().await.map_err(|e| self.err("commit", e))?;
        Ok(affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    #[tokio::test]
    async fn test_pool_is_built_without_connecting() {
        let config = ConnectionConfig {
            name: "warehouse".to_string(),
            dialect: "postgres".to_string(),
            host: "db.invalid".to_string(),
            port: None,
            user: "analyst".to_string(),
            password: SecretString::from("secret".to_string()),
            database: "dw".to_string(),
        };
        let strategy = PostgresStrategy::new(&config).unwrap();
        assert_eq!(strategy.dialect(), Dialect::Postgres);
        assert_eq!(strategy.pool.status().size, 0);
    }
}
