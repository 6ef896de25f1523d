//! Statement routing.
//!
//! Each statement ends in exactly one of two paths: the query path, which
//! yields a [`Table`], or the statement path, which yields a row count. The
//! choice is made from the first keyword only.

use async_trait::async_trait;
use flatql_common::models::Table;
use flatql_common::sql::Sql;
use flatql_common::telemetry::QUERY_TARGET;
use flatql_connectors::sources::sql::{LocalEngineBridge, RemoteEngineAdapter};
use flatql_error::Result;
use serde::Serialize;
use std::sync::Arc;

/// Anything that can run both kinds of statement.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    async fn query(&self, sql: &str) -> Result<Table>;
    async fn execute(&self, sql: &str) -> Result<u64>;
}

#[async_trait]
impl SqlExecutor for LocalEngineBridge {
    async fn query(&self, sql: &str) -> Result<Table> {
        LocalEngineBridge::query(self, sql).await
    }

    async fn execute(&self, sql: &str) -> Result<u64> {
        self.execute_statement(sql).await
    }
}

#[async_trait]
impl SqlExecutor for RemoteEngineAdapter {
    async fn query(&self, sql: &str) -> Result<Table> {
        self.execute_query(sql).await
    }

    async fn execute(&self, sql: &str) -> Result<u64> {
        self.execute_statement(sql).await
    }
}

/// Which statements take the query path.
///
/// `WITH` only returns rows remotely; the embedded engine runs it as a
/// statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionPolicy {
    Local,
    Remote,
}

impl ExecutionPolicy {
    pub fn returns_rows(&self, sql: &Sql) -> bool {
        match self {
            ExecutionPolicy::Local => sql.is_select() || sql.is_explain(),
            ExecutionPolicy::Remote => sql.is_select() || sql.is_explain() || sql.is_with(),
        }
    }
}

/// Result of one routed statement: a table or a row count, never both.
///
/// Serializes as `{"table": {...}}` or `{"rows_affected": n}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionOutput {
    Table(Table),
    RowsAffected(u64),
}

impl ExecutionOutput {
    pub fn rows(table: Table) -> Self {
        ExecutionOutput::Table(table)
    }

    pub fn affected(rows_affected: u64) -> Self {
        ExecutionOutput::RowsAffected(rows_affected)
    }

    pub fn has_table(&self) -> bool {
        matches!(self, ExecutionOutput::Table(_))
    }

    pub fn table(&self) -> Option<&Table> {
        match self {
            ExecutionOutput::Table(table) => Some(table),
            ExecutionOutput::RowsAffected(_) => None,
        }
    }

    pub fn into_table(self) -> Option<Table> {
        match self {
            ExecutionOutput::Table(table) => Some(table),
            ExecutionOutput::RowsAffected(_) => None,
        }
    }

    /// `None` for a query result.
    pub fn rows_affected(&self) -> Option<u64> {
        match self {
            ExecutionOutput::Table(_) => None,
            ExecutionOutput::RowsAffected(n) => Some(*n),
        }
    }
}

#[derive(Clone)]
pub struct ExecutionRouter {
    executor: Arc<dyn SqlExecutor>,
    policy: ExecutionPolicy,
}

impl ExecutionRouter {
    pub fn new(executor: Arc<dyn SqlExecutor>, policy: ExecutionPolicy) -> Self {
        Self { executor, policy }
    }

    pub fn local(bridge: LocalEngineBridge) -> Self {
        Self::new(Arc::new(bridge), ExecutionPolicy::Local)
    }

    pub fn remote(adapter: RemoteEngineAdapter) -> Self {
        Self::new(Arc::new(adapter), ExecutionPolicy::Remote)
    }

    pub fn policy(&self) -> ExecutionPolicy {
        self.policy
    }

    /// Classifies `sql` and runs it on the matching path.
    ///
    /// Empty input fails with `EmptyQuery` before reaching the executor.
    pub async fn execute(&self, sql: &str) -> Result<ExecutionOutput> {
        let statement = Sql::try_from(sql)?;

        if self.policy.returns_rows(&statement) {
            tracing::debug!(target: QUERY_TARGET, policy = ?self.policy, path = "query", sql = %sql);
            let table = self.executor.query(sql).await?;
            Ok(ExecutionOutput::rows(table))
        } else {
            tracing::debug!(target: QUERY_TARGET, policy = ?self.policy, path = "statement", sql = %sql);
            let affected = self.executor.execute(sql).await?;
            Ok(ExecutionOutput::affected(affected))
        }
    }
}
