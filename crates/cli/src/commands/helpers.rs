//! Shared helpers and result types for CLI commands.

use anyhow::Result;
use flatql_common::config::{AppConfig, ConnectionProvider, StaticConnections};
use flatql_common::models::Table;
use flatql_connectors::sources::file::OpendalObjectStore;
use flatql_connectors::sources::sql::RemoteEngineAdapter;
use flatql_runtime::ingest::WorkspaceOptions;
use flatql_runtime::Workspace;
use serde::Serialize;
use std::sync::Arc;

/// Where a catalog command looks.
pub enum Source<'a> {
    Files(&'a [String]),
    Connection(&'a str),
}

/// Loads `files` into a new workspace. Ctrl-C cancels remote transfers.
pub async fn open_workspace(files: &[String], config: &AppConfig) -> Result<Workspace> {
    let mut workspace = Workspace::new(WorkspaceOptions {
        http: config.http.clone(),
        object_store: Some(Arc::new(OpendalObjectStore::new(&config.s3))),
    })?;

    let token = workspace.cancellation_token();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling transfers");
            token.cancel();
        }
    });

    let loaded = workspace.load_files(files).await;
    watcher.abort();
    loaded?;
    Ok(workspace)
}

pub fn open_connection(name: &str, config: &AppConfig) -> Result<RemoteEngineAdapter> {
    let connection = StaticConnections::from(config).connection(name)?;
    Ok(RemoteEngineAdapter::new(&connection)?)
}

// ===== Result Types =====

#[derive(Serialize)]
pub struct TablesResult {
    pub tables: Vec<Table>,
}

#[derive(Serialize)]
pub struct DdlResult {
    pub ddl: Table,
}

#[derive(Serialize)]
pub struct ExportResult {
    pub destination: String,
    pub records: usize,
}
