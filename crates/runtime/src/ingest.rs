//! File ingestion into the embedded engine.
//!
//! A [`Workspace`] owns the single engine connection for a session. Files are
//! fetched concurrently, then loaded one at a time, each in its own
//! all-or-nothing transaction.

use crate::router::ExecutionRouter;
use flatql_common::config::HttpConfig;
use flatql_common::file::File;
use flatql_common::models::Table;
use flatql_connectors::sources::file::{write_table, FormatReader, ObjectStoreClient};
use flatql_connectors::sources::sql::{EngineFactory, LocalEngineBridge};
use flatql_error::{ErrorCode, FlatqlError, Result};
use futures::future::try_join_all;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Default)]
pub struct WorkspaceOptions {
    pub http: HttpConfig,
    pub object_store: Option<Arc<dyn ObjectStoreClient>>,
}

/// The local engine plus the tables loaded into it.
pub struct Workspace {
    bridge: LocalEngineBridge,
    reader: FormatReader,
    tables: Vec<String>,
}

impl Workspace {
    pub fn new(options: WorkspaceOptions) -> Result<Self> {
        let mut reader = FormatReader::new(&options.http)?;
        if let Some(store) = options.object_store {
            reader = reader.with_object_store(store);
        }
        Self::with_reader(reader)
    }

    pub fn with_reader(reader: FormatReader) -> Result<Self> {
        let bridge = LocalEngineBridge::new(EngineFactory::shared(EngineFactory::in_memory()?));
        Ok(Self {
            bridge,
            reader,
            tables: Vec::new(),
        })
    }

    pub fn bridge(&self) -> &LocalEngineBridge {
        &self.bridge
    }

    /// Names of the tables loaded so far, in load order.
    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    /// Cancels in-flight remote transfers.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.reader.cancellation_token()
    }

    pub fn router(&self) -> ExecutionRouter {
        ExecutionRouter::local(self.bridge.clone())
    }

    /// Reads and loads one file; returns the table name.
    pub async fn load_file(&mut self, location: &str) -> Result<String> {
        let file = File::new(location)?;
        let table = self.reader.read(&file).await?;
        self.load(table).await
    }

    /// Reads every file before loading any of them.
    ///
    /// A read failure loads nothing. A load failure leaves the earlier tables
    /// in place.
    pub async fn load_files<S: AsRef<str>>(&mut self, locations: &[S]) -> Result<Vec<String>> {
        let files = locations
            .iter()
            .map(|l| File::new(l.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        let reader = &self.reader;
        let tables = try_join_all(files.iter().map(|f| reader.read(f))).await?;

        let mut names = Vec::with_capacity(tables.len());
        for table in tables {
            names.push(self.load(table).await?);
        }
        Ok(names)
    }

    async fn load(&mut self, table: Table) -> Result<String> {
        if self.tables.iter().any(|t| t == table.name()) {
            return Err(FlatqlError::new(
                ErrorCode::EngineFailure,
                format!("table '{}' is already loaded", table.name()),
            )
            .for_table("load_table", table.name())
            .with_hint("two sources share a base name; rename one of the files"));
        }

        self.bridge.load_table(&table).await?;
        let name = table.name().to_string();
        self.tables.push(name.clone());
        Ok(name)
    }

    /// Runs `sql` on the local engine and writes the result to `destination`.
    ///
    /// Returns the number of records written.
    pub async fn export(&self, sql: &str, destination: &str) -> Result<usize> {
        let file = File::new(destination)?;
        let table = self.bridge.query(sql).await?;
        let written = table.records().len();

        tokio::task::spawn_blocking(move || write_table(&file, &table))
            .await
            .map_err(|e| FlatqlError::new(ErrorCode::InternalPanic, e.to_string()))??;

        tracing::info!(destination, records = written, "Exported query result");
        Ok(written)
    }
}
