//! Data source implementations.
//!
//! | Source | Entry point | Description |
//! |--------|-------------|-------------|
//! | `file` | [`file::FormatReader`] | CSV, TSV and LTSV from local disk, HTTP(S) or S3, optionally compressed |
//! | `sql`  | [`sql::LocalEngineBridge`] | Embedded in-memory SQLite holding loaded tables |
//! | `sql`  | [`sql::RemoteEngineAdapter`] | SQLite, MySQL, PostgreSQL and SQL Server over the network |

pub mod file;
pub mod sql;
