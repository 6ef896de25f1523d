//! Shared building blocks for the flatql crates.
//!
//! - **Models**: the in-memory [`models::Table`] every source converges on.
//! - **SQL**: keyword-based statement classification (`sql`).
//! - **Files**: source descriptors with transport, codec and format (`file`).
//! - **Configuration**: typed application configuration (`config`).
//! - **Telemetry**: logging setup (`telemetry`).
pub mod config;
pub mod file;
pub mod models;
pub mod sql;
pub mod telemetry;

pub use file::File;
pub use models::{ColumnDescription, Header, Record, Table};
pub use sql::Sql;
