//! Subcommand implementations.
//!
//! Every command takes its source either from local files (loaded into a
//! fresh [`flatql_runtime::Workspace`]) or from a named connection in the
//! configuration file.

mod catalog;
mod helpers;
mod query;

pub use catalog::{ddl, tables};
pub use helpers::Source;
pub use query::{query, remote};
