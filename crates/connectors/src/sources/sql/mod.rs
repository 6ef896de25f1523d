//! SQL engines.
//!
//! - `local`: the embedded engine that file sources are loaded into.
//! - `remote`: one adapter over SQLite, MySQL, PostgreSQL and SQL Server,
//!   with a [`remote::DialectStrategy`] per backend.

pub mod engine;
pub mod local;
pub mod mysql;
pub mod postgres;
pub mod remote;
pub mod sqlite;
pub mod sqlserver;

pub use engine::{EngineFactory, SharedConnection};
pub use local::LocalEngineBridge;
pub use remote::{Dialect, DialectStrategy, RemoteEngineAdapter};

/// Names a query result after the token following the first `FROM`.
///
/// Backticks are stripped first and the keyword match is case-insensitive.
/// `WITH` statements and a trailing `FROM` yield an empty name.
pub fn extract_table_name(sql: &str) -> String {
    let cleaned = sql.replace('`', "");
    let words: Vec<&str> = cleaned.split_whitespace().collect();

    if words.first().is_some_and(|w| w.eq_ignore_ascii_case("WITH")) {
        return String::new();
    }

    words
        .iter()
        .position(|w| w.eq_ignore_ascii_case("FROM"))
        .and_then(|i| words.get(i + 1))
        .map(|w| w.to_string())
        .unwrap_or_default()
}
