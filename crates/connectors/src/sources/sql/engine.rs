//! Embedded engine construction.
//!
//! Every SQLite connection used by flatql comes from [`EngineFactory`], which
//! enforces foreign keys before handing the connection out.

use flatql_error::{ErrorCode, FlatqlError, Result};
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// The single engine handle shared by local operations.
pub type SharedConnection = Arc<Mutex<Connection>>;

pub struct EngineFactory;

impl EngineFactory {
    /// Opens the in-memory engine that backs local file queries.
    pub fn in_memory() -> Result<Connection> {
        let conn = Connection::open_in_memory()
            .map_err(|e| FlatqlError::from(e).with_hint("failed to open in-memory database"))?;
        Self::prepare(conn)
    }

    /// Opens a file-backed database, creating it if it does not exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Connection> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|e| {
            FlatqlError::new(ErrorCode::ConnectionFailed, e.to_string())
                .for_file("open", path.display().to_string())
        })?;
        Self::prepare(conn)
    }

    /// Opens a database file that must already exist. Nothing is created.
    pub fn open_existing(path: impl AsRef<Path>) -> Result<Connection> {
        let path = path.as_ref();
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags).map_err(|e| {
            FlatqlError::new(ErrorCode::ConnectionFailed, e.to_string())
                .for_file("open", path.display().to_string())
                .with_hint("check the database path of the connection")
        })?;
        Self::prepare(conn)
    }

    /// Wraps a connection for sharing across blocking tasks.
    pub fn shared(conn: Connection) -> SharedConnection {
        Arc::new(Mutex::new(conn))
    }

    fn prepare(conn: Connection) -> Result<Connection> {
        if let Err(e) = conn.execute_batch("PRAGMA foreign_keys = ON;") {
            if let Err((_, close_err)) = conn.close() {
                tracing::warn!("Failed to close connection after setup error: {}", close_err);
            }
            return Err(FlatqlError::new(
                ErrorCode::ConnectionFailed,
                format!("failed to enable foreign keys: {}", e),
            ));
        }
        Ok(conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn foreign_keys(conn: &Connection) -> i64 {
        conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_in_memory_enforces_foreign_keys() {
        let conn = EngineFactory::in_memory().unwrap();
        assert_eq!(foreign_keys(&conn), 1);
    }

    #[test]
    fn test_file_backed_enforces_foreign_keys() {
        let dir = tempfile::tempdir().unwrap();
        let conn = EngineFactory::open(dir.path().join("app.db")).unwrap();
        assert_eq!(foreign_keys(&conn), 1);

        conn.execute_batch(
            "CREATE TABLE parent (id INTEGER PRIMARY KEY);
             CREATE TABLE child (parent_id INTEGER REFERENCES parent(id));",
        )
        .unwrap();
        assert!(conn.execute("INSERT INTO child VALUES (42)", []).is_err());
    }

    #[test]
    fn test_open_existing_does_not_create() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("typo.db");
        let err = EngineFactory::open_existing(&path).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConnectionFailed);
        assert!(!path.exists());

        EngineFactory::open(&path).unwrap();
        let conn = EngineFactory::open_existing(&path).unwrap();
        assert_eq!(foreign_keys(&conn), 1);
    }

    #[test]
    fn test_unopenable_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = EngineFactory::open(dir.path().join("missing").join("app.db")).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConnectionFailed);
    }
}
