//! # Error Contexts
//!
//! Structured metadata naming what an operation was working on when it failed.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Structured context for errors.
///
/// Each variant identifies the object of the failing operation: a file path,
/// a table name, a query text or a connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ErrorContext {
    /// Reading or writing a file source
    File { operation: String, path: String },

    /// Creating, loading or describing a table
    Table { operation: String, table: String },

    /// Executing or classifying SQL text
    Query { operation: String, sql: String },

    /// Talking to a remote backend
    Connection {
        operation: String,
        dialect: String,
        host: Option<String>,
        port: Option<u16>,
    },

    /// Generic key-value context for extensibility
    Generic {
        #[serde(flatten)]
        data: std::collections::HashMap<String, serde_json::Value>,
    },
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorContext::File { operation, path } => write!(f, "{} file '{}'", operation, path),
            ErrorContext::Table { operation, table } => {
                write!(f, "{} table '{}'", operation, table)
            }
            ErrorContext::Query { operation, sql } => write!(f, "{} query '{}'", operation, sql),
            ErrorContext::Connection {
                operation,
                dialect,
                host,
                port,
            } => {
                write!(f, "{} on {}", operation, dialect)?;
                if let Some(host) = host {
                    write!(f, " at {}", host)?;
                    if let Some(port) = port {
                        write!(f, ":{}", port)?;
                    }
                }
                Ok(())
            }
            ErrorContext::Generic { data } => {
                let mut keys: Vec<_> = data.keys().collect();
                keys.sort();
                let parts: Vec<String> = keys.iter().map(|k| format!("{}={}", k, data[*k])).collect();
                write!(f, "{}", parts.join(", "))
            }
        }
    }
}
