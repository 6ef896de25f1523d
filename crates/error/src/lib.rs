//! # flatql-error
//!
//! Unified error types for the flatql query layer.
//!
//! Every failure surfaced by the file readers, the embedded engine bridge and
//! the remote dialect adapters is a [`FlatqlError`] carrying:
//! - Numeric error codes (FLATQL-XXXX)
//! - Structured JSON context naming the file, table, query or connection involved
//! - An optional hint for the operator

mod code;
mod context;
mod convert;

pub use code::{ErrorCategory, ErrorCode};
pub use context::ErrorContext;
pub use convert::find_closest_match;

use serde::{Deserialize, Serialize};
use std::fmt;

/// The unified error type for all flatql operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatqlError {
    /// Numeric error code (e.g., "FLATQL-5001")
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Structured context for programmatic handling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<ErrorContext>,

    /// Suggestion for correcting the input
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl FlatqlError {
    /// Create a new error with code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: None,
            hint: None,
        }
    }

    /// Add structured context
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Add a hint
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Annotate with the file being read or written.
    pub fn for_file(self, operation: &str, path: impl Into<String>) -> Self {
        self.with_context(ErrorContext::File {
            operation: operation.to_string(),
            path: path.into(),
        })
    }

    /// Annotate with the table being created, loaded or described.
    pub fn for_table(self, operation: &str, table: impl Into<String>) -> Self {
        self.with_context(ErrorContext::Table {
            operation: operation.to_string(),
            table: table.into(),
        })
    }

    /// Annotate with the SQL text being executed.
    pub fn for_query(self, operation: &str, sql: impl Into<String>) -> Self {
        self.with_context(ErrorContext::Query {
            operation: operation.to_string(),
            sql: sql.into(),
        })
    }

    pub fn category(&self) -> ErrorCategory {
        self.code.category()
    }

    /// Serialize to JSON for machine-readable output
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            tracing::warn!("Failed to serialize FlatqlError: {}", e);
            format!(
                r#"{{"code":"{}","message":"Serialization failed"}}"#,
                self.code
            )
        })
    }

    /// Serialize to pretty JSON for logging
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| self.to_json())
    }
}

impl fmt::Display for FlatqlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(context) = &self.context {
            write!(f, " ({})", context)?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " (Hint: {})", hint)?;
        }
        Ok(())
    }
}

impl std::error::Error for FlatqlError {}

/// Result type alias for flatql operations
pub type Result<T> = std::result::Result<T, FlatqlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatql_error_builder() {
        let err = FlatqlError::new(ErrorCode::UnsupportedDialect, "Unsupported dialect: oracle")
            .with_hint("Did you mean 'mysql'?");

        assert_eq!(err.code, ErrorCode::UnsupportedDialect);
        assert_eq!(err.message, "Unsupported dialect: oracle");
        assert_eq!(err.hint, Some("Did you mean 'mysql'?".to_string()));
        assert!(err.context.is_none());
    }

    #[test]
    fn test_display_implementation() {
        let err = FlatqlError::new(ErrorCode::MissingLabel, "no labels in the data")
            .with_hint("LTSV fields look like label:value");

        assert_eq!(
            err.to_string(),
            "[FLATQL-6001] no labels in the data (Hint: LTSV fields look like label:value)"
        );

        let err_no_hint = FlatqlError::new(ErrorCode::EmptyRecords, "records is empty");
        assert_eq!(err_no_hint.to_string(), "[FLATQL-5003] records is empty");
    }

    #[test]
    fn test_display_includes_context() {
        let err = FlatqlError::new(ErrorCode::FileOpenFailed, "No such file or directory")
            .for_file("read", "data/users.csv");

        assert_eq!(
            err.to_string(),
            "[FLATQL-1001] No such file or directory (read file 'data/users.csv')"
        );
    }

    #[test]
    fn test_json_output() {
        let err = FlatqlError::new(ErrorCode::NoColumns, "query returned no columns");
        let json = err.to_json();

        assert!(json.contains("\"code\":\"FLATQL-3002\""));
        assert!(json.contains("\"message\":\"query returned no columns\""));
    }
}
