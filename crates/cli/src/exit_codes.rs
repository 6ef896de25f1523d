//! Structured exit codes for machine-readable error handling.
//!
//! Scripts can tell a missing file from a bad statement without parsing
//! stderr.

use flatql_error::{ErrorCategory, FlatqlError};

/// Success (standard convention)
#[allow(dead_code)]
pub const SUCCESS: i32 = 0;

/// General error (fallback for unknown errors)
pub const GENERAL_ERROR: i32 = 1;

/// CLI usage error (invalid arguments, missing flags)
pub const USAGE_ERROR: i32 = 2;

/// Configuration error (YAML parse failure, unknown connection or dialect)
pub const CONFIG_ERROR: i32 = 3;

/// Transport error (file missing, HTTP failure, object store failure)
pub const TRANSPORT_ERROR: i32 = 4;

/// Validation error (empty query, invalid table, malformed file)
pub const VALIDATION_ERROR: i32 = 5;

/// Engine error (SQL rejected, connection refused, transaction failure)
pub const ENGINE_ERROR: i32 = 6;

pub fn for_category(category: ErrorCategory) -> i32 {
    match category {
        ErrorCategory::Transport => TRANSPORT_ERROR,
        ErrorCategory::Config => CONFIG_ERROR,
        ErrorCategory::Classification | ErrorCategory::Validation | ErrorCategory::Format => {
            VALIDATION_ERROR
        }
        ErrorCategory::Engine => ENGINE_ERROR,
        ErrorCategory::Internal => GENERAL_ERROR,
        _ => GENERAL_ERROR,
    }
}

pub fn for_error(e: &anyhow::Error) -> i32 {
    if let Some(err) = e.downcast_ref::<FlatqlError>() {
        return for_category(err.category());
    }

    // Errors raised outside the flatql crates carry no code.
    let s = e.to_string().to_lowercase();
    if s.contains("usage") || s.contains("argument") {
        return USAGE_ERROR;
    }
    if s.contains("config") || s.contains("yaml") {
        return CONFIG_ERROR;
    }
    GENERAL_ERROR
}
