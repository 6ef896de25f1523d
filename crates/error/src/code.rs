use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric error codes following FLATQL-XXXX format.
///
/// ## Code Ranges
/// - **1000-1999**: Transport errors (local files, HTTP, object store, codecs)
/// - **2000-2999**: Query classification errors
/// - **3000-3999**: Engine errors (embedded or remote)
/// - **4000-4999**: Configuration errors
/// - **5000-5999**: Table validation errors
/// - **6000-6999**: File format errors
/// - **9000-9999**: Internal errors
///
/// Codes are stable across versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
#[non_exhaustive]
pub enum ErrorCode {
    // === Transport Errors (1000-1999) ===
    /// FLATQL-1001: Local file could not be opened or created
    FileOpenFailed = 1001,
    /// FLATQL-1002: HTTP request could not be sent or the body not read
    HttpRequestFailed = 1002,
    /// FLATQL-1003: HTTP response carried a non-success status
    HttpStatus = 1003,
    /// FLATQL-1004: Object store fetch failed
    ObjectStoreFailed = 1004,
    /// FLATQL-1005: Transfer aborted by cancellation
    TransferCancelled = 1005,
    /// FLATQL-1006: Compressed stream could not be decoded
    DecompressionFailed = 1006,
    /// FLATQL-1007: Path scheme has no transport
    UnsupportedProtocol = 1007,
    /// FLATQL-1008: Generic I/O failure
    IoFailure = 1008,

    // === Query Errors (2000-2999) ===
    /// FLATQL-2001: SQL text is empty
    EmptyQuery = 2001,
    /// FLATQL-2002: A row-returning call was given more than one statement
    MultipleStatements = 2002,

    // === Engine Errors (3000-3999) ===
    /// FLATQL-3001: Engine rejected a statement or catalog query
    EngineFailure = 3001,
    /// FLATQL-3002: Query produced a result without columns
    NoColumns = 3002,
    /// FLATQL-3003: Could not connect to the backend
    ConnectionFailed = 3003,
    /// FLATQL-3004: Transaction could not be started, committed or rolled back
    TransactionFailed = 3004,

    // === Configuration Errors (4000-4999) ===
    /// FLATQL-4001: Configuration is invalid
    InvalidConfig = 4001,
    /// FLATQL-4002: Dialect is unknown or not configured
    UnsupportedDialect = 4002,
    /// FLATQL-4003: Named connection does not exist
    ConnectionNotFound = 4003,
    /// FLATQL-4004: Invalid YAML syntax
    InvalidYaml = 4004,

    // === Validation Errors (5000-5999) ===
    /// FLATQL-5001: Table name is not set
    EmptyTableName = 5001,
    /// FLATQL-5002: Table header is empty
    EmptyHeader = 5002,
    /// FLATQL-5003: Table has no records
    EmptyRecords = 5003,
    /// FLATQL-5004: Header contains a duplicate column name
    DuplicateHeaderColumn = 5004,

    // === Format Errors (6000-6999) ===
    /// FLATQL-6001: LTSV field without a label
    MissingLabel = 6001,
    /// FLATQL-6002: File suffix is not csv, tsv or ltsv
    UnsupportedFileFormat = 6002,
    /// FLATQL-6003: Delimited record could not be parsed
    MalformedRecord = 6003,
    /// FLATQL-6004: Table could not be written
    WriteFailed = 6004,

    // === Internal Errors (9000-9999) ===
    /// FLATQL-9001: Serialization/deserialization failed
    SerializationFailed = 9001,
    /// FLATQL-9002: Unexpected internal state
    InternalPanic = 9002,

    /// FLATQL-9999: Unknown/unclassified error
    Unknown = 9999,
}

impl ErrorCode {
    /// Get the numeric code value
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    /// Get the formatted code string (e.g., "FLATQL-3002")
    pub fn as_str(&self) -> String {
        format!("FLATQL-{:04}", self.as_u16())
    }

    /// Get the error category
    pub fn category(&self) -> ErrorCategory {
        match self.as_u16() {
            1000..=1999 => ErrorCategory::Transport,
            2000..=2999 => ErrorCategory::Classification,
            3000..=3999 => ErrorCategory::Engine,
            4000..=4999 => ErrorCategory::Config,
            5000..=5999 => ErrorCategory::Validation,
            6000..=6999 => ErrorCategory::Format,
            _ => ErrorCategory::Internal,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<ErrorCode> for String {
    fn from(code: ErrorCode) -> String {
        code.as_str()
    }
}

impl TryFrom<String> for ErrorCode {
    type Error = String;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        let num: u16 = s
            .strip_prefix("FLATQL-")
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| "Invalid format".to_string())?;
        Self::try_from(num).map_err(|_| "Unknown code".to_string())
    }
}

impl TryFrom<u16> for ErrorCode {
    type Error = String;

    fn try_from(n: u16) -> std::result::Result<Self, Self::Error> {
        match n {
            1001 => Ok(Self::FileOpenFailed),
            1002 => Ok(Self::HttpRequestFailed),
            1003 => Ok(Self::HttpStatus),
            1004 => Ok(Self::ObjectStoreFailed),
            1005 => Ok(Self::TransferCancelled),
            1006 => Ok(Self::DecompressionFailed),
            1007 => Ok(Self::UnsupportedProtocol),
            1008 => Ok(Self::IoFailure),
            2001 => Ok(Self::EmptyQuery),
            2002 => Ok(Self::MultipleStatements),
            3001 => Ok(Self::EngineFailure),
            3002 => Ok(Self::NoColumns),
            3003 => Ok(Self::ConnectionFailed),
            3004 => Ok(Self::TransactionFailed),
            4001 => Ok(Self::InvalidConfig),
            4002 => Ok(Self::UnsupportedDialect),
            4003 => Ok(Self::ConnectionNotFound),
            4004 => Ok(Self::InvalidYaml),
            5001 => Ok(Self::EmptyTableName),
            5002 => Ok(Self::EmptyHeader),
            5003 => Ok(Self::EmptyRecords),
            5004 => Ok(Self::DuplicateHeaderColumn),
            6001 => Ok(Self::MissingLabel),
            6002 => Ok(Self::UnsupportedFileFormat),
            6003 => Ok(Self::MalformedRecord),
            6004 => Ok(Self::WriteFailed),
            9001 => Ok(Self::SerializationFailed),
            9002 => Ok(Self::InternalPanic),
            9999 => Ok(Self::Unknown),
            _ => Err(format!("Unknown error code: {}", n)),
        }
    }
}

/// High-level error category, used by front ends to pick exit codes and dialogs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ErrorCategory {
    Transport,
    Classification,
    Engine,
    Config,
    Validation,
    Format,
    Internal,
}
