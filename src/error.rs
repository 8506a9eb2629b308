// Error types for the fold preparation pipeline
//
// This module defines custom error types for dataset and signal operations,
// providing structured error handling with error codes suitable for CLI
// reporting and log scraping.

use log::error;
use std::fmt;

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// the CLI boundary.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}

/// Log a dataset error with structured context
pub fn log_dataset_error(err: &DatasetError, context: &str) {
    error!(
        "Dataset error in {}: code={}, component=PrepRunner, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Log a signal error with structured context
pub fn log_signal_error(err: &SignalError, context: &str) {
    error!(
        "Signal error in {}: code={}, component=SignalLoader, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Dataset-level errors
///
/// These errors cover the reference table, fold configuration, and
/// output-tree operations.
///
/// Error code ranges: 1001-1004
#[derive(Debug, Clone, PartialEq)]
pub enum DatasetError {
    /// Reference CSV is absent or unreadable
    ReferenceMissing { path: String, details: String },

    /// A reference row could not be parsed
    ReferenceParse { line: u64, details: String },

    /// Fold configuration is unusable for the record set
    InvalidFoldCount { folds: usize, records: usize },

    /// Output tree I/O failed
    OutputIo { path: String, details: String },
}

impl ErrorCode for DatasetError {
    fn code(&self) -> i32 {
        match self {
            DatasetError::ReferenceMissing { .. } => 1001,
            DatasetError::ReferenceParse { .. } => 1002,
            DatasetError::InvalidFoldCount { .. } => 1003,
            DatasetError::OutputIo { .. } => 1004,
        }
    }

    fn message(&self) -> String {
        match self {
            DatasetError::ReferenceMissing { path, details } => {
                format!("Cannot read reference table {}: {}", path, details)
            }
            DatasetError::ReferenceParse { line, details } => {
                format!("Malformed reference row at line {}: {}", line, details)
            }
            DatasetError::InvalidFoldCount { folds, records } => {
                format!(
                    "Cannot split {} records into {} folds (need at least one record per fold and folds >= 2)",
                    records, folds
                )
            }
            DatasetError::OutputIo { path, details } => {
                format!("Output tree I/O failed at {}: {}", path, details)
            }
        }
    }
}

impl fmt::Display for DatasetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DatasetError (code {}): {}", self.code(), self.message())
    }
}

impl std::error::Error for DatasetError {}

/// Signal loading errors
///
/// These errors cover record resolution and decoding of the two storage
/// formats (MATLAB v5 containers and WFDB header/data pairs).
///
/// Error code ranges: 2001-2006
#[derive(Debug, Clone, PartialEq)]
pub enum SignalError {
    /// Record exists in neither the MAT nor the WFDB location
    RecordNotFound { record: String },

    /// MAT container holds neither a `val` nor an `ecg` variable
    MissingVariable { path: String },

    /// MAT container violates the v5 layout
    MatFormat { path: String, details: String },

    /// WFDB header or data file violates the format
    WfdbFormat { path: String, details: String },

    /// WFDB signal format code this loader does not decode
    UnsupportedWfdbFormat { path: String, format: u32 },

    /// Underlying I/O failure while reading signal data
    Io { details: String },
}

impl ErrorCode for SignalError {
    fn code(&self) -> i32 {
        match self {
            SignalError::RecordNotFound { .. } => 2001,
            SignalError::MissingVariable { .. } => 2002,
            SignalError::MatFormat { .. } => 2003,
            SignalError::WfdbFormat { .. } => 2004,
            SignalError::UnsupportedWfdbFormat { .. } => 2005,
            SignalError::Io { .. } => 2006,
        }
    }

    fn message(&self) -> String {
        match self {
            SignalError::RecordNotFound { record } => {
                format!("Record '{}' found in neither MAT nor WFDB location", record)
            }
            SignalError::MissingVariable { path } => {
                format!("No ECG variable ('val' or 'ecg') found in {}", path)
            }
            SignalError::MatFormat { path, details } => {
                format!("Malformed MAT container {}: {}", path, details)
            }
            SignalError::WfdbFormat { path, details } => {
                format!("Malformed WFDB file {}: {}", path, details)
            }
            SignalError::UnsupportedWfdbFormat { path, format } => {
                format!("Unsupported WFDB signal format {} in {}", format, path)
            }
            SignalError::Io { details } => format!("Signal I/O error: {}", details),
        }
    }
}

impl fmt::Display for SignalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SignalError (code {}): {}", self.code(), self.message())
    }
}

impl std::error::Error for SignalError {}

/// Convert from std::io::Error to SignalError
impl From<std::io::Error> for SignalError {
    fn from(err: std::io::Error) -> Self {
        SignalError::Io {
            details: err.to_string(),
        }
    }
}
