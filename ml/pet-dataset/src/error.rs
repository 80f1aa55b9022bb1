//! Error types for pet-dataset crate.

use thiserror::Error;

/// Errors that can occur while building, splitting, or persisting datasets.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// Not enough usable log entries to form transitions.
    #[error("insufficient data: {usable} usable entries, need at least {required}")]
    InsufficientData {
        /// Entries left after dropping malformed ones.
        usable: usize,
        /// Minimum required.
        required: usize,
    },

    /// Invalid split ratio.
    #[error("invalid split ratio: {0} (must be in (0, 1))")]
    InvalidSplitRatio(f32),

    /// Parallel columns have different lengths.
    #[error("column {column} has {actual} rows, expected {expected}")]
    LengthMismatch {
        /// Column name.
        column: &'static str,
        /// Expected row count.
        expected: usize,
        /// Actual row count.
        actual: usize,
    },

    /// Dataset file content does not describe a valid dataset.
    #[error("invalid dataset file: {0}")]
    InvalidFile(String),

    /// Invalid argument to a generator or builder.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl DatasetError {
    /// Creates an insufficient data error.
    #[must_use]
    pub const fn insufficient_data(usable: usize, required: usize) -> Self {
        Self::InsufficientData { usable, required }
    }

    /// Creates an invalid split ratio error.
    #[must_use]
    pub const fn invalid_split_ratio(ratio: f32) -> Self {
        Self::InvalidSplitRatio(ratio)
    }

    /// Creates a length mismatch error.
    #[must_use]
    pub const fn length_mismatch(column: &'static str, expected: usize, actual: usize) -> Self {
        Self::LengthMismatch {
            column,
            expected,
            actual,
        }
    }

    /// Creates an invalid file error.
    #[must_use]
    pub fn invalid_file(reason: impl Into<String>) -> Self {
        Self::InvalidFile(reason.into())
    }

    /// Creates an invalid argument error.
    #[must_use]
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument(reason.into())
    }
}

impl From<std::io::Error> for DatasetError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for DatasetError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type for pet-dataset operations.
pub type Result<T> = std::result::Result<T, DatasetError>;
