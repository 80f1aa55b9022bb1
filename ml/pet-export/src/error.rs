//! Error types for pet-export crate.

use pet_types::ValidationError;
use thiserror::Error;

/// Errors that can occur while exporting or verifying a model artifact.
#[derive(Debug, Error)]
pub enum ExportError {
    /// A tensor does not have the fixed architecture's shape.
    #[error("tensor {tensor} has {actual} values, expected {expected}")]
    ShapeMismatch {
        /// Tensor name.
        tensor: &'static str,
        /// Required element count.
        expected: usize,
        /// Supplied element count.
        actual: usize,
    },

    /// A tensor contains NaN or infinity.
    #[error("tensor {tensor} has a non-finite value at index {index}")]
    NonFinite {
        /// Tensor name.
        tensor: &'static str,
        /// Flat index of the first offending value.
        index: usize,
    },

    /// Artifact length is not one the device accepts.
    #[error("artifact is {actual} bytes, expected one of {expected:?}")]
    SizeMismatch {
        /// Accepted lengths.
        expected: Vec<usize>,
        /// Actual length.
        actual: usize,
    },

    /// Int8 artifact with a flag byte other than `0x01`.
    #[error("invalid quantization flag: {0:#04x}")]
    InvalidQuantFlag(u8),

    /// CRC32 over the artifact does not match the expected value.
    #[error("checksum mismatch: expected {expected:08X}, computed {actual:08X}")]
    ChecksumMismatch {
        /// Checksum from metadata.
        expected: u32,
        /// Checksum of the bytes.
        actual: u32,
    },

    /// Version header does not match metadata.
    #[error("version mismatch: metadata says {expected}, artifact header says {actual}")]
    VersionMismatch {
        /// Version from metadata.
        expected: u32,
        /// Version in the artifact header.
        actual: u32,
    },

    /// Quantized flag in metadata disagrees with the artifact layout.
    #[error("metadata quantized={expected} but artifact layout is quantized={actual}")]
    PrecisionMismatch {
        /// Flag from metadata.
        expected: bool,
        /// Flag implied by the artifact length.
        actual: bool,
    },

    /// Architecture or feature schema contract violation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl ExportError {
    /// Creates a shape mismatch error.
    #[must_use]
    pub const fn shape_mismatch(tensor: &'static str, expected: usize, actual: usize) -> Self {
        Self::ShapeMismatch {
            tensor,
            expected,
            actual,
        }
    }

    /// Creates a non-finite value error.
    #[must_use]
    pub const fn non_finite(tensor: &'static str, index: usize) -> Self {
        Self::NonFinite { tensor, index }
    }

    /// Creates a size mismatch error.
    #[must_use]
    pub fn size_mismatch(expected: &[usize], actual: usize) -> Self {
        Self::SizeMismatch {
            expected: expected.to_vec(),
            actual,
        }
    }

    /// Returns true if the artifact bytes themselves are damaged, as
    /// opposed to a caller or contract error.
    #[must_use]
    pub const fn is_corruption(&self) -> bool {
        matches!(
            self,
            Self::SizeMismatch { .. } | Self::InvalidQuantFlag(_) | Self::ChecksumMismatch { .. }
        )
    }
}

impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type for pet-export operations.
pub type Result<T> = std::result::Result<T, ExportError>;
