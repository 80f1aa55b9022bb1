//! Error types for pet-types crate.

use thiserror::Error;

use crate::arch::Architecture;

/// Validation errors for pipeline data.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Raw log object is missing a field or has a field of the wrong type.
    #[error("malformed log entry: {0}")]
    Malformed(String),

    /// Numeric field is NaN or outside the f32 range.
    #[error("non-finite value in field `{field}`")]
    NonFinite {
        /// Offending field.
        field: &'static str,
    },

    /// Event id outside the input event enumeration.
    #[error("unknown input event id: {0}")]
    UnknownEvent(u64),

    /// Action id outside the action enumeration.
    #[error("unknown action id: {0}")]
    UnknownAction(u64),

    /// Dimensions differ from the fixed architecture.
    #[error("architecture mismatch: expected {expected}, got {actual}")]
    ArchitectureMismatch {
        /// Fixed architecture.
        expected: Architecture,
        /// Offending dimensions.
        actual: Architecture,
    },

    /// Feature schema version differs from the one the device understands.
    #[error("feature schema version mismatch: expected {expected}, got {actual}")]
    FeatureSchemaMismatch {
        /// Supported version.
        expected: u32,
        /// Offending version.
        actual: u32,
    },
}

impl ValidationError {
    /// Creates a malformed entry error.
    #[must_use]
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed(reason.into())
    }
}

/// Result type for pet-types operations.
pub type Result<T> = std::result::Result<T, ValidationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ValidationError::malformed("missing field `ts`");
        assert!(err.to_string().contains("missing field `ts`"));

        let err = ValidationError::NonFinite {
            field: "state.trust",
        };
        assert!(err.to_string().contains("state.trust"));

        let err = ValidationError::UnknownEvent(9);
        assert!(err.to_string().contains('9'));

        let err = ValidationError::FeatureSchemaMismatch {
            expected: 1,
            actual: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("expected 1"));
        assert!(msg.contains("got 2"));
    }

    #[test]
    fn architecture_mismatch_display() {
        let err = ValidationError::ArchitectureMismatch {
            expected: Architecture::CURRENT,
            actual: Architecture {
                input_size: 8,
                hidden_size: 16,
                output_size: 10,
            },
        };
        assert!(err.to_string().contains("12-16-10"));
        assert!(err.to_string().contains("8-16-10"));
    }
}
