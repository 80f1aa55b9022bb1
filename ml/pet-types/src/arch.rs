//! Fixed network architecture shared by the trainer and the device.
//!
//! These values are a contract with the firmware, not tunable parameters.
//! Every crate in the workspace reads them from here; a mismatch between
//! trainer and device is a fatal error, never something to negotiate.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};

/// Number of input features.
pub const INPUT_SIZE: usize = 12;

/// Width of the single hidden layer.
pub const HIDDEN_SIZE: usize = 16;

/// Number of discrete actions the device can emit.
pub const ACTION_COUNT: usize = 8;

/// Output width: one logit per action plus the valence and arousal heads.
pub const OUTPUT_SIZE: usize = ACTION_COUNT + 2;

/// Output index of the valence head.
pub const VALENCE_OUTPUT: usize = ACTION_COUNT;

/// Output index of the arousal head.
pub const AROUSAL_OUTPUT: usize = ACTION_COUNT + 1;

/// Feature schema version understood by the device.
pub const FEATURE_SCHEMA_VERSION: u32 = 1;

/// Number of elements in the first weight matrix.
pub const W1_LEN: usize = INPUT_SIZE * HIDDEN_SIZE;

/// Number of elements in the first bias vector.
pub const B1_LEN: usize = HIDDEN_SIZE;

/// Number of elements in the second weight matrix.
pub const W2_LEN: usize = HIDDEN_SIZE * OUTPUT_SIZE;

/// Number of elements in the second bias vector.
pub const B2_LEN: usize = OUTPUT_SIZE;

/// Total number of trainable parameters.
pub const PARAMETER_COUNT: usize = W1_LEN + B1_LEN + W2_LEN + B2_LEN;

const _: () = assert!(OUTPUT_SIZE == 10);
const _: () = assert!(PARAMETER_COUNT == 378);

/// Architecture dimensions as carried in artifact metadata.
///
/// # Example
///
/// ```
/// use pet_types::Architecture;
///
/// let arch = Architecture::CURRENT;
/// assert_eq!(arch.input_size, 12);
/// assert!(arch.check().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Architecture {
    /// Input width.
    pub input_size: usize,
    /// Hidden width.
    pub hidden_size: usize,
    /// Output width.
    pub output_size: usize,
}

impl Architecture {
    /// The only architecture the device accepts.
    pub const CURRENT: Self = Self {
        input_size: INPUT_SIZE,
        hidden_size: HIDDEN_SIZE,
        output_size: OUTPUT_SIZE,
    };

    /// Checks that these dimensions equal the fixed architecture.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ArchitectureMismatch`] on any difference.
    pub fn check(&self) -> Result<()> {
        if *self == Self::CURRENT {
            Ok(())
        } else {
            Err(ValidationError::ArchitectureMismatch {
                expected: Self::CURRENT,
                actual: *self,
            })
        }
    }
}

impl Default for Architecture {
    fn default() -> Self {
        Self::CURRENT
    }
}

impl std::fmt::Display for Architecture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}-{}-{}",
            self.input_size, self.hidden_size, self.output_size
        )
    }
}
