//! Byte layout of the device model artifact.
//!
//! ```text
//! float32:  [0..4)   u32 version
//!           [4..)    f32 w1 | b1 | w2 | b2
//!
//! int8:     [0..4)   u32 version
//!           [4]      u8  quant flag = 0x01
//!           [5..21)  f32 w1_scale | b1_scale | w2_scale | b2_scale
//!           [21..)   i8  w1 | b1 | w2 | b2
//! ```
//!
//! All multi-byte fields are little-endian. There is no magic number or
//! length prefix; the consumer learns the size from metadata.

use pet_types::arch::PARAMETER_COUNT;

/// Size of the version header.
pub const VERSION_SIZE: usize = 4;

/// Offset of the first float32 tensor value.
pub const FLOAT32_DATA_OFFSET: usize = VERSION_SIZE;

/// Total size of a float32 artifact.
pub const FLOAT32_ARTIFACT_SIZE: usize = VERSION_SIZE + 4 * PARAMETER_COUNT;

/// Offset of the quantization flag byte.
pub const QUANT_FLAG_OFFSET: usize = VERSION_SIZE;

/// Flag byte marking an int8 artifact.
pub const QUANT_FLAG_INT8: u8 = 0x01;

/// Offset of the four scales.
pub const SCALES_OFFSET: usize = QUANT_FLAG_OFFSET + 1;

/// Offset of the first int8 tensor value.
pub const INT8_DATA_OFFSET: usize = SCALES_OFFSET + 4 * 4;

/// Total size of an int8 artifact.
pub const INT8_ARTIFACT_SIZE: usize = INT8_DATA_OFFSET + PARAMETER_COUNT;

/// Every artifact size the device accepts.
pub const ACCEPTED_SIZES: [usize; 2] = [FLOAT32_ARTIFACT_SIZE, INT8_ARTIFACT_SIZE];

const _: () = assert!(FLOAT32_ARTIFACT_SIZE == 1516);
const _: () = assert!(INT8_ARTIFACT_SIZE == 399);
