//! Packing weights into the device artifact and reading them back.

use pet_types::arch::{B1_LEN, B2_LEN, W1_LEN, W2_LEN};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ExportError, Result};
use crate::layout::{
    ACCEPTED_SIZES, FLOAT32_ARTIFACT_SIZE, FLOAT32_DATA_OFFSET, INT8_ARTIFACT_SIZE,
    INT8_DATA_OFFSET, QUANT_FLAG_INT8, QUANT_FLAG_OFFSET, SCALES_OFFSET, VERSION_SIZE,
};
use crate::quantize::{QuantScales, QuantizedWeights};
use crate::weights::ModelWeights;

/// Numeric format of the packed tensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    /// Raw little-endian `f32`.
    #[default]
    Float32,
    /// Per-tensor scaled `i8`.
    Int8,
}

impl Precision {
    /// Maps the `quantized` flag to a precision.
    #[must_use]
    pub const fn from_quantized(quantized: bool) -> Self {
        if quantized { Self::Int8 } else { Self::Float32 }
    }

    /// Returns true for [`Precision::Int8`].
    #[must_use]
    pub const fn is_quantized(self) -> bool {
        matches!(self, Self::Int8)
    }

    /// Exact artifact size for this precision.
    #[must_use]
    pub const fn artifact_size(self) -> usize {
        match self {
            Self::Float32 => FLOAT32_ARTIFACT_SIZE,
            Self::Int8 => INT8_ARTIFACT_SIZE,
        }
    }

    /// Precision implied by an artifact length, if any.
    #[must_use]
    pub const fn from_artifact_size(len: usize) -> Option<Self> {
        match len {
            FLOAT32_ARTIFACT_SIZE => Some(Self::Float32),
            INT8_ARTIFACT_SIZE => Some(Self::Int8),
            _ => None,
        }
    }
}

impl std::fmt::Display for Precision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Float32 => "float32",
            Self::Int8 => "int8",
        })
    }
}

/// A packed artifact and the checksum of exactly its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// The packed bytes.
    pub bytes: Vec<u8>,
    /// CRC-32 (IEEE, zlib-compatible) of `bytes`.
    pub crc32: u32,
    /// Model version in the header.
    pub version: u32,
    /// Tensor format.
    pub precision: Precision,
}

impl Artifact {
    /// Artifact length in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// CRC-32 of `bytes`, as the device computes it.
#[must_use]
pub fn checksum(bytes: &[u8]) -> u32 {
    crc32fast::hash(bytes)
}

/// Packs `weights` in the device layout.
///
/// # Errors
///
/// Returns [`ExportError::NonFinite`] if any weight is NaN or infinite.
///
/// # Example
///
/// ```
/// use pet_export::{pack, ModelWeights, Precision};
///
/// let artifact = pack(&ModelWeights::default(), 3, Precision::Int8).unwrap();
/// assert_eq!(artifact.size(), 399);
/// assert_eq!(&artifact.bytes[..4], &3u32.to_le_bytes());
/// ```
pub fn pack(weights: &ModelWeights, version: u32, precision: Precision) -> Result<Artifact> {
    weights.validate()?;

    let mut bytes = Vec::with_capacity(precision.artifact_size());
    bytes.extend_from_slice(&version.to_le_bytes());

    match precision {
        Precision::Float32 => {
            for tensor in [
                weights.w1_flat(),
                &weights.b1[..],
                weights.w2_flat(),
                &weights.b2[..],
            ] {
                for value in tensor {
                    bytes.extend_from_slice(&value.to_le_bytes());
                }
            }
        }
        Precision::Int8 => {
            let quantized = QuantizedWeights::from_weights(weights);
            bytes.push(QUANT_FLAG_INT8);
            for scale in quantized.scales.to_array() {
                bytes.extend_from_slice(&scale.to_le_bytes());
            }
            for tensor in [&quantized.w1, &quantized.b1, &quantized.w2, &quantized.b2] {
                bytes.extend(tensor.iter().flat_map(|q| q.to_le_bytes()));
            }
        }
    }

    debug_assert_eq!(bytes.len(), precision.artifact_size());

    let crc32 = checksum(&bytes);
    debug!(version, %precision, size = bytes.len(), crc32, "Packed model artifact");

    Ok(Artifact {
        bytes,
        crc32,
        version,
        precision,
    })
}

/// Tensors read back from an artifact.
#[derive(Debug, Clone, PartialEq)]
pub enum UnpackedTensors {
    /// Float weights, bit-identical to what was packed.
    Float32(ModelWeights),
    /// Quantized integers and their scales.
    Int8(QuantizedWeights),
}

/// A decoded artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct UnpackedModel {
    /// Version header.
    pub version: u32,
    /// Tensors.
    pub tensors: UnpackedTensors,
}

impl UnpackedModel {
    /// Precision of the decoded tensors.
    #[must_use]
    pub const fn precision(&self) -> Precision {
        match self.tensors {
            UnpackedTensors::Float32(_) => Precision::Float32,
            UnpackedTensors::Int8(_) => Precision::Int8,
        }
    }

    /// Float weights the device would run, dequantizing if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the tensors are not finite.
    pub fn weights(&self) -> Result<ModelWeights> {
        let weights = match &self.tensors {
            UnpackedTensors::Float32(w) => w.clone(),
            UnpackedTensors::Int8(q) => q.dequantize()?,
        };
        weights.validate()?;
        Ok(weights)
    }
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

fn read_f32s(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

fn read_i8s(bytes: &[u8]) -> Vec<i8> {
    bytes.iter().map(|&b| i8::from_le_bytes([b])).collect()
}

/// Version header of an artifact.
///
/// # Errors
///
/// Returns [`ExportError::SizeMismatch`] if `bytes` is shorter than the
/// header.
pub fn read_version(bytes: &[u8]) -> Result<u32> {
    if bytes.len() < VERSION_SIZE {
        return Err(ExportError::size_mismatch(&ACCEPTED_SIZES, bytes.len()));
    }
    Ok(read_u32(bytes, 0))
}

/// Decodes an artifact. The precision is selected by exact length.
///
/// # Errors
///
/// Returns [`ExportError::SizeMismatch`] for any length other than the two
/// accepted sizes and [`ExportError::InvalidQuantFlag`] for an int8
/// artifact whose flag byte is not `0x01`.
pub fn unpack(bytes: &[u8]) -> Result<UnpackedModel> {
    let precision = Precision::from_artifact_size(bytes.len())
        .ok_or_else(|| ExportError::size_mismatch(&ACCEPTED_SIZES, bytes.len()))?;
    let version = read_u32(bytes, 0);

    let tensors = match precision {
        Precision::Float32 => {
            let values = read_f32s(&bytes[FLOAT32_DATA_OFFSET..]);
            let (w1, rest) = values.split_at(W1_LEN);
            let (b1, rest) = rest.split_at(B1_LEN);
            let (w2, b2) = rest.split_at(W2_LEN);
            UnpackedTensors::Float32(raw_weights(w1, b1, w2, b2))
        }
        Precision::Int8 => {
            let flag = bytes[QUANT_FLAG_OFFSET];
            if flag != QUANT_FLAG_INT8 {
                return Err(ExportError::InvalidQuantFlag(flag));
            }
            let scales = read_f32s(&bytes[SCALES_OFFSET..INT8_DATA_OFFSET]);
            let values = read_i8s(&bytes[INT8_DATA_OFFSET..]);
            let (w1, rest) = values.split_at(W1_LEN);
            let (b1, rest) = rest.split_at(B1_LEN);
            let (w2, b2) = rest.split_at(W2_LEN);
            debug_assert_eq!(b2.len(), B2_LEN);

            UnpackedTensors::Int8(QuantizedWeights {
                w1: w1.to_vec(),
                b1: b1.to_vec(),
                w2: w2.to_vec(),
                b2: b2.to_vec(),
                scales: QuantScales::from_array([scales[0], scales[1], scales[2], scales[3]]),
            })
        }
    };

    Ok(UnpackedModel { version, tensors })
}

/// Copies tensors without the finiteness check; the bytes are reproduced
/// as found.
fn raw_weights(w1: &[f32], b1: &[f32], w2: &[f32], b2: &[f32]) -> ModelWeights {
    let mut weights = ModelWeights::default();
    for (dst, src) in weights.w1.as_flattened_mut().iter_mut().zip(w1) {
        *dst = *src;
    }
    weights.b1.copy_from_slice(b1);
    for (dst, src) in weights.w2.as_flattened_mut().iter_mut().zip(w2) {
        *dst = *src;
    }
    weights.b2.copy_from_slice(b2);
    weights
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp, clippy::cast_precision_loss)]
mod tests {
    use super::*;

    fn sample_weights() -> ModelWeights {
        let ramp = |len: usize, step: f32| -> Vec<f32> {
            (0..len).map(|i| (i as f32 - len as f32 / 2.0) * step).collect()
        };
        ModelWeights::from_slices(
            &ramp(W1_LEN, 0.013),
            &ramp(B1_LEN, 0.1),
            &ramp(W2_LEN, -0.021),
            &ramp(B2_LEN, 0.3),
        )
        .unwrap()
    }

    #[test]
    fn precision_sizes() {
        assert_eq!(Precision::Float32.artifact_size(), 1516);
        assert_eq!(Precision::Int8.artifact_size(), 399);
        assert_eq!(Precision::from_artifact_size(399), Some(Precision::Int8));
        assert_eq!(Precision::from_artifact_size(400), None);
        assert_eq!(Precision::from_quantized(true), Precision::Int8);
    }

    #[test]
    fn float32_header_and_first_value() {
        let w = sample_weights();
        let artifact = pack(&w, 0x0102_0304, Precision::Float32).unwrap();

        assert_eq!(&artifact.bytes[..4], &[0x04, 0x03, 0x02, 0x01]);
        assert_eq!(&artifact.bytes[4..8], &w.w1[0][0].to_le_bytes());
        assert_eq!(
            &artifact.bytes[FLOAT32_ARTIFACT_SIZE - 4..],
            &w.b2[9].to_le_bytes()
        );
    }

    #[test]
    fn int8_header_fields() {
        let artifact = pack(&sample_weights(), 7, Precision::Int8).unwrap();

        assert_eq!(artifact.bytes[QUANT_FLAG_OFFSET], 0x01);
        let quantized = QuantizedWeights::from_weights(&sample_weights());
        assert_eq!(
            &artifact.bytes[SCALES_OFFSET..SCALES_OFFSET + 4],
            &quantized.scales.w1.to_le_bytes()
        );
        assert_eq!(
            artifact.bytes[INT8_DATA_OFFSET],
            quantized.w1[0].to_le_bytes()[0]
        );
    }

    #[test]
    fn crc_covers_exact_bytes() {
        let artifact = pack(&sample_weights(), 1, Precision::Int8).unwrap();
        assert_eq!(artifact.crc32, checksum(&artifact.bytes));

        let mut padded = artifact.bytes.clone();
        padded.push(0);
        assert_ne!(checksum(&padded), artifact.crc32);
    }

    #[test]
    fn checksum_matches_zlib() {
        // CRC-32/ISO-HDLC check value.
        assert_eq!(checksum(b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn unpack_rejects_unknown_lengths() {
        for len in [0, 3, 398, 400, 1515, 1517] {
            let err = unpack(&vec![0u8; len]).unwrap_err();
            assert!(matches!(err, ExportError::SizeMismatch { actual, .. } if actual == len));
        }
    }

    #[test]
    fn unpack_rejects_bad_flag() {
        let mut bytes = pack(&sample_weights(), 1, Precision::Int8).unwrap().bytes;
        bytes[QUANT_FLAG_OFFSET] = 0x02;
        assert!(matches!(
            unpack(&bytes),
            Err(ExportError::InvalidQuantFlag(0x02))
        ));
    }

    #[test]
    fn pack_rejects_non_finite() {
        let mut w = sample_weights();
        w.b1[0] = f32::NAN;
        assert!(matches!(
            pack(&w, 1, Precision::Float32),
            Err(ExportError::NonFinite { tensor: "b1", .. })
        ));
    }

    #[test]
    fn read_version_needs_header() {
        assert_eq!(read_version(&5u32.to_le_bytes()).unwrap(), 5);
        assert!(read_version(&[1, 2]).is_err());
    }
}
