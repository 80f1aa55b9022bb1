//! Symmetric per-tensor int8 quantization.
//!
//! Each tensor gets its own scale `max(|min|, |max|) / 127`. Values map to
//! `round(x / scale)` clamped to `[-127, 127]`; `-128` is never produced so
//! the mapping stays symmetric around zero. An all-zero tensor uses scale
//! `1.0`.

use serde::{Deserialize, Serialize};

use crate::weights::ModelWeights;

/// Largest quantized magnitude.
pub const QUANT_MAX: i8 = 127;

/// Scale used for all-zero tensors.
pub const ZERO_TENSOR_SCALE: f32 = 1.0;

/// A quantized tensor and its scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantizedTensor {
    /// Quantized values in `[-127, 127]`.
    pub values: Vec<i8>,
    /// Dequantization scale.
    pub scale: f32,
}

impl QuantizedTensor {
    /// Reconstructs approximate float values.
    #[must_use]
    pub fn dequantize(&self) -> Vec<f32> {
        dequantize(&self.values, self.scale)
    }

    /// Number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the tensor has no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Scale for `values`.
#[must_use]
pub fn scale_for(values: &[f32]) -> f32 {
    let max_abs = values.iter().fold(0.0_f32, |m, v| m.max(v.abs()));
    let scale = max_abs / f32::from(QUANT_MAX);
    if scale == 0.0 { ZERO_TENSOR_SCALE } else { scale }
}

/// Quantizes one tensor.
///
/// The scale is computed and stored as `f32` (`max|x| / 127` in single
/// precision), and each `x / scale` is an `f32` division rounded half-to-even.
/// Artifacts are bit-compatible only with dequantizers that use the same
/// `f32` scale.
///
/// # Example
///
/// ```
/// use pet_export::quantize;
///
/// let q = quantize(&[-2.0, 0.0, 1.0, 2.0]);
/// assert!((q.scale - 2.0 / 127.0).abs() < 1e-9);
/// assert_eq!(q.values[0], -127);
/// assert_eq!(q.values[3], 127);
/// ```
#[must_use]
pub fn quantize(values: &[f32]) -> QuantizedTensor {
    let scale = scale_for(values);
    let lo = f32::from(-QUANT_MAX);
    let hi = f32::from(QUANT_MAX);

    #[allow(clippy::cast_possible_truncation)]
    let values = values
        .iter()
        .map(|&x| (x / scale).round_ties_even().clamp(lo, hi) as i8)
        .collect();

    QuantizedTensor { values, scale }
}

/// Multiplies quantized values back by their scale.
#[must_use]
pub fn dequantize(values: &[i8], scale: f32) -> Vec<f32> {
    values.iter().map(|&q| f32::from(q) * scale).collect()
}

/// The four per-tensor scales of a quantized model, in packing order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuantScales {
    /// Layer 1 weight scale.
    pub w1: f32,
    /// Layer 1 bias scale.
    pub b1: f32,
    /// Layer 2 weight scale.
    pub w2: f32,
    /// Layer 2 bias scale.
    pub b2: f32,
}

impl QuantScales {
    /// Scales in packing order.
    #[must_use]
    pub const fn to_array(self) -> [f32; 4] {
        [self.w1, self.b1, self.w2, self.b2]
    }

    /// Scales from packing order.
    #[must_use]
    pub const fn from_array([w1, b1, w2, b2]: [f32; 4]) -> Self {
        Self { w1, b1, w2, b2 }
    }
}

/// An int8 model: four quantized tensors sharing nothing but the layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantizedWeights {
    /// Layer 1 weights, flattened input-major.
    pub w1: Vec<i8>,
    /// Layer 1 biases.
    pub b1: Vec<i8>,
    /// Layer 2 weights, flattened hidden-major.
    pub w2: Vec<i8>,
    /// Layer 2 biases.
    pub b2: Vec<i8>,
    /// Per-tensor scales.
    pub scales: QuantScales,
}

impl QuantizedWeights {
    /// Quantizes each tensor independently.
    #[must_use]
    pub fn from_weights(weights: &ModelWeights) -> Self {
        let w1 = quantize(weights.w1_flat());
        let b1 = quantize(&weights.b1);
        let w2 = quantize(weights.w2_flat());
        let b2 = quantize(&weights.b2);

        Self {
            scales: QuantScales {
                w1: w1.scale,
                b1: b1.scale,
                w2: w2.scale,
                b2: b2.scale,
            },
            w1: w1.values,
            b1: b1.values,
            w2: w2.values,
            b2: b2.values,
        }
    }

    /// Dequantizes back into device-layout float weights.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ExportError::ShapeMismatch`] if a tensor does not
    /// have the fixed architecture's length.
    pub fn dequantize(&self) -> crate::Result<ModelWeights> {
        ModelWeights::from_slices(
            &dequantize(&self.w1, self.scales.w1),
            &dequantize(&self.b1, self.scales.b1),
            &dequantize(&self.w2, self.scales.w2),
            &dequantize(&self.b2, self.scales.b2),
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn symmetric_range() {
        let q = quantize(&[-2.0, 0.0, 1.0, 2.0]);

        assert!((q.scale - 0.015_748).abs() < 1e-6);
        assert_eq!(q.values[0], -127);
        assert_eq!(q.values[1], 0);
        assert!(q.values[2] == 63 || q.values[2] == 64);
        assert_eq!(q.values[3], 127);
    }

    #[test]
    fn dequantized_within_one_step() {
        let original = [-2.0, 0.0, 1.0, 2.0];
        let q = quantize(&original);
        for (x, y) in original.iter().zip(q.dequantize()) {
            assert!((x - y).abs() <= q.scale, "{x} vs {y}");
        }
    }

    #[test]
    fn requantizing_is_a_fixed_point() {
        let inputs: [&[f32]; 3] = [
            &[-2.0, 0.0, 1.0, 2.0],
            &[0.3, -0.7, 0.05, 0.5, -0.01],
            &[1e-3, -4e-4, 2.5e-4],
        ];
        for original in inputs {
            let first = quantize(original);
            let second = quantize(&first.dequantize());
            assert_eq!(first.values, second.values);
            assert!((first.scale - second.scale).abs() <= first.scale * 1e-5);
        }
    }

    #[test]
    fn scale_is_single_precision_quotient() {
        for max_abs in [0.3_f32, 0.1, 1.7, 1e-3] {
            let q = quantize(&[max_abs, -max_abs / 3.0]);
            assert_eq!(q.scale.to_bits(), (max_abs / 127.0_f32).to_bits());
        }
    }

    #[test]
    fn all_zero_tensor_uses_unit_scale() {
        let q = quantize(&[0.0; 16]);
        assert_eq!(q.scale, 1.0);
        assert!(q.values.iter().all(|&v| v == 0));
        assert_eq!(quantize(&[]).scale, 1.0);
    }

    #[test]
    fn never_produces_minus_128() {
        let q = quantize(&[-1.0, 1.0, -0.999, 0.5]);
        assert!(q.values.iter().all(|&v| v >= -127));
        assert_eq!(q.values[0], -127);
    }

    #[test]
    fn asymmetric_range_uses_larger_magnitude() {
        let q = quantize(&[-0.5, 4.0]);
        assert!((q.scale - 4.0 / 127.0).abs() < 1e-7);
        assert_eq!(q.values[1], 127);
        assert_eq!(q.values[0], -16);
    }

    #[test]
    fn ties_round_to_even() {
        // scale = 127/127 = 1.0, so values are divided by exactly one.
        let q = quantize(&[127.0, 2.5, 3.5, -2.5, 0.5]);
        assert_eq!(q.scale, 1.0);
        assert_eq!(&q.values[1..], &[2, 4, -2, 0]);
    }

    #[test]
    fn scales_array_order() {
        let s = QuantScales::from_array([1.0, 2.0, 3.0, 4.0]);
        assert_eq!(s.w2, 3.0);
        assert_eq!(s.to_array(), [1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn weights_quantize_per_tensor() {
        let mut w = ModelWeights::default();
        w.w1[0][0] = 0.5;
        w.b2[9] = -8.0;

        let q = QuantizedWeights::from_weights(&w);
        assert!((q.scales.w1 - 0.5 / 127.0).abs() < 1e-9);
        assert_eq!(q.scales.b1, 1.0);
        assert_eq!(q.scales.w2, 1.0);
        assert!((q.scales.b2 - 8.0 / 127.0).abs() < 1e-7);
        assert_eq!(q.w1[0], 127);
        assert_eq!(q.b2[9], -127);

        let back = q.dequantize().unwrap();
        assert!((back.w1[0][0] - 0.5).abs() < 1e-6);
        assert!((back.b2[9] + 8.0).abs() < 1e-5);
    }
}
