//! Dense weights of the two-layer device network.

use pet_types::arch::{AROUSAL_OUTPUT, B1_LEN, B2_LEN, VALENCE_OUTPUT, W1_LEN, W2_LEN};
use pet_types::{ACTION_COUNT, Action, FeatureVector, HIDDEN_SIZE, INPUT_SIZE, OUTPUT_SIZE};
use serde::{Deserialize, Serialize};

use crate::error::{ExportError, Result};

/// Weights in device layout.
///
/// `w1` is input-major (`w1[input][hidden]`) and `w2` is hidden-major
/// (`w2[hidden][output]`), which is also the order they are packed in.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModelWeights {
    /// Layer 1 weights, `[INPUT_SIZE][HIDDEN_SIZE]`.
    pub w1: [[f32; HIDDEN_SIZE]; INPUT_SIZE],
    /// Layer 1 biases.
    pub b1: [f32; HIDDEN_SIZE],
    /// Layer 2 weights, `[HIDDEN_SIZE][OUTPUT_SIZE]`.
    pub w2: [[f32; OUTPUT_SIZE]; HIDDEN_SIZE],
    /// Layer 2 biases. The last two entries feed the valence and arousal
    /// heads.
    pub b2: [f32; OUTPUT_SIZE],
}

/// Layers as most trainers store them: output-major weight matrices.
///
/// Field names follow a `fc1`/`fc2` state dict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearLayers {
    /// Layer 1 weights, `[HIDDEN_SIZE][INPUT_SIZE]`.
    pub fc1_weight: Vec<Vec<f32>>,
    /// Layer 1 biases.
    pub fc1_bias: Vec<f32>,
    /// Layer 2 weights, `[OUTPUT_SIZE][HIDDEN_SIZE]`.
    pub fc2_weight: Vec<Vec<f32>>,
    /// Layer 2 biases.
    pub fc2_bias: Vec<f32>,
}

fn check_len(tensor: &'static str, values: &[f32], expected: usize) -> Result<()> {
    if values.len() == expected {
        Ok(())
    } else {
        Err(ExportError::shape_mismatch(tensor, expected, values.len()))
    }
}

fn check_finite(tensor: &'static str, values: &[f32]) -> Result<()> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(ExportError::non_finite(tensor, index)),
        None => Ok(()),
    }
}

fn copy_rows<const N: usize>(dst: &mut [[f32; N]], src: &[f32]) {
    for (row, chunk) in dst.iter_mut().zip(src.chunks_exact(N)) {
        row.copy_from_slice(chunk);
    }
}

impl ModelWeights {
    /// Builds weights from flat row-major tensors in device layout.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::ShapeMismatch`] if any tensor has the wrong
    /// element count and [`ExportError::NonFinite`] for NaN or infinity.
    /// Nothing is reshaped or truncated.
    pub fn from_slices(w1: &[f32], b1: &[f32], w2: &[f32], b2: &[f32]) -> Result<Self> {
        check_len("w1", w1, W1_LEN)?;
        check_len("b1", b1, B1_LEN)?;
        check_len("w2", w2, W2_LEN)?;
        check_len("b2", b2, B2_LEN)?;

        let mut weights = Self::default();
        copy_rows(&mut weights.w1, w1);
        weights.b1.copy_from_slice(b1);
        copy_rows(&mut weights.w2, w2);
        weights.b2.copy_from_slice(b2);

        weights.validate()?;
        Ok(weights)
    }

    /// Builds weights from output-major layer matrices, transposing them
    /// into device layout.
    ///
    /// # Errors
    ///
    /// Same as [`ModelWeights::from_slices`]. A ragged row reports the
    /// length of that row.
    pub fn from_linear_layers(layers: &LinearLayers) -> Result<Self> {
        let mut weights = Self::default();

        if layers.fc1_weight.len() != HIDDEN_SIZE {
            return Err(ExportError::shape_mismatch(
                "fc1.weight",
                HIDDEN_SIZE,
                layers.fc1_weight.len(),
            ));
        }
        for (h, row) in layers.fc1_weight.iter().enumerate() {
            check_len("fc1.weight", row, INPUT_SIZE)?;
            for (i, &value) in row.iter().enumerate() {
                weights.w1[i][h] = value;
            }
        }

        if layers.fc2_weight.len() != OUTPUT_SIZE {
            return Err(ExportError::shape_mismatch(
                "fc2.weight",
                OUTPUT_SIZE,
                layers.fc2_weight.len(),
            ));
        }
        for (o, row) in layers.fc2_weight.iter().enumerate() {
            check_len("fc2.weight", row, HIDDEN_SIZE)?;
            for (h, &value) in row.iter().enumerate() {
                weights.w2[h][o] = value;
            }
        }

        check_len("fc1.bias", &layers.fc1_bias, B1_LEN)?;
        check_len("fc2.bias", &layers.fc2_bias, B2_LEN)?;
        weights.b1.copy_from_slice(&layers.fc1_bias);
        weights.b2.copy_from_slice(&layers.fc2_bias);

        weights.validate()?;
        Ok(weights)
    }

    /// Checks every value is finite.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::NonFinite`] naming the first bad tensor.
    pub fn validate(&self) -> Result<()> {
        check_finite("w1", self.w1_flat())?;
        check_finite("b1", &self.b1)?;
        check_finite("w2", self.w2_flat())?;
        check_finite("b2", &self.b2)
    }

    /// Layer 1 weights, flattened in packing order.
    #[must_use]
    pub fn w1_flat(&self) -> &[f32] {
        self.w1.as_flattened()
    }

    /// Layer 2 weights, flattened in packing order.
    #[must_use]
    pub fn w2_flat(&self) -> &[f32] {
        self.w2.as_flattened()
    }

    /// Runs the network the way the device does.
    #[must_use]
    pub fn forward(&self, features: &FeatureVector) -> Inference {
        let input = features.as_array();

        let mut hidden = self.b1;
        for (h, acc) in hidden.iter_mut().enumerate() {
            for (i, &x) in input.iter().enumerate() {
                *acc += x * self.w1[i][h];
            }
            *acc = acc.max(0.0);
        }

        let mut output = self.b2;
        for (o, acc) in output.iter_mut().enumerate() {
            for (h, &x) in hidden.iter().enumerate() {
                *acc += x * self.w2[h][o];
            }
        }

        let mut logits = [0.0; ACTION_COUNT];
        logits.copy_from_slice(&output[..ACTION_COUNT]);

        Inference {
            logits,
            valence: output[VALENCE_OUTPUT].tanh(),
            arousal: sigmoid(output[AROUSAL_OUTPUT]),
        }
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// One forward pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Inference {
    /// Raw action scores.
    pub logits: [f32; ACTION_COUNT],
    /// Valence in `[-1, 1]`.
    pub valence: f32,
    /// Arousal in `[0, 1]`.
    pub arousal: f32,
}

impl Inference {
    /// Highest-scoring action, lowest id on ties.
    #[must_use]
    pub fn action(&self) -> Action {
        let mut best = 0;
        for (i, &logit) in self.logits.iter().enumerate().skip(1) {
            if logit > self.logits[best] {
                best = i;
            }
        }
        Action::ALL[best]
    }

    /// Softmax over the action scores.
    #[must_use]
    pub fn probabilities(&self) -> [f32; ACTION_COUNT] {
        let max = self.logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let mut probs = self.logits.map(|l| (l - max).exp());
        let sum: f32 = probs.iter().sum();
        for p in &mut probs {
            *p /= sum;
        }
        probs
    }
}
