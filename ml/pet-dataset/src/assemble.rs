//! Dataset assembly: log entries to labeled, weighted examples.

use pet_types::{Action, FeatureVector, LogEntry, decode_log};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{DatasetError, Result};
use crate::policy::{target_action, target_emotion};
use crate::reward::{reward, reward_to_weight};
use crate::summary::DatasetSummary;

/// Minimum number of usable log entries for a dataset.
pub const MIN_ENTRIES: usize = 2;

/// One labeled training example.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Example {
    /// Input features.
    pub features: FeatureVector,
    /// Target action.
    pub action: Action,
    /// Target valence in `[-1, 1]`.
    pub valence: f32,
    /// Target arousal in `[0, 1]`.
    pub arousal: f32,
    /// Sample weight in `[0.1, 1.1]`.
    pub weight: f32,
}

/// Labeled dataset stored as parallel columns.
///
/// All columns always have the same length. Order carries no meaning for
/// training; it is kept only so reruns are byte-identical.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabeledDataset {
    features: Vec<FeatureVector>,
    actions: Vec<Action>,
    valence: Vec<f32>,
    arousal: Vec<f32>,
    weights: Vec<f32>,
}

impl LabeledDataset {
    /// Creates an empty dataset.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            features: Vec::new(),
            actions: Vec::new(),
            valence: Vec::new(),
            arousal: Vec::new(),
            weights: Vec::new(),
        }
    }

    /// Creates an empty dataset with room for `capacity` examples.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            features: Vec::with_capacity(capacity),
            actions: Vec::with_capacity(capacity),
            valence: Vec::with_capacity(capacity),
            arousal: Vec::with_capacity(capacity),
            weights: Vec::with_capacity(capacity),
        }
    }

    /// Builds a dataset from parallel columns.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::LengthMismatch`] if any column's length
    /// differs from `features`.
    pub fn from_columns(
        features: Vec<FeatureVector>,
        actions: Vec<Action>,
        valence: Vec<f32>,
        arousal: Vec<f32>,
        weights: Vec<f32>,
    ) -> Result<Self> {
        let n = features.len();
        for (column, len) in [
            ("y_action", actions.len()),
            ("y_valence", valence.len()),
            ("y_arousal", arousal.len()),
            ("weights", weights.len()),
        ] {
            if len != n {
                return Err(DatasetError::length_mismatch(column, n, len));
            }
        }
        Ok(Self {
            features,
            actions,
            valence,
            arousal,
            weights,
        })
    }

    /// Appends one example.
    pub fn push(&mut self, example: Example) {
        self.features.push(example.features);
        self.actions.push(example.action);
        self.valence.push(example.valence);
        self.arousal.push(example.arousal);
        self.weights.push(example.weight);
    }

    /// Number of examples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Returns `true` if there are no examples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Example at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Example> {
        Some(Example {
            features: *self.features.get(index)?,
            action: *self.actions.get(index)?,
            valence: *self.valence.get(index)?,
            arousal: *self.arousal.get(index)?,
            weight: *self.weights.get(index)?,
        })
    }

    /// Iterates examples in order.
    pub fn iter(&self) -> impl Iterator<Item = Example> + '_ {
        (0..self.len()).filter_map(|i| self.get(i))
    }

    /// Feature column.
    #[must_use]
    pub fn features(&self) -> &[FeatureVector] {
        &self.features
    }

    /// Target action column.
    #[must_use]
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Target valence column.
    #[must_use]
    pub fn valence(&self) -> &[f32] {
        &self.valence
    }

    /// Target arousal column.
    #[must_use]
    pub fn arousal(&self) -> &[f32] {
        &self.arousal
    }

    /// Sample weight column.
    #[must_use]
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// New dataset holding the examples at `indices`, in that order.
    ///
    /// Out-of-range indices are skipped.
    #[must_use]
    pub fn select(&self, indices: &[usize]) -> Self {
        let mut out = Self::with_capacity(indices.len());
        for example in indices.iter().filter_map(|&i| self.get(i)) {
            out.push(example);
        }
        out
    }
}

impl FromIterator<Example> for LabeledDataset {
    fn from_iter<I: IntoIterator<Item = Example>>(iter: I) -> Self {
        let mut dataset = Self::new();
        for example in iter {
            dataset.push(example);
        }
        dataset
    }
}

/// Output of dataset assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct Assembly {
    /// The labeled examples.
    pub dataset: LabeledDataset,
    /// Raw reward per example, before conversion to a weight.
    pub rewards: Vec<f32>,
    /// Raw entries dropped during decoding.
    pub dropped: usize,
    /// Diagnostics.
    pub summary: DatasetSummary,
}

/// Labels a decoded log.
///
/// Entry `i` is paired with entry `i + 1` for reward shaping; the last
/// entry has no successor and gets no transition terms.
///
/// # Errors
///
/// Returns [`DatasetError::InsufficientData`] for fewer than
/// [`MIN_ENTRIES`] entries. No partial dataset is produced.
pub fn build_dataset(entries: &[LogEntry]) -> Result<Assembly> {
    if entries.len() < MIN_ENTRIES {
        return Err(DatasetError::insufficient_data(entries.len(), MIN_ENTRIES));
    }

    let mut dataset = LabeledDataset::with_capacity(entries.len());
    let mut rewards = Vec::with_capacity(entries.len());

    for (i, entry) in entries.iter().enumerate() {
        let next = entries.get(i + 1);
        let emotion = target_emotion(&entry.features);
        let r = reward(entry, next);

        dataset.push(Example {
            features: entry.features,
            action: target_action(&entry.features),
            valence: emotion.valence,
            arousal: emotion.arousal,
            weight: reward_to_weight(r),
        });
        rewards.push(r);
    }

    let summary = DatasetSummary::from_dataset(&dataset).with_rewards(&rewards);
    debug!(examples = dataset.len(), "Labeled log entries");

    Ok(Assembly {
        dataset,
        rewards,
        dropped: 0,
        summary,
    })
}

/// Decodes a raw JSON log and labels it.
///
/// Malformed entries are dropped one by one with a warning; the rest of
/// the log is still used.
///
/// # Errors
///
/// Returns [`DatasetError::InsufficientData`] if fewer than
/// [`MIN_ENTRIES`] entries survive decoding.
///
/// # Example
///
/// ```
/// use pet_dataset::{assemble, DatasetError};
///
/// let err = assemble(&[]).unwrap_err();
/// assert!(matches!(err, DatasetError::InsufficientData { usable: 0, .. }));
/// ```
pub fn assemble(raw: &[Value]) -> Result<Assembly> {
    let decoded = decode_log(raw);

    for rejected in &decoded.rejected {
        warn!(
            index = rejected.index,
            error = %rejected.error,
            "Dropping malformed log entry"
        );
    }

    let dropped = decoded.rejected.len();
    let mut assembly = build_dataset(&decoded.entries)?;
    assembly.dropped = dropped;
    assembly.summary = assembly.summary.with_dropped(dropped);

    info!(
        raw = raw.len(),
        examples = assembly.dataset.len(),
        dropped,
        "Assembled dataset"
    );

    Ok(assembly)
}
