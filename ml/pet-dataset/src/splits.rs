//! Train/validation splitting.

use std::collections::BTreeMap;

use pet_types::Action;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::assemble::LabeledDataset;
use crate::error::{DatasetError, Result};

/// Ratio for splitting datasets into train/validation sets.
///
/// The ratio specifies the proportion of data to use for training.
/// The remainder goes to validation.
///
/// # Example
///
/// ```
/// use pet_dataset::SplitRatio;
///
/// let ratio = SplitRatio::try_new(0.8).unwrap();
/// assert!((ratio.val_ratio() - 0.2).abs() < 1e-6);
/// assert_eq!(ratio.split_point(10), 8);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f32", into = "f32")]
pub struct SplitRatio {
    train: f32,
}

impl SplitRatio {
    /// Creates a split ratio.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::InvalidSplitRatio`] unless `train` is in
    /// `(0, 1)`.
    pub fn try_new(train: f32) -> Result<Self> {
        if train > 0.0 && train < 1.0 {
            Ok(Self { train })
        } else {
            Err(DatasetError::invalid_split_ratio(train))
        }
    }

    /// Returns the training ratio.
    #[must_use]
    pub const fn train_ratio(&self) -> f32 {
        self.train
    }

    /// Returns the validation ratio.
    #[must_use]
    pub fn val_ratio(&self) -> f32 {
        1.0 - self.train
    }

    /// Computes the split point for a given dataset size.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn split_point(&self, total: usize) -> usize {
        (total as f32 * self.train).round() as usize
    }

    /// Common 80/20 split.
    pub const EIGHTY_TWENTY: Self = Self { train: 0.8 };
}

impl Default for SplitRatio {
    fn default() -> Self {
        Self::EIGHTY_TWENTY
    }
}

impl TryFrom<f32> for SplitRatio {
    type Error = DatasetError;

    fn try_from(train: f32) -> Result<Self> {
        Self::try_new(train)
    }
}

impl From<SplitRatio> for f32 {
    fn from(ratio: SplitRatio) -> Self {
        ratio.train
    }
}

fn rng_for(seed: Option<u64>) -> ChaCha8Rng {
    seed.map_or_else(ChaCha8Rng::from_entropy, ChaCha8Rng::seed_from_u64)
}

/// Shuffled index split. Both halves are non-empty when `len >= 2`.
fn split_indices(len: usize, ratio: SplitRatio, rng: &mut ChaCha8Rng) -> (Vec<usize>, Vec<usize>) {
    if len == 0 {
        return (Vec::new(), Vec::new());
    }
    let mut indices: Vec<usize> = (0..len).collect();
    indices.shuffle(rng);

    let split = if len < 2 {
        len
    } else {
        ratio.split_point(len).clamp(1, len - 1)
    };
    let val = indices.split_off(split);
    (indices, val)
}

/// Splits a dataset into training and validation sets.
///
/// With a seed the split is reproducible. Datasets of two or more
/// examples always yield a non-empty validation set.
///
/// # Example
///
/// ```
/// use pet_dataset::{split_dataset, synthesize, SplitRatio};
///
/// let data = synthesize(10, Some(7)).unwrap();
/// let (train, val) = split_dataset(&data, SplitRatio::EIGHTY_TWENTY, Some(42));
/// assert_eq!(train.len(), 8);
/// assert_eq!(val.len(), 2);
/// ```
#[must_use]
pub fn split_dataset(
    dataset: &LabeledDataset,
    ratio: SplitRatio,
    seed: Option<u64>,
) -> (LabeledDataset, LabeledDataset) {
    let mut rng = rng_for(seed);
    let (train, val) = split_indices(dataset.len(), ratio, &mut rng);
    (dataset.select(&train), dataset.select(&val))
}

/// Splits a dataset while keeping the action distribution of both halves
/// close to the whole.
///
/// Each target action is split on its own. Actions with a single example
/// go to the training set.
#[must_use]
pub fn split_stratified(
    dataset: &LabeledDataset,
    ratio: SplitRatio,
    seed: Option<u64>,
) -> (LabeledDataset, LabeledDataset) {
    let mut groups: BTreeMap<Action, Vec<usize>> = BTreeMap::new();
    for (i, &action) in dataset.actions().iter().enumerate() {
        groups.entry(action).or_default().push(i);
    }

    let mut rng = rng_for(seed);
    let mut train = Vec::with_capacity(dataset.len());
    let mut val = Vec::new();

    for members in groups.values() {
        let (t, v) = split_indices(members.len(), ratio, &mut rng);
        train.extend(t.into_iter().map(|i| members[i]));
        val.extend(v.into_iter().map(|i| members[i]));
    }

    train.shuffle(&mut rng);
    val.shuffle(&mut rng);

    (dataset.select(&train), dataset.select(&val))
}
