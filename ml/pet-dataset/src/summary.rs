//! Dataset summary and statistics.

use pet_types::{ACTION_COUNT, Action};
use serde::{Deserialize, Serialize};

use crate::assemble::LabeledDataset;

/// Summary statistics for a labeled dataset.
///
/// Printed after assembly so a skewed label distribution or a log full of
/// penalized interactions shows up before training.
///
/// # Example
///
/// ```
/// use pet_dataset::{DatasetSummary, LabeledDataset};
///
/// let summary = DatasetSummary::from_dataset(&LabeledDataset::new());
/// assert!(summary.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    /// Total number of examples.
    pub total_examples: usize,

    /// Example count per target action, indexed by action id.
    pub action_histogram: [usize; ACTION_COUNT],

    /// Mean sample weight.
    pub mean_weight: f32,

    /// Smallest sample weight.
    pub min_weight: f32,

    /// Largest sample weight.
    pub max_weight: f32,

    /// Mean raw reward, if rewards were attached.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean_reward: Option<f32>,

    /// Raw entries dropped while decoding.
    #[serde(default)]
    pub dropped_entries: usize,
}

impl DatasetSummary {
    /// Creates a summary from a dataset.
    #[must_use]
    pub fn from_dataset(dataset: &LabeledDataset) -> Self {
        if dataset.is_empty() {
            return Self::default();
        }

        let mut action_histogram = [0usize; ACTION_COUNT];
        for action in dataset.actions() {
            action_histogram[action.index()] += 1;
        }

        let weights = dataset.weights();
        let min_weight = weights.iter().copied().fold(f32::INFINITY, f32::min);
        let max_weight = weights.iter().copied().fold(f32::NEG_INFINITY, f32::max);

        Self {
            total_examples: dataset.len(),
            action_histogram,
            mean_weight: mean(weights),
            min_weight,
            max_weight,
            mean_reward: None,
            dropped_entries: 0,
        }
    }

    /// Attaches the mean of `rewards`.
    #[must_use]
    pub fn with_rewards(mut self, rewards: &[f32]) -> Self {
        self.mean_reward = (!rewards.is_empty()).then(|| mean(rewards));
        self
    }

    /// Sets the dropped entry count.
    #[must_use]
    pub const fn with_dropped(mut self, dropped: usize) -> Self {
        self.dropped_entries = dropped;
        self
    }

    /// Returns true if the dataset is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.total_examples == 0
    }

    /// Number of examples labeled `action`.
    #[must_use]
    pub const fn count(&self, action: Action) -> usize {
        self.action_histogram[action.index()]
    }

    /// Most frequent target action, lowest id on ties.
    #[must_use]
    pub fn dominant_action(&self) -> Option<Action> {
        if self.is_empty() {
            return None;
        }
        Action::ALL
            .iter()
            .copied()
            .rev()
            .max_by_key(|&a| self.count(a))
    }

    /// Returns a human-readable summary string.
    #[must_use]
    #[allow(clippy::let_underscore_must_use)] // String::write_fmt is infallible
    pub fn to_report(&self) -> String {
        use std::fmt::Write;

        let mut report = String::new();
        let _ = writeln!(report, "Dataset Summary");
        let _ = writeln!(report, "===============");
        let _ = writeln!(report, "Total examples: {}", self.total_examples);
        if self.dropped_entries > 0 {
            let _ = writeln!(report, "Dropped entries: {}", self.dropped_entries);
        }
        let _ = writeln!(
            report,
            "Weights: mean {:.3}, min {:.3}, max {:.3}",
            self.mean_weight, self.min_weight, self.max_weight
        );
        if let Some(reward) = self.mean_reward {
            let _ = writeln!(report, "Mean reward: {reward:.3}");
        }

        let _ = writeln!(report, "\nAction Distribution:");
        for action in Action::ALL {
            let count = self.count(action);
            #[allow(clippy::cast_precision_loss)]
            let share = if self.total_examples > 0 {
                count as f32 / self.total_examples as f32 * 100.0
            } else {
                0.0
            };
            let _ = writeln!(report, "  {:<8} {count:>6} ({share:.1}%)", action.name());
        }

        report
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f32>() / values.len() as f32
}
