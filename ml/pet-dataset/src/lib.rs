//! Dataset assembly for the NeuroPet training pipeline.
//!
//! Turns a raw device log into labeled, weighted training examples:
//!
//! # Labeling
//!
//! - [`target_action`] - rule-based target action for a feature vector
//! - [`target_emotion`] - clamped valence and arousal targets
//! - [`reward`] - bounded reward for a log entry given its successor
//! - [`reward_to_weight`] - reward to sample weight in `[0.1, 1.1]`
//!
//! # Dataset Operations
//!
//! - [`assemble`] - raw JSON log to [`LabeledDataset`] plus diagnostics
//! - [`DatasetSummary`] - action histogram and weight statistics
//! - [`split_dataset`] - seeded train/validation split
//! - [`synthesize`] - bootstrap dataset for a device with no logs yet
//!
//! # Storage
//!
//! - [`save_dataset`] / [`load_dataset`] - columnar JSON files
//!
//! # Example
//!
//! ```
//! use pet_dataset::{assemble, DatasetError};
//! use serde_json::json;
//!
//! // One entry cannot form a transition.
//! let raw = vec![json!({
//!     "ts": 0, "event": 1,
//!     "features": {"hunger": 0.8, "energy": 0.5, "affection": 0.2,
//!                  "trust": 0.5, "stress": 0.1, "dt": 0.0, "feed_5m": 0.0,
//!                  "pet_5m": 0.0, "ignore": 0.0, "tod_sin": 0.0,
//!                  "tod_cos": 1.0, "spam": 0.0},
//!     "brain": {"action": 3, "valence": -0.2, "arousal": 0.3}
//! })];
//!
//! let err = assemble(&raw).unwrap_err();
//! assert!(matches!(err, DatasetError::InsufficientData { usable: 1, required: 2 }));
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod assemble;
mod error;
pub mod policy;
pub mod reward;
mod splits;
mod storage;
mod summary;
pub mod synthetic;

// Re-export assembly types
pub use assemble::{Assembly, Example, LabeledDataset, MIN_ENTRIES, assemble, build_dataset};

// Re-export labeling functions
pub use policy::{EmotionTarget, PolicyRule, target_action, target_emotion};
pub use reward::{RewardTerms, reward, reward_terms, reward_to_weight};

// Re-export split utilities
pub use splits::{SplitRatio, split_dataset, split_stratified};

// Re-export storage
pub use storage::{DatasetFile, load_dataset, save_dataset};

// Re-export summary types
pub use summary::DatasetSummary;

pub use synthetic::synthesize;

// Re-export error types
pub use error::{DatasetError, Result};

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{
        Assembly, DatasetError, DatasetSummary, LabeledDataset, SplitRatio, assemble,
        load_dataset, save_dataset, split_dataset, synthesize,
    };
}
