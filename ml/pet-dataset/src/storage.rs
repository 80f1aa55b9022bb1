//! Columnar dataset files.
//!
//! The trainer consumes a single JSON document with parallel columns:
//!
//! ```text
//! {"X": [[f32; 12], ...], "y_action": [i32, ...], "y_valence": [...],
//!  "y_arousal": [...], "weights": [...],
//!  "feature_names": [...], "action_names": [...]}
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use pet_types::{ACTION_NAMES, Action, FEATURE_NAMES, FeatureVector, INPUT_SIZE};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::assemble::LabeledDataset;
use crate::error::{DatasetError, Result};

/// On-disk form of a [`LabeledDataset`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetFile {
    /// Feature matrix, one row per example.
    #[serde(rename = "X")]
    pub x: Vec<[f32; INPUT_SIZE]>,
    /// Target action ids.
    pub y_action: Vec<i32>,
    /// Target valence.
    pub y_valence: Vec<f32>,
    /// Target arousal.
    pub y_arousal: Vec<f32>,
    /// Sample weights.
    pub weights: Vec<f32>,
    /// Feature column names.
    pub feature_names: Vec<String>,
    /// Action names, indexed by id.
    pub action_names: Vec<String>,
}

impl From<&LabeledDataset> for DatasetFile {
    fn from(dataset: &LabeledDataset) -> Self {
        Self {
            x: dataset.features().iter().map(|f| *f.as_array()).collect(),
            y_action: dataset
                .actions()
                .iter()
                .map(|a| i32::from(a.id()))
                .collect(),
            y_valence: dataset.valence().to_vec(),
            y_arousal: dataset.arousal().to_vec(),
            weights: dataset.weights().to_vec(),
            feature_names: FEATURE_NAMES.iter().map(ToString::to_string).collect(),
            action_names: ACTION_NAMES.iter().map(ToString::to_string).collect(),
        }
    }
}

impl DatasetFile {
    /// Checks the label lists against the fixed feature and action lists.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::InvalidFile`] on any difference.
    pub fn validate_names(&self) -> Result<()> {
        if self.feature_names != FEATURE_NAMES {
            return Err(DatasetError::invalid_file(format!(
                "feature names {:?} do not match expected {:?}",
                self.feature_names, FEATURE_NAMES
            )));
        }
        if self.action_names != ACTION_NAMES {
            return Err(DatasetError::invalid_file(format!(
                "action names {:?} do not match expected {:?}",
                self.action_names, ACTION_NAMES
            )));
        }
        Ok(())
    }

    /// Validates the file and converts it into a dataset.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::InvalidFile`] for mismatched label lists or
    /// an out-of-range action id, and [`DatasetError::LengthMismatch`] for
    /// ragged columns.
    pub fn into_dataset(self) -> Result<LabeledDataset> {
        self.validate_names()?;

        let actions = self
            .y_action
            .iter()
            .enumerate()
            .map(|(row, &id)| {
                u64::try_from(id)
                    .ok()
                    .and_then(Action::from_id)
                    .ok_or_else(|| {
                        DatasetError::invalid_file(format!("row {row}: action id {id} out of range"))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        LabeledDataset::from_columns(
            self.x.into_iter().map(FeatureVector::new).collect(),
            actions,
            self.y_valence,
            self.y_arousal,
            self.weights,
        )
    }
}

/// Writes `dataset` to `path` as JSON.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn save_dataset<P: AsRef<Path>>(dataset: &LabeledDataset, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, &DatasetFile::from(dataset))?;
    writer.flush()?;

    info!(path = %path.display(), examples = dataset.len(), "Saved dataset");
    Ok(())
}

/// Reads and validates a dataset written by [`save_dataset`].
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not valid JSON, or
/// fails [`DatasetFile::into_dataset`] validation.
pub fn load_dataset<P: AsRef<Path>>(path: P) -> Result<LabeledDataset> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let contents: DatasetFile = serde_json::from_reader(BufReader::new(file))?;
    let dataset = contents.into_dataset()?;

    info!(path = %path.display(), examples = dataset.len(), "Loaded dataset");
    Ok(dataset)
}
