//! Artifact files on disk: `<name>.bin` plus `<name>.json`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ExportError, Result};
use crate::metadata::ArtifactMetadata;
use crate::pack::Artifact;
use crate::weights::{LinearLayers, ModelWeights};

/// Path of the metadata file that accompanies `bin_path`.
#[must_use]
pub fn metadata_path(bin_path: &Path) -> PathBuf {
    bin_path.with_extension("json")
}

/// Writes the artifact bytes to `bin_path` and its metadata next to it.
///
/// Returns the metadata path.
///
/// # Errors
///
/// Returns an error if either file cannot be written.
pub fn write_artifact<P: AsRef<Path>>(
    bin_path: P,
    artifact: &Artifact,
    metadata: &ArtifactMetadata,
) -> Result<PathBuf> {
    let bin_path = bin_path.as_ref();
    let meta_path = metadata_path(bin_path);

    fs::write(bin_path, &artifact.bytes)?;
    fs::write(&meta_path, metadata.to_json()?)?;

    info!(
        path = %bin_path.display(),
        size = artifact.size(),
        crc32 = %metadata.crc_hex(),
        version = artifact.version,
        "Wrote model artifact"
    );
    Ok(meta_path)
}

/// Reads a metadata file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn read_metadata<P: AsRef<Path>>(path: P) -> Result<ArtifactMetadata> {
    ArtifactMetadata::from_json(&fs::read_to_string(path)?)
}

/// Artifact bytes plus the metadata to send with them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedArtifact {
    /// Raw artifact bytes.
    pub bytes: Vec<u8>,
    /// Metadata from file, or derived from the bytes.
    pub metadata: ArtifactMetadata,
    /// True if no metadata file was found.
    pub derived: bool,
}

/// Loads an artifact for upload.
///
/// Metadata comes from `meta_path` if given, else from the `.json` next to
/// `bin_path`, else it is derived from the bytes with `created_at` as the
/// creation time.
///
/// # Errors
///
/// Returns an error if the artifact cannot be read, a metadata file exists
/// but is invalid, or metadata must be derived and the length is not an
/// accepted artifact size.
pub fn load_artifact(
    bin_path: &Path,
    meta_path: Option<&Path>,
    created_at: i64,
) -> Result<LoadedArtifact> {
    let bytes = fs::read(bin_path)?;
    let candidate = meta_path.map_or_else(|| metadata_path(bin_path), Path::to_path_buf);

    if candidate.exists() {
        let metadata = read_metadata(&candidate)?;
        return Ok(LoadedArtifact {
            bytes,
            metadata,
            derived: false,
        });
    }

    warn!(
        path = %candidate.display(),
        "No metadata file, deriving metadata from artifact bytes"
    );
    let metadata = ArtifactMetadata::from_bytes(&bytes, created_at)?;
    Ok(LoadedArtifact {
        bytes,
        metadata,
        derived: true,
    })
}

/// Layout of a weights JSON file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightsLayout {
    /// [`ModelWeights`] as serialized: device layout.
    #[default]
    Device,
    /// [`LinearLayers`]: output-major `fc1`/`fc2` matrices.
    Linear,
}

impl std::str::FromStr for WeightsLayout {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "device" => Ok(Self::Device),
            "linear" => Ok(Self::Linear),
            other => Err(ExportError::Serialization(format!(
                "unknown weights layout '{other}' (expected 'device' or 'linear')"
            ))),
        }
    }
}

/// Loads trained weights from a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or the weights
/// fail shape or finiteness checks.
pub fn load_weights<P: AsRef<Path>>(path: P, layout: WeightsLayout) -> Result<ModelWeights> {
    let contents = fs::read_to_string(path)?;
    let weights = match layout {
        WeightsLayout::Device => {
            let weights: ModelWeights = serde_json::from_str(&contents)?;
            weights.validate()?;
            weights
        }
        WeightsLayout::Linear => {
            let layers: LinearLayers = serde_json::from_str(&contents)?;
            ModelWeights::from_linear_layers(&layers)?
        }
    };
    Ok(weights)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::pack::{Precision, pack};
    use pet_types::{HIDDEN_SIZE, INPUT_SIZE, OUTPUT_SIZE};
    use tempfile::tempdir;

    #[test]
    fn metadata_path_swaps_extension() {
        assert_eq!(
            metadata_path(Path::new("out/model.bin")),
            PathBuf::from("out/model.json")
        );
    }

    #[test]
    fn write_then_load() {
        let dir = tempdir().unwrap();
        let bin = dir.path().join("model.bin");
        let artifact = pack(&ModelWeights::default(), 6, Precision::Int8).unwrap();
        let meta = ArtifactMetadata::from_artifact(&artifact, 1_234);

        let meta_path = write_artifact(&bin, &artifact, &meta).unwrap();
        assert_eq!(meta_path, dir.path().join("model.json"));

        let loaded = load_artifact(&bin, None, 0).unwrap();
        assert!(!loaded.derived);
        assert_eq!(loaded.bytes, artifact.bytes);
        assert_eq!(loaded.metadata, meta);
    }

    #[test]
    fn load_without_metadata_derives_it() {
        let dir = tempdir().unwrap();
        let bin = dir.path().join("model.bin");
        let artifact = pack(&ModelWeights::default(), 2, Precision::Float32).unwrap();
        fs::write(&bin, &artifact.bytes).unwrap();

        let loaded = load_artifact(&bin, None, 77).unwrap();
        assert!(loaded.derived);
        assert_eq!(loaded.metadata.size, 1516);
        assert_eq!(loaded.metadata.version, 2);
        assert_eq!(loaded.metadata.crc32, artifact.crc32);
        assert_eq!(loaded.metadata.created_at, 77);
    }

    #[test]
    fn load_weights_linear_layout() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("weights.json");
        let layers = LinearLayers {
            fc1_weight: vec![vec![0.1; INPUT_SIZE]; HIDDEN_SIZE],
            fc1_bias: vec![0.0; HIDDEN_SIZE],
            fc2_weight: vec![vec![-0.2; HIDDEN_SIZE]; OUTPUT_SIZE],
            fc2_bias: vec![0.0; OUTPUT_SIZE],
        };
        fs::write(&path, serde_json::to_string(&layers).unwrap()).unwrap();

        let weights = load_weights(&path, WeightsLayout::Linear).unwrap();
        assert!(weights.w1_flat().iter().all(|&v| (v - 0.1).abs() < 1e-7));

        assert!(matches!(
            load_weights(&path, WeightsLayout::Device),
            Err(ExportError::Serialization(_))
        ));
    }

    #[test]
    fn layout_from_str() {
        assert_eq!("linear".parse::<WeightsLayout>().unwrap(), WeightsLayout::Linear);
        assert!("torch".parse::<WeightsLayout>().is_err());
    }
}
