//! Artifact metadata and transfer headers.
//!
//! The binary carries only a version header. Everything the device checks
//! before parsing it travels alongside: as a JSON file next to the `.bin`
//! and as HTTP headers on upload.

use pet_types::{Architecture, FEATURE_SCHEMA_VERSION};
use serde::{Deserialize, Serialize};

use crate::error::{ExportError, Result};
use crate::layout::ACCEPTED_SIZES;
use crate::pack::{Artifact, Precision, checksum, read_version};

/// `Content-Type` of an uploaded artifact.
pub const CONTENT_TYPE: &str = "application/octet-stream";

/// Header carrying the artifact size in bytes.
pub const HEADER_SIZE: &str = "X-Model-Size";
/// Header carrying the model version.
pub const HEADER_VERSION: &str = "X-Model-Version";
/// Header carrying the feature schema version.
pub const HEADER_FEATURES_VERSION: &str = "X-Features-Version";
/// Header carrying the CRC-32 as eight uppercase hex digits.
pub const HEADER_CRC: &str = "X-Model-CRC";
/// Header carrying the creation time in Unix seconds.
pub const HEADER_CREATED: &str = "X-Model-Created";

/// Side record describing an artifact.
///
/// Serializes to the flat JSON object the device tooling reads:
///
/// ```text
/// {"version": 3, "features_version": 1, "size": 399, "crc32": 2864434397,
///  "quantized": true, "created_at": 1700000000,
///  "input_size": 12, "hidden_size": 16, "output_size": 10}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    /// Model version.
    pub version: u32,
    /// Feature schema version the model was trained against.
    pub features_version: u32,
    /// Artifact size in bytes.
    pub size: usize,
    /// CRC-32 of the artifact bytes.
    pub crc32: u32,
    /// Whether tensors are int8.
    #[serde(default)]
    pub quantized: bool,
    /// Creation time, Unix seconds.
    pub created_at: i64,
    /// Network dimensions.
    #[serde(flatten)]
    pub architecture: Architecture,
}

impl ArtifactMetadata {
    /// Describes a freshly packed artifact.
    #[must_use]
    pub fn from_artifact(artifact: &Artifact, created_at: i64) -> Self {
        Self {
            version: artifact.version,
            features_version: FEATURE_SCHEMA_VERSION,
            size: artifact.size(),
            crc32: artifact.crc32,
            quantized: artifact.precision.is_quantized(),
            created_at,
            architecture: Architecture::CURRENT,
        }
    }

    /// Derives metadata from raw artifact bytes when no metadata file is
    /// available. Precision is inferred from the length.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::SizeMismatch`] if the length is not one of
    /// the accepted artifact sizes.
    pub fn from_bytes(bytes: &[u8], created_at: i64) -> Result<Self> {
        let precision = Precision::from_artifact_size(bytes.len())
            .ok_or_else(|| ExportError::size_mismatch(&ACCEPTED_SIZES, bytes.len()))?;

        Ok(Self {
            version: read_version(bytes)?,
            features_version: FEATURE_SCHEMA_VERSION,
            size: bytes.len(),
            crc32: checksum(bytes),
            quantized: precision.is_quantized(),
            created_at,
            architecture: Architecture::CURRENT,
        })
    }

    /// Precision implied by the `quantized` flag.
    #[must_use]
    pub const fn precision(&self) -> Precision {
        Precision::from_quantized(self.quantized)
    }

    /// Checksum as eight uppercase hex digits.
    #[must_use]
    pub fn crc_hex(&self) -> String {
        format!("{:08X}", self.crc32)
    }

    /// Checks the contract fields: architecture and feature schema.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Validation`] on a mismatch.
    pub fn check_contract(&self) -> Result<()> {
        self.architecture.check()?;
        if self.features_version != FEATURE_SCHEMA_VERSION {
            return Err(pet_types::ValidationError::FeatureSchemaMismatch {
                expected: FEATURE_SCHEMA_VERSION,
                actual: self.features_version,
            }
            .into());
        }
        Ok(())
    }

    /// Upload headers, in the order the device expects them.
    ///
    /// # Example
    ///
    /// ```
    /// use pet_export::{pack, ArtifactMetadata, ModelWeights, Precision};
    ///
    /// let artifact = pack(&ModelWeights::default(), 2, Precision::Float32).unwrap();
    /// let meta = ArtifactMetadata::from_artifact(&artifact, 1_700_000_000);
    /// let headers = meta.transfer_headers();
    ///
    /// assert_eq!(headers[0], ("Content-Type", "application/octet-stream".to_string()));
    /// assert_eq!(headers[1], ("X-Model-Size", "1516".to_string()));
    /// ```
    #[must_use]
    pub fn transfer_headers(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Content-Type", CONTENT_TYPE.to_string()),
            (HEADER_SIZE, self.size.to_string()),
            (HEADER_VERSION, self.version.to_string()),
            (HEADER_FEATURES_VERSION, self.features_version.to_string()),
            (HEADER_CRC, self.crc_hex()),
            (HEADER_CREATED, self.created_at.to_string()),
        ]
    }

    /// Serializes to pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(ExportError::from)
    }

    /// Deserializes from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(ExportError::from)
    }
}

/// Checks `bytes` against `metadata` the way the device does before
/// accepting an upload: size, checksum, version header, precision, then
/// the architecture and feature schema contract.
///
/// # Errors
///
/// Returns the first failed check.
pub fn verify(bytes: &[u8], metadata: &ArtifactMetadata) -> Result<()> {
    if bytes.len() != metadata.size {
        return Err(ExportError::size_mismatch(&[metadata.size], bytes.len()));
    }

    let crc = checksum(bytes);
    if crc != metadata.crc32 {
        return Err(ExportError::ChecksumMismatch {
            expected: metadata.crc32,
            actual: crc,
        });
    }

    let version = read_version(bytes)?;
    if version != metadata.version {
        return Err(ExportError::VersionMismatch {
            expected: metadata.version,
            actual: version,
        });
    }

    let precision = Precision::from_artifact_size(bytes.len())
        .ok_or_else(|| ExportError::size_mismatch(&ACCEPTED_SIZES, bytes.len()))?;
    if precision != metadata.precision() {
        return Err(ExportError::PrecisionMismatch {
            expected: metadata.quantized,
            actual: precision.is_quantized(),
        });
    }

    metadata.check_contract()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::pack::pack;
    use crate::weights::ModelWeights;
    use pet_types::ValidationError;

    fn artifact(precision: Precision) -> Artifact {
        let mut w = ModelWeights::default();
        w.w1[0][0] = 0.25;
        w.b2[8] = -1.5;
        pack(&w, 4, precision).unwrap()
    }

    #[test]
    fn json_uses_flat_keys() {
        let meta = ArtifactMetadata::from_artifact(&artifact(Precision::Int8), 1_700_000_000);
        let value: serde_json::Value = serde_json::from_str(&meta.to_json().unwrap()).unwrap();

        assert_eq!(value["version"], 4);
        assert_eq!(value["features_version"], 1);
        assert_eq!(value["size"], 399);
        assert_eq!(value["quantized"], true);
        assert_eq!(value["created_at"], 1_700_000_000);
        assert_eq!(value["input_size"], 12);
        assert_eq!(value["hidden_size"], 16);
        assert_eq!(value["output_size"], 10);
        assert_eq!(value.as_object().unwrap().len(), 9);

        assert_eq!(ArtifactMetadata::from_json(&meta.to_json().unwrap()).unwrap(), meta);
    }

    #[test]
    fn headers_in_order() {
        let mut meta = ArtifactMetadata::from_artifact(&artifact(Precision::Float32), 42);
        meta.crc32 = 0x00ab_cdef;
        let names: Vec<&str> = meta.transfer_headers().iter().map(|(n, _)| *n).collect();

        assert_eq!(
            names,
            [
                "Content-Type",
                "X-Model-Size",
                "X-Model-Version",
                "X-Features-Version",
                "X-Model-CRC",
                "X-Model-Created"
            ]
        );
        assert_eq!(meta.transfer_headers()[4].1, "00ABCDEF");
        assert_eq!(meta.transfer_headers()[5].1, "42");
    }

    #[test]
    fn derived_metadata_matches_packed() {
        for precision in [Precision::Float32, Precision::Int8] {
            let a = artifact(precision);
            let packed = ArtifactMetadata::from_artifact(&a, 9);
            let derived = ArtifactMetadata::from_bytes(&a.bytes, 9).unwrap();
            assert_eq!(packed, derived);
        }
        assert!(ArtifactMetadata::from_bytes(&[0; 10], 0).is_err());
    }

    #[test]
    fn verify_accepts_matching_pair() {
        let a = artifact(Precision::Int8);
        let meta = ArtifactMetadata::from_artifact(&a, 0);
        assert!(verify(&a.bytes, &meta).is_ok());
    }

    #[test]
    fn verify_detects_corruption() {
        let a = artifact(Precision::Float32);
        let meta = ArtifactMetadata::from_artifact(&a, 0);

        let mut flipped = a.bytes.clone();
        flipped[100] ^= 0x40;
        assert!(matches!(
            verify(&flipped, &meta),
            Err(ExportError::ChecksumMismatch { .. })
        ));

        assert!(matches!(
            verify(&a.bytes[..a.bytes.len() - 1], &meta),
            Err(ExportError::SizeMismatch { .. })
        ));
    }

    #[test]
    fn verify_detects_version_and_schema_drift() {
        let a = artifact(Precision::Float32);

        let mut meta = ArtifactMetadata::from_artifact(&a, 0);
        meta.version = 5;
        assert!(matches!(
            verify(&a.bytes, &meta),
            Err(ExportError::VersionMismatch {
                expected: 5,
                actual: 4
            })
        ));

        let mut meta = ArtifactMetadata::from_artifact(&a, 0);
        meta.features_version = 2;
        assert!(matches!(
            verify(&a.bytes, &meta),
            Err(ExportError::Validation(ValidationError::FeatureSchemaMismatch { .. }))
        ));

        let mut meta = ArtifactMetadata::from_artifact(&a, 0);
        meta.architecture.hidden_size = 32;
        assert!(matches!(
            verify(&a.bytes, &meta),
            Err(ExportError::Validation(ValidationError::ArchitectureMismatch { .. }))
        ));

        let mut meta = ArtifactMetadata::from_artifact(&a, 0);
        meta.quantized = true;
        assert!(matches!(
            verify(&a.bytes, &meta),
            Err(ExportError::PrecisionMismatch { .. })
        ));
    }
}
