//! Model export for NeuroPet devices.
//!
//! Turns trained float weights into the byte buffer the device loads:
//!
//! # Weights
//!
//! - [`ModelWeights`] - dense two-layer weights in device layout
//! - [`LinearLayers`] - output-major layers, transposed on import
//! - [`ModelWeights::forward`] - reference forward pass matching the device
//!
//! # Quantization
//!
//! - [`quantize`] / [`dequantize`] - symmetric per-tensor int8
//! - [`QuantScales`] - the four per-tensor scales
//!
//! # Artifacts
//!
//! - [`pack`] / [`unpack`] - byte-exact little-endian layout, see [`layout`]
//! - [`ArtifactMetadata`] - side record and upload headers
//! - [`verify`] - the checks the device runs before accepting an upload
//! - [`write_artifact`] / [`load_artifact`] - `.bin` plus `.json` on disk
//!
//! # Example
//!
//! ```
//! use pet_export::{pack, unpack, verify, ArtifactMetadata, ModelWeights, Precision};
//!
//! let mut weights = ModelWeights::default();
//! weights.b2[1] = 0.5;
//!
//! let artifact = pack(&weights, 1, Precision::Float32).unwrap();
//! let meta = ArtifactMetadata::from_artifact(&artifact, 0);
//! verify(&artifact.bytes, &meta).unwrap();
//!
//! let model = unpack(&artifact.bytes).unwrap();
//! assert_eq!(model.weights().unwrap(), weights);
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod artifact;
mod error;
pub mod layout;
mod metadata;
mod pack;
mod quantize;
mod weights;

// Re-export weight types
pub use weights::{Inference, LinearLayers, ModelWeights};

// Re-export quantization
pub use quantize::{
    QUANT_MAX, QuantScales, QuantizedTensor, QuantizedWeights, dequantize, quantize, scale_for,
};

// Re-export packing
pub use pack::{
    Artifact, Precision, UnpackedModel, UnpackedTensors, checksum, pack, read_version, unpack,
};

// Re-export metadata
pub use metadata::{ArtifactMetadata, verify};

// Re-export file helpers
pub use artifact::{
    LoadedArtifact, WeightsLayout, load_artifact, load_weights, metadata_path, read_metadata,
    write_artifact,
};

// Re-export error types
pub use error::{ExportError, Result};
