//! `export` and `inspect` subcommands.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use owo_colors::OwoColorize;
use pet_export::{
    ArtifactMetadata, ExportError, Precision, UnpackedTensors, WeightsLayout, load_artifact, load_weights,
    pack, unpack, verify, write_artifact,
};
use tracing::info;

use crate::config::PipelineConfig;

/// Options for the `export` subcommand.
#[derive(Debug, Clone)]
pub struct ExportArgs {
    /// Trained weights JSON.
    pub weights: PathBuf,
    /// Layout of the weights file.
    pub layout: WeightsLayout,
    /// Artifact output path; metadata goes next to it.
    pub output: PathBuf,
}

/// Packs trained weights into a device artifact plus metadata file.
///
/// Returns the metadata that was written.
pub fn run(args: &ExportArgs, config: &PipelineConfig) -> Result<ArtifactMetadata> {
    let weights = load_weights(&args.weights, args.layout)
        .with_context(|| format!("loading weights from {}", args.weights.display()))?;

    let precision = Precision::from_quantized(config.quantize);
    let artifact = pack(&weights, config.model_version, precision).context("packing model")?;
    let metadata = ArtifactMetadata::from_artifact(&artifact, Utc::now().timestamp());

    // Never write what the device would reject.
    verify(&artifact.bytes, &metadata).context("packed artifact failed verification")?;

    let meta_path = write_artifact(&args.output, &artifact, &metadata)
        .with_context(|| format!("writing {}", args.output.display()))?;
    info!(precision = %precision, "Exported model");

    println!("{}", "Model exported".bold());
    println!("  {:<10} {}", "artifact", args.output.display());
    println!("  {:<10} {}", "metadata", meta_path.display());
    print_metadata(&metadata);
    println!();
    println!("{} ready for upload", "✓".green());

    Ok(metadata)
}

/// Context line for a failed [`verify`]: damaged bytes or a mismatched contract.
pub fn verify_failure(err: &ExportError) -> &'static str {
    if err.is_corruption() {
        "artifact is corrupted"
    } else {
        "artifact does not match its metadata"
    }
}

fn format_created(created_at: i64) -> String {
    DateTime::<Utc>::from_timestamp(created_at, 0)
        .map_or_else(|| created_at.to_string(), |t| t.to_rfc3339())
}

fn print_metadata(meta: &ArtifactMetadata) {
    println!("  {:<10} {}", "version", meta.version);
    println!("  {:<10} {}", "features", meta.features_version);
    println!("  {:<10} {}", "precision", meta.precision());
    println!("  {:<10} {} bytes", "size", meta.size);
    println!("  {:<10} {}", "crc32", meta.crc_hex());
    println!("  {:<10} {}", "network", meta.architecture);
    println!("  {:<10} {}", "created", format_created(meta.created_at));
}

/// Verifies an artifact against its metadata and prints what it contains.
///
/// Returns an error if any check fails.
pub fn inspect(artifact: &Path, meta: Option<&Path>) -> Result<()> {
    let loaded = load_artifact(artifact, meta, Utc::now().timestamp())
        .with_context(|| format!("loading {}", artifact.display()))?;

    println!("{}", artifact.display().to_string().bold());
    if loaded.derived {
        println!("  {}", "no metadata file; derived from bytes".yellow());
    }
    print_metadata(&loaded.metadata);

    let model = unpack(&loaded.bytes).context("decoding artifact")?;
    if let UnpackedTensors::Int8(q) = &model.tensors {
        let s = q.scales;
        println!(
            "  {:<10} w1={:.6} b1={:.6} w2={:.6} b2={:.6}",
            "scales", s.w1, s.b1, s.w2, s.b2
        );
    }
    let weights = model.weights().context("artifact holds non-finite weights")?;
    let bias_only = weights.forward(&pet_types::FeatureVector::default());
    println!(
        "  {:<10} {} (valence {:+.3}, arousal {:.3})",
        "zero input",
        bias_only.action(),
        bias_only.valence,
        bias_only.arousal
    );

    println!();
    match verify(&loaded.bytes, &loaded.metadata) {
        Ok(()) => {
            println!("{} artifact matches its metadata", "✓".green());
            Ok(())
        }
        Err(e) => {
            println!("{} {e}", "✗".red());
            let reason = verify_failure(&e);
            Err(e).context(reason)
        }
    }
}
