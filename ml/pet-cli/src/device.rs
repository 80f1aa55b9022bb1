//! `upload` and `status` subcommands.

use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use owo_colors::OwoColorize;
use pet_export::{load_artifact, verify};
use serde_json::Value;
use tracing::warn;

use crate::config::PipelineConfig;
use crate::export::verify_failure;
use crate::transfer::{DeviceClient, DeviceModelMeta};

/// Options for the `upload` subcommand.
#[derive(Debug, Clone, Copy)]
pub struct UploadArgs<'a> {
    /// Artifact to send.
    pub artifact: &'a Path,
    /// Metadata file, if not next to the artifact.
    pub meta: Option<&'a Path>,
    /// Send even if local verification fails.
    pub skip_verify: bool,
}

/// Uploads an artifact and confirms the device installed it.
pub fn upload(args: UploadArgs<'_>, config: &PipelineConfig) -> Result<()> {
    let loaded = load_artifact(args.artifact, args.meta, Utc::now().timestamp())
        .with_context(|| format!("loading {}", args.artifact.display()))?;

    match verify(&loaded.bytes, &loaded.metadata) {
        Ok(()) => println!("{} local verification passed", "✓".green()),
        Err(e) if args.skip_verify => {
            warn!(error = %e, "Uploading artifact that failed verification");
            println!("{} {e} (sending anyway)", "!".yellow());
        }
        Err(e) => {
            let reason = verify_failure(&e);
            return Err(e).context(reason);
        }
    }

    let client = DeviceClient::new(config)?;

    if let Err(e) = client.status() {
        warn!(error = %e, "Device status check failed, trying upload anyway");
    }

    println!(
        "Uploading {} bytes ({}) to {}...",
        loaded.metadata.size,
        loaded.metadata.crc_hex(),
        client.base_url()
    );
    let reply = client
        .upload_model(&loaded.bytes, &loaded.metadata)
        .context("device rejected the model")?;
    if !reply.is_null() {
        println!("  {} {reply}", "device:".dimmed());
    }

    match client.model_meta().context("reading installed model metadata")? {
        Some(installed) if installed.matches(&loaded.metadata) => {
            println!("{} model v{} installed", "✓".green(), installed.version);
            Ok(())
        }
        Some(installed) => bail!(
            "device reports v{} crc {:08X}, expected v{} crc {}",
            installed.version,
            installed.crc32,
            loaded.metadata.version,
            loaded.metadata.crc_hex()
        ),
        None => bail!("device accepted the upload but reports no model"),
    }
}

fn print_status(status: &Value) {
    match status {
        Value::Object(fields) => {
            for (key, value) in fields {
                println!("  {key:<14} {value}");
            }
        }
        other => println!("  {other}"),
    }
}

fn print_model(meta: Option<&DeviceModelMeta>) {
    println!();
    println!("{}", "Installed model".bold());
    match meta {
        Some(m) => {
            println!("  {:<14} {}", "version", m.version);
            println!("  {:<14} {}", "features", m.features_version);
            println!("  {:<14} {} bytes", "size", m.size);
            println!("  {:<14} {:08X}", "crc32", m.crc32);
            println!("  {:<14} {}", "created_at", m.created_at);
        }
        None => println!("  {}", "none".yellow()),
    }
}

/// Prints device status and, optionally, installed model metadata.
pub fn status(model: bool, config: &PipelineConfig) -> Result<()> {
    let client = DeviceClient::new(config)?;
    let status = client
        .status()
        .with_context(|| format!("querying {}", client.base_url()))?;

    println!("{} {}", "Device".bold(), client.base_url().cyan());
    print_status(&status);

    if model {
        let meta = client.model_meta().context("reading model metadata")?;
        print_model(meta.as_ref());
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pet_export::{ArtifactMetadata, ModelWeights, Precision, pack, write_artifact};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn tampered_artifact_is_not_sent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.bin");
        let artifact = pack(&ModelWeights::default(), 1, Precision::Float32).unwrap();
        write_artifact(&path, &artifact, &ArtifactMetadata::from_artifact(&artifact, 0)).unwrap();

        let mut bytes = fs::read(&path).unwrap();
        bytes[10] ^= 0x01;
        fs::write(&path, bytes).unwrap();

        // Port 9 is discard; nothing should be contacted anyway.
        let config = PipelineConfig::default().with_host("127.0.0.1:9");
        let args = UploadArgs {
            artifact: &path,
            meta: None,
            skip_verify: false,
        };
        let err = upload(args, &config).unwrap_err();
        assert!(format!("{err:#}").contains("artifact is corrupted"));
    }
}
