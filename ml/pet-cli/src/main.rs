//! NeuroPet offline pipeline.
//!
//! Everything that happens off the device between collecting interaction
//! logs and installing a new brain.
//!
//! # Commands
//!
//! - `neuropet dataset` - fetch the device log and build a weighted dataset
//! - `neuropet synth` - generate a synthetic bootstrap dataset
//! - `neuropet export <WEIGHTS>` - pack trained weights into a device artifact
//! - `neuropet inspect <ARTIFACT>` - verify an artifact and show its contents
//! - `neuropet upload <ARTIFACT>` - send an artifact and confirm installation
//! - `neuropet status` - show device status
//!
//! Settings come from an optional JSON config file (`--config`); flags
//! override it. `RUST_LOG` overrides `--verbose`.

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod config;
mod dataset;
mod device;
mod export;
mod transfer;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pet_dataset::SplitRatio;
use pet_export::WeightsLayout;
use tracing_subscriber::EnvFilter;

use crate::config::PipelineConfig;
use crate::dataset::{DatasetArgs, SplitMode};
use crate::device::UploadArgs;
use crate::export::ExportArgs;

/// NeuroPet dataset and model tooling
#[derive(Parser)]
#[command(name = "neuropet")]
#[command(about = "Build datasets from pet logs, export and upload models", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Device host or URL (overrides config)
    #[arg(long, global = true)]
    host: Option<String>,

    /// Seed for splits and synthetic data (overrides config)
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a labeled dataset from the device log
    Dataset {
        /// Read the log from a JSON file instead of the device
        #[arg(long)]
        input: Option<PathBuf>,

        /// Dataset output file
        #[arg(long, short, default_value = "dataset.json")]
        output: PathBuf,

        /// Also write <name>_train and <name>_val files
        #[arg(long)]
        split: bool,

        /// Split each target action separately (implies --split)
        #[arg(long)]
        stratified: bool,

        /// Training share of the split (overrides config)
        #[arg(long)]
        split_ratio: Option<f32>,
    },

    /// Generate a synthetic bootstrap dataset
    Synth {
        /// Number of examples (overrides config)
        #[arg(long)]
        count: Option<usize>,

        /// Dataset output file
        #[arg(long, short, default_value = "synthetic.json")]
        output: PathBuf,
    },

    /// Pack trained weights into a device artifact
    Export {
        /// Trained weights JSON
        #[arg(name = "WEIGHTS")]
        weights: PathBuf,

        /// Weights file layout: device or linear
        #[arg(long, default_value = "device")]
        layout: WeightsLayout,

        /// Artifact output file; metadata goes next to it
        #[arg(long, short, default_value = "model.bin")]
        output: PathBuf,

        /// Model version header (overrides config)
        #[arg(long = "model-version")]
        model_version: Option<u32>,

        /// Export int8 tensors
        #[arg(long)]
        quantize: bool,
    },

    /// Verify an artifact and show what it contains
    Inspect {
        /// Artifact file
        #[arg(name = "ARTIFACT")]
        artifact: PathBuf,

        /// Metadata file (default: next to the artifact)
        #[arg(long)]
        meta: Option<PathBuf>,
    },

    /// Upload an artifact to the device
    Upload {
        /// Artifact file
        #[arg(name = "ARTIFACT")]
        artifact: PathBuf,

        /// Metadata file (default: next to the artifact)
        #[arg(long)]
        meta: Option<PathBuf>,

        /// Send even if local verification fails
        #[arg(long)]
        skip_verify: bool,
    },

    /// Show device status
    Status {
        /// Also show installed model metadata
        #[arg(long)]
        model: bool,
    },
}

fn init_logging(verbose: bool) -> Result<()> {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn load_config(
    path: Option<&Path>,
    host: Option<String>,
    seed: Option<u64>,
) -> Result<PipelineConfig> {
    let mut config = match path {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(host) = host {
        config = config.with_host(host);
    }
    if let Some(seed) = seed {
        config = config.with_seed(seed);
    }
    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let mut config = load_config(cli.config.as_deref(), cli.host, cli.seed)?;

    match cli.command {
        Commands::Dataset {
            input,
            output,
            split,
            stratified,
            split_ratio,
        } => {
            if let Some(ratio) = split_ratio {
                config = config.with_split_ratio(
                    SplitRatio::try_new(ratio).context("invalid --split-ratio")?,
                );
            }
            let split = if stratified {
                SplitMode::Stratified
            } else if split {
                SplitMode::Random
            } else {
                SplitMode::None
            };
            dataset::run(
                &DatasetArgs {
                    input,
                    output,
                    split,
                },
                &config,
            )
        }
        Commands::Synth { count, output } => {
            dataset::synth(count.unwrap_or(config.synthetic_samples), &output, &config)
        }
        Commands::Export {
            weights,
            layout,
            output,
            model_version,
            quantize,
        } => {
            if let Some(version) = model_version {
                config = config.with_model_version(version);
            }
            if quantize {
                config = config.with_quantize(true);
            }
            export::run(
                &ExportArgs {
                    weights,
                    layout,
                    output,
                },
                &config,
            )
            .map(drop)
        }
        Commands::Inspect { artifact, meta } => export::inspect(&artifact, meta.as_deref()),
        Commands::Upload {
            artifact,
            meta,
            skip_verify,
        } => device::upload(
            UploadArgs {
                artifact: &artifact,
                meta: meta.as_deref(),
                skip_verify,
            },
            &config,
        ),
        Commands::Status { model } => device::status(model, &config),
    }
}
