//! `dataset` and `synth` subcommands.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use pet_dataset::{
    DatasetSummary, LabeledDataset, assemble, save_dataset, split_dataset, split_stratified,
    synthesize,
};
use serde_json::Value;
use tracing::info;

use crate::config::PipelineConfig;
use crate::transfer::DeviceClient;

/// How to split the assembled dataset, if at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SplitMode {
    /// Write one file.
    #[default]
    None,
    /// Random train/validation split.
    Random,
    /// Split each target action separately.
    Stratified,
}

/// Options for the `dataset` subcommand.
#[derive(Debug, Clone)]
pub struct DatasetArgs {
    /// Read the log from this file instead of the device.
    pub input: Option<PathBuf>,
    /// Dataset output path.
    pub output: PathBuf,
    /// Split mode.
    pub split: SplitMode,
}

/// `<dir>/<stem>_<suffix>.<ext>` next to `path`.
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map_or_else(|| "dataset".into(), |s| s.to_string_lossy().into_owned());
    let name = match path.extension() {
        Some(ext) => format!("{stem}_{suffix}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{suffix}"),
    };
    path.with_file_name(name)
}

fn read_log_file(path: &Path) -> Result<Vec<Value>> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("reading log {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("{} is not a JSON array of log entries", path.display()))
}

fn print_summary(title: &str, summary: &DatasetSummary) {
    println!();
    println!("{}", title.bold());
    print!("{}", summary.to_report());
}

fn write_split(
    dataset: &LabeledDataset,
    output: &Path,
    mode: SplitMode,
    config: &PipelineConfig,
) -> Result<()> {
    let (train, val) = match mode {
        SplitMode::None => return Ok(()),
        SplitMode::Random => split_dataset(dataset, config.split_ratio, config.seed),
        SplitMode::Stratified => split_stratified(dataset, config.split_ratio, config.seed),
    };

    for (part, data) in [("train", &train), ("val", &val)] {
        let path = sibling(output, part);
        save_dataset(data, &path).with_context(|| format!("writing {}", path.display()))?;
        println!("  {} {part}: {} examples -> {}", "✓".green(), data.len(), path.display());
    }
    Ok(())
}

/// Builds a labeled dataset from a device log.
pub fn run(args: &DatasetArgs, config: &PipelineConfig) -> Result<()> {
    let raw = match &args.input {
        Some(path) => read_log_file(path)?,
        None => {
            println!("Fetching log from {}...", config.base_url());
            DeviceClient::new(config)?
                .fetch_log()
                .context("fetching device log")?
        }
    };
    info!(entries = raw.len(), "Loaded raw log");

    let assembly = assemble(&raw).context("assembling dataset")?;

    save_dataset(&assembly.dataset, &args.output)
        .with_context(|| format!("writing {}", args.output.display()))?;

    print_summary("Dataset", &assembly.summary);
    println!();
    println!(
        "{} {} examples -> {}",
        "✓".green(),
        assembly.dataset.len(),
        args.output.display()
    );

    write_split(&assembly.dataset, &args.output, args.split, config)
}

/// Generates a synthetic bootstrap dataset.
pub fn synth(count: usize, output: &Path, config: &PipelineConfig) -> Result<()> {
    let dataset = synthesize(count, config.seed).context("generating synthetic dataset")?;
    save_dataset(&dataset, output).with_context(|| format!("writing {}", output.display()))?;

    print_summary("Synthetic dataset", &DatasetSummary::from_dataset(&dataset));
    println!();
    println!(
        "{} {} examples -> {}",
        "✓".green(),
        dataset.len(),
        output.display()
    );
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pet_dataset::load_dataset;
    use serde_json::json;
    use tempfile::tempdir;

    fn entry(ts: u64, event: u64, hunger: f64) -> Value {
        json!({
            "ts": ts, "event": event,
            "features": {"hunger": hunger, "energy": 0.5, "affection": 0.2,
                         "trust": 0.5, "stress": 0.1, "dt": 0.0, "feed_5m": 0.0,
                         "pet_5m": 0.0, "ignore": 0.0, "tod_sin": 0.0,
                         "tod_cos": 1.0, "spam": 0.0},
            "brain": {"action": 1, "valence": 0.0, "arousal": 0.3}
        })
    }

    #[test]
    fn sibling_names() {
        assert_eq!(
            sibling(Path::new("out/dataset.json"), "train"),
            PathBuf::from("out/dataset_train.json")
        );
        assert_eq!(sibling(Path::new("data"), "val"), PathBuf::from("data_val"));
    }

    #[test]
    fn dataset_from_file_with_split() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("log.json");
        let raw: Vec<Value> = (0..10).map(|i| entry(i * 60, i % 8, 0.8)).collect();
        fs::write(&log, serde_json::to_string(&raw).unwrap()).unwrap();

        let output = dir.path().join("dataset.json");
        let args = DatasetArgs {
            input: Some(log),
            output: output.clone(),
            split: SplitMode::Random,
        };
        run(&args, &PipelineConfig::default().with_seed(1)).unwrap();

        assert_eq!(load_dataset(&output).unwrap().len(), 10);
        assert_eq!(load_dataset(sibling(&output, "train")).unwrap().len(), 8);
        assert_eq!(load_dataset(sibling(&output, "val")).unwrap().len(), 2);
    }

    #[test]
    fn too_short_log_writes_nothing() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("log.json");
        fs::write(&log, serde_json::to_string(&[entry(0, 1, 0.8)]).unwrap()).unwrap();

        let output = dir.path().join("dataset.json");
        let args = DatasetArgs {
            input: Some(log),
            output: output.clone(),
            split: SplitMode::None,
        };
        let err = run(&args, &PipelineConfig::default()).unwrap_err();

        assert!(format!("{err:#}").contains("insufficient data"));
        assert!(!output.exists());
    }

    #[test]
    fn synth_writes_requested_count() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("synthetic.json");
        synth(25, &output, &PipelineConfig::default().with_seed(2)).unwrap();
        assert_eq!(load_dataset(&output).unwrap().len(), 25);
    }
}
