//! Pipeline configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use pet_dataset::SplitRatio;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Address of a device running as its own access point.
pub const DEFAULT_HOST: &str = "192.168.4.1";

/// Errors from loading or validating a [`PipelineConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// Config file is not valid JSON for this schema.
    #[error("failed to parse config {path}: {source}")]
    Parse {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },

    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Settings shared by all subcommands.
///
/// Every field has a default, so a config file only needs the values it
/// changes. Command-line flags override the file.
///
/// # Example
///
/// ```text
/// {"host": "10.0.0.7", "quantize": true, "model_version": 4}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Device host or base URL.
    pub host: String,

    /// Timeout for `GET /api/log`, seconds.
    pub fetch_timeout_secs: u64,

    /// Timeout for `POST /api/model`, seconds.
    pub upload_timeout_secs: u64,

    /// Timeout for status and metadata queries, seconds.
    pub status_timeout_secs: u64,

    /// Version written into exported artifacts.
    pub model_version: u32,

    /// Export int8 instead of float32.
    pub quantize: bool,

    /// Training share of the train/validation split.
    pub split_ratio: SplitRatio,

    /// Seed for splitting and synthetic data.
    pub seed: Option<u64>,

    /// Number of synthetic examples.
    pub synthetic_samples: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            fetch_timeout_secs: 10,
            upload_timeout_secs: 30,
            status_timeout_secs: 5,
            model_version: 1,
            quantize: false,
            split_ratio: SplitRatio::EIGHTY_TWENTY,
            seed: None,
            synthetic_samples: 1000,
        }
    }
}

impl PipelineConfig {
    /// Loads a config file, falling back to defaults for absent keys.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] or [`ConfigError::Parse`], or
    /// [`ConfigError::Invalid`] if the loaded values fail
    /// [`PipelineConfig::validate`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the device host.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the model version.
    #[must_use]
    pub const fn with_model_version(mut self, version: u32) -> Self {
        self.model_version = version;
        self
    }

    /// Sets whether to quantize.
    #[must_use]
    pub const fn with_quantize(mut self, quantize: bool) -> Self {
        self.quantize = quantize;
        self
    }

    /// Sets the split ratio.
    #[must_use]
    pub const fn with_split_ratio(mut self, ratio: SplitRatio) -> Self {
        self.split_ratio = ratio;
        self
    }

    /// Sets the random seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Invalid("host must not be empty".into()));
        }
        for (name, secs) in [
            ("fetch_timeout_secs", self.fetch_timeout_secs),
            ("upload_timeout_secs", self.upload_timeout_secs),
            ("status_timeout_secs", self.status_timeout_secs),
        ] {
            if secs == 0 {
                return Err(ConfigError::Invalid(format!("{name} must be positive")));
            }
        }
        if self.synthetic_samples == 0 {
            return Err(ConfigError::Invalid(
                "synthetic_samples must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Base URL of the device, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> String {
        let host = self.host.trim().trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("http://{host}")
        }
    }

    /// Log fetch timeout.
    #[must_use]
    pub const fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Upload timeout.
    #[must_use]
    pub const fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.upload_timeout_secs)
    }

    /// Status query timeout.
    #[must_use]
    pub const fn status_timeout(&self) -> Duration {
        Duration::from_secs(self.status_timeout_secs)
    }
}
