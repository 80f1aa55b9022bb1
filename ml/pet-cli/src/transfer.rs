//! HTTP transfer to and from the device.
//!
//! The device serves four endpoints:
//!
//! - `GET /api/log` - JSON array of raw log objects
//! - `POST /api/model` - artifact bytes, metadata in headers
//! - `GET /api/status` - free-form status object
//! - `GET /api/model/meta` - metadata of the installed model, 404 if none

use std::time::Duration;

use pet_export::ArtifactMetadata;
use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::PipelineConfig;

/// Errors talking to the device.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Connection, timeout, or decoding failure.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Device answered with a non-success status.
    #[error("{url} returned {status}: {body}")]
    Status {
        /// Request URL.
        url: String,
        /// HTTP status.
        status: StatusCode,
        /// Response body text.
        body: String,
    },

    /// Log endpoint did not return a JSON array.
    #[error("log endpoint returned {0}, expected a JSON array")]
    NotAnArray(&'static str),
}

/// Model metadata as reported by the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceModelMeta {
    /// Installed model version.
    pub version: u32,
    /// Feature schema version of the installed model.
    pub features_version: u32,
    /// Artifact size in bytes.
    pub size: usize,
    /// CRC-32 of the installed artifact.
    pub crc32: u32,
    /// Creation time, Unix seconds.
    #[serde(default)]
    pub created_at: i64,
}

impl DeviceModelMeta {
    /// Returns true if the device holds exactly the described artifact.
    #[must_use]
    pub fn matches(&self, expected: &ArtifactMetadata) -> bool {
        self.version == expected.version
            && self.features_version == expected.features_version
            && self.size == expected.size
            && self.crc32 == expected.crc32
    }
}

/// Blocking client for one device.
#[derive(Debug, Clone)]
pub struct DeviceClient {
    client: Client,
    base_url: String,
    fetch_timeout: Duration,
    upload_timeout: Duration,
    status_timeout: Duration,
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl DeviceClient {
    /// Creates a client using the host and timeouts from `config`.
    ///
    /// The device sits on the local network, so system proxies are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &PipelineConfig) -> Result<Self, TransferError> {
        Ok(Self {
            client: Client::builder().no_proxy().build()?,
            base_url: config.base_url(),
            fetch_timeout: config.fetch_timeout(),
            upload_timeout: config.upload_timeout(),
            status_timeout: config.status_timeout(),
        })
    }

    /// Device base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn send(&self, request: RequestBuilder, url: &str) -> Result<Response, TransferError> {
        let response = request.send()?;
        let status = response.status();
        debug!(url, %status, "Device responded");
        if status.is_success() {
            Ok(response)
        } else {
            Err(TransferError::Status {
                url: url.to_string(),
                status,
                body: response.text().unwrap_or_default(),
            })
        }
    }

    /// Downloads the raw interaction log.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-success status, or a
    /// body that is not a JSON array.
    pub fn fetch_log(&self) -> Result<Vec<Value>, TransferError> {
        let url = self.url("/api/log");
        let request = self.client.get(&url).timeout(self.fetch_timeout);
        let body: Value = self.send(request, &url)?.json()?;

        match body {
            Value::Array(entries) => {
                info!(url = %url, entries = entries.len(), "Fetched device log");
                Ok(entries)
            }
            other => Err(TransferError::NotAnArray(json_kind(&other))),
        }
    }

    /// Uploads an artifact with its metadata as headers.
    ///
    /// Returns the device's JSON reply, or `Null` if the reply is not JSON.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-success status; the
    /// device rejects bad checksums and schema mismatches with 400.
    pub fn upload_model(
        &self,
        bytes: &[u8],
        metadata: &ArtifactMetadata,
    ) -> Result<Value, TransferError> {
        let url = self.url("/api/model");
        let mut request = self
            .client
            .post(&url)
            .timeout(self.upload_timeout)
            .body(bytes.to_vec());
        for (name, value) in metadata.transfer_headers() {
            request = request.header(name, value);
        }

        let response = self.send(request, &url)?;
        let text = response.text()?;
        info!(
            url = %url,
            size = bytes.len(),
            crc32 = %metadata.crc_hex(),
            "Uploaded model"
        );
        Ok(serde_json::from_str(&text).unwrap_or(Value::Null))
    }

    /// Reads the device status object.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-success status, or a
    /// non-JSON body.
    pub fn status(&self) -> Result<Value, TransferError> {
        let url = self.url("/api/status");
        let request = self.client.get(&url).timeout(self.status_timeout);
        Ok(self.send(request, &url)?.json()?)
    }

    /// Reads metadata of the installed model. `None` if the device has no
    /// model.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a status other than success
    /// or 404, or a body that does not describe a model.
    pub fn model_meta(&self) -> Result<Option<DeviceModelMeta>, TransferError> {
        let url = self.url("/api/model/meta");
        let response = self
            .client
            .get(&url)
            .timeout(self.status_timeout)
            .send()?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(TransferError::Status {
                url,
                status: response.status(),
                body: response.text().unwrap_or_default(),
            });
        }
        Ok(Some(response.json()?))
    }
}
