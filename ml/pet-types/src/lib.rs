//! Shared data model for the NeuroPet training pipeline.
//!
//! This crate holds the types every other crate in the workspace agrees on:
//!
//! # Architecture Contract
//!
//! - [`INPUT_SIZE`], [`HIDDEN_SIZE`], [`ACTION_COUNT`], [`OUTPUT_SIZE`] - fixed
//!   network dimensions shared with the device firmware
//! - [`Architecture`] - the same dimensions as a metadata record
//! - [`FEATURE_SCHEMA_VERSION`] - feature layout version the device accepts
//!
//! # Log Types
//!
//! - [`FeatureVector`] / [`Feature`] - fixed-order twelve-slot state snapshot
//! - [`InputEvent`] - user interaction kind
//! - [`Action`] - one of the eight behaviours
//! - [`LogEntry`] - one validated device log record
//! - [`decode_log`] - decode a raw JSON log, dropping malformed entries
//!
//! # Layer 0 Crate
//!
//! No I/O, no logging, no randomness. It can be used in:
//! - Dataset builders
//! - Exporters
//! - Host-side simulators of the device
//!
//! # Example
//!
//! ```
//! use pet_types::{decode_log, Action, InputEvent};
//! use serde_json::json;
//!
//! let raw = vec![json!({
//!     "ts": 0, "event": 4,
//!     "features": {"hunger": 0.1, "energy": 0.9, "affection": 0.7,
//!                  "trust": 0.6, "stress": 0.0, "dt": 0.0, "feed_5m": 0.0,
//!                  "pet_5m": 0.2, "ignore": 0.0, "tod_sin": 0.0,
//!                  "tod_cos": 1.0, "spam": 0.0},
//!     "brain": {"action": 4, "valence": 0.1, "arousal": 0.45}
//! })];
//!
//! let log = decode_log(&raw);
//! assert_eq!(log.entries[0].event, InputEvent::PetShort);
//! assert_eq!(log.entries[0].brain.action, Action::AskPet);
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod action;
pub mod arch;
mod error;
mod event;
mod feature;
mod log_entry;

// Re-export architecture contract
pub use arch::{
    ACTION_COUNT, Architecture, FEATURE_SCHEMA_VERSION, HIDDEN_SIZE, INPUT_SIZE, OUTPUT_SIZE,
};

// Re-export log types
pub use action::{ACTION_NAMES, Action};
pub use event::{INPUT_EVENT_NAMES, InputEvent};
pub use feature::{FEATURE_NAMES, Feature, FeatureVector};
pub use log_entry::{BrainOutput, DecodedLog, LogEntry, RejectedEntry, StateSnapshot, decode_log};

// Re-export error types
pub use error::{Result, ValidationError};
