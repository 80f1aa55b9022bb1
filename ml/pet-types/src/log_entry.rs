//! Decoded device log entries.
//!
//! The device serves its ring buffer as a JSON array. Each object carries
//! the input event, the feature vector the brain saw, what the brain
//! emitted, and a snapshot of internal state after the event:
//!
//! ```text
//! {"ts": 60, "event": 1,
//!  "features": {"hunger": 0.8, "energy": 0.5, "affection": 0.2, "trust": 0.5,
//!               "stress": 0.1, "dt": 0.0, "feed_5m": 0.0, "pet_5m": 0.0,
//!               "ignore": 0.0, "tod_sin": 0.0, "tod_cos": 1.0, "spam": 0.0},
//!  "brain": {"action": 3, "valence": -0.2, "arousal": 0.3},
//!  "state": {"hunger": 0.6, "energy": 0.5, "affection": 0.2,
//!            "trust": 0.55, "stress": 0.1}}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::action::Action;
use crate::error::{Result, ValidationError};
use crate::event::InputEvent;
use crate::feature::{FEATURE_NAMES, FeatureVector};

/// Internal state recorded after an event.
///
/// Every field is optional; older firmware omits some of them.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Hunger after the event.
    #[serde(default)]
    pub hunger: Option<f32>,
    /// Energy after the event.
    #[serde(default)]
    pub energy: Option<f32>,
    /// Affection need after the event.
    #[serde(default)]
    pub affection: Option<f32>,
    /// Trust after the event.
    #[serde(default)]
    pub trust: Option<f32>,
    /// Stress after the event.
    #[serde(default)]
    pub stress: Option<f32>,
}

impl StateSnapshot {
    fn check_finite(&self) -> Result<()> {
        for (field, value) in [
            ("state.hunger", self.hunger),
            ("state.energy", self.energy),
            ("state.affection", self.affection),
            ("state.trust", self.trust),
            ("state.stress", self.stress),
        ] {
            if let Some(value) = value {
                finite(field, value)?;
            }
        }
        Ok(())
    }
}

/// Out-of-range JSON numbers deserialize to `inf`.
fn finite(field: &'static str, value: f32) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::NonFinite { field })
    }
}

/// What the on-device brain emitted for an entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BrainOutput {
    /// Chosen action.
    pub action: Action,
    /// Emitted valence.
    pub valence: f32,
    /// Emitted arousal.
    pub arousal: f32,
}

/// One immutable, validated log record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Device timestamp.
    pub timestamp: u64,
    /// Input event.
    pub event: InputEvent,
    /// Features the brain saw.
    pub features: FeatureVector,
    /// What the brain emitted.
    pub brain: BrainOutput,
    /// State after the event.
    pub state_after: StateSnapshot,
}

#[derive(Deserialize)]
struct RawEntry {
    ts: u64,
    event: u64,
    features: RawFeatures,
    brain: RawBrain,
    #[serde(default)]
    state: StateSnapshot,
}

#[derive(Deserialize)]
struct RawFeatures {
    hunger: f32,
    energy: f32,
    affection: f32,
    trust: f32,
    stress: f32,
    dt: f32,
    feed_5m: f32,
    pet_5m: f32,
    ignore: f32,
    tod_sin: f32,
    tod_cos: f32,
    spam: f32,
}

#[derive(Deserialize)]
struct RawBrain {
    action: u64,
    valence: f32,
    arousal: f32,
}

impl LogEntry {
    /// Decodes one raw log object.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Malformed`] when a required field is
    /// missing or mistyped, [`ValidationError::NonFinite`] for a number that
    /// does not fit an `f32` (such as `1e39`), [`ValidationError::UnknownEvent`]
    /// or [`ValidationError::UnknownAction`] for ids outside their enumeration.
    ///
    /// # Example
    ///
    /// ```
    /// use pet_types::{InputEvent, LogEntry};
    /// use serde_json::json;
    ///
    /// let raw = json!({
    ///     "ts": 0, "event": 1,
    ///     "features": {"hunger": 0.8, "energy": 0.5, "affection": 0.2,
    ///                  "trust": 0.5, "stress": 0.1, "dt": 0.0, "feed_5m": 0.0,
    ///                  "pet_5m": 0.0, "ignore": 0.0, "tod_sin": 0.0,
    ///                  "tod_cos": 1.0, "spam": 0.0},
    ///     "brain": {"action": 3, "valence": 0.0, "arousal": 0.3}
    /// });
    ///
    /// let entry = LogEntry::from_value(&raw).unwrap();
    /// assert_eq!(entry.event, InputEvent::FeedShort);
    /// assert!(entry.state_after.trust.is_none());
    /// ```
    pub fn from_value(value: &Value) -> Result<Self> {
        let raw = RawEntry::deserialize(value)
            .map_err(|e| ValidationError::malformed(e.to_string()))?;

        let event = InputEvent::from_id(raw.event).ok_or(ValidationError::UnknownEvent(raw.event))?;
        let action =
            Action::from_id(raw.brain.action).ok_or(ValidationError::UnknownAction(raw.brain.action))?;

        let f = raw.features;
        let features = FeatureVector::new([
            f.hunger, f.energy, f.affection, f.trust, f.stress, f.dt, f.feed_5m, f.pet_5m,
            f.ignore, f.tod_sin, f.tod_cos, f.spam,
        ]);

        for (&value, field) in features.as_array().iter().zip(FEATURE_NAMES) {
            finite(field, value)?;
        }
        finite("brain.valence", raw.brain.valence)?;
        finite("brain.arousal", raw.brain.arousal)?;
        raw.state.check_finite()?;

        Ok(Self {
            timestamp: raw.ts,
            event,
            features,
            brain: BrainOutput {
                action,
                valence: raw.brain.valence,
                arousal: raw.brain.arousal,
            },
            state_after: raw.state,
        })
    }
}

/// A raw object that failed to decode.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedEntry {
    /// Position in the raw sequence.
    pub index: usize,
    /// Why it was rejected.
    pub error: ValidationError,
}

/// Result of decoding a raw log: usable entries in order plus rejects.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedLog {
    /// Successfully decoded entries, original order preserved.
    pub entries: Vec<LogEntry>,
    /// Entries that were dropped.
    pub rejected: Vec<RejectedEntry>,
}

/// Decodes a raw log, keeping every entry that validates.
///
/// A bad entry never aborts decoding of the rest.
#[must_use]
pub fn decode_log(raw: &[Value]) -> DecodedLog {
    let mut decoded = DecodedLog::default();
    for (index, value) in raw.iter().enumerate() {
        match LogEntry::from_value(value) {
            Ok(entry) => decoded.entries.push(entry),
            Err(error) => decoded.rejected.push(RejectedEntry { index, error }),
        }
    }
    decoded
}
