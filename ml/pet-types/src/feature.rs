//! Feature vector: the fixed-order snapshot of device state.

use serde::{Deserialize, Serialize};

use crate::arch::INPUT_SIZE;

/// Feature names in wire order.
pub const FEATURE_NAMES: [&str; INPUT_SIZE] = [
    "hunger",
    "energy",
    "affection_need",
    "trust",
    "stress",
    "dt_seconds_norm",
    "feed_count_5m_norm",
    "pet_count_5m_norm",
    "ignore_time_norm",
    "time_of_day_sin",
    "time_of_day_cos",
    "spam_score_norm",
];

/// One slot of the feature vector.
///
/// The discriminant is the slot index. Order is shared with the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(usize)]
pub enum Feature {
    /// Hunger level in `[0, 1]`.
    Hunger = 0,
    /// Energy level in `[0, 1]`.
    Energy = 1,
    /// Need for affection in `[0, 1]`.
    AffectionNeed = 2,
    /// Trust towards the owner in `[0, 1]`.
    Trust = 3,
    /// Stress level in `[0, 1]`.
    Stress = 4,
    /// Normalized time since the previous event.
    Elapsed = 5,
    /// Normalized feed count over the last five minutes.
    FeedCount5m = 6,
    /// Normalized pet count over the last five minutes.
    PetCount5m = 7,
    /// Normalized duration of being ignored.
    IgnoreTime = 8,
    /// Sine of the time of day.
    TimeOfDaySin = 9,
    /// Cosine of the time of day.
    TimeOfDayCos = 10,
    /// Normalized spam score.
    SpamScore = 11,
}

impl Feature {
    /// All features in wire order.
    pub const ALL: [Self; INPUT_SIZE] = [
        Self::Hunger,
        Self::Energy,
        Self::AffectionNeed,
        Self::Trust,
        Self::Stress,
        Self::Elapsed,
        Self::FeedCount5m,
        Self::PetCount5m,
        Self::IgnoreTime,
        Self::TimeOfDaySin,
        Self::TimeOfDayCos,
        Self::SpamScore,
    ];

    /// Slot index in the vector.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Canonical name, as stored in dataset files.
    #[must_use]
    pub const fn name(self) -> &'static str {
        FEATURE_NAMES[self as usize]
    }
}

/// Fixed-order vector of twelve features.
///
/// Position encodes meaning; use [`Feature`] to address slots.
///
/// # Example
///
/// ```
/// use pet_types::{Feature, FeatureVector};
///
/// let fv = FeatureVector::zeros()
///     .with(Feature::Hunger, 0.8)
///     .with(Feature::Energy, 0.4);
///
/// assert!((fv.hunger() - 0.8).abs() < 1e-6);
/// assert!((fv[Feature::Energy] - 0.4).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector([f32; INPUT_SIZE]);

impl FeatureVector {
    /// Wraps raw values in wire order.
    #[must_use]
    pub const fn new(values: [f32; INPUT_SIZE]) -> Self {
        Self(values)
    }

    /// All-zero vector.
    #[must_use]
    pub const fn zeros() -> Self {
        Self([0.0; INPUT_SIZE])
    }

    /// Returns a copy with one slot replaced.
    #[must_use]
    pub const fn with(mut self, feature: Feature, value: f32) -> Self {
        self.0[feature.index()] = value;
        self
    }

    /// Reads one slot.
    #[must_use]
    pub const fn get(&self, feature: Feature) -> f32 {
        self.0[feature.index()]
    }

    /// Raw values in wire order.
    #[must_use]
    pub const fn as_array(&self) -> &[f32; INPUT_SIZE] {
        &self.0
    }

    /// Hunger slot.
    #[must_use]
    pub const fn hunger(&self) -> f32 {
        self.get(Feature::Hunger)
    }

    /// Energy slot.
    #[must_use]
    pub const fn energy(&self) -> f32 {
        self.get(Feature::Energy)
    }

    /// Affection-need slot.
    #[must_use]
    pub const fn affection_need(&self) -> f32 {
        self.get(Feature::AffectionNeed)
    }

    /// Trust slot.
    #[must_use]
    pub const fn trust(&self) -> f32 {
        self.get(Feature::Trust)
    }

    /// Stress slot.
    #[must_use]
    pub const fn stress(&self) -> f32 {
        self.get(Feature::Stress)
    }

    /// Spam-score slot.
    #[must_use]
    pub const fn spam_score(&self) -> f32 {
        self.get(Feature::SpamScore)
    }

    /// Returns `true` if every value is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }
}

impl From<[f32; INPUT_SIZE]> for FeatureVector {
    fn from(values: [f32; INPUT_SIZE]) -> Self {
        Self(values)
    }
}

impl std::ops::Index<Feature> for FeatureVector {
    type Output = f32;

    fn index(&self, feature: Feature) -> &f32 {
        &self.0[feature.index()]
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn feature_order_matches_names() {
        for (i, feature) in Feature::ALL.iter().enumerate() {
            assert_eq!(feature.index(), i);
            assert_eq!(feature.name(), FEATURE_NAMES[i]);
        }
    }

    #[test]
    fn with_sets_only_one_slot() {
        let fv = FeatureVector::zeros().with(Feature::Stress, 0.7);
        assert_eq!(fv.stress(), 0.7);
        assert_eq!(fv.as_array().iter().filter(|v| **v != 0.0).count(), 1);
    }

    #[test]
    fn serializes_as_plain_array() {
        let fv = FeatureVector::zeros().with(Feature::Hunger, 0.5);
        let json = serde_json::to_string(&fv).unwrap();
        assert!(json.starts_with("[0.5,0.0"));
        let back: FeatureVector = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fv);
    }

    #[test]
    fn finiteness() {
        assert!(FeatureVector::zeros().is_finite());
        assert!(!FeatureVector::zeros().with(Feature::Trust, f32::NAN).is_finite());
    }
}
