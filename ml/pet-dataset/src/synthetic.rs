//! Synthetic bootstrap dataset.
//!
//! Before a device has produced any logs, a first model is trained on
//! random feature vectors labeled by a night-aware variant of the labeling
//! policy. Time of day is sampled with a bias toward typical owner hours.

use std::f32::consts::TAU;

use pet_types::{Action, Feature, FeatureVector, INPUT_SIZE};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use tracing::debug;

use crate::assemble::{Example, LabeledDataset};
use crate::error::{DatasetError, Result};
use crate::policy::{POLICY_RULES, first_match, raw_arousal, raw_valence};

/// Hours at which owners typically interact.
pub const INTERACTION_HOURS: [u32; 7] = [7, 8, 9, 18, 19, 20, 21];

/// Probability of drawing from [`INTERACTION_HOURS`].
pub const INTERACTION_HOUR_BIAS: f32 = 0.3;

/// Night starts at this hour.
pub const NIGHT_START: u32 = 22;

/// Night ends before this hour.
pub const NIGHT_END: u32 = 7;

/// Standard deviation of the label noise.
pub const LABEL_NOISE: f32 = 0.1;

const NIGHT_SLEEPY_ENERGY: f32 = 0.5;
const VERY_TIRED_ENERGY: f32 = 0.15;
const NIGHT_HUNGER: f32 = 0.8;
const NIGHT_SLEEP_PROBABILITY: f32 = 0.6;
const NIGHT_VALENCE_SHIFT: f32 = 0.1;
const NIGHT_AROUSAL_SCALE: f32 = 0.7;

/// Returns true for hours in `[22, 24) ∪ [0, 7)`.
#[must_use]
pub const fn is_night(hour: u32) -> bool {
    hour >= NIGHT_START || hour < NIGHT_END
}

/// Sin/cos encoding of an hour of day.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn encode_hour(hour: u32) -> (f32, f32) {
    let angle = hour as f32 / 24.0 * TAU;
    angle.sin_cos()
}

fn sample_hour(rng: &mut ChaCha8Rng) -> u32 {
    if rng.r#gen::<f32>() < INTERACTION_HOUR_BIAS {
        INTERACTION_HOURS[rng.gen_range(0..INTERACTION_HOURS.len())]
    } else {
        rng.gen_range(0..24)
    }
}

fn night_action(features: &FeatureVector, rng: &mut ChaCha8Rng) -> Action {
    if features.energy() < NIGHT_SLEEPY_ENERGY {
        Action::Sleep
    } else if features.hunger() > NIGHT_HUNGER {
        Action::AskFood
    } else if rng.r#gen::<f32>() < NIGHT_SLEEP_PROBABILITY {
        Action::Sleep
    } else {
        Action::Idle
    }
}

fn day_action(features: &FeatureVector) -> Action {
    if features.energy() < VERY_TIRED_ENERGY {
        Action::Sleep
    } else {
        // The stricter energy cut-off above replaces the exhaustion rule.
        first_match(&POLICY_RULES[1..], features)
    }
}

/// Generates `count` synthetic examples.
///
/// With `Some(seed)` the output is fully deterministic.
///
/// # Errors
///
/// Returns [`DatasetError::InvalidArgument`] if `count` is zero.
///
/// # Example
///
/// ```
/// use pet_dataset::synthesize;
///
/// let a = synthesize(100, Some(1)).unwrap();
/// let b = synthesize(100, Some(1)).unwrap();
/// assert_eq!(a, b);
/// assert!(a.weights().iter().all(|&w| w == 1.0));
/// ```
pub fn synthesize(count: usize, seed: Option<u64>) -> Result<LabeledDataset> {
    if count == 0 {
        return Err(DatasetError::invalid_argument(
            "synthetic sample count must be positive",
        ));
    }

    let mut rng = seed.map_or_else(ChaCha8Rng::from_entropy, ChaCha8Rng::seed_from_u64);
    let noise = Normal::new(0.0_f32, LABEL_NOISE)
        .map_err(|e| DatasetError::invalid_argument(e.to_string()))?;

    let mut dataset = LabeledDataset::with_capacity(count);
    for _ in 0..count {
        let mut raw = [0.0_f32; INPUT_SIZE];
        for value in &mut raw {
            *value = rng.r#gen();
        }

        let hour = sample_hour(&mut rng);
        let (sin, cos) = encode_hour(hour);
        let features = FeatureVector::new(raw)
            .with(Feature::TimeOfDaySin, sin)
            .with(Feature::TimeOfDayCos, cos);

        let night = is_night(hour);
        let action = if night {
            night_action(&features, &mut rng)
        } else {
            day_action(&features)
        };

        let mut valence = raw_valence(&features);
        let mut arousal = raw_arousal(&features);
        if night {
            valence -= NIGHT_VALENCE_SHIFT;
            arousal *= NIGHT_AROUSAL_SCALE;
        }
        let valence = (valence.clamp(-1.0, 1.0) + noise.sample(&mut rng)).clamp(-1.0, 1.0);
        let arousal = (arousal.clamp(0.0, 1.0) + noise.sample(&mut rng)).clamp(0.0, 1.0);

        dataset.push(Example {
            features,
            action,
            valence,
            arousal,
            weight: 1.0,
        });
    }

    debug!(count, ?seed, "Generated synthetic dataset");
    Ok(dataset)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn night_hours() {
        for hour in [22, 23, 0, 3, 6] {
            assert!(is_night(hour), "{hour} should be night");
        }
        for hour in [7, 12, 18, 21] {
            assert!(!is_night(hour), "{hour} should be day");
        }
    }

    #[test]
    fn hour_encoding() {
        let (sin, cos) = encode_hour(0);
        assert!(sin.abs() < 1e-6);
        assert!((cos - 1.0).abs() < 1e-6);

        let (sin, cos) = encode_hour(6);
        assert!((sin - 1.0).abs() < 1e-6);
        assert!(cos.abs() < 1e-6);
    }

    #[test]
    fn zero_count_rejected() {
        assert!(matches!(
            synthesize(0, Some(1)),
            Err(DatasetError::InvalidArgument(_))
        ));
    }

    #[test]
    fn deterministic_with_seed() {
        let a = synthesize(64, Some(99)).unwrap();
        let b = synthesize(64, Some(99)).unwrap();
        let c = synthesize(64, Some(100)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn labels_in_range() {
        let data = synthesize(500, Some(5)).unwrap();
        assert_eq!(data.len(), 500);

        for example in data.iter() {
            assert!((-1.0..=1.0).contains(&example.valence));
            assert!((0.0..=1.0).contains(&example.arousal));
            assert_eq!(example.weight, 1.0);
            for (i, &value) in example.features.as_array().iter().enumerate() {
                if i == Feature::TimeOfDaySin.index() || i == Feature::TimeOfDayCos.index() {
                    assert!((-1.0..=1.0).contains(&value));
                } else {
                    assert!((0.0..1.0).contains(&value));
                }
            }
        }
    }

    #[test]
    fn time_encoding_lies_on_unit_circle() {
        let data = synthesize(200, Some(11)).unwrap();
        for f in data.features() {
            let sin = f[Feature::TimeOfDaySin];
            let cos = f[Feature::TimeOfDayCos];
            assert!((sin * sin + cos * cos - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn exhausted_night_pet_sleeps() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let tired = FeatureVector::zeros()
            .with(Feature::Energy, 0.3)
            .with(Feature::Hunger, 0.95);
        assert_eq!(night_action(&tired, &mut rng), Action::Sleep);

        let hungry = tired.with(Feature::Energy, 0.9);
        assert_eq!(night_action(&hungry, &mut rng), Action::AskFood);
    }

    #[test]
    fn day_uses_stricter_tiredness_cutoff() {
        let drowsy = FeatureVector::zeros().with(Feature::Energy, 0.18);
        assert_eq!(day_action(&drowsy), Action::Idle);

        let spent = FeatureVector::zeros().with(Feature::Energy, 0.1);
        assert_eq!(day_action(&spent), Action::Sleep);

        let hungry = FeatureVector::zeros()
            .with(Feature::Energy, 0.5)
            .with(Feature::Hunger, 0.75);
        assert_eq!(day_action(&hungry), Action::AskFood);
    }

    #[test]
    fn produces_several_actions() {
        let data = synthesize(1000, Some(3)).unwrap();
        let mut seen: Vec<Action> = data.actions().to_vec();
        seen.sort_unstable();
        seen.dedup();
        assert!(seen.len() >= 5, "only saw {seen:?}");
    }
}
