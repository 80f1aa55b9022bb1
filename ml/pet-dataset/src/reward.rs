//! Reward shaping for consecutive log entries.
//!
//! The reward is a bounded signal in `[-1, 1]` that becomes the training
//! weight of an example. Terms are summed, then clamped once at the end.

use pet_types::{InputEvent, LogEntry};

/// Hunger above which feeding is rewarded in proportion to hunger.
pub const FEED_NEED_THRESHOLD: f32 = 0.5;
/// Hunger below which feeding counts as overfeeding.
pub const OVERFEED_THRESHOLD: f32 = 0.2;
/// Flat penalty for overfeeding.
pub const OVERFEED_PENALTY: f32 = 0.5;

/// Affection need above which petting is rewarded in proportion to need.
pub const PET_NEED_THRESHOLD: f32 = 0.5;
/// Affection need below which petting counts as over-petting.
pub const OVERPET_THRESHOLD: f32 = 0.15;
/// Flat penalty for over-petting.
pub const OVERPET_PENALTY: f32 = 0.3;

/// Need level above which ignoring the pet is penalized.
pub const IGNORE_NEED_THRESHOLD: f32 = 0.6;
/// Flat penalty for ignoring a needy pet.
pub const IGNORE_PENALTY: f32 = 1.0;

/// Spam score above which a spam penalty applies.
pub const SPAM_THRESHOLD: f32 = 0.5;
/// Spam penalty per unit of spam score.
pub const SPAM_PENALTY_RATE: f32 = 0.5;

/// Reward per unit of trust gained.
pub const TRUST_GAIN: f32 = 2.0;
/// Reward per unit of stress relieved.
pub const STRESS_RELIEF_GAIN: f32 = 0.5;

/// Individual reward contributions, before clamping.
///
/// The trust and stress terms are `None` for the last entry of a log,
/// which has no successor; they are omitted, not zero-filled.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RewardTerms {
    /// Feed, pet, and ignore shaping.
    pub care: f32,
    /// Spam penalty (zero or negative).
    pub spam: f32,
    /// Trust change contribution.
    pub trust: Option<f32>,
    /// Stress relief contribution (zero or positive).
    pub stress_relief: Option<f32>,
}

impl RewardTerms {
    /// Sum of all terms clamped to `[-1, 1]`.
    #[must_use]
    pub fn total(&self) -> f32 {
        let mut reward = self.care + self.spam;
        if let Some(trust) = self.trust {
            reward += trust;
        }
        if let Some(stress) = self.stress_relief {
            reward += stress;
        }
        reward.clamp(-1.0, 1.0)
    }
}

/// Breaks the reward of `entry` down into its terms.
#[must_use]
pub fn reward_terms(entry: &LogEntry, next: Option<&LogEntry>) -> RewardTerms {
    let features = &entry.features;
    let hunger = features.hunger();
    let affection = features.affection_need();
    let trust = features.trust();
    let stress = features.stress();
    let spam = features.spam_score();

    let mut care = 0.0;

    if entry.event.is_feed() {
        if hunger > FEED_NEED_THRESHOLD {
            care += hunger;
        } else if hunger < OVERFEED_THRESHOLD {
            care -= OVERFEED_PENALTY;
        }
    }

    if entry.event.is_pet() {
        if affection > PET_NEED_THRESHOLD {
            care += affection;
        } else if affection < OVERPET_THRESHOLD {
            care -= OVERPET_PENALTY;
        }
    }

    // Flat, unlike the feed and pet terms which scale with need.
    if entry.event == InputEvent::Ignore
        && (hunger > IGNORE_NEED_THRESHOLD || affection > IGNORE_NEED_THRESHOLD)
    {
        care -= IGNORE_PENALTY;
    }

    let spam_term = if spam > SPAM_THRESHOLD {
        -SPAM_PENALTY_RATE * spam
    } else {
        0.0
    };

    let (trust_term, stress_term) = match next {
        Some(next) => {
            let next_trust = next.state_after.trust.unwrap_or(trust);
            let next_stress = next.state_after.stress.unwrap_or(stress);
            let relief = stress - next_stress;
            let stress_term = if relief > 0.0 {
                relief * STRESS_RELIEF_GAIN
            } else {
                0.0
            };
            (
                Some((next_trust - trust) * TRUST_GAIN),
                Some(stress_term),
            )
        }
        None => (None, None),
    };

    RewardTerms {
        care,
        spam: spam_term,
        trust: trust_term,
        stress_relief: stress_term,
    }
}

/// Reward for `entry` given its successor, in `[-1, 1]`.
///
/// # Example
///
/// ```
/// use pet_dataset::reward;
/// use pet_types::{BrainOutput, Action, Feature, FeatureVector, InputEvent, LogEntry, StateSnapshot};
///
/// let entry = LogEntry {
///     timestamp: 0,
///     event: InputEvent::FeedShort,
///     features: FeatureVector::zeros().with(Feature::Hunger, 0.8),
///     brain: BrainOutput { action: Action::AskFood, valence: 0.0, arousal: 0.0 },
///     state_after: StateSnapshot::default(),
/// };
///
/// assert!((reward(&entry, None) - 0.8).abs() < 1e-6);
/// ```
#[must_use]
pub fn reward(entry: &LogEntry, next: Option<&LogEntry>) -> f32 {
    reward_terms(entry, next).total()
}

/// Maps a reward in `[-1, 1]` to a strictly positive weight in `[0.1, 1.1]`.
#[must_use]
pub fn reward_to_weight(reward: f32) -> f32 {
    (reward + 1.0) / 2.0 + 0.1
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use pet_types::{Action, BrainOutput, Feature, FeatureVector, InputEvent, StateSnapshot};

    fn entry(event: InputEvent, features: FeatureVector) -> LogEntry {
        LogEntry {
            timestamp: 0,
            event,
            features,
            brain: BrainOutput {
                action: Action::Idle,
                valence: 0.0,
                arousal: 0.0,
            },
            state_after: StateSnapshot::default(),
        }
    }

    fn with_state(mut entry: LogEntry, trust: Option<f32>, stress: Option<f32>) -> LogEntry {
        entry.state_after.trust = trust;
        entry.state_after.stress = stress;
        entry
    }

    fn fv() -> FeatureVector {
        FeatureVector::zeros()
    }

    #[test]
    fn feeding_when_hungry_scales_with_hunger() {
        let e = entry(InputEvent::FeedLong, fv().with(Feature::Hunger, 0.9));
        assert!((reward(&e, None) - 0.9).abs() < 1e-6);
    }

    #[test]
    fn overfeeding_is_penalized() {
        let e = entry(InputEvent::FeedShort, fv().with(Feature::Hunger, 0.1));
        assert!((reward(&e, None) + 0.5).abs() < 1e-6);
    }

    #[test]
    fn feeding_in_neutral_band_is_neutral() {
        for hunger in [0.2, 0.35, 0.5] {
            let e = entry(InputEvent::FeedDouble, fv().with(Feature::Hunger, hunger));
            assert_eq!(reward(&e, None), 0.0, "hunger {hunger}");
        }
    }

    #[test]
    fn petting_mirrors_feeding() {
        let e = entry(InputEvent::PetShort, fv().with(Feature::AffectionNeed, 0.7));
        assert!((reward(&e, None) - 0.7).abs() < 1e-6);

        let e = entry(InputEvent::PetLong, fv().with(Feature::AffectionNeed, 0.1));
        assert!((reward(&e, None) + 0.3).abs() < 1e-6);

        let e = entry(InputEvent::PetDouble, fv().with(Feature::AffectionNeed, 0.15));
        assert_eq!(reward(&e, None), 0.0);
    }

    #[test]
    fn feeding_ignores_affection() {
        let e = entry(
            InputEvent::FeedShort,
            fv().with(Feature::Hunger, 0.3).with(Feature::AffectionNeed, 0.9),
        );
        assert_eq!(reward(&e, None), 0.0);
    }

    #[test]
    fn ignoring_needy_pet_is_flat_penalty() {
        let e = entry(InputEvent::Ignore, fv().with(Feature::Hunger, 0.61));
        assert_eq!(reward(&e, None), -1.0);

        let e = entry(InputEvent::Ignore, fv().with(Feature::AffectionNeed, 0.99));
        assert_eq!(reward(&e, None), -1.0);

        let e = entry(InputEvent::Ignore, fv().with(Feature::Hunger, 0.6));
        assert_eq!(reward(&e, None), 0.0);
    }

    #[test]
    fn spam_penalty_scales() {
        let e = entry(InputEvent::None, fv().with(Feature::SpamScore, 0.8));
        assert!((reward(&e, None) + 0.4).abs() < 1e-6);

        let e = entry(InputEvent::None, fv().with(Feature::SpamScore, 0.5));
        assert_eq!(reward(&e, None), 0.0);
    }

    #[test]
    fn trust_gain_and_loss() {
        let current = entry(InputEvent::None, fv().with(Feature::Trust, 0.5));
        let next = with_state(entry(InputEvent::None, fv()), Some(0.6), None);
        assert!((reward(&current, Some(&next)) - 0.2).abs() < 1e-5);

        let next = with_state(entry(InputEvent::None, fv()), Some(0.4), None);
        assert!((reward(&current, Some(&next)) + 0.2).abs() < 1e-5);
    }

    #[test]
    fn stress_relief_only_counts_when_stress_falls() {
        let current = entry(InputEvent::None, fv().with(Feature::Stress, 0.6));

        let calmer = with_state(entry(InputEvent::None, fv()), None, Some(0.2));
        assert!((reward(&current, Some(&calmer)) - 0.2).abs() < 1e-5);

        let tenser = with_state(entry(InputEvent::None, fv()), None, Some(0.9));
        assert_eq!(reward(&current, Some(&tenser)), 0.0);
    }

    #[test]
    fn missing_snapshot_fields_contribute_nothing() {
        let current = entry(
            InputEvent::None,
            fv().with(Feature::Trust, 0.7).with(Feature::Stress, 0.4),
        );
        let next = entry(InputEvent::None, fv());
        let terms = reward_terms(&current, Some(&next));
        assert_eq!(terms.trust, Some(0.0));
        assert_eq!(terms.stress_relief, Some(0.0));
    }

    #[test]
    fn terminal_entry_omits_transition_terms() {
        let e = entry(InputEvent::FeedShort, fv().with(Feature::Hunger, 0.8));
        let terms = reward_terms(&e, None);
        assert_eq!(terms.trust, None);
        assert_eq!(terms.stress_relief, None);
    }

    #[test]
    fn reward_is_clamped() {
        let current = entry(
            InputEvent::FeedShort,
            fv().with(Feature::Hunger, 0.95).with(Feature::Trust, 0.0),
        );
        let next = with_state(entry(InputEvent::None, fv()), Some(1.0), None);
        assert_eq!(reward(&current, Some(&next)), 1.0);

        let current = entry(
            InputEvent::Ignore,
            fv().with(Feature::Hunger, 0.9)
                .with(Feature::SpamScore, 1.0)
                .with(Feature::Trust, 1.0),
        );
        let next = with_state(entry(InputEvent::None, fv()), Some(0.0), None);
        assert_eq!(reward(&current, Some(&next)), -1.0);
    }

    #[test]
    fn weight_range() {
        assert!((reward_to_weight(-1.0) - 0.1).abs() < 1e-6);
        assert!((reward_to_weight(0.0) - 0.6).abs() < 1e-6);
        assert!((reward_to_weight(1.0) - 1.1).abs() < 1e-6);
    }

    #[test]
    fn reward_and_weight_bounded_over_grid() {
        let levels = [-2.0, 0.0, 0.1, 0.15, 0.2, 0.5, 0.6, 0.7, 1.0, 5.0];
        for event in InputEvent::ALL {
            for &hunger in &levels {
                for &affection in &levels {
                    for &trust in &levels {
                        let current = entry(
                            event,
                            fv().with(Feature::Hunger, hunger)
                                .with(Feature::AffectionNeed, affection)
                                .with(Feature::Trust, trust)
                                .with(Feature::SpamScore, affection),
                        );
                        let next = with_state(entry(event, fv()), Some(hunger), Some(trust));
                        for r in [reward(&current, None), reward(&current, Some(&next))] {
                            assert!((-1.0..=1.0).contains(&r));
                            let w = reward_to_weight(r);
                            assert!((0.1..=1.1).contains(&w) && w > 0.0);
                        }
                    }
                }
            }
        }
    }
}
