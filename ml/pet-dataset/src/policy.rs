//! Labeling policy: rule-based supervision targets.
//!
//! The target action is a decision list. Rules are evaluated in order and
//! the first match wins, so an earlier rule shadows every later one.
//! Emotion targets are fixed linear combinations of the features.

use pet_types::{Action, FeatureVector};

/// One entry of the decision list.
#[derive(Debug, Clone, Copy)]
pub struct PolicyRule {
    /// Short description, for diagnostics.
    pub name: &'static str,
    /// Action chosen when the rule matches.
    pub action: Action,
    predicate: fn(&FeatureVector) -> bool,
}

impl PolicyRule {
    /// Returns `true` if this rule fires for `features`.
    #[must_use]
    pub fn matches(&self, features: &FeatureVector) -> bool {
        (self.predicate)(features)
    }
}

fn exhausted(f: &FeatureVector) -> bool {
    f.energy() < 0.2
}

fn starving(f: &FeatureVector) -> bool {
    f.hunger() > 0.7
}

fn lonely(f: &FeatureVector) -> bool {
    f.affection_need() > 0.6
}

fn stressed(f: &FeatureVector) -> bool {
    f.stress() > 0.6
}

fn content(f: &FeatureVector) -> bool {
    f.hunger() < 0.3 && f.energy() > 0.5 && f.affection_need() < 0.3 && f.stress() < 0.3
}

fn playful(f: &FeatureVector) -> bool {
    f.energy() > 0.6 && f.stress() < 0.4
}

/// The decision list, highest priority first.
pub const POLICY_RULES: [PolicyRule; 6] = [
    PolicyRule {
        name: "energy < 0.2",
        action: Action::Sleep,
        predicate: exhausted,
    },
    PolicyRule {
        name: "hunger > 0.7",
        action: Action::AskFood,
        predicate: starving,
    },
    PolicyRule {
        name: "affection_need > 0.6",
        action: Action::AskPet,
        predicate: lonely,
    },
    PolicyRule {
        name: "stress > 0.6",
        action: Action::Annoyed,
        predicate: stressed,
    },
    PolicyRule {
        name: "all needs low, energy > 0.5",
        action: Action::Happy,
        predicate: content,
    },
    PolicyRule {
        name: "energy > 0.6, stress < 0.4",
        action: Action::Play,
        predicate: playful,
    },
];

/// Action used when no rule fires.
pub const FALLBACK_ACTION: Action = Action::Idle;

/// Evaluates `rules` in order and returns the first match, else idle.
#[must_use]
pub fn first_match(rules: &[PolicyRule], features: &FeatureVector) -> Action {
    rules
        .iter()
        .find(|rule| rule.matches(features))
        .map_or(FALLBACK_ACTION, |rule| rule.action)
}

/// Target action for a feature vector.
///
/// # Example
///
/// ```
/// use pet_dataset::target_action;
/// use pet_types::{Action, Feature, FeatureVector};
///
/// // Exhaustion outranks hunger.
/// let fv = FeatureVector::zeros()
///     .with(Feature::Energy, 0.1)
///     .with(Feature::Hunger, 0.9);
/// assert_eq!(target_action(&fv), Action::Sleep);
/// ```
#[must_use]
pub fn target_action(features: &FeatureVector) -> Action {
    first_match(&POLICY_RULES, features)
}

/// Target emotion pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmotionTarget {
    /// Valence in `[-1, 1]`.
    pub valence: f32,
    /// Arousal in `[0, 1]`.
    pub arousal: f32,
}

/// Unclamped valence: trust minus weighted needs.
pub(crate) fn raw_valence(f: &FeatureVector) -> f32 {
    let mut valence = f.trust() - 0.5;
    valence -= f.hunger() * 0.3;
    valence -= f.affection_need() * 0.2;
    valence -= f.stress() * 0.4;
    valence
}

/// Unclamped arousal: energy and stress.
pub(crate) fn raw_arousal(f: &FeatureVector) -> f32 {
    f.energy() * 0.5 + f.stress() * 0.3
}

/// Target valence and arousal for a feature vector.
///
/// Both are clamped, so out-of-range inputs still give in-range targets.
#[must_use]
pub fn target_emotion(features: &FeatureVector) -> EmotionTarget {
    EmotionTarget {
        valence: raw_valence(features).clamp(-1.0, 1.0),
        arousal: raw_arousal(features).clamp(0.0, 1.0),
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use pet_types::Feature;

    fn fv(hunger: f32, energy: f32, affection: f32, stress: f32) -> FeatureVector {
        FeatureVector::zeros()
            .with(Feature::Hunger, hunger)
            .with(Feature::Energy, energy)
            .with(Feature::AffectionNeed, affection)
            .with(Feature::Stress, stress)
    }

    #[test]
    fn each_rule_in_isolation() {
        assert_eq!(target_action(&fv(0.5, 0.1, 0.5, 0.5)), Action::Sleep);
        assert_eq!(target_action(&fv(0.8, 0.4, 0.5, 0.5)), Action::AskFood);
        assert_eq!(target_action(&fv(0.5, 0.4, 0.7, 0.5)), Action::AskPet);
        assert_eq!(target_action(&fv(0.5, 0.4, 0.5, 0.7)), Action::Annoyed);
        assert_eq!(target_action(&fv(0.1, 0.6, 0.1, 0.1)), Action::Happy);
        assert_eq!(target_action(&fv(0.5, 0.7, 0.5, 0.35)), Action::Play);
        assert_eq!(target_action(&fv(0.5, 0.4, 0.5, 0.5)), Action::Idle);
    }

    #[test]
    fn earlier_rules_win() {
        // sleep over ask_food
        assert_eq!(target_action(&fv(0.9, 0.1, 0.0, 0.0)), Action::Sleep);
        // ask_food over play
        assert_eq!(target_action(&fv(0.8, 0.9, 0.0, 0.0)), Action::AskFood);
        // ask_pet over annoyed
        assert_eq!(target_action(&fv(0.0, 0.4, 0.9, 0.9)), Action::AskPet);
        // happy over play
        assert_eq!(target_action(&fv(0.0, 0.9, 0.0, 0.0)), Action::Happy);
    }

    #[test]
    fn thresholds_are_strict() {
        assert_eq!(target_action(&fv(0.5, 0.2, 0.5, 0.5)), Action::Idle);
        assert_eq!(target_action(&fv(0.7, 0.4, 0.5, 0.5)), Action::Idle);
        assert_eq!(target_action(&fv(0.5, 0.4, 0.6, 0.5)), Action::Idle);
        assert_eq!(target_action(&fv(0.5, 0.4, 0.5, 0.6)), Action::Idle);
        assert_eq!(target_action(&fv(0.5, 0.6, 0.5, 0.3)), Action::Idle);
    }

    #[test]
    fn rule_order_is_stable() {
        let actions: Vec<Action> = POLICY_RULES.iter().map(|r| r.action).collect();
        assert_eq!(
            actions,
            vec![
                Action::Sleep,
                Action::AskFood,
                Action::AskPet,
                Action::Annoyed,
                Action::Happy,
                Action::Play,
            ]
        );
    }

    #[test]
    fn emotion_formula() {
        let f = fv(0.5, 0.6, 0.5, 0.2).with(Feature::Trust, 0.9);
        let target = target_emotion(&f);
        // 0.9 - 0.5 - 0.15 - 0.1 - 0.08
        assert!((target.valence - 0.07).abs() < 1e-6);
        // 0.3 + 0.06
        assert!((target.arousal - 0.36).abs() < 1e-6);
    }

    #[test]
    fn emotion_clamped_for_out_of_range_inputs() {
        let target = target_emotion(&fv(5.0, 5.0, 5.0, 5.0));
        assert_eq!(target.valence, -1.0);
        assert_eq!(target.arousal, 1.0);

        let target = target_emotion(&fv(-5.0, -5.0, -5.0, -5.0).with(Feature::Trust, 9.0));
        assert_eq!(target.valence, 1.0);
        assert_eq!(target.arousal, 0.0);
    }

    #[test]
    fn emotion_always_in_range() {
        let levels = [-3.0, -0.5, 0.0, 0.25, 0.5, 0.75, 1.0, 4.0];
        for &a in &levels {
            for &b in &levels {
                for &c in &levels {
                    let target = target_emotion(&fv(a, b, c, a - b).with(Feature::Trust, c));
                    assert!((-1.0..=1.0).contains(&target.valence));
                    assert!((0.0..=1.0).contains(&target.arousal));
                }
            }
        }
    }
}
