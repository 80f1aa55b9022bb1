//! Discrete actions the device can emit.

use serde::{Deserialize, Serialize};

use crate::arch::ACTION_COUNT;

/// Action names in wire order (index = action id).
pub const ACTION_NAMES: [&str; ACTION_COUNT] = [
    "sleep", "idle", "play", "ask_food", "ask_pet", "happy", "annoyed", "sad",
];

/// One of the eight behaviours.
///
/// The discriminant is the class index used for training labels and the
/// position of the action's logit in the network output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Go to sleep.
    Sleep = 0,
    /// Do nothing in particular.
    Idle = 1,
    /// Play.
    Play = 2,
    /// Ask for food.
    AskFood = 3,
    /// Ask to be petted.
    AskPet = 4,
    /// Show happiness.
    Happy = 5,
    /// Show annoyance.
    Annoyed = 6,
    /// Show sadness.
    Sad = 7,
}

impl Action {
    /// All actions in id order.
    pub const ALL: [Self; ACTION_COUNT] = [
        Self::Sleep,
        Self::Idle,
        Self::Play,
        Self::AskFood,
        Self::AskPet,
        Self::Happy,
        Self::Annoyed,
        Self::Sad,
    ];

    /// Looks up an action by class id.
    ///
    /// # Example
    ///
    /// ```
    /// use pet_types::Action;
    ///
    /// assert_eq!(Action::from_id(3), Some(Action::AskFood));
    /// assert_eq!(Action::from_id(8), None);
    /// ```
    #[must_use]
    pub fn from_id(id: u64) -> Option<Self> {
        usize::try_from(id)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    /// Class id.
    #[must_use]
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Class index, for addressing histograms and logits.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Wire name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        ACTION_NAMES[self as usize]
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
