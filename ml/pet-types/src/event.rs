//! Input events recorded by the device.

use serde::{Deserialize, Serialize};

/// Event names in wire order (index = event id).
pub const INPUT_EVENT_NAMES: [&str; 8] = [
    "none",
    "feed_short",
    "feed_long",
    "feed_double",
    "pet_short",
    "pet_long",
    "pet_double",
    "ignore",
];

/// User interaction kind attached to a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputEvent {
    /// No interaction.
    #[default]
    None,
    /// Short press on the feed button.
    FeedShort,
    /// Long press on the feed button.
    FeedLong,
    /// Double press on the feed button.
    FeedDouble,
    /// Short press on the pet button.
    PetShort,
    /// Long press on the pet button.
    PetLong,
    /// Double press on the pet button.
    PetDouble,
    /// The owner ignored the pet.
    Ignore,
}

impl InputEvent {
    /// All events in id order.
    pub const ALL: [Self; 8] = [
        Self::None,
        Self::FeedShort,
        Self::FeedLong,
        Self::FeedDouble,
        Self::PetShort,
        Self::PetLong,
        Self::PetDouble,
        Self::Ignore,
    ];

    /// Looks up an event by its wire id.
    ///
    /// # Example
    ///
    /// ```
    /// use pet_types::InputEvent;
    ///
    /// assert_eq!(InputEvent::from_id(7), Some(InputEvent::Ignore));
    /// assert_eq!(InputEvent::from_id(8), None);
    /// ```
    #[must_use]
    pub fn from_id(id: u64) -> Option<Self> {
        usize::try_from(id)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    /// Wire id.
    #[must_use]
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Wire name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        INPUT_EVENT_NAMES[self as usize]
    }

    /// Any of the feed variants.
    #[must_use]
    pub const fn is_feed(self) -> bool {
        matches!(self, Self::FeedShort | Self::FeedLong | Self::FeedDouble)
    }

    /// Any of the pet variants.
    #[must_use]
    pub const fn is_pet(self) -> bool {
        matches!(self, Self::PetShort | Self::PetLong | Self::PetDouble)
    }
}

impl std::fmt::Display for InputEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip() {
        for event in InputEvent::ALL {
            assert_eq!(InputEvent::from_id(u64::from(event.id())), Some(event));
        }
    }

    #[test]
    fn names_match_wire_order() {
        assert_eq!(InputEvent::FeedShort.name(), "feed_short");
        assert_eq!(InputEvent::Ignore.name(), "ignore");
        assert_eq!(InputEvent::Ignore.id(), 7);
    }

    #[test]
    fn feed_and_pet_groups() {
        assert!(InputEvent::FeedDouble.is_feed());
        assert!(!InputEvent::FeedDouble.is_pet());
        assert!(InputEvent::PetLong.is_pet());
        assert!(!InputEvent::Ignore.is_feed());
        assert!(!InputEvent::None.is_pet());
    }

    #[test]
    fn out_of_range_id() {
        assert_eq!(InputEvent::from_id(255), None);
        assert_eq!(InputEvent::from_id(u64::MAX), None);
    }
}
