//! Transport state as reported through the `ST` driver

/// Playback state of a speaker
///
/// The discriminants are the values published on the `ST` driver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TransportState {
    Playing = 0,
    Transitioning = 1,
    Paused = 2,
    #[default]
    Stopped = 3,
}

impl TransportState {
    /// Map the raw `CurrentTransportState` text of a device
    ///
    /// Matching is case-insensitive. Anything unrecognised (including
    /// `NO_MEDIA_PRESENT`) is treated as stopped.
    pub fn from_device(text: &str) -> Self {
        match text.trim().to_ascii_uppercase().as_str() {
            "PLAYING" => TransportState::Playing,
            "TRANSITIONING" => TransportState::Transitioning,
            "PAUSED_PLAYBACK" => TransportState::Paused,
            _ => TransportState::Stopped,
        }
    }

    pub fn driver_value(self) -> i32 {
        self as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case("PLAYING", 0)]
    #[case("playing", 0)]
    #[case("TRANSITIONING", 1)]
    #[case("PAUSED_PLAYBACK", 2)]
    #[case("Paused_Playback", 2)]
    #[case("STOPPED", 3)]
    #[case("NO_MEDIA_PRESENT", 3)]
    #[case("", 3)]
    fn test_from_device(#[case] text: &str, #[case] expected: i32) {
        assert_eq!(TransportState::from_device(text).driver_value(), expected);
    }

    proptest! {
        #[test]
        fn known_states_map_in_any_case(
            (text, expected) in prop_oneof![
                Just(("PLAYING", 0)),
                Just(("TRANSITIONING", 1)),
                Just(("PAUSED_PLAYBACK", 2)),
                Just(("STOPPED", 3)),
            ],
            mask in proptest::collection::vec(any::<bool>(), 15)
        ) {
            let mixed: String = text
                .chars()
                .zip(mask.iter().cycle())
                .map(|(c, lower)| if *lower { c.to_ascii_lowercase() } else { c })
                .collect();
            prop_assert_eq!(TransportState::from_device(&mixed).driver_value(), expected);
        }

        #[test]
        fn unknown_states_are_stopped(text in "[A-Za-z_]{0,20}") {
            let upper = text.to_ascii_uppercase();
            prop_assume!(!["PLAYING", "TRANSITIONING", "PAUSED_PLAYBACK"].contains(&upper.as_str()));
            prop_assert_eq!(TransportState::from_device(&text), TransportState::Stopped);
        }
    }
}
