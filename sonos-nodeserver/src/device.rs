//! Abstractions over the speakers themselves
//!
//! [`SpeakerDevice`] is a control handle for one speaker, [`DeviceConnector`]
//! opens handles, and [`SpeakerDiscovery`] finds speakers on the network. The
//! Sonos-backed implementations live in [`crate::network`].

use crate::error::Result;

/// A control handle for one speaker
///
/// Every call goes to the device; nothing is cached.
pub trait SpeakerDevice {
    fn volume(&self) -> Result<i32>;
    fn set_volume(&self, volume: i32) -> Result<()>;

    fn bass(&self) -> Result<i32>;
    fn set_bass(&self, bass: i32) -> Result<()>;

    fn treble(&self) -> Result<i32>;
    fn set_treble(&self, treble: i32) -> Result<()>;

    fn mute(&self) -> Result<bool>;
    fn set_mute(&self, mute: bool) -> Result<()>;

    /// Raw transport state text, e.g. `PLAYING` or `PAUSED_PLAYBACK`
    fn transport_state(&self) -> Result<String>;

    fn play(&self) -> Result<()>;
    fn stop(&self) -> Result<()>;
    fn pause(&self) -> Result<()>;
    fn next(&self) -> Result<()>;
    fn previous(&self) -> Result<()>;

    /// Join every other visible zone in the household to this one
    fn partymode(&self) -> Result<()>;
}

/// Opens control handles by network address
pub trait DeviceConnector {
    fn connect(&self, ip: &str) -> Result<Box<dyn SpeakerDevice>>;
}

/// A speaker found on the network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredSpeaker {
    /// Vendor unique id, e.g. `RINCON_000E58A0123401400`
    pub uid: String,
    pub name: String,
    pub ip: String,
}

impl DiscoveredSpeaker {
    /// Node address derived from the unique id
    ///
    /// Characters 8..22 of the id (after any `uuid:` prefix), lower-cased.
    /// Empty if the id is too short to contain them.
    pub fn address(&self) -> String {
        let uid = self.uid.strip_prefix("uuid:").unwrap_or(&self.uid);
        uid.chars().skip(8).take(14).collect::<String>().to_lowercase()
    }
}

/// Finds speakers on the network
pub trait SpeakerDiscovery {
    /// Find speakers, optionally scanning `networks_to_scan` when multicast
    /// finds nothing. Failures are logged and yield an empty list.
    fn discover(&self, networks_to_scan: Option<&[String]>) -> Vec<DiscoveredSpeaker>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("RINCON_000E58A0123401400", "00e58a01234014")]
    #[case("uuid:RINCON_5CAAFD0A251E01400", "caafd0a251e014")]
    #[case("RINCON_48A6B8C0FFEE01400", "8a6b8c0ffee014")]
    #[case("RINCON_", "")]
    fn test_address_from_uid(#[case] uid: &str, #[case] expected: &str) {
        let speaker = DiscoveredSpeaker {
            uid: uid.to_string(),
            name: "Den".to_string(),
            ip: "10.0.0.2".to_string(),
        };
        assert_eq!(speaker.address(), expected);
    }
}
