//! Command codes accepted by the nodes and their payloads

use std::fmt;
use std::str::FromStr;

use crate::error::{NodeServerError, Result};

/// Commands the host can dispatch to a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandCode {
    Play,
    Stop,
    /// "On": starts playback
    On,
    /// "Off": pauses playback
    Off,
    Pause,
    Next,
    Previous,
    PartyMode,
    Mute,
    Unmute,
    Bass,
    Treble,
    Volume,
    Query,
    Discover,
}

impl CommandCode {
    pub const ALL: [CommandCode; 15] = [
        CommandCode::Play,
        CommandCode::Stop,
        CommandCode::On,
        CommandCode::Off,
        CommandCode::Pause,
        CommandCode::Next,
        CommandCode::Previous,
        CommandCode::PartyMode,
        CommandCode::Mute,
        CommandCode::Unmute,
        CommandCode::Bass,
        CommandCode::Treble,
        CommandCode::Volume,
        CommandCode::Query,
        CommandCode::Discover,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CommandCode::Play => "PLAY",
            CommandCode::Stop => "STOP",
            CommandCode::On => "DON",
            CommandCode::Off => "DOF",
            CommandCode::Pause => "PAUSE",
            CommandCode::Next => "NEXT",
            CommandCode::Previous => "PREVIOUS",
            CommandCode::PartyMode => "PARTYMODE",
            CommandCode::Mute => "MUTE",
            CommandCode::Unmute => "UNMUTE",
            CommandCode::Bass => "BASS",
            CommandCode::Treble => "TREBLE",
            CommandCode::Volume => "VOLUME",
            CommandCode::Query => "QUERY",
            CommandCode::Discover => "DISCOVER",
        }
    }
}

impl fmt::Display for CommandCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandCode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        CommandCode::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| s.to_string())
    }
}

/// Optional argument carried by a command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandPayload {
    pub value: Option<String>,
}

impl CommandPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(value: impl Into<String>) -> Self {
        Self { value: Some(value.into()) }
    }

    /// Parse the value as an integer argument for `command`
    ///
    /// Surrounding whitespace is ignored; a missing value is invalid.
    pub fn int_value(&self, command: &str) -> Result<i32> {
        let raw = self.value.as_deref().unwrap_or_default();
        raw.trim().parse().map_err(|_| NodeServerError::InvalidArgument {
            command: command.to_string(),
            value: raw.to_string(),
        })
    }
}
