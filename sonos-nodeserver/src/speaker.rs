//! The speaker node
//!
//! A speaker owns its control handle and its driver table. Drivers change
//! only after the device confirmed a change or a refresh read the live
//! values; the host is told about a driver only when its value changed.

use tracing::{debug, error, info};

use crate::command::{CommandCode, CommandPayload};
use crate::device::{DeviceConnector, SpeakerDevice};
use crate::driver::{Driver, Drivers};
use crate::error::{NodeServerError, Result};
use crate::host::{Host, NodeInfo};
use crate::poll::PollKind;
use crate::transport::TransportState;

/// Node definition id of speaker nodes
pub const SPEAKER_NODE_DEF: &str = "sonosspeaker";

const TRANSPORT_HINT: &str = "Transition not available. This typically means no music is selected.";
const NAVIGATION_HINT: &str = "This typically means that the station or mode you are in doesn't support it.";
const PARTYMODE_HINT: &str = "Your Sonos didn't like that. Make sure you are doing things correctly.";
const MUTE_HINT: &str = "Unable to change mute. Make sure the speaker is powered on.";
const SETTER_HINT: &str = "Speaker rejected the new value.";

/// Run a device call, logging a failure with `hint` instead of returning it
pub fn attempt<T>(address: &str, hint: &str, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            info!(address = %address, error = %e, "{}", hint);
            None
        }
    }
}

/// Snapshot of everything a refresh reads from the device
struct LiveState {
    transport: TransportState,
    volume: i32,
    bass: i32,
    treble: i32,
    mute: bool,
}

pub struct Speaker {
    address: String,
    primary: String,
    name: String,
    ip: String,
    device: Box<dyn SpeakerDevice>,
    drivers: Drivers,
}

impl std::fmt::Debug for Speaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Speaker")
            .field("address", &self.address)
            .field("name", &self.name)
            .field("ip", &self.ip)
            .field("drivers", &self.drivers)
            .finish()
    }
}

impl Speaker {
    /// Open a handle to the speaker at `ip` and read its volume
    ///
    /// Fails if the handle cannot be opened or the speaker does not answer.
    pub fn new(
        connector: &dyn DeviceConnector,
        primary: &str,
        address: &str,
        name: &str,
        ip: &str,
    ) -> Result<Self> {
        let device = connector.connect(ip)?;
        let volume = device.volume()?;
        info!("Sonos Speaker: {}@{} Current Volume: {}", name, ip, volume);

        Ok(Self {
            address: address.to_string(),
            primary: primary.to_string(),
            name: name.to_string(),
            ip: ip.to_string(),
            device,
            drivers: Drivers::new(),
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Display name as registered with the host
    pub fn display_name(&self) -> String {
        format!("Sonos {}", self.name)
    }

    pub fn ip(&self) -> &str {
        &self.ip
    }

    pub fn drivers(&self) -> &Drivers {
        &self.drivers
    }

    pub fn node_info(&self) -> NodeInfo {
        NodeInfo {
            address: self.address.clone(),
            primary: self.primary.clone(),
            name: self.display_name(),
            node_def: SPEAKER_NODE_DEF.to_string(),
            drivers: self.drivers.values(),
        }
    }

    /// Called once the node is registered
    pub fn start(&mut self, host: &mut dyn Host) {
        info!("{} ready to rock!", self.display_name());
        self.update(PollKind::ShortPoll, host);
    }

    /// Refresh all drivers from the device on short polls
    ///
    /// If any read fails nothing is written; the previous values stay until
    /// the next tick succeeds.
    pub fn update(&mut self, kind: PollKind, host: &mut dyn Host) {
        if kind != PollKind::ShortPoll {
            return;
        }

        match self.read_live_state() {
            Ok(state) => {
                self.set_driver(host, Driver::Status, state.transport.driver_value());
                self.set_driver(host, Driver::Volume, state.volume);
                self.set_driver(host, Driver::Bass, state.bass);
                self.set_driver(host, Driver::Treble, state.treble);
                self.set_driver(host, Driver::Mute, i32::from(state.mute));
            }
            Err(e) if e.is_connection_error() => {
                error!(address = %self.address, host = %self.ip, "Connection error to Speaker: {}", e);
            }
            Err(e) => {
                error!(address = %self.address, host = %self.ip, "Unable to refresh Speaker: {}", e);
            }
        }
    }

    /// Refresh now and report every driver, changed or not
    pub fn query(&mut self, host: &mut dyn Host) {
        self.update(PollKind::ShortPoll, host);
        for value in self.drivers.values() {
            host.report_driver(&self.address, value);
        }
    }

    /// Handle a command addressed to this node
    ///
    /// Device failures are logged and swallowed; only commands a speaker does
    /// not understand are returned as errors.
    pub fn on_command(&mut self, code: CommandCode, payload: &CommandPayload, host: &mut dyn Host) -> Result<()> {
        debug!(address = %self.address, command = %code, value = ?payload.value, "Speaker command");

        match code {
            CommandCode::Play | CommandCode::On => self.transport(host, |d| d.play()),
            CommandCode::Stop => self.transport(host, |d| d.stop()),
            CommandCode::Pause | CommandCode::Off => self.transport(host, |d| d.pause()),
            CommandCode::Next => {
                attempt(&self.address, NAVIGATION_HINT, self.device.next());
            }
            CommandCode::Previous => {
                attempt(&self.address, NAVIGATION_HINT, self.device.previous());
            }
            CommandCode::PartyMode => {
                attempt(&self.address, PARTYMODE_HINT, self.device.partymode());
            }
            CommandCode::Mute => self.set_mute(host, true),
            CommandCode::Unmute => self.set_mute(host, false),
            CommandCode::Volume | CommandCode::Bass | CommandCode::Treble => self.set_level(host, code, payload),
            CommandCode::Query => self.query(host),
            CommandCode::Discover => {
                return Err(NodeServerError::UnknownCommand {
                    address: self.address.clone(),
                    command: code.to_string(),
                })
            }
        }
        Ok(())
    }

    fn read_live_state(&self) -> Result<LiveState> {
        Ok(LiveState {
            transport: TransportState::from_device(&self.device.transport_state()?),
            volume: self.device.volume()?,
            bass: self.device.bass()?,
            treble: self.device.treble()?,
            mute: self.device.mute()?,
        })
    }

    fn set_driver(&mut self, host: &mut dyn Host, driver: Driver, value: i32) {
        if self.drivers.set(driver, value) {
            host.report_driver(&self.address, self.drivers.value(driver));
        }
    }

    fn transport(&mut self, host: &mut dyn Host, action: impl Fn(&dyn SpeakerDevice) -> Result<()>) {
        let state = action(&*self.device).and_then(|_| self.device.transport_state());
        if let Some(state) = attempt(&self.address, TRANSPORT_HINT, state) {
            self.set_driver(host, Driver::Status, TransportState::from_device(&state).driver_value());
        }
    }

    fn set_mute(&mut self, host: &mut dyn Host, mute: bool) {
        if attempt(&self.address, MUTE_HINT, self.device.set_mute(mute)).is_some() {
            self.set_driver(host, Driver::Mute, i32::from(mute));
        }
    }

    /// VOLUME, BASS and TREBLE
    ///
    /// Bass and treble outside -10..=10 are dropped without a device call.
    /// Volume is passed through as given.
    fn set_level(&mut self, host: &mut dyn Host, code: CommandCode, payload: &CommandPayload) {
        let command = code.as_str().to_lowercase();
        let value = match payload.int_value(&command) {
            Ok(value) => value,
            Err(e) => {
                error!(address = %self.address, error = %e, "{}: Invalid argument", command);
                return;
            }
        };

        let (driver, result) = match code {
            CommandCode::Volume => (Driver::Volume, self.device.set_volume(value)),
            CommandCode::Bass if (-10..=10).contains(&value) => (Driver::Bass, self.device.set_bass(value)),
            CommandCode::Treble if (-10..=10).contains(&value) => (Driver::Treble, self.device.set_treble(value)),
            _ => {
                debug!(address = %self.address, value, "{} out of range, ignored", command);
                return;
            }
        };

        if attempt(&self.address, SETTER_HINT, result).is_some() {
            self.set_driver(host, driver, value);
        }
    }
}
