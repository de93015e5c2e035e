//! Sonos node server
//!
//! Exposes Sonos speakers to a home-automation host as nodes. A [`Controller`]
//! finds speakers (multicast discovery, optional subnet scans and manual
//! `sonos_<address>` entries) and owns one [`Speaker`] node per device. Each
//! speaker publishes its transport state, volume, bass, treble and mute as
//! drivers and accepts playback and level commands.
//!
//! The host is reached only through the [`Host`] trait, and devices only
//! through [`SpeakerDevice`], [`DeviceConnector`] and [`SpeakerDiscovery`].
//!
//! ```rust,no_run
//! use sonos_nodeserver::{Controller, MemoryHost, PollKind, SonosConnector, SonosNetwork};
//!
//! let mut host = MemoryHost::new();
//! let mut controller = Controller::new(Box::new(SonosNetwork::default()), Box::new(SonosConnector::new()));
//! controller.start(&mut host);
//! controller.on_poll(PollKind::ShortPoll, &mut host);
//! ```

pub mod command;
pub mod config;
pub mod controller;
pub mod device;
pub mod driver;
pub mod error;
pub mod harness;
pub mod host;
pub mod logging;
pub mod network;
pub mod poll;
pub mod speaker;
pub mod transport;

pub use command::{CommandCode, CommandPayload};
pub use config::{sanitize_name, CustomParams, ManualSpeaker, NAME_DENYLIST};
pub use controller::Controller;
pub use device::{DeviceConnector, DiscoveredSpeaker, SpeakerDevice, SpeakerDiscovery};
pub use driver::{Driver, DriverValue, Drivers};
pub use error::{NodeServerError, Result};
pub use host::{Host, MemoryHost, NodeInfo};
pub use network::{SonosConnector, SonosNetwork, SonosZone};
pub use poll::PollKind;
pub use speaker::Speaker;
pub use transport::TransportState;
