//! Finds Sonos players with an SSDP M-SEARCH and their UPnP device
//! descriptions. When multicast finds nothing, configured subnets can be
//! probed directly, which reaches players behind a router on another VLAN.
//!
//! ```no_run
//! use sonos_discovery::{get_with_options, DiscoveryOptions};
//!
//! let options = DiscoveryOptions::default()
//!     .with_networks_to_scan(vec!["192.168.20.0/24".to_string()]);
//! for device in get_with_options(&options) {
//!     println!("Found {} at {}", device.name, device.ip_address);
//! }
//! ```

mod error;
mod ssdp;
mod scan;
pub mod device;
mod discovery;

pub use error::{DiscoveryError, Result};
pub use discovery::DiscoveryIterator;
pub use scan::Network;

use std::time::Duration;

/// A player that answered discovery.
#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    /// UDN, e.g. "uuid:RINCON_000E58A0123456"
    pub id: String,
    /// Room name, else the friendly name
    pub name: String,
    pub room_name: String,
    pub ip_address: String,
    pub port: u16,
    pub model_name: String,
}

impl Device {
    /// The UDN without its `uuid:` scheme, e.g. "RINCON_000E58A0123456"
    pub fn uid(&self) -> &str {
        self.id.strip_prefix("uuid:").unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone)]
pub enum DeviceEvent {
    Found(Device),
}

/// Tuning for a discovery pass.
///
/// The defaults perform a 3-second multicast search with no subnet scan.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryOptions {
    /// How long to wait for SSDP responses and device description fetches
    pub timeout: Duration,
    /// Probe `networks_to_scan` when multicast discovery finds nothing
    pub allow_network_scan: bool,
    /// Networks in CIDR notation ("192.168.20.0/24") or bare addresses
    pub networks_to_scan: Vec<String>,
    /// Networks with a shorter prefix than this are too large to scan
    pub min_prefix: u8,
    /// TCP port probed on every scanned host
    pub scan_port: u16,
    /// Connect timeout for each scan probe
    pub probe_timeout: Duration,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(3),
            allow_network_scan: false,
            networks_to_scan: Vec::new(),
            min_prefix: 24,
            scan_port: device::DEFAULT_PLAYER_PORT,
            probe_timeout: Duration::from_millis(300),
        }
    }
}

impl DiscoveryOptions {
    /// Override the multicast and description timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enable the subnet-scan fallback over the given networks
    pub fn with_networks_to_scan(mut self, networks: Vec<String>) -> Self {
        self.allow_network_scan = true;
        self.networks_to_scan = networks;
        self
    }
}

/// One multicast pass with the default options.
pub fn get() -> Vec<Device> {
    get_with_options(&DiscoveryOptions::default())
}

/// Run a full pass and collect every player found.
///
/// Never fails: an unusable network simply yields fewer (or no) devices.
pub fn get_with_options(options: &DiscoveryOptions) -> Vec<Device> {
    get_iter_with_options(options)
        .map(|event| match event {
            DeviceEvent::Found(device) => device,
        })
        .collect()
}

/// Lazily discover players; nothing is sent until the first `next()`.
pub fn get_iter_with_options(options: &DiscoveryOptions) -> DiscoveryIterator {
    DiscoveryIterator::new(options.clone()).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Discovery unavailable");
        DiscoveryIterator::empty()
    })
}
