//! Core discovery logic and iterator implementation.
//!
//! The iterator:
//! 1. Sends an SSDP M-SEARCH for Sonos ZonePlayer devices and buffers replies
//! 2. Falls back to probing configured subnets when multicast found nothing
//! 3. Fetches and validates each candidate's device description
//! 4. Yields discovered devices as events

use std::collections::HashSet;
use std::net::Ipv4Addr;

use crate::device::DeviceDescription;
use crate::error::{DiscoveryError, Result};
use crate::scan::{parse_networks, probe_hosts};
use crate::ssdp::{SsdpClient, SsdpResponse};
use crate::{DeviceEvent, DiscoveryOptions};

/// A description URL waiting to be fetched
#[derive(Debug, Clone, PartialEq)]
struct Candidate {
    location: String,
}

impl Candidate {
    fn from_scan(ip: Ipv4Addr, port: u16) -> Self {
        Self {
            location: format!("http://{}:{}/xml/device_description.xml", ip, port),
        }
    }
}

/// Iterator that discovers Sonos devices on the local network.
///
/// Yields `DeviceEvent::Found` once per device location, skipping anything
/// that does not describe itself as a Sonos player.
///
/// # Examples
///
/// ```no_run
/// use sonos_discovery::{get_iter_with_options, DeviceEvent, DiscoveryOptions};
///
/// for event in get_iter_with_options(&DiscoveryOptions::default()) {
///     match event {
///         DeviceEvent::Found(device) => {
///             println!("Found: {}", device.name);
///         }
///     }
/// }
/// ```
pub struct DiscoveryIterator {
    ssdp_client: Option<SsdpClient>,
    filled: bool,
    options: DiscoveryOptions,
    candidates: Vec<Candidate>,
    index: usize,
    seen_locations: HashSet<String>,
    /// Absent only in the empty iterator
    http_client: Option<reqwest::blocking::Client>,
}

impl DiscoveryIterator {
    /// Create a new discovery iterator with the given options
    ///
    /// Without a multicast socket the iterator still scans `networks_to_scan`.
    pub fn new(options: DiscoveryOptions) -> Result<Self> {
        let ssdp_client = match SsdpClient::new(options.timeout) {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!(error = %e, "SSDP unavailable, relying on network scan");
                None
            }
        };
        let http_client = reqwest::blocking::Client::builder()
            .timeout(options.timeout)
            .build()
            .map_err(|e| DiscoveryError::NetworkError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            ssdp_client,
            filled: false,
            options,
            candidates: Vec::new(),
            index: 0,
            seen_locations: HashSet::new(),
            http_client: Some(http_client),
        })
    }

    /// Create an empty iterator that yields no results
    ///
    /// Used when the HTTP client could not be built, so it builds none itself.
    pub(crate) fn empty() -> Self {
        Self {
            ssdp_client: None,
            filled: true,
            options: DiscoveryOptions::default(),
            candidates: Vec::new(),
            index: 0,
            seen_locations: HashSet::new(),
            http_client: None,
        }
    }

    /// Check if an SSDP response is likely from a Sonos device (early filtering)
    fn is_likely_sonos(response: &SsdpResponse) -> bool {
        response.urn.contains("ZonePlayer")
            || response.usn.contains("RINCON")
            || response
                .server
                .as_ref()
                .is_some_and(|server| server.to_lowercase().contains("sonos"))
    }

    fn fetch_device_description(&self, location: &str) -> Result<DeviceDescription> {
        let client = self
            .http_client
            .as_ref()
            .ok_or_else(|| DiscoveryError::NetworkError("no HTTP client".to_string()))?;
        crate::device::fetch_description(client, location)
    }

    /// Gather candidates: multicast first, subnet scan only if that found nothing
    fn fill_candidates(&mut self) {
        self.filled = true;

        if let Some(client) = self.ssdp_client.take() {
            match client.search("urn:schemas-upnp-org:device:ZonePlayer:1") {
                Ok(responses) => {
                    self.candidates.extend(
                        responses
                            .filter_map(|r| r.ok())
                            .filter(Self::is_likely_sonos)
                            .map(|r| Candidate { location: r.location }),
                    );
                }
                Err(e) => tracing::warn!(error = %e, "SSDP search failed"),
            }
        }

        if self.candidates.is_empty() && self.options.allow_network_scan {
            self.candidates = self.scan_candidates();
        }
    }

    fn scan_candidates(&self) -> Vec<Candidate> {
        let networks = parse_networks(&self.options.networks_to_scan, self.options.min_prefix);
        let hosts: Vec<Ipv4Addr> = networks.iter().flat_map(|n| n.hosts()).collect();

        tracing::info!(networks = networks.len(), hosts = hosts.len(), "Scanning networks for players");

        probe_hosts(hosts, self.options.scan_port, self.options.probe_timeout)
            .into_iter()
            .map(|ip| Candidate::from_scan(ip, self.options.scan_port))
            .collect()
    }
}

impl Iterator for DiscoveryIterator {
    type Item = DeviceEvent;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.filled {
            self.fill_candidates();
        }

        while self.index < self.candidates.len() {
            let location = self.candidates[self.index].location.clone();
            self.index += 1;

            if !self.seen_locations.insert(location.clone()) {
                continue;
            }

            let device_desc = match self.fetch_device_description(&location) {
                Ok(desc) => desc,
                Err(e) => {
                    tracing::debug!(%location, error = %e, "Skipping candidate");
                    continue;
                }
            };

            if !device_desc.is_sonos_device() {
                continue;
            }

            if let Some(device) = device_desc.into_device(&location) {
                return Some(DeviceEvent::Found(device));
            }
        }

        None
    }
}
