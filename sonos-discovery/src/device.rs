//! UPnP device descriptions served by players at `/xml/device_description.xml`.

use crate::error::{DiscoveryError, Result};
use crate::Device;
use serde::Deserialize;

/// Port players serve descriptions and control endpoints on.
pub const DEFAULT_PLAYER_PORT: u16 = 1400;

#[derive(Debug, Deserialize)]
struct DescriptionRoot {
    device: DeviceDescription,
}

/// The parts of a device description discovery cares about.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDescription {
    pub device_type: String,
    pub friendly_name: String,
    pub manufacturer: String,
    pub model_name: String,
    #[serde(rename = "UDN")]
    pub udn: String,
    /// Only players carry a room name; bridges and other UPnP gear do not.
    pub room_name: Option<String>,
}

impl DeviceDescription {
    pub fn from_xml(xml: &str) -> Result<Self> {
        quick_xml::de::from_str::<DescriptionRoot>(xml)
            .map(|root| root.device)
            .map_err(|e| DiscoveryError::ParseError(format!("device description: {}", e)))
    }

    /// Sonos players identify as `ZonePlayer`; the manufacturer is the fallback.
    pub fn is_sonos_device(&self) -> bool {
        self.device_type.contains("ZonePlayer") || self.manufacturer.to_lowercase().contains("sonos")
    }

    /// Build a [`Device`] for the player whose description lives at `location`.
    ///
    /// The display name is the room name when present, else the friendly name.
    /// Returns `None` when `location` has no host.
    pub fn into_device(self, location: &str) -> Option<Device> {
        let (ip_address, port) = split_location(location)?;
        let name = self.room_name.clone().unwrap_or_else(|| self.friendly_name.clone());

        Some(Device {
            id: self.udn,
            name,
            room_name: self.room_name.unwrap_or_else(|| "Unknown".to_string()),
            ip_address,
            port: port.unwrap_or(DEFAULT_PLAYER_PORT),
            model_name: self.model_name,
        })
    }
}

/// GET and parse the description at `location`.
pub fn fetch_description(client: &reqwest::blocking::Client, location: &str) -> Result<DeviceDescription> {
    let body = client
        .get(location)
        .send()
        .and_then(|r| r.error_for_status())
        .and_then(|r| r.text())
        .map_err(|e| DiscoveryError::NetworkError(format!("{}: {}", location, e)))?;

    DeviceDescription::from_xml(&body)
}

/// Host and explicit port of an `http://host[:port]/path` location.
pub fn split_location(url: &str) -> Option<(String, Option<u16>)> {
    let authority = url.split_once("//")?.1.split('/').next()?;
    let (host, port) = match authority.rsplit_once(':') {
        Some((host, port)) => (host, Some(port.parse().ok()?)),
        None => (authority, None),
    };
    (!host.is_empty()).then(|| (host.to_string(), port))
}
