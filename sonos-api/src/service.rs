//! UPnP services a speaker exposes on its control port

/// Services this crate has operations for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    /// Playback: play, pause, stop, track navigation, stream source
    AVTransport,
    /// Output levels: volume, bass, treble, mute
    RenderingControl,
    /// Household layout: which speakers are grouped with which
    ZoneGroupTopology,
}

/// Where to POST a service's SOAP actions and which URN to name them under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInfo {
    /// Path relative to `http://<ip>:<port>/`
    pub endpoint: &'static str,
    pub service_uri: &'static str,
}

impl Service {
    pub const ALL: [Service; 3] = [Service::AVTransport, Service::RenderingControl, Service::ZoneGroupTopology];

    pub fn name(&self) -> &'static str {
        self.info().service_uri.rsplit(':').nth(1).unwrap_or_default()
    }

    pub fn info(&self) -> ServiceInfo {
        let (endpoint, service_uri) = match self {
            Service::AVTransport => (
                "MediaRenderer/AVTransport/Control",
                "urn:schemas-upnp-org:service:AVTransport:1",
            ),
            Service::RenderingControl => (
                "MediaRenderer/RenderingControl/Control",
                "urn:schemas-upnp-org:service:RenderingControl:1",
            ),
            Service::ZoneGroupTopology => (
                "ZoneGroupTopology/Control",
                "urn:schemas-upnp-org:service:ZoneGroupTopology:1",
            ),
        };
        ServiceInfo { endpoint, service_uri }
    }
}
