//! Sonos-backed implementations of the device traits

use std::collections::HashSet;
use std::time::Duration;

use sonos_api::operations::av_transport::{
    GetTransportInfoOperation, GetTransportInfoOperationRequest, NextOperation, NextOperationRequest,
    PauseOperation, PauseOperationRequest, PlayOperation, PlayOperationRequest, PreviousOperation,
    PreviousOperationRequest, SetAVTransportURIOperation, SetAVTransportURIOperationRequest, StopOperation,
    StopOperationRequest,
};
use sonos_api::operations::rendering_control::{
    GetBassOperation, GetBassOperationRequest, GetMuteOperation, GetMuteOperationRequest, GetTrebleOperation,
    GetTrebleOperationRequest, GetVolumeOperation, GetVolumeOperationRequest, SetBassOperation,
    SetBassOperationRequest, SetMuteOperation, SetMuteOperationRequest, SetTrebleOperation,
    SetTrebleOperationRequest, SetVolumeOperation, SetVolumeOperationRequest,
};
use sonos_api::operations::zone_group_topology::{
    GetZoneGroupStateOperation, GetZoneGroupStateOperationRequest, GetZoneGroupStateResponse,
};
use sonos_api::operations::MASTER_CHANNEL;
use sonos_api::{ApiError, SonosClient};
use sonos_discovery::{Device, DiscoveryOptions};
use tracing::{debug, info, warn};

use crate::device::{DeviceConnector, DiscoveredSpeaker, SpeakerDevice, SpeakerDiscovery};
use crate::error::Result;

const INSTANCE_ID: u32 = 0;

/// How long a discovery pass listens for speakers
pub const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Control handle for one Sonos zone player
///
/// Setters clamp to what the device accepts: volume 0..=100, bass and treble
/// -10..=10.
#[derive(Debug, Clone)]
pub struct SonosZone {
    ip: String,
    client: SonosClient,
}

impl SonosZone {
    pub fn new(ip: impl Into<String>) -> Self {
        Self::with_client(ip, SonosClient::new())
    }

    pub fn with_client(ip: impl Into<String>, client: SonosClient) -> Self {
        Self { ip: ip.into(), client }
    }

    pub fn ip(&self) -> &str {
        &self.ip
    }

    fn channel() -> String {
        MASTER_CHANNEL.to_string()
    }
}

impl SpeakerDevice for SonosZone {
    fn volume(&self) -> Result<i32> {
        let request = GetVolumeOperationRequest { instance_id: INSTANCE_ID, channel: Self::channel() };
        let response = self.client.execute::<GetVolumeOperation>(&self.ip, &request)?;
        Ok(i32::from(response.current_volume))
    }

    fn set_volume(&self, volume: i32) -> Result<()> {
        let request = SetVolumeOperationRequest {
            instance_id: INSTANCE_ID,
            channel: Self::channel(),
            desired_volume: volume.clamp(0, 100) as u8,
        };
        Ok(self.client.execute::<SetVolumeOperation>(&self.ip, &request)?)
    }

    fn bass(&self) -> Result<i32> {
        let request = GetBassOperationRequest { instance_id: INSTANCE_ID, channel: Self::channel() };
        let response = self.client.execute::<GetBassOperation>(&self.ip, &request)?;
        Ok(i32::from(response.current_bass))
    }

    fn set_bass(&self, bass: i32) -> Result<()> {
        let request = SetBassOperationRequest {
            instance_id: INSTANCE_ID,
            channel: Self::channel(),
            desired_bass: bass.clamp(-10, 10) as i8,
        };
        Ok(self.client.execute::<SetBassOperation>(&self.ip, &request)?)
    }

    fn treble(&self) -> Result<i32> {
        let request = GetTrebleOperationRequest { instance_id: INSTANCE_ID, channel: Self::channel() };
        let response = self.client.execute::<GetTrebleOperation>(&self.ip, &request)?;
        Ok(i32::from(response.current_treble))
    }

    fn set_treble(&self, treble: i32) -> Result<()> {
        let request = SetTrebleOperationRequest {
            instance_id: INSTANCE_ID,
            channel: Self::channel(),
            desired_treble: treble.clamp(-10, 10) as i8,
        };
        Ok(self.client.execute::<SetTrebleOperation>(&self.ip, &request)?)
    }

    fn mute(&self) -> Result<bool> {
        let request = GetMuteOperationRequest { instance_id: INSTANCE_ID, channel: Self::channel() };
        Ok(self.client.execute::<GetMuteOperation>(&self.ip, &request)?.current_mute)
    }

    fn set_mute(&self, mute: bool) -> Result<()> {
        let request = SetMuteOperationRequest {
            instance_id: INSTANCE_ID,
            channel: Self::channel(),
            desired_mute: mute,
        };
        Ok(self.client.execute::<SetMuteOperation>(&self.ip, &request)?)
    }

    fn transport_state(&self) -> Result<String> {
        let request = GetTransportInfoOperationRequest { instance_id: INSTANCE_ID };
        let info = self.client.execute::<GetTransportInfoOperation>(&self.ip, &request)?;
        Ok(info.current_transport_state)
    }

    fn play(&self) -> Result<()> {
        let request = PlayOperationRequest { instance_id: INSTANCE_ID, speed: "1".to_string() };
        Ok(self.client.execute::<PlayOperation>(&self.ip, &request)?)
    }

    fn stop(&self) -> Result<()> {
        let request = StopOperationRequest { instance_id: INSTANCE_ID };
        Ok(self.client.execute::<StopOperation>(&self.ip, &request)?)
    }

    fn pause(&self) -> Result<()> {
        let request = PauseOperationRequest { instance_id: INSTANCE_ID };
        Ok(self.client.execute::<PauseOperation>(&self.ip, &request)?)
    }

    fn next(&self) -> Result<()> {
        let request = NextOperationRequest { instance_id: INSTANCE_ID };
        Ok(self.client.execute::<NextOperation>(&self.ip, &request)?)
    }

    fn previous(&self) -> Result<()> {
        let request = PreviousOperationRequest { instance_id: INSTANCE_ID };
        Ok(self.client.execute::<PreviousOperation>(&self.ip, &request)?)
    }

    fn partymode(&self) -> Result<()> {
        let request = GetZoneGroupStateOperationRequest { instance_id: INSTANCE_ID };
        let topology = self.client.execute::<GetZoneGroupStateOperation>(&self.ip, &request)?;
        let plan = party_plan(&topology, &self.ip)?;

        for ip in &plan.members {
            debug!(coordinator = %self.ip, member = %ip, "Joining zone to party");
            let request = SetAVTransportURIOperationRequest {
                instance_id: INSTANCE_ID,
                current_uri: plan.uri.clone(),
                current_uri_metadata: String::new(),
            };
            self.client.execute::<SetAVTransportURIOperation>(ip, &request)?;
        }
        Ok(())
    }
}

/// Zones to join and the URI that joins them
#[derive(Debug, Clone, PartialEq, Eq)]
struct PartyPlan {
    uri: String,
    members: Vec<String>,
}

/// Every other visible zone joins the zone at `ip` through `x-rincon:<uid>`
fn party_plan(topology: &GetZoneGroupStateResponse, ip: &str) -> std::result::Result<PartyPlan, ApiError> {
    let own = topology
        .members()
        .find(|m| m.ip == ip && !m.invisible)
        .ok_or_else(|| ApiError::DeviceError(format!("{} is not in the zone group topology", ip)))?;

    let members = topology
        .members()
        .filter(|m| !m.invisible && m.uuid != own.uuid)
        .map(|m| m.ip.clone())
        .collect();

    Ok(PartyPlan { uri: format!("x-rincon:{}", own.uuid), members })
}

/// Opens [`SonosZone`] handles sharing one client
#[derive(Debug, Clone, Default)]
pub struct SonosConnector {
    client: SonosClient,
}

impl SonosConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: SonosClient) -> Self {
        Self { client }
    }
}

impl DeviceConnector for SonosConnector {
    fn connect(&self, ip: &str) -> Result<Box<dyn SpeakerDevice>> {
        Ok(Box::new(SonosZone::with_client(ip, self.client.clone())))
    }
}

/// Finds zone players with `sonos-discovery`
///
/// Bonded satellites (surrounds, subs) answer discovery too; they are
/// dropped using the household topology, which is read from the first
/// device found. Without a topology every device is kept.
#[derive(Debug, Clone)]
pub struct SonosNetwork {
    options: DiscoveryOptions,
    client: SonosClient,
}

impl Default for SonosNetwork {
    fn default() -> Self {
        Self::new(DISCOVERY_TIMEOUT)
    }
}

impl SonosNetwork {
    pub fn new(timeout: Duration) -> Self {
        Self::with_options(DiscoveryOptions::default().with_timeout(timeout), SonosClient::new())
    }

    /// Use explicit discovery options (scan port, probe timeout, prefix limit)
    pub fn with_options(options: DiscoveryOptions, client: SonosClient) -> Self {
        Self { options, client }
    }

    fn topology(&self, devices: &[Device]) -> Option<GetZoneGroupStateResponse> {
        let first = devices.first()?;
        let request = GetZoneGroupStateOperationRequest { instance_id: INSTANCE_ID };
        match self.client.execute::<GetZoneGroupStateOperation>(&first.ip_address, &request) {
            Ok(topology) => Some(topology),
            Err(e) => {
                warn!(host = %first.ip_address, error = %e, "Zone group topology unavailable, keeping all devices");
                None
            }
        }
    }
}

impl SpeakerDiscovery for SonosNetwork {
    fn discover(&self, networks_to_scan: Option<&[String]>) -> Vec<DiscoveredSpeaker> {
        let options = match networks_to_scan {
            Some(networks) => {
                info!(networks = ?networks, "Scanning additional networks if multicast finds nothing");
                self.options.clone().with_networks_to_scan(networks.to_vec())
            }
            None => self.options.clone(),
        };

        let devices = sonos_discovery::get_with_options(&options);
        let topology = self.topology(&devices);
        visible_speakers(devices, topology.as_ref())
    }
}

/// Responders that are visible zones, plus visible zones the topology lists
/// but whose multicast reply never arrived
fn visible_speakers(devices: Vec<Device>, topology: Option<&GetZoneGroupStateResponse>) -> Vec<DiscoveredSpeaker> {
    let visible: Option<HashSet<&str>> =
        topology.map(|t| t.members().filter(|m| !m.invisible).map(|m| m.uuid.as_str()).collect());

    let mut speakers: Vec<DiscoveredSpeaker> = devices
        .into_iter()
        .filter(|device| match &visible {
            Some(uuids) => {
                let keep = uuids.contains(device.uid());
                if !keep {
                    debug!(uid = %device.uid(), host = %device.ip_address, "Skipping invisible zone");
                }
                keep
            }
            None => true,
        })
        .map(|device| DiscoveredSpeaker {
            uid: device.uid().to_string(),
            name: device.name,
            ip: device.ip_address,
        })
        .collect();

    if let Some(topology) = topology {
        let missing: Vec<DiscoveredSpeaker> = topology
            .members()
            .filter(|m| !m.invisible && !m.ip.is_empty())
            .filter(|m| !speakers.iter().any(|s| s.uid == m.uuid))
            .map(|m| DiscoveredSpeaker { uid: m.uuid.clone(), name: m.zone_name.clone(), ip: m.ip.clone() })
            .collect();
        for speaker in &missing {
            debug!(uid = %speaker.uid, host = %speaker.ip, "Adding zone known only from topology");
        }
        speakers.extend(missing);
    }

    speakers
}
