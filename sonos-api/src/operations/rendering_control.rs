//! RenderingControl service operations
//!
//! Volume, equalizer and mute for a single speaker. Every request carries a
//! channel; Sonos only honours `Master` for these actions.

use crate::operation::child_value;

/// Response for GetVolume
#[derive(Debug, Clone, PartialEq)]
pub struct GetVolumeResponse {
    pub current_volume: u8,
}

define_operation! {
    /// Read the speaker volume (0-100)
    operation: GetVolumeOperation,
    action: "GetVolume",
    service: RenderingControl,
    request: {
        channel: String,
    },
    response: GetVolumeResponse,
    payload: |req| format!("<InstanceID>{}</InstanceID><Channel>{}</Channel>", req.instance_id, req.channel),
    parse: |xml| Ok(GetVolumeResponse { current_volume: child_value(xml, "CurrentVolume")? }),
}

define_operation! {
    /// Set the speaker volume (0-100)
    operation: SetVolumeOperation,
    action: "SetVolume",
    service: RenderingControl,
    request: {
        channel: String,
        desired_volume: u8,
    },
    response: (),
    payload: |req| format!(
        "<InstanceID>{}</InstanceID><Channel>{}</Channel><DesiredVolume>{}</DesiredVolume>",
        req.instance_id, req.channel, req.desired_volume
    ),
    parse: |_xml| Ok(()),
}

/// Response for GetBass
#[derive(Debug, Clone, PartialEq)]
pub struct GetBassResponse {
    pub current_bass: i8,
}

define_operation! {
    /// Read the bass level (-10 to 10)
    operation: GetBassOperation,
    action: "GetBass",
    service: RenderingControl,
    request: {
        channel: String,
    },
    response: GetBassResponse,
    payload: |req| format!("<InstanceID>{}</InstanceID><Channel>{}</Channel>", req.instance_id, req.channel),
    parse: |xml| Ok(GetBassResponse { current_bass: child_value(xml, "CurrentBass")? }),
}

define_operation! {
    /// Set the bass level (-10 to 10)
    operation: SetBassOperation,
    action: "SetBass",
    service: RenderingControl,
    request: {
        channel: String,
        desired_bass: i8,
    },
    response: (),
    payload: |req| format!(
        "<InstanceID>{}</InstanceID><Channel>{}</Channel><DesiredBass>{}</DesiredBass>",
        req.instance_id, req.channel, req.desired_bass
    ),
    parse: |_xml| Ok(()),
}

/// Response for GetTreble
#[derive(Debug, Clone, PartialEq)]
pub struct GetTrebleResponse {
    pub current_treble: i8,
}

define_operation! {
    /// Read the treble level (-10 to 10)
    operation: GetTrebleOperation,
    action: "GetTreble",
    service: RenderingControl,
    request: {
        channel: String,
    },
    response: GetTrebleResponse,
    payload: |req| format!("<InstanceID>{}</InstanceID><Channel>{}</Channel>", req.instance_id, req.channel),
    parse: |xml| Ok(GetTrebleResponse { current_treble: child_value(xml, "CurrentTreble")? }),
}

define_operation! {
    /// Set the treble level (-10 to 10)
    operation: SetTrebleOperation,
    action: "SetTreble",
    service: RenderingControl,
    request: {
        channel: String,
        desired_treble: i8,
    },
    response: (),
    payload: |req| format!(
        "<InstanceID>{}</InstanceID><Channel>{}</Channel><DesiredTreble>{}</DesiredTreble>",
        req.instance_id, req.channel, req.desired_treble
    ),
    parse: |_xml| Ok(()),
}

/// Response for GetMute
#[derive(Debug, Clone, PartialEq)]
pub struct GetMuteResponse {
    pub current_mute: bool,
}

define_operation! {
    /// Read the mute flag
    operation: GetMuteOperation,
    action: "GetMute",
    service: RenderingControl,
    request: {
        channel: String,
    },
    response: GetMuteResponse,
    payload: |req| format!("<InstanceID>{}</InstanceID><Channel>{}</Channel>", req.instance_id, req.channel),
    parse: |xml| {
        let raw: u8 = child_value(xml, "CurrentMute")?;
        Ok(GetMuteResponse { current_mute: raw != 0 })
    },
}

define_operation! {
    /// Set the mute flag
    operation: SetMuteOperation,
    action: "SetMute",
    service: RenderingControl,
    request: {
        channel: String,
        desired_mute: bool,
    },
    response: (),
    payload: |req| format!(
        "<InstanceID>{}</InstanceID><Channel>{}</Channel><DesiredMute>{}</DesiredMute>",
        req.instance_id, req.channel, u8::from(req.desired_mute)
    ),
    parse: |_xml| Ok(()),
}
