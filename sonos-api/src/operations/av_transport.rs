//! AVTransport service operations
//!
//! Playback control for a zone: play, pause, stop, track navigation, the
//! current transport state and the source URI (used to group zones).

use crate::operation::{child_text, xml_escape};

define_operation! {
    /// Start or resume playback
    operation: PlayOperation,
    action: "Play",
    service: AVTransport,
    request: {
        speed: String,
    },
    response: (),
    payload: |req| format!("<InstanceID>{}</InstanceID><Speed>{}</Speed>", req.instance_id, req.speed),
    parse: |_xml| Ok(()),
}

define_operation! {
    /// Pause playback
    operation: PauseOperation,
    action: "Pause",
    service: AVTransport,
}

define_operation! {
    /// Stop playback
    operation: StopOperation,
    action: "Stop",
    service: AVTransport,
}

define_operation! {
    /// Skip to the next track
    operation: NextOperation,
    action: "Next",
    service: AVTransport,
}

define_operation! {
    /// Go back to the previous track
    operation: PreviousOperation,
    action: "Previous",
    service: AVTransport,
}

/// Response for GetTransportInfo
///
/// The state is kept as the raw text the device reported (`PLAYING`,
/// `PAUSED_PLAYBACK`, ...) so callers decide how to treat unknown values.
#[derive(Debug, Clone, PartialEq)]
pub struct GetTransportInfoResponse {
    pub current_transport_state: String,
    pub current_transport_status: String,
    pub current_speed: String,
}

define_operation! {
    /// Read the current transport state of a zone
    operation: GetTransportInfoOperation,
    action: "GetTransportInfo",
    service: AVTransport,
    request: {},
    response: GetTransportInfoResponse,
    payload: |req| format!("<InstanceID>{}</InstanceID>", req.instance_id),
    parse: |xml| {
        Ok(GetTransportInfoResponse {
            current_transport_state: child_text(xml, "CurrentTransportState")?,
            current_transport_status: child_text(xml, "CurrentTransportStatus")
                .unwrap_or_else(|_| "OK".to_string()),
            current_speed: child_text(xml, "CurrentSpeed").unwrap_or_else(|_| "1".to_string()),
        })
    },
}

define_operation! {
    /// Replace the source of a zone
    ///
    /// Pointing a zone at `x-rincon:<coordinator uid>` joins it to that
    /// coordinator's group.
    operation: SetAVTransportURIOperation,
    action: "SetAVTransportURI",
    service: AVTransport,
    request: {
        current_uri: String,
        current_uri_metadata: String,
    },
    response: (),
    payload: |req| format!(
        "<InstanceID>{}</InstanceID><CurrentURI>{}</CurrentURI><CurrentURIMetaData>{}</CurrentURIMetaData>",
        req.instance_id,
        xml_escape(&req.current_uri),
        xml_escape(&req.current_uri_metadata)
    ),
    parse: |_xml| Ok(()),
}
