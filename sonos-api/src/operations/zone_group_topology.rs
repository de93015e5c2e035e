//! ZoneGroupTopology service operations
//!
//! `GetZoneGroupState` returns the household topology as an XML document
//! embedded (escaped) in a single response argument. Current firmware wraps it
//! in `<ZoneGroupState><ZoneGroups>`, older firmware returns `<ZoneGroups>` at
//! the root; both shapes are accepted.

use serde::Deserialize;

use crate::error::ApiError;
use crate::operation::child_text;

/// A group of zones playing in sync
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneGroup {
    /// UUID (`RINCON_...`) of the member driving playback for the group
    pub coordinator: String,
    pub members: Vec<ZoneMember>,
}

/// One speaker in the household topology
///
/// Bonded satellites (surrounds, subs) are listed as members too, flagged
/// `invisible`.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneMember {
    pub uuid: String,
    pub location: String,
    /// Host part of `location`, empty when the location is not a URL
    pub ip: String,
    pub zone_name: String,
    pub invisible: bool,
}

impl ZoneGroup {
    /// Iterate over every visible member of the group
    pub fn visible_members(&self) -> impl Iterator<Item = &ZoneMember> {
        self.members.iter().filter(|m| !m.invisible)
    }
}

/// Response for GetZoneGroupState
#[derive(Debug, Clone, PartialEq)]
pub struct GetZoneGroupStateResponse {
    pub zone_groups: Vec<ZoneGroup>,
}

impl GetZoneGroupStateResponse {
    /// All members of all groups, in document order
    pub fn members(&self) -> impl Iterator<Item = &ZoneMember> {
        self.zone_groups.iter().flat_map(|g| g.members.iter())
    }
}

define_operation! {
    /// Read the zone group topology of the household
    operation: GetZoneGroupStateOperation,
    action: "GetZoneGroupState",
    service: ZoneGroupTopology,
    request: {},
    response: GetZoneGroupStateResponse,
    payload: |_req| String::new(),
    parse: |xml| {
        let state = child_text(xml, "ZoneGroupState")?;
        Ok(GetZoneGroupStateResponse { zone_groups: parse_zone_group_state(&state)? })
    },
}

/// Parse the decoded zone-group-state document
pub fn parse_zone_group_state(xml: &str) -> Result<Vec<ZoneGroup>, ApiError> {
    let document: ZoneGroupStateXml = quick_xml::de::from_str(xml)
        .map_err(|e| ApiError::ParseError(format!("Invalid zone group state: {}", e)))?;

    let groups = match document.zone_groups {
        Some(wrapper) => wrapper.zone_groups,
        None => document.zone_group,
    };

    Ok(groups.into_iter().map(ZoneGroup::from).collect())
}

#[derive(Debug, Deserialize)]
struct ZoneGroupStateXml {
    #[serde(rename = "ZoneGroups", default)]
    zone_groups: Option<ZoneGroupsXml>,

    #[serde(rename = "ZoneGroup", default)]
    zone_group: Vec<ZoneGroupXml>,
}

#[derive(Debug, Deserialize)]
struct ZoneGroupsXml {
    #[serde(rename = "ZoneGroup", default)]
    zone_groups: Vec<ZoneGroupXml>,
}

#[derive(Debug, Deserialize)]
struct ZoneGroupXml {
    #[serde(rename = "@Coordinator")]
    coordinator: String,

    #[serde(rename = "ZoneGroupMember", default)]
    members: Vec<ZoneGroupMemberXml>,
}

#[derive(Debug, Deserialize)]
struct ZoneGroupMemberXml {
    #[serde(rename = "@UUID")]
    uuid: String,

    #[serde(rename = "@Location", default)]
    location: String,

    #[serde(rename = "@ZoneName", default)]
    zone_name: String,

    #[serde(rename = "@Invisible", default)]
    invisible: Option<String>,

    #[serde(rename = "Satellite", default)]
    satellites: Vec<ZoneGroupMemberXml>,
}

impl ZoneGroupMemberXml {
    fn into_members(self, out: &mut Vec<ZoneMember>) {
        out.push(ZoneMember {
            ip: host_from_location(&self.location),
            invisible: self.invisible.as_deref() == Some("1"),
            uuid: self.uuid,
            location: self.location,
            zone_name: self.zone_name,
        });
        for satellite in self.satellites {
            satellite.into_members(out);
        }
    }
}

impl From<ZoneGroupXml> for ZoneGroup {
    fn from(group: ZoneGroupXml) -> Self {
        let mut members = Vec::new();
        for member in group.members {
            member.into_members(&mut members);
        }
        ZoneGroup { coordinator: group.coordinator, members }
    }
}

fn host_from_location(location: &str) -> String {
    location
        .split_once("://")
        .map(|(_, rest)| rest)
        .and_then(|rest| rest.split(['/', ':']).next())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SonosOperation;
    use xmltree::Element;

    const STATE: &str = r#"<ZoneGroupState><ZoneGroups>
        <ZoneGroup Coordinator="RINCON_000E58A0000101400" ID="RINCON_000E58A0000101400:12">
            <ZoneGroupMember UUID="RINCON_000E58A0000101400" Location="http://192.168.1.10:1400/xml/device_description.xml" ZoneName="Living Room" SoftwareVersion="79.1-56030">
                <Satellite UUID="RINCON_000E58A0000301400" Location="http://192.168.1.12:1400/xml/device_description.xml" ZoneName="Living Room" Invisible="1"/>
            </ZoneGroupMember>
        </ZoneGroup>
        <ZoneGroup Coordinator="RINCON_000E58A0000201400" ID="RINCON_000E58A0000201400:3">
            <ZoneGroupMember UUID="RINCON_000E58A0000201400" Location="http://192.168.1.11:1400/xml/device_description.xml" ZoneName="Kitchen"/>
            <ZoneGroupMember UUID="RINCON_000E58A0000401400" Location="http://192.168.1.13:1400/xml/device_description.xml" ZoneName="Sub" Invisible="1"/>
        </ZoneGroup>
    </ZoneGroups><VanishedDevices/></ZoneGroupState>"#;

    #[test]
    fn test_parse_wrapped_state() {
        let groups = parse_zone_group_state(STATE).unwrap();
        assert_eq!(groups.len(), 2);

        let living = &groups[0];
        assert_eq!(living.coordinator, "RINCON_000E58A0000101400");
        assert_eq!(living.members.len(), 2);
        assert_eq!(living.members[0].ip, "192.168.1.10");
        assert_eq!(living.members[0].zone_name, "Living Room");
        assert!(!living.members[0].invisible);
        assert_eq!(living.members[1].uuid, "RINCON_000E58A0000301400");
        assert!(living.members[1].invisible);

        let visible: Vec<_> = groups[1].visible_members().map(|m| m.zone_name.as_str()).collect();
        assert_eq!(visible, vec!["Kitchen"]);
    }

    #[test]
    fn test_parse_legacy_root() {
        let legacy = r#"<ZoneGroups><ZoneGroup Coordinator="RINCON_A" ID="RINCON_A:1"><ZoneGroupMember UUID="RINCON_A" Location="http://10.0.0.5:1400/xml/device_description.xml" ZoneName="Office"/></ZoneGroup></ZoneGroups>"#;
        let groups = parse_zone_group_state(legacy).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].members[0].ip, "10.0.0.5");
    }

    #[test]
    fn test_parse_invalid_state() {
        assert!(matches!(
            parse_zone_group_state("<ZoneGroupState><ZoneGroups><ZoneGroup>"),
            Err(ApiError::ParseError(_))
        ));
    }

    #[test]
    fn test_response_parse_from_escaped_argument() {
        let escaped = quick_xml::escape::escape(STATE);
        let response = format!(
            "<GetZoneGroupStateResponse><ZoneGroupState>{}</ZoneGroupState></GetZoneGroupStateResponse>",
            escaped
        );
        let xml = Element::parse(response.as_bytes()).unwrap();

        let result = GetZoneGroupStateOperation::parse_response(&xml).unwrap();
        assert_eq!(result.members().count(), 4);
        assert_eq!(
            GetZoneGroupStateOperation::build_payload(&GetZoneGroupStateOperationRequest { instance_id: 0 }),
            ""
        );
    }

    #[test]
    fn test_host_from_location() {
        assert_eq!(host_from_location("http://192.168.1.10:1400/xml/x.xml"), "192.168.1.10");
        assert_eq!(host_from_location("http://sonos.local/xml"), "sonos.local");
        assert_eq!(host_from_location("garbage"), "");
    }
}
