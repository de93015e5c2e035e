//! Custom parameters configured by the user through the host
//!
//! Two kinds of keys are understood:
//!
//! - `networks_to_scan`: comma separated networks (`192.168.2.0/24`, or a bare
//!   address) to probe when multicast discovery cannot reach the speakers.
//! - `sonos_<address>`: a speaker added by hand, valued with JSON such as
//!   `{"name": "Family Room", "host": "192.168.1.86"}`.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{NodeServerError, Result};

/// Characters stripped from user-supplied node names and hosts
pub const NAME_DENYLIST: &str = "<>'~!@#$%^&*(){}[]?/\\;:\"";

const NETWORKS_KEY: &str = "networks_to_scan";
const MANUAL_PREFIX: &str = "sonos_";

/// Remove every [`NAME_DENYLIST`] character from `name`
pub fn sanitize_name(name: &str) -> String {
    name.chars().filter(|c| !NAME_DENYLIST.contains(*c)).collect()
}

/// A speaker configured through a `sonos_<address>` parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualSpeaker {
    pub key: String,
    pub address: String,
    pub name: String,
    pub host: String,
}

/// The host's custom parameter map, ordered by key
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct CustomParams {
    params: BTreeMap<String, String>,
}

impl CustomParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON object of string values
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Networks to scan when multicast discovery finds nothing
    ///
    /// Any key starting with `networks_to_scan` (ignoring case) counts; when
    /// several match, the last one wins. `None` when nothing usable is set.
    pub fn networks_to_scan(&self) -> Option<Vec<String>> {
        let (_, value) = self.iter().filter(|(key, _)| has_prefix(key, NETWORKS_KEY)).last()?;

        let networks: Vec<String> = value
            .split(',')
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .collect();

        (!networks.is_empty()).then_some(networks)
    }

    /// Every `sonos_<address>` entry, validated independently
    pub fn manual_speakers(&self) -> Vec<Result<ManualSpeaker>> {
        self.iter()
            .filter(|(key, _)| has_prefix(key, MANUAL_PREFIX))
            .map(|(key, value)| parse_manual_speaker(key, value))
            .collect()
    }
}

fn has_prefix(key: &str, prefix: &str) -> bool {
    key.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

fn parse_manual_speaker(key: &str, value: &str) -> Result<ManualSpeaker> {
    let invalid = |reason: String| NodeServerError::InvalidManualSpeaker { key: key.to_string(), reason };

    let address = key[MANUAL_PREFIX.len()..].to_lowercase();
    if address.is_empty() {
        return Err(invalid("no address after sonos_".to_string()));
    }

    let json: Value = serde_json::from_str(value).map_err(|e| invalid(format!("invalid JSON ({})", e)))?;
    let object = json
        .as_object()
        .ok_or_else(|| invalid("value is not a JSON object".to_string()))?;

    let field = |name: &str| -> Result<String> {
        match object.get(name) {
            None => Err(invalid(format!("no {} in value {}", name, value))),
            Some(Value::String(s)) => Ok(sanitize_name(s)),
            Some(_) => Err(invalid(format!("{} must be a string", name))),
        }
    };

    Ok(ManualSpeaker {
        key: key.to_string(),
        address,
        name: field("name")?,
        host: field("host")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn params(entries: &[(&str, &str)]) -> CustomParams {
        let mut params = CustomParams::new();
        for (k, v) in entries {
            params.insert(*k, *v);
        }
        params
    }

    #[test]
    fn test_sanitize_strips_denylist() {
        assert_eq!(sanitize_name("Kitchen"), "Kitchen");
        assert_eq!(sanitize_name("Bob's <Den> #2!"), "Bobs Den 2");
        assert_eq!(sanitize_name(NAME_DENYLIST), "");
        assert_eq!(sanitize_name("192.168.1.86"), "192.168.1.86");
        assert_eq!(sanitize_name("Salle à manger"), "Salle à manger");
    }

    #[rstest]
    #[case(&[], None)]
    #[case(&[("networks_to_scan", "192.168.2.0/24")], Some(vec!["192.168.2.0/24"]))]
    #[case(&[("Networks_To_Scan", " 10.0.0.0/24 , ,10.0.1.7")], Some(vec!["10.0.0.0/24", "10.0.1.7"]))]
    #[case(&[("networks_to_scan", " , ")], None)]
    #[case(&[("networks", "10.0.0.0/24")], None)]
    fn test_networks_to_scan(#[case] entries: &[(&str, &str)], #[case] expected: Option<Vec<&str>>) {
        let expected = expected.map(|v| v.into_iter().map(str::to_string).collect::<Vec<_>>());
        assert_eq!(params(entries).networks_to_scan(), expected);
    }

    #[test]
    fn test_manual_speaker_kitchen() {
        let params = params(&[("sonos_abcdef1234567890", r#"{"name":"Kitchen","host":"10.0.0.5"}"#)]);
        let speakers = params.manual_speakers();
        assert_eq!(speakers.len(), 1);

        let speaker = speakers[0].as_ref().unwrap();
        assert_eq!(speaker.address, "abcdef1234567890");
        assert_eq!(speaker.name, "Kitchen");
        assert_eq!(speaker.host, "10.0.0.5");
    }

    #[test]
    fn test_manual_speaker_key_is_case_insensitive_and_lowercased() {
        let params = params(&[("SONOS_ABCDEF", r#"{"name":"Den (upstairs)","host":"10.0.0.6"}"#)]);
        let speaker = params.manual_speakers().remove(0).unwrap();
        assert_eq!(speaker.address, "abcdef");
        assert_eq!(speaker.name, "Den upstairs");
    }

    #[rstest]
    #[case("sonos_a1", r#"{"name":"Kitchen"}"#, "no host")]
    #[case("sonos_a2", r#"{"host":"10.0.0.5"}"#, "no name")]
    #[case("sonos_a3", "{not json", "invalid JSON")]
    #[case("sonos_a4", r#"["Kitchen","10.0.0.5"]"#, "not a JSON object")]
    #[case("sonos_a5", r#"{"name":7,"host":"10.0.0.5"}"#, "must be a string")]
    #[case("sonos_", r#"{"name":"Kitchen","host":"10.0.0.5"}"#, "no address")]
    fn test_manual_speaker_rejected(#[case] key: &str, #[case] value: &str, #[case] reason_fragment: &str) {
        match params(&[(key, value)]).manual_speakers().remove(0) {
            Err(NodeServerError::InvalidManualSpeaker { key: k, reason }) => {
                assert_eq!(k, key);
                assert!(reason.contains(reason_fragment), "reason was {}", reason);
            }
            other => panic!("expected InvalidManualSpeaker, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_entry_does_not_hide_later_entries() {
        let params = params(&[
            ("sonos_aaa", r#"{"name":"Broken"}"#),
            ("sonos_bbb", r#"{"name":"Office","host":"10.0.0.9"}"#),
            ("unrelated", "x"),
        ]);
        let results = params.manual_speakers();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_err());
        assert_eq!(results[1].as_ref().unwrap().address, "bbb");
    }

    #[test]
    fn test_from_json() {
        let params = CustomParams::from_json(r#"{"networks_to_scan":"10.0.0.0/24"}"#).unwrap();
        assert_eq!(params.get("networks_to_scan"), Some("10.0.0.0/24"));
        assert!(matches!(CustomParams::from_json("[1,2]"), Err(NodeServerError::Params(_))));
    }
}
