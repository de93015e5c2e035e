//! JSON-lines protocol used by the stdio harness
//!
//! Every message is one JSON object per line, tagged by `type`.
//!
//! Outbound (stdout):
//! ```text
//! {"type":"addnode","address":"00e58a01234014","primary":"controller","name":"Sonos Den","nodedef":"sonosspeaker","drivers":[...]}
//! {"type":"driver","address":"00e58a01234014","driver":"SVOL","value":25,"uom":51}
//! {"type":"notice","key":"error","text":"No speakers found..."}
//! {"type":"removenotice","key":"error"}
//! ```
//!
//! Inbound (stdin):
//! ```text
//! {"type":"command","address":"00e58a01234014","cmd":"VOLUME","value":30}
//! {"type":"customparams","params":{"networks_to_scan":"192.168.2.0/24"}}
//! {"type":"discover"}
//! {"type":"query","address":"00e58a01234014"}
//! ```

use std::io::Write;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, warn};

use crate::command::{CommandCode, CommandPayload};
use crate::config::CustomParams;
use crate::controller::{Controller, CONTROLLER_ADDRESS};
use crate::driver::DriverValue;
use crate::error::Result;
use crate::host::{Host, NodeInfo};

/// Messages written to the host
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Outbound {
    AddNode(NodeInfo),
    Driver {
        address: String,
        #[serde(flatten)]
        value: DriverValue,
    },
    Notice {
        key: String,
        text: String,
    },
    RemoveNotice {
        key: String,
    },
}

/// Messages read from the host
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Inbound {
    Command {
        address: String,
        cmd: String,
        #[serde(default)]
        value: Option<Value>,
    },
    CustomParams {
        params: CustomParams,
    },
    Discover,
    Query {
        address: String,
    },
}

impl Inbound {
    /// Parse one input line
    pub fn parse(line: &str) -> Result<Self> {
        Ok(serde_json::from_str(line.trim())?)
    }
}

/// Command values may arrive as JSON strings or numbers
fn payload_from(value: Option<Value>) -> CommandPayload {
    match value {
        None | Some(Value::Null) => CommandPayload::new(),
        Some(Value::String(s)) => CommandPayload::with_value(s),
        Some(other) => CommandPayload::with_value(other.to_string()),
    }
}

/// Hand one inbound message to the controller
///
/// Errors are logged, never returned: a bad command must not stop the loop.
pub fn dispatch(controller: &mut Controller, message: Inbound, host: &mut dyn Host) {
    let result = match message {
        Inbound::Command { address, cmd, value } => {
            controller.on_raw_command(&address, &cmd, &payload_from(value), host)
        }
        Inbound::CustomParams { params } => {
            controller.on_custom_params(params);
            Ok(())
        }
        Inbound::Discover => {
            controller.on_command(CONTROLLER_ADDRESS, CommandCode::Discover, &CommandPayload::new(), host)
        }
        Inbound::Query { address } => {
            controller.on_command(&address, CommandCode::Query, &CommandPayload::new(), host)
        }
    };

    if let Err(e) = result {
        warn!(error = %e, "Command not handled");
    }
}

/// A [`Host`] writing [`Outbound`] lines to a writer (stdout in the binary)
pub struct StdioHost<W: Write> {
    out: W,
}

impl<W: Write> StdioHost<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn send(&mut self, message: &Outbound) {
        let written = serde_json::to_writer(&mut self.out, message)
            .map_err(std::io::Error::from)
            .and_then(|_| self.out.write_all(b"\n"))
            .and_then(|_| self.out.flush());
        if let Err(e) = written {
            error!(error = %e, "Failed to write to host");
        }
    }
}

impl<W: Write> Host for StdioHost<W> {
    fn add_node(&mut self, node: NodeInfo) {
        self.send(&Outbound::AddNode(node));
    }

    fn report_driver(&mut self, address: &str, value: DriverValue) {
        self.send(&Outbound::Driver { address: address.to_string(), value });
    }

    fn add_notice(&mut self, key: &str, text: &str) {
        self.send(&Outbound::Notice { key: key.to_string(), text: text.to_string() });
    }

    fn remove_notice(&mut self, key: &str) {
        self.send(&Outbound::RemoveNotice { key: key.to_string() });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{Driver, Drivers};
    use rstest::rstest;

    #[rstest]
    #[case(r#"{"type":"command","address":"abc","cmd":"VOLUME","value":30}"#, Some("30"))]
    #[case(r#"{"type":"command","address":"abc","cmd":"VOLUME","value":"30"}"#, Some("30"))]
    #[case(r#"{"type":"command","address":"abc","cmd":"PLAY"}"#, None)]
    #[case(r#"{"type":"command","address":"abc","cmd":"PLAY","value":null}"#, None)]
    fn test_command_values(#[case] line: &str, #[case] expected: Option<&str>) {
        match Inbound::parse(line).unwrap() {
            Inbound::Command { value, .. } => {
                assert_eq!(payload_from(value).value.as_deref(), expected);
            }
            other => panic!("expected command, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_other_messages() {
        assert_eq!(Inbound::parse(r#"{"type":"discover"}"#).unwrap(), Inbound::Discover);
        assert_eq!(
            Inbound::parse(r#" {"type":"query","address":"abc"} "#).unwrap(),
            Inbound::Query { address: "abc".to_string() }
        );
        match Inbound::parse(r#"{"type":"customparams","params":{"sonos_abc":"{}"}}"#).unwrap() {
            Inbound::CustomParams { params } => assert_eq!(params.get("sonos_abc"), Some("{}")),
            other => panic!("expected customparams, got {:?}", other),
        }
        assert!(Inbound::parse(r#"{"type":"reboot"}"#).is_err());
        assert!(Inbound::parse("not json").is_err());
    }

    #[test]
    fn test_stdio_host_writes_lines() {
        let mut host = StdioHost::new(Vec::new());
        let mut drivers = Drivers::new();
        drivers.set(Driver::Volume, 25);

        host.report_driver("abc", drivers.value(Driver::Volume));
        host.add_notice("error", "nothing found");
        host.remove_notice("error");

        let output = String::from_utf8(host.into_inner()).unwrap();
        let lines: Vec<Value> = output.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            serde_json::json!({"type":"driver","address":"abc","driver":"SVOL","value":25,"uom":51})
        );
        assert_eq!(lines[1], serde_json::json!({"type":"notice","key":"error","text":"nothing found"}));
        assert_eq!(lines[2], serde_json::json!({"type":"removenotice","key":"error"}));
    }

    #[test]
    fn test_add_node_line() {
        let mut host = StdioHost::new(Vec::new());
        host.add_node(NodeInfo {
            address: "abc".to_string(),
            primary: "controller".to_string(),
            name: "Sonos Den".to_string(),
            node_def: "sonosspeaker".to_string(),
            drivers: Drivers::new().values(),
        });

        let output = String::from_utf8(host.into_inner()).unwrap();
        let line: Value = serde_json::from_str(output.trim()).unwrap();
        assert_eq!(line["type"], "addnode");
        assert_eq!(line["nodedef"], "sonosspeaker");
        assert_eq!(line["drivers"].as_array().map(Vec::len), Some(5));
    }
}
