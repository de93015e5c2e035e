//! The controller node
//!
//! Owns discovery and every speaker node. The embedding harness calls the
//! `on_*` methods; each runs to completion on the caller's thread.

use std::collections::BTreeMap;

use tracing::{error, info, warn};

use crate::command::{CommandCode, CommandPayload};
use crate::config::CustomParams;
use crate::device::{DeviceConnector, SpeakerDiscovery};
use crate::error::{NodeServerError, Result};
use crate::host::{Host, NodeInfo};
use crate::poll::PollKind;
use crate::speaker::Speaker;

pub const CONTROLLER_ADDRESS: &str = "controller";
pub const CONTROLLER_NAME: &str = "Sonos Controller";
pub const CONTROLLER_NODE_DEF: &str = "controller";

/// Notice key used when discovery finds nothing
pub const DISCOVERY_NOTICE: &str = "error";
pub const NO_SPEAKERS_NOTICE: &str = "No speakers found. Make sure they are powered on and try Discover again.";

pub struct Controller {
    params: CustomParams,
    speakers: BTreeMap<String, Speaker>,
    discovery: Box<dyn SpeakerDiscovery>,
    connector: Box<dyn DeviceConnector>,
    discovering: bool,
}

impl Controller {
    pub fn new(discovery: Box<dyn SpeakerDiscovery>, connector: Box<dyn DeviceConnector>) -> Self {
        Self {
            params: CustomParams::new(),
            speakers: BTreeMap::new(),
            discovery,
            connector,
            discovering: false,
        }
    }

    pub fn node_info(&self) -> NodeInfo {
        NodeInfo {
            address: CONTROLLER_ADDRESS.to_string(),
            primary: CONTROLLER_ADDRESS.to_string(),
            name: CONTROLLER_NAME.to_string(),
            node_def: CONTROLLER_NODE_DEF.to_string(),
            drivers: Vec::new(),
        }
    }

    /// Register the controller node and run the first discovery pass
    pub fn start(&mut self, host: &mut dyn Host) {
        info!("Starting Sonos NodeServer version {}", env!("CARGO_PKG_VERSION"));
        host.add_node(self.node_info());
        self.discover(host);
    }

    pub fn params(&self) -> &CustomParams {
        &self.params
    }

    /// Replace the custom parameters; they apply from the next discovery
    pub fn on_custom_params(&mut self, params: CustomParams) {
        info!(count = params.len(), "Custom parameters updated");
        self.params = params;
    }

    pub fn speaker(&self, address: &str) -> Option<&Speaker> {
        self.speakers.get(address)
    }

    pub fn speaker_addresses(&self) -> impl Iterator<Item = &str> {
        self.speakers.keys().map(String::as_str)
    }

    pub fn is_discovering(&self) -> bool {
        self.discovering
    }

    /// Find speakers on the network and in the custom parameters
    ///
    /// Addresses that already have a node are left alone, so running this
    /// repeatedly is safe.
    pub fn discover(&mut self, host: &mut dyn Host) {
        info!("Starting Speaker Discovery...");
        self.discovering = true;
        host.remove_notice(DISCOVERY_NOTICE);

        let networks = self.params.networks_to_scan();
        let found = self.discovery.discover(networks.as_deref());

        if found.is_empty() {
            info!("No Speakers found. Are they powered on?");
            host.add_notice(DISCOVERY_NOTICE, NO_SPEAKERS_NOTICE);
        } else {
            info!("Found {} Speaker(s)", found.len());
            for speaker in found {
                let address = speaker.address();
                if address.is_empty() {
                    warn!(uid = %speaker.uid, "Speaker id too short to derive an address, skipping");
                    continue;
                }
                self.add_speaker(host, &address, &speaker.name, &speaker.ip);
            }
        }

        info!("Adding speakers from custom parameters");
        for entry in self.params.manual_speakers() {
            match entry {
                Ok(manual) => self.add_speaker(host, &manual.address, &manual.name, &manual.host),
                Err(e) => error!(error = %e, "Skipping manual speaker"),
            }
        }

        self.discovering = false;
    }

    fn add_speaker(&mut self, host: &mut dyn Host, address: &str, name: &str, ip: &str) {
        if address == CONTROLLER_ADDRESS || self.speakers.contains_key(address) {
            info!("Speaker {} already configured.", name);
            return;
        }

        match Speaker::new(&*self.connector, CONTROLLER_ADDRESS, address, name, ip) {
            Ok(mut speaker) => {
                host.add_node(speaker.node_info());
                speaker.start(host);
                self.speakers.insert(address.to_string(), speaker);
            }
            Err(e) => error!(address = %address, host = %ip, error = %e, "Unable to add speaker {}", name),
        }
    }

    /// Deliver a poll tick to every speaker
    pub fn on_poll(&mut self, kind: PollKind, host: &mut dyn Host) {
        if self.discovering {
            return;
        }
        for speaker in self.speakers.values_mut() {
            speaker.update(kind, host);
        }
    }

    /// Route a command to the controller or to the addressed speaker
    pub fn on_command(
        &mut self,
        address: &str,
        code: CommandCode,
        payload: &CommandPayload,
        host: &mut dyn Host,
    ) -> Result<()> {
        if address == CONTROLLER_ADDRESS {
            return match code {
                CommandCode::Discover => {
                    self.discover(host);
                    Ok(())
                }
                CommandCode::Query => {
                    for speaker in self.speakers.values_mut() {
                        speaker.query(host);
                    }
                    Ok(())
                }
                _ => Err(NodeServerError::UnknownCommand {
                    address: address.to_string(),
                    command: code.to_string(),
                }),
            };
        }

        self.speakers
            .get_mut(address)
            .ok_or_else(|| NodeServerError::UnknownNode(address.to_string()))?
            .on_command(code, payload, host)
    }

    /// Like [`Controller::on_command`] but with the raw command text
    pub fn on_raw_command(
        &mut self,
        address: &str,
        command: &str,
        payload: &CommandPayload,
        host: &mut dyn Host,
    ) -> Result<()> {
        let code = command.parse::<CommandCode>().map_err(|command| NodeServerError::UnknownCommand {
            address: address.to_string(),
            command,
        })?;
        self.on_command(address, code, payload, host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DiscoveredSpeaker, SpeakerDevice};
    use crate::driver::Driver;
    use crate::host::MemoryHost;
    use sonos_api::ApiError;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct StaticDevice {
        volume: i32,
    }

    impl SpeakerDevice for StaticDevice {
        fn volume(&self) -> Result<i32> {
            Ok(self.volume)
        }
        fn set_volume(&self, _: i32) -> Result<()> {
            Ok(())
        }
        fn bass(&self) -> Result<i32> {
            Ok(1)
        }
        fn set_bass(&self, _: i32) -> Result<()> {
            Ok(())
        }
        fn treble(&self) -> Result<i32> {
            Ok(-1)
        }
        fn set_treble(&self, _: i32) -> Result<()> {
            Ok(())
        }
        fn mute(&self) -> Result<bool> {
            Ok(false)
        }
        fn set_mute(&self, _: bool) -> Result<()> {
            Ok(())
        }
        fn transport_state(&self) -> Result<String> {
            Ok("PLAYING".to_string())
        }
        fn play(&self) -> Result<()> {
            Ok(())
        }
        fn stop(&self) -> Result<()> {
            Ok(())
        }
        fn pause(&self) -> Result<()> {
            Ok(())
        }
        fn next(&self) -> Result<()> {
            Ok(())
        }
        fn previous(&self) -> Result<()> {
            Ok(())
        }
        fn partymode(&self) -> Result<()> {
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct Connector {
        offline: Rc<RefCell<Vec<String>>>,
        connected: Rc<RefCell<Vec<String>>>,
    }

    impl DeviceConnector for Connector {
        fn connect(&self, ip: &str) -> Result<Box<dyn SpeakerDevice>> {
            self.connected.borrow_mut().push(ip.to_string());
            if self.offline.borrow().iter().any(|o| o == ip) {
                return Err(ApiError::ConnectionError(format!("{} unreachable", ip)).into());
            }
            Ok(Box::new(StaticDevice { volume: 20 }))
        }
    }

    #[derive(Clone, Default)]
    struct Discovery {
        speakers: Rc<RefCell<Vec<DiscoveredSpeaker>>>,
        requests: Rc<RefCell<Vec<Option<Vec<String>>>>>,
    }

    impl SpeakerDiscovery for Discovery {
        fn discover(&self, networks_to_scan: Option<&[String]>) -> Vec<DiscoveredSpeaker> {
            self.requests.borrow_mut().push(networks_to_scan.map(<[String]>::to_vec));
            self.speakers.borrow().clone()
        }
    }

    fn found(uid: &str, name: &str, ip: &str) -> DiscoveredSpeaker {
        DiscoveredSpeaker { uid: uid.to_string(), name: name.to_string(), ip: ip.to_string() }
    }

    fn controller() -> (Controller, Discovery, Connector) {
        let discovery = Discovery::default();
        let connector = Connector::default();
        let controller = Controller::new(Box::new(discovery.clone()), Box::new(connector.clone()));
        (controller, discovery, connector)
    }

    #[test]
    fn test_start_registers_controller_then_speakers() {
        let (mut controller, discovery, _) = controller();
        discovery.speakers.borrow_mut().push(found("RINCON_000E58A0123401400", "Den", "10.0.0.2"));
        let mut host = MemoryHost::new();

        controller.start(&mut host);

        assert_eq!(host.nodes[0].address, CONTROLLER_ADDRESS);
        let node = host.node("00e58a01234014").unwrap();
        assert_eq!(node.name, "Sonos Den");
        assert_eq!(node.primary, CONTROLLER_ADDRESS);
        // start() refreshed the drivers right away
        assert_eq!(host.last_report("00e58a01234014", Driver::Volume), Some(20));
        assert!(host.notices.is_empty());
    }

    #[test]
    fn test_discover_twice_registers_once() {
        let (mut controller, discovery, _) = controller();
        discovery.speakers.borrow_mut().push(found("RINCON_000E58A0123401400", "Den", "10.0.0.2"));
        let mut host = MemoryHost::new();

        controller.discover(&mut host);
        controller.discover(&mut host);

        assert_eq!(host.nodes.len(), 1);
        assert_eq!(controller.speaker_addresses().count(), 1);
    }

    #[test]
    fn test_no_speakers_sets_notice_and_next_run_clears_it() {
        let (mut controller, discovery, _) = controller();
        let mut host = MemoryHost::new();

        controller.discover(&mut host);
        assert_eq!(host.notices.get(DISCOVERY_NOTICE).map(String::as_str), Some(NO_SPEAKERS_NOTICE));

        discovery.speakers.borrow_mut().push(found("RINCON_000E58A0123401400", "Den", "10.0.0.2"));
        controller.discover(&mut host);
        assert!(host.notices.is_empty());
    }

    #[test]
    fn test_networks_to_scan_passed_to_discovery() {
        let (mut controller, discovery, _) = controller();
        let mut params = CustomParams::new();
        params.insert("networks_to_scan", "192.168.2.0/24,192.168.3.0/24");
        controller.on_custom_params(params);
        let mut host = MemoryHost::new();

        controller.discover(&mut host);
        controller.on_custom_params(CustomParams::new());
        controller.discover(&mut host);

        let requests = discovery.requests.borrow();
        assert_eq!(
            requests[0],
            Some(vec!["192.168.2.0/24".to_string(), "192.168.3.0/24".to_string()])
        );
        assert_eq!(requests[1], None);
    }

    #[test]
    fn test_manual_speakers_added_and_bad_entries_skipped() {
        let (mut controller, _, connector) = controller();
        let mut params = CustomParams::new();
        params.insert("sonos_aaa", r#"{"name":"Broken"}"#);
        params.insert("sonos_abcdef1234567890", r#"{"name":"Kitchen","host":"10.0.0.5"}"#);
        params.insert("sonos_zzz", "not json");
        controller.on_custom_params(params);
        let mut host = MemoryHost::new();

        controller.discover(&mut host);

        let speaker = controller.speaker("abcdef1234567890").unwrap();
        assert_eq!(speaker.ip(), "10.0.0.5");
        assert_eq!(speaker.display_name(), "Sonos Kitchen");
        assert_eq!(controller.speaker_addresses().count(), 1);
        assert_eq!(*connector.connected.borrow(), vec!["10.0.0.5".to_string()]);
        // network discovery found nothing, manual entries do not clear the notice
        assert!(host.notices.contains_key(DISCOVERY_NOTICE));
    }

    #[test]
    fn test_manual_speaker_matching_discovered_address_is_not_duplicated() {
        let (mut controller, discovery, _) = controller();
        discovery.speakers.borrow_mut().push(found("RINCON_000E58A0123401400", "Den", "10.0.0.2"));
        let mut params = CustomParams::new();
        params.insert("sonos_00E58A01234014", r#"{"name":"Den","host":"10.0.0.2"}"#);
        controller.on_custom_params(params);
        let mut host = MemoryHost::new();

        controller.discover(&mut host);

        assert_eq!(host.nodes.len(), 1);
    }

    #[test]
    fn test_manual_speaker_at_controller_address_is_skipped() {
        let (mut controller, _, _) = controller();
        let mut params = CustomParams::new();
        params.insert("sonos_controller", r#"{"name":"X","host":"10.0.0.9"}"#);
        controller.on_custom_params(params);
        let mut host = MemoryHost::new();

        controller.start(&mut host);

        assert_eq!(host.nodes.iter().filter(|n| n.address == CONTROLLER_ADDRESS).count(), 1);
        assert!(controller.speaker(CONTROLLER_ADDRESS).is_none());
        assert!(controller
            .on_command(CONTROLLER_ADDRESS, CommandCode::Discover, &CommandPayload::new(), &mut host)
            .is_ok());
    }

    #[test]
    fn test_unreachable_speaker_is_skipped() {
        let (mut controller, discovery, connector) = controller();
        discovery.speakers.borrow_mut().extend([
            found("RINCON_000E58A0123401400", "Den", "10.0.0.2"),
            found("RINCON_5CAAFD0A251E01400", "Kitchen", "10.0.0.3"),
        ]);
        connector.offline.borrow_mut().push("10.0.0.2".to_string());
        let mut host = MemoryHost::new();

        controller.discover(&mut host);

        let addresses: Vec<_> = controller.speaker_addresses().collect();
        assert_eq!(addresses, vec!["caafd0a251e014"]);

        // back online: the next discovery picks it up
        connector.offline.borrow_mut().clear();
        controller.discover(&mut host);
        assert_eq!(controller.speaker_addresses().count(), 2);
    }

    #[test]
    fn test_command_routing() {
        let (mut controller, discovery, _) = controller();
        discovery.speakers.borrow_mut().push(found("RINCON_000E58A0123401400", "Den", "10.0.0.2"));
        let mut host = MemoryHost::new();
        controller.start(&mut host);

        let payload = CommandPayload::with_value("5");
        controller.on_command("00e58a01234014", CommandCode::Bass, &payload, &mut host).unwrap();
        assert_eq!(controller.speaker("00e58a01234014").unwrap().drivers().get(Driver::Bass), 5);

        assert!(matches!(
            controller.on_command("nope", CommandCode::Play, &CommandPayload::new(), &mut host),
            Err(NodeServerError::UnknownNode(_))
        ));
        assert!(matches!(
            controller.on_command(CONTROLLER_ADDRESS, CommandCode::Play, &CommandPayload::new(), &mut host),
            Err(NodeServerError::UnknownCommand { .. })
        ));
        assert!(matches!(
            controller.on_raw_command("00e58a01234014", "REWIND", &CommandPayload::new(), &mut host),
            Err(NodeServerError::UnknownCommand { .. })
        ));

        discovery.speakers.borrow_mut().push(found("RINCON_5CAAFD0A251E01400", "Kitchen", "10.0.0.3"));
        controller.on_raw_command(CONTROLLER_ADDRESS, "DISCOVER", &CommandPayload::new(), &mut host).unwrap();
        assert_eq!(controller.speaker_addresses().count(), 2);
    }

    #[test]
    fn test_controller_query_reports_all_speakers() {
        let (mut controller, discovery, _) = controller();
        discovery.speakers.borrow_mut().extend([
            found("RINCON_000E58A0123401400", "Den", "10.0.0.2"),
            found("RINCON_5CAAFD0A251E01400", "Kitchen", "10.0.0.3"),
        ]);
        let mut host = MemoryHost::new();
        controller.discover(&mut host);
        host.reports.clear();

        controller.on_command(CONTROLLER_ADDRESS, CommandCode::Query, &CommandPayload::new(), &mut host).unwrap();

        assert_eq!(host.reports.len(), 2 * Driver::ALL.len());
    }

    #[test]
    fn test_poll_reaches_speakers_unless_discovering() {
        let (mut controller, discovery, _) = controller();
        discovery.speakers.borrow_mut().push(found("RINCON_000E58A0123401400", "Den", "10.0.0.2"));
        let mut host = MemoryHost::new();
        controller.discover(&mut host);
        assert!(!controller.is_discovering());

        host.reports.clear();
        controller.on_poll(PollKind::ShortPoll, &mut host);
        // values did not change since discovery refreshed them
        assert!(host.reports.is_empty());

        controller.discovering = true;
        controller.on_command("00e58a01234014", CommandCode::Mute, &CommandPayload::new(), &mut host).unwrap();
        host.reports.clear();
        controller.on_poll(PollKind::ShortPoll, &mut host);
        assert!(host.reports.is_empty());

        controller.discovering = false;
        controller.on_poll(PollKind::ShortPoll, &mut host);
        // device still says unmuted, so the poll puts GV3 back to 0
        assert_eq!(host.last_report("00e58a01234014", Driver::Mute), Some(0));
    }
}
