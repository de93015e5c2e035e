//! The seam between the node server and the host it runs inside
//!
//! The host owns node registration, driver display and user notices. The
//! node server only ever talks to it through [`Host`], so it can be driven
//! by the stdio harness, an embedding application, or [`MemoryHost`] in tests.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::driver::{Driver, DriverValue};

/// A node as registered with the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeInfo {
    pub address: String,
    /// Address of the controller node that owns this node
    pub primary: String,
    pub name: String,
    #[serde(rename = "nodedef")]
    pub node_def: String,
    pub drivers: Vec<DriverValue>,
}

/// Operations the node server needs from its host
pub trait Host {
    /// Register a node
    fn add_node(&mut self, node: NodeInfo);

    /// Publish the current value of one driver
    fn report_driver(&mut self, address: &str, value: DriverValue);

    /// Show a persistent notice to the user, replacing any notice with the same key
    fn add_notice(&mut self, key: &str, text: &str);

    fn remove_notice(&mut self, key: &str);
}

/// A driver report captured by [`MemoryHost`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverReport {
    pub address: String,
    pub driver: Driver,
    pub value: i32,
}

/// In-memory host that records everything it is told
#[derive(Debug, Clone, Default)]
pub struct MemoryHost {
    pub nodes: Vec<NodeInfo>,
    pub reports: Vec<DriverReport>,
    pub notices: BTreeMap<String, String>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, address: &str) -> Option<&NodeInfo> {
        self.nodes.iter().find(|n| n.address == address)
    }

    /// Most recent value reported for `driver` on `address`
    pub fn last_report(&self, address: &str, driver: Driver) -> Option<i32> {
        self.reports
            .iter()
            .rev()
            .find(|r| r.address == address && r.driver == driver)
            .map(|r| r.value)
    }

    pub fn reports_for(&self, address: &str) -> Vec<&DriverReport> {
        self.reports.iter().filter(|r| r.address == address).collect()
    }
}

impl Host for MemoryHost {
    fn add_node(&mut self, node: NodeInfo) {
        self.nodes.push(node);
    }

    fn report_driver(&mut self, address: &str, value: DriverValue) {
        self.reports.push(DriverReport {
            address: address.to_string(),
            driver: value.driver,
            value: value.value,
        });
    }

    fn add_notice(&mut self, key: &str, text: &str) {
        self.notices.insert(key.to_string(), text.to_string());
    }

    fn remove_notice(&mut self, key: &str) {
        self.notices.remove(key);
    }
}
