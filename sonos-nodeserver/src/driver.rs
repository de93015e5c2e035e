//! Driver codes and the per-node driver table

use serde::Serialize;

/// Host-visible state values of a speaker node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Driver {
    /// `GV1`, -10..10
    Bass,
    /// `GV2`, -10..10
    Treble,
    /// `SVOL`, 0..100
    Volume,
    /// `ST`, see [`crate::transport::TransportState`]
    Status,
    /// `GV3`, 0/1
    Mute,
}

impl Driver {
    /// Every driver, in the order the node definition declares them
    pub const ALL: [Driver; 5] = [Driver::Bass, Driver::Treble, Driver::Volume, Driver::Status, Driver::Mute];

    pub fn code(&self) -> &'static str {
        match self {
            Driver::Bass => "GV1",
            Driver::Treble => "GV2",
            Driver::Volume => "SVOL",
            Driver::Status => "ST",
            Driver::Mute => "GV3",
        }
    }

    /// Unit-of-measure tag
    pub fn uom(&self) -> u16 {
        match self {
            Driver::Bass | Driver::Treble => 56,
            Driver::Volume => 51,
            Driver::Status => 25,
            Driver::Mute => 2,
        }
    }

    pub fn from_code(code: &str) -> Option<Driver> {
        Driver::ALL.into_iter().find(|d| d.code().eq_ignore_ascii_case(code))
    }
}

/// One driver value as sent to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DriverValue {
    #[serde(serialize_with = "serialize_code")]
    pub driver: Driver,
    pub value: i32,
    pub uom: u16,
}

fn serialize_code<S: serde::Serializer>(driver: &Driver, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(driver.code())
}

/// Current driver values of one node, all starting at 0
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Drivers {
    values: [i32; 5],
}

impl Drivers {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(driver: Driver) -> usize {
        driver as usize
    }

    pub fn get(&self, driver: Driver) -> i32 {
        self.values[Self::slot(driver)]
    }

    /// Store a value, returning whether it differs from the previous one
    pub fn set(&mut self, driver: Driver, value: i32) -> bool {
        let slot = &mut self.values[Self::slot(driver)];
        let changed = *slot != value;
        *slot = value;
        changed
    }

    pub fn value(&self, driver: Driver) -> DriverValue {
        DriverValue { driver, value: self.get(driver), uom: driver.uom() }
    }

    pub fn values(&self) -> Vec<DriverValue> {
        Driver::ALL.into_iter().map(|d| self.value(d)).collect()
    }
}
