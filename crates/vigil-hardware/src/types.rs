//! Device descriptions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of a peripheral, logged when a worker takes ownership of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Name given by the board configuration, e.g. "Door Keypad".
    pub name: String,
    /// Part number of the module, e.g. "MFRC522".
    pub part: String,
}

impl DeviceInfo {
    pub fn new(name: impl Into<String>, part: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            part: part.into(),
        }
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.part)
    }
}
