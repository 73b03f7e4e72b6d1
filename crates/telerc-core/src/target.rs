//! The device currently selected for connection and control.

use serde::{Deserialize, Serialize};

/// A television endpoint handed to the engine by the device-selection
/// surface.
///
/// Immutable value: replacing the target always replaces the whole
/// record. The engine never owns the catalog of known devices — only
/// the one currently targeted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetDevice {
    /// Network endpoint identity (IP or host name).
    pub address: String,

    /// Display name, when known.
    pub name: Option<String>,

    /// Hardware (MAC) address, used only for Wake-on-LAN.
    pub hardware_address: Option<String>,
}

impl TargetDevice {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: None,
            hardware_address: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_hardware_address(mut self, mac: impl Into<String>) -> Self {
        self.hardware_address = Some(mac.into());
        self
    }

    /// Display name, falling back to a generic label.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("TV")
    }
}

impl std::fmt::Display for TargetDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.display_name(), self.address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_and_display() {
        let tv = TargetDevice::new("10.0.0.5")
            .with_name("Living Room")
            .with_hardware_address("AA:BB:CC:DD:EE:FF");
        assert_eq!(tv.display_name(), "Living Room");
        assert_eq!(tv.to_string(), "Living Room (10.0.0.5)");
    }

    #[test]
    fn display_falls_back_without_name() {
        let tv = TargetDevice::new("10.0.0.5");
        assert_eq!(tv.to_string(), "TV (10.0.0.5)");
    }
}
