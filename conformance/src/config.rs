//! What the engine knows about the platform topology, loaded from JSON.
//!
//! ```json
//! {
//!   "agent_id": 1,
//!   "trusted_agent": true,
//!   "accessible_device": { "device_id": 0, "protocol_id": 21 },
//!   "reset_domains": [{ "async_supported": false }, { "async_supported": true }]
//! }
//! ```

use core::fmt;
use std::path::Path;

use facet::Facet;
use scmi_core::protocol::protocol_id;
use scmi_sim::Topology;

use crate::probe::{Capability, CapabilityProbe};

/// A device the agent can be denied, and a protocol that touches it.
#[derive(Debug, Clone, PartialEq, Eq, Facet)]
pub struct AccessibleDevice {
    pub device_id: u32,
    pub protocol_id: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Facet)]
pub struct ResetDomainInfo {
    pub async_supported: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Facet)]
pub struct PlatformInfo {
    pub agent_id: u32,
    pub trusted_agent: bool,
    pub accessible_device: Option<AccessibleDevice>,
    pub reset_domains: Vec<ResetDomainInfo>,
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "cannot read platform description: {e}"),
            Self::Parse(e) => write!(f, "invalid platform description: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Parse(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl PlatformInfo {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        facet_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn num_reset_domains(&self) -> u32 {
        self.reset_domains.len() as u32
    }
}

impl From<&Topology> for PlatformInfo {
    fn from(topology: &Topology) -> Self {
        Self {
            agent_id: topology.agent_id,
            trusted_agent: topology.trusted,
            accessible_device: topology.devices.iter().find_map(|d| {
                d.protocols.first().map(|&protocol_id| AccessibleDevice {
                    device_id: d.id,
                    protocol_id,
                })
            }),
            reset_domains: topology
                .reset_domains
                .iter()
                .map(|d| ResetDomainInfo {
                    async_supported: d.async_supported,
                })
                .collect(),
        }
    }
}

impl CapabilityProbe for PlatformInfo {
    fn is_present(&self, capability: &Capability) -> bool {
        match capability {
            Capability::TrustedAgent => self.trusted_agent,
            Capability::ResourceDomains {
                protocol_id: protocol_id::RESET,
            } => !self.reset_domains.is_empty(),
            Capability::ResourceDomains { .. } => false,
            Capability::AccessibleDevice => self.accessible_device.is_some(),
            // Resolved on the wire by the runner.
            Capability::Command { .. } => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json() {
        let info = PlatformInfo::from_json(
            r#"{
                "agent_id": 3,
                "trusted_agent": false,
                "accessible_device": null,
                "reset_domains": [{ "async_supported": true }]
            }"#,
        )
        .unwrap();
        assert_eq!(info.agent_id, 3);
        assert!(!info.is_present(&Capability::TrustedAgent));
        assert!(!info.is_present(&Capability::AccessibleDevice));
        assert!(info.is_present(&Capability::ResourceDomains {
            protocol_id: protocol_id::RESET
        }));
        assert!(!info.is_present(&Capability::ResourceDomains {
            protocol_id: protocol_id::CLOCK
        }));
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(
            PlatformInfo::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_from_topology() {
        let info = PlatformInfo::from(&Topology::default());
        assert_eq!(info.agent_id, 1);
        assert!(info.trusted_agent);
        assert_eq!(
            info.accessible_device,
            Some(AccessibleDevice {
                device_id: 0,
                protocol_id: protocol_id::SENSOR,
            })
        );
        assert_eq!(info.num_reset_domains(), 2);
        assert!(info.reset_domains[1].async_supported);
    }
}
