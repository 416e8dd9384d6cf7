//! What the simulated platform exposes.

use scmi_core::protocol::protocol_id;

/// A device an agent can be granted or denied access to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub id: u32,
    /// Protocols whose commands touch this device. Denying the device denies
    /// these protocols to the agent.
    pub protocols: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetDomain {
    pub name: String,
    pub async_supported: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    /// The id of the agent the channel belongs to.
    pub agent_id: u32,
    /// Trusted agents may change permissions.
    pub trusted: bool,
    pub num_agents: u32,
    pub devices: Vec<Device>,
    pub reset_domains: Vec<ResetDomain>,
    pub warm_reset_supported: bool,
    pub suspend_supported: bool,
}

impl Default for Topology {
    fn default() -> Self {
        Self {
            agent_id: 1,
            trusted: true,
            num_agents: 2,
            devices: vec![Device {
                id: 0,
                protocols: vec![protocol_id::SENSOR],
            }],
            reset_domains: vec![
                ResetDomain {
                    name: "cpu0".to_string(),
                    async_supported: false,
                },
                ResetDomain {
                    name: "gpu".to_string(),
                    async_supported: true,
                },
            ],
            warm_reset_supported: true,
            suspend_supported: false,
        }
    }
}

impl Topology {
    pub fn device(&self, id: u32) -> Option<&Device> {
        self.devices.iter().find(|d| d.id == id)
    }

    pub fn reset_domain(&self, id: u32) -> Option<&ResetDomain> {
        self.reset_domains.get(id as usize)
    }
}

/// Optional commands of the base protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Features {
    pub device_permissions: bool,
    pub reset_agent_configuration: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            device_permissions: true,
            reset_agent_configuration: true,
        }
    }
}
