//! The simulated platform: an in-process [`Transport`] that answers Base,
//! Reset, System Power and (version-only) Sensor commands the way conforming
//! firmware would, unless told otherwise by its [`FaultInjector`].

use std::collections::BTreeSet;

use scmi_core::protocol::{
    DevicePermissionFlags, ResetAgentFlags, ResetFlags, base, common, protocol_id, reset,
    system_power,
};
use scmi_core::transport::TokenCounter;
use scmi_core::{ChannelError, MessageHeader, MessageType, Response, StatusCode, Transport};
use tracing::{debug, trace};

use crate::fault::{Fault, FaultInjector};
use crate::topology::{Features, Topology};

/// Protocols this platform implements besides Base.
const PROTOCOLS: [u8; 3] = [
    protocol_id::SYSTEM_POWER,
    protocol_id::SENSOR,
    protocol_id::RESET,
];

const BASE_VERSION: u32 = 0x0002_0000;
const PROTOCOL_VERSION_1_0: u32 = 0x0001_0000;
const VENDOR: &str = "scmi-sim";

type Reply = (StatusCode, Vec<u32>);

fn status(status: StatusCode) -> Reply {
    (status, Vec::new())
}

fn success(values: Vec<u32>) -> Reply {
    (StatusCode::SUCCESS, values)
}

/// Pack an ASCII name into four null-padded words.
fn pack_name(name: &str) -> Vec<u32> {
    let mut bytes = [0u8; 16];
    for (dst, src) in bytes.iter_mut().zip(name.bytes().take(15)) {
        *dst = src;
    }
    bytes
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

/// Counters the tests use to check which commands reached the platform.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    /// Every command answered.
    pub commands: u32,
    /// Commands that changed platform state.
    pub mutating: u32,
}

pub struct SimulatedPlatform {
    topology: Topology,
    features: Features,
    faults: FaultInjector,
    denied: BTreeSet<u32>,
    tokens: TokenCounter,
    stats: Stats,
}

impl Default for SimulatedPlatform {
    fn default() -> Self {
        Self::new(Topology::default())
    }
}

impl SimulatedPlatform {
    pub fn new(topology: Topology) -> Self {
        Self {
            topology,
            features: Features::default(),
            faults: FaultInjector::new(),
            denied: BTreeSet::new(),
            tokens: TokenCounter::new(),
            stats: Stats::default(),
        }
    }

    pub fn with_features(mut self, features: Features) -> Self {
        self.features = features;
        self
    }

    pub fn with_fault(mut self, fault: Fault) -> Self {
        self.faults.inject(fault);
        self
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn features(&self) -> Features {
        self.features
    }

    pub fn faults(&self) -> &FaultInjector {
        &self.faults
    }

    pub fn faults_mut(&mut self) -> &mut FaultInjector {
        &mut self.faults
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    /// Devices currently denied to the agent.
    pub fn denied_devices(&self) -> Vec<u32> {
        self.denied.iter().copied().collect()
    }

    /// Answer one command. Never fails: every protocol condition is a status.
    pub fn handle(&mut self, header: MessageHeader, params: &[u32]) -> Response {
        self.stats.commands += 1;

        let (status, return_values) = if header.message_type == MessageType::Command {
            self.dispatch(header.protocol_id, header.message_id, params)
        } else {
            self::status(StatusCode::PROTOCOL_ERROR)
        };

        let mut response = Response {
            header,
            status,
            return_values,
        };
        self.faults.apply(&mut response);
        debug!(command = %header, status = %response.status, "handled command");
        response
    }

    fn dispatch(&mut self, protocol: u8, message: u8, params: &[u32]) -> Reply {
        if protocol != protocol_id::BASE && !PROTOCOLS.contains(&protocol) {
            return status(StatusCode::NOT_SUPPORTED);
        }
        if protocol != protocol_id::BASE && self.protocol_denied(protocol) {
            trace!(protocol, "protocol denied by device permissions");
            return status(StatusCode::DENIED);
        }

        match protocol {
            protocol_id::BASE => self.base(message, params),
            protocol_id::RESET => self.reset(message, params),
            protocol_id::SYSTEM_POWER => self.system_power(message, params),
            _ => self.sensor(message, params),
        }
    }

    fn protocol_denied(&self, protocol: u8) -> bool {
        self.denied.iter().any(|id| {
            self.topology
                .device(*id)
                .is_some_and(|d| d.protocols.contains(&protocol))
        })
    }

    fn message_attributes(
        &self,
        params: &[u32],
        implemented: &[u8],
        attributes: impl Fn(u8) -> u32,
    ) -> Reply {
        let Some(&message) = params.first() else {
            return status(StatusCode::PROTOCOL_ERROR);
        };
        match u8::try_from(message) {
            Ok(message) if implemented.contains(&message) => success(vec![attributes(message)]),
            _ => status(StatusCode::NOT_FOUND),
        }
    }

    // =========================================================================
    // Base
    // =========================================================================

    fn base_messages(&self) -> Vec<u8> {
        let mut messages = vec![
            base::PROTOCOL_VERSION,
            base::PROTOCOL_ATTRIBUTES,
            base::PROTOCOL_MESSAGE_ATTRIBUTES,
            base::DISCOVER_VENDOR,
        ];
        if self.features.device_permissions {
            messages.push(base::SET_DEVICE_PERMISSIONS);
        }
        if self.features.reset_agent_configuration {
            messages.push(base::RESET_AGENT_CONFIGURATION);
        }
        messages
    }

    fn base(&mut self, message: u8, params: &[u32]) -> Reply {
        let implemented = self.base_messages();
        if !implemented.contains(&message) {
            return status(StatusCode::NOT_SUPPORTED);
        }

        match message {
            base::PROTOCOL_VERSION => success(vec![BASE_VERSION]),
            base::PROTOCOL_ATTRIBUTES => success(vec![
                (self.topology.num_agents & 0xFF) << 8 | PROTOCOLS.len() as u32,
            ]),
            base::PROTOCOL_MESSAGE_ATTRIBUTES => self.message_attributes(params, &implemented, |_| 0),
            base::DISCOVER_VENDOR => success(pack_name(VENDOR)),
            base::SET_DEVICE_PERMISSIONS => self.set_device_permissions(params),
            _ => self.reset_agent_configuration(params),
        }
    }

    fn check_agent(&self, agent_id: u32) -> Result<(), StatusCode> {
        if !self.topology.trusted {
            return Err(StatusCode::DENIED);
        }
        if agent_id != self.topology.agent_id {
            return Err(StatusCode::NOT_FOUND);
        }
        Ok(())
    }

    fn set_device_permissions(&mut self, params: &[u32]) -> Reply {
        let &[agent_id, device_id, flags] = params else {
            return status(StatusCode::PROTOCOL_ERROR);
        };
        if let Err(e) = self.check_agent(agent_id) {
            return status(e);
        }
        if self.topology.device(device_id).is_none() {
            return status(StatusCode::NOT_FOUND);
        }
        let Some(flags) = DevicePermissionFlags::from_bits(flags) else {
            return status(StatusCode::INVALID_PARAMETERS);
        };

        self.stats.mutating += 1;
        if flags.contains(DevicePermissionFlags::ALLOW) {
            self.denied.remove(&device_id);
        } else if !self.faults.ignores_deny() {
            self.denied.insert(device_id);
        }
        debug!(device_id, allow = flags.contains(DevicePermissionFlags::ALLOW), "device permissions changed");
        success(Vec::new())
    }

    fn reset_agent_configuration(&mut self, params: &[u32]) -> Reply {
        let &[agent_id, flags] = params else {
            return status(StatusCode::PROTOCOL_ERROR);
        };
        if let Err(e) = self.check_agent(agent_id) {
            return status(e);
        }
        let Some(flags) = ResetAgentFlags::from_bits(flags) else {
            return status(StatusCode::INVALID_PARAMETERS);
        };

        self.stats.mutating += 1;
        if flags.contains(ResetAgentFlags::RESET_ACCESS) {
            self.denied.clear();
        }
        debug!(agent_id, ?flags, "agent configuration reset");
        success(Vec::new())
    }

    // =========================================================================
    // Reset
    // =========================================================================

    fn reset(&mut self, message: u8, params: &[u32]) -> Reply {
        const IMPLEMENTED: [u8; 5] = [
            reset::PROTOCOL_VERSION,
            reset::PROTOCOL_ATTRIBUTES,
            reset::PROTOCOL_MESSAGE_ATTRIBUTES,
            reset::RESET_DOMAIN_ATTRIBUTES,
            reset::RESET,
        ];

        match message {
            reset::PROTOCOL_VERSION => success(vec![PROTOCOL_VERSION_1_0]),
            reset::PROTOCOL_ATTRIBUTES => {
                success(vec![self.topology.reset_domains.len() as u32 & 0xFFFF])
            }
            reset::PROTOCOL_MESSAGE_ATTRIBUTES => self.message_attributes(params, &IMPLEMENTED, |_| 0),
            reset::RESET_DOMAIN_ATTRIBUTES => self.reset_domain_attributes(params),
            reset::RESET => self.reset_domain(params),
            _ => status(StatusCode::NOT_SUPPORTED),
        }
    }

    fn reset_domain_attributes(&self, params: &[u32]) -> Reply {
        let Some(&domain_id) = params.first() else {
            return status(StatusCode::PROTOCOL_ERROR);
        };
        let Some(domain) = self.topology.reset_domain(domain_id) else {
            return status(StatusCode::NOT_FOUND);
        };

        let attributes = (domain.async_supported as u32) << reset::DOMAIN_ATTR_ASYNC_BIT;
        let mut values = vec![attributes, 0x7FFF_FFFF];
        values.extend(pack_name(&domain.name));
        success(values)
    }

    fn reset_domain(&mut self, params: &[u32]) -> Reply {
        let &[domain_id, flags, reset_state] = params else {
            return status(StatusCode::PROTOCOL_ERROR);
        };
        let Some(domain) = self.topology.reset_domain(domain_id) else {
            return status(StatusCode::NOT_FOUND);
        };
        let Some(flags) = ResetFlags::from_bits(flags) else {
            return status(StatusCode::INVALID_PARAMETERS);
        };
        if flags.contains(ResetFlags::ASYNC) && !domain.async_supported {
            return status(StatusCode::NOT_SUPPORTED);
        }
        // Only the architectural cold reset is defined in the architectural range.
        if reset_state >> 31 == 0 && reset_state != reset::ARCH_COLD_RESET {
            return status(StatusCode::INVALID_PARAMETERS);
        }

        self.stats.mutating += 1;
        debug!(domain_id, ?flags, "domain reset");
        success(Vec::new())
    }

    // =========================================================================
    // System power
    // =========================================================================

    fn system_power(&mut self, message: u8, params: &[u32]) -> Reply {
        const IMPLEMENTED: [u8; 6] = [
            system_power::PROTOCOL_VERSION,
            system_power::PROTOCOL_ATTRIBUTES,
            system_power::PROTOCOL_MESSAGE_ATTRIBUTES,
            system_power::SYSTEM_POWER_STATE_SET,
            system_power::SYSTEM_POWER_STATE_GET,
            system_power::SYSTEM_POWER_STATE_NOTIFY,
        ];

        let warm = self.topology.warm_reset_supported as u32;
        let suspend = self.topology.suspend_supported as u32;

        match message {
            system_power::PROTOCOL_VERSION => success(vec![PROTOCOL_VERSION_1_0]),
            system_power::PROTOCOL_ATTRIBUTES => success(vec![0]),
            system_power::PROTOCOL_MESSAGE_ATTRIBUTES => {
                self.message_attributes(params, &IMPLEMENTED, |m| {
                    if m == system_power::SYSTEM_POWER_STATE_SET {
                        warm << system_power::ATTR_WARM_RESET_BIT
                            | suspend << system_power::ATTR_SUSPEND_BIT
                    } else {
                        0
                    }
                })
            }
            system_power::SYSTEM_POWER_STATE_SET => {
                self.stats.mutating += 1;
                success(Vec::new())
            }
            system_power::SYSTEM_POWER_STATE_GET => success(vec![0]),
            system_power::SYSTEM_POWER_STATE_NOTIFY => success(Vec::new()),
            _ => status(StatusCode::NOT_SUPPORTED),
        }
    }

    // =========================================================================
    // Sensor (discovery only)
    // =========================================================================

    fn sensor(&mut self, message: u8, params: &[u32]) -> Reply {
        const IMPLEMENTED: [u8; 3] = [
            common::PROTOCOL_VERSION,
            common::PROTOCOL_ATTRIBUTES,
            common::PROTOCOL_MESSAGE_ATTRIBUTES,
        ];

        match message {
            common::PROTOCOL_VERSION => success(vec![PROTOCOL_VERSION_1_0]),
            common::PROTOCOL_ATTRIBUTES => success(vec![0]),
            common::PROTOCOL_MESSAGE_ATTRIBUTES => self.message_attributes(params, &IMPLEMENTED, |_| 0),
            _ => status(StatusCode::NOT_SUPPORTED),
        }
    }
}

impl Transport for SimulatedPlatform {
    fn send(&mut self, header: MessageHeader, params: &[u32]) -> Result<Response, ChannelError> {
        if self.faults.channel_down(self.stats.commands) {
            return Err(ChannelError::Closed);
        }
        let header = header.with_token(self.tokens.next_token());
        Ok(self.handle(header, params))
    }
}
