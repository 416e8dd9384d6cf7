//! Fault injection for the simulated platform.
//!
//! Faults are applied after the platform has computed its honest reply, so
//! the conformance engine sees exactly one deliberate deviation at a time.

use scmi_core::{Response, StatusCode};

/// A deliberate non-conformance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// OR `mask` into the first return value of one message.
    ReservedBits {
        protocol_id: u8,
        message_id: u8,
        mask: u32,
    },
    /// Answer one message with the next message id.
    WrongMessageId { protocol_id: u8, message_id: u8 },
    /// Replace the status of one message.
    Status {
        protocol_id: u8,
        message_id: u8,
        status: StatusCode,
    },
    /// Acknowledge a deny in SET_DEVICE_PERMISSIONS without enforcing it.
    IgnoreDeny,
    /// The channel closes once this many commands have been answered.
    ChannelDownAfter(u32),
}

/// Holds the active faults.
#[derive(Debug, Default, Clone)]
pub struct FaultInjector {
    faults: Vec<Fault>,
}

impl FaultInjector {
    /// No faults.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inject(&mut self, fault: Fault) {
        self.faults.push(fault);
    }

    pub fn clear(&mut self) {
        self.faults.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.faults.is_empty()
    }

    /// Should the channel refuse the next command?
    pub fn channel_down(&self, answered: u32) -> bool {
        self.faults
            .iter()
            .any(|f| matches!(f, Fault::ChannelDownAfter(limit) if answered >= *limit))
    }

    pub fn ignores_deny(&self) -> bool {
        self.faults.contains(&Fault::IgnoreDeny)
    }

    /// Corrupt `response` according to the faults targeting its message.
    pub fn apply(&self, response: &mut Response) {
        let (protocol, message) = (response.header.protocol_id, response.header.message_id);
        for fault in &self.faults {
            match *fault {
                Fault::ReservedBits {
                    protocol_id,
                    message_id,
                    mask,
                } if protocol_id == protocol && message_id == message => {
                    if let Some(first) = response.return_values.first_mut() {
                        *first |= mask;
                    }
                }
                Fault::WrongMessageId {
                    protocol_id,
                    message_id,
                } if protocol_id == protocol && message_id == message => {
                    response.header.message_id = message_id.wrapping_add(1);
                }
                Fault::Status {
                    protocol_id,
                    message_id,
                    status,
                } if protocol_id == protocol && message_id == message => {
                    response.status = status;
                }
                _ => {}
            }
        }
    }
}
