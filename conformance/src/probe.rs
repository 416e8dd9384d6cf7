//! Prerequisites a case can declare.

use core::fmt;

use scmi_core::protocol::protocol_id;

/// Something a case needs from the platform before it may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// The agent owning the channel may change permissions.
    TrustedAgent,
    /// The protocol exposes at least one resource domain.
    ResourceDomains { protocol_id: u8 },
    /// A device the agent can be denied and granted again.
    AccessibleDevice,
    /// The platform implements this command. Resolved on the wire with
    /// PROTOCOL_MESSAGE_ATTRIBUTES, not by the probe.
    Command { protocol_id: u8, message_id: u8 },
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TrustedAgent => write!(f, "trusted agent"),
            Self::ResourceDomains { protocol_id: id } => {
                write!(f, "{} domains", protocol_id::name(*id))
            }
            Self::AccessibleDevice => write!(f, "accessible device"),
            Self::Command {
                protocol_id: id,
                message_id,
            } => write!(f, "{} message {message_id:#x}", protocol_id::name(*id)),
        }
    }
}

/// Answers topology questions. Must not touch the platform.
pub trait CapabilityProbe {
    fn is_present(&self, capability: &Capability) -> bool;
}

impl<T: CapabilityProbe + ?Sized> CapabilityProbe for &T {
    fn is_present(&self, capability: &Capability) -> bool {
        (**self).is_present(capability)
    }
}
