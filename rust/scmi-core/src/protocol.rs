//! Protocol identifiers, message identifiers and flag layouts.
//!
//! Only the command families exercised by the shipped test cases are listed
//! in full; the protocol id table is complete.

use bitflags::bitflags;

// =============================================================================
// Protocol identifiers
// =============================================================================

pub mod protocol_id {
    pub const BASE: u8 = 0x10;
    pub const POWER_DOMAIN: u8 = 0x11;
    pub const SYSTEM_POWER: u8 = 0x12;
    pub const PERFORMANCE: u8 = 0x13;
    pub const CLOCK: u8 = 0x14;
    pub const SENSOR: u8 = 0x15;
    pub const RESET: u8 = 0x16;
    pub const VOLTAGE: u8 = 0x17;
    pub const POWERCAP: u8 = 0x18;

    /// Short name for logs.
    pub fn name(id: u8) -> &'static str {
        match id {
            BASE => "base",
            POWER_DOMAIN => "power-domain",
            SYSTEM_POWER => "system-power",
            PERFORMANCE => "performance",
            CLOCK => "clock",
            SENSOR => "sensor",
            RESET => "reset",
            VOLTAGE => "voltage",
            POWERCAP => "powercap",
            _ => "unknown",
        }
    }
}

// =============================================================================
// Messages shared by every protocol
// =============================================================================

pub mod common {
    pub const PROTOCOL_VERSION: u8 = 0x0;
    pub const PROTOCOL_ATTRIBUTES: u8 = 0x1;
    /// Capability probe: takes a message id, answers NOT_FOUND when the
    /// message is not implemented.
    pub const PROTOCOL_MESSAGE_ATTRIBUTES: u8 = 0x2;
}

// =============================================================================
// Base protocol
// =============================================================================

pub mod base {
    pub use super::common::*;

    pub const DISCOVER_VENDOR: u8 = 0x3;
    pub const DISCOVER_SUB_VENDOR: u8 = 0x4;
    pub const DISCOVER_IMPLEMENTATION_VERSION: u8 = 0x5;
    pub const DISCOVER_LIST_PROTOCOLS: u8 = 0x6;
    pub const DISCOVER_AGENT: u8 = 0x7;
    pub const NOTIFY_ERRORS: u8 = 0x8;
    pub const SET_DEVICE_PERMISSIONS: u8 = 0x9;
    pub const SET_PROTOCOL_PERMISSIONS: u8 = 0xA;
    pub const RESET_AGENT_CONFIGURATION: u8 = 0xB;
}

// =============================================================================
// System power protocol
// =============================================================================

pub mod system_power {
    pub use super::common::*;

    pub const SYSTEM_POWER_STATE_SET: u8 = 0x3;
    pub const SYSTEM_POWER_STATE_GET: u8 = 0x4;
    pub const SYSTEM_POWER_STATE_NOTIFY: u8 = 0x5;

    /// STATE_SET message attributes: warm reset supported.
    pub const ATTR_WARM_RESET_BIT: u32 = 31;
    /// STATE_SET message attributes: system suspend supported.
    pub const ATTR_SUSPEND_BIT: u32 = 30;
}

// =============================================================================
// Reset protocol
// =============================================================================

pub mod reset {
    pub use super::common::*;

    pub const RESET_DOMAIN_ATTRIBUTES: u8 = 0x3;
    pub const RESET: u8 = 0x4;
    pub const RESET_NOTIFY: u8 = 0x5;

    /// Architectural cold reset: reset_state bit 31 clear, id 0.
    pub const ARCH_COLD_RESET: u32 = 0;
    /// Domain attributes: asynchronous reset supported.
    pub const DOMAIN_ATTR_ASYNC_BIT: u32 = 31;
    /// Domain attributes: reset notifications supported.
    pub const DOMAIN_ATTR_NOTIFY_BIT: u32 = 30;
}

bitflags! {
    /// Flags word of the RESET command. Bits 31:3 are reserved.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ResetFlags: u32 {
        const AUTONOMOUS = 1 << 0;
        const EXPLICIT_ASSERT = 1 << 1;
        const ASYNC = 1 << 2;
    }
}

bitflags! {
    /// Flags word of SET_DEVICE_PERMISSIONS. Clear means deny.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DevicePermissionFlags: u32 {
        const ALLOW = 1 << 0;
    }
}

bitflags! {
    /// Flags word of RESET_AGENT_CONFIGURATION.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ResetAgentFlags: u32 {
        /// Also restore the agent's access permissions to their defaults.
        const RESET_ACCESS = 1 << 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_flag_reserved_bits() {
        let invalid = 0xF0u32;
        assert!(ResetFlags::from_bits(invalid).is_none());
        assert_eq!(ResetFlags::all().bits(), 0b111);
    }

    #[test]
    fn test_protocol_names() {
        assert_eq!(protocol_id::name(protocol_id::RESET), "reset");
        assert_eq!(protocol_id::name(0x99), "unknown");
    }
}
