//! A simulated SCMI platform.
//!
//! The conformance engine runs against it by default, in-process through the
//! [`Transport`](scmi_core::Transport) impl on [`SimulatedPlatform`], or out
//! of process through the `scmi-platform-sim` binary speaking length-prefixed
//! frames on stdin/stdout.

#![deny(unsafe_code)]

pub mod fault;
pub mod platform;
pub mod serve;
pub mod topology;

pub use fault::{Fault, FaultInjector};
pub use platform::{SimulatedPlatform, Stats};
pub use serve::serve;
pub use topology::{Device, Features, ResetDomain, Topology};
