//! SCMI conformance test engine.
//!
//! Each test case builds a command, sends it to the platform, and checks the
//! response status, header and payload against what the protocol requires.
//!
//! # Usage
//!
//! Run every registered case against the built-in simulated platform:
//!
//! ```bash
//! scmi-conformance --all
//! ```
//!
//! or against real firmware behind a stdio bridge:
//!
//! ```bash
//! scmi-conformance --all --config platform.json --platform-cmd ./bridge
//! ```
//!
//! The binary exits with:
//! - 0: the platform is compliant
//! - 1: at least one case failed (compliance mode)
//! - 2: a case ended in ERROR, or the harness itself failed

pub mod config;
pub mod oracle;
pub mod probe;
pub mod process;
pub mod runner;
pub mod suite;
pub mod testcase;
pub mod tests;

use runner::TestCaseRunner;
use testcase::CaseOutcome;

/// A registered conformance test.
///
/// Tests are registered using the `#[conformance(name = "...")]` attribute macro.
pub struct ConformanceTest {
    /// `category.case`
    pub name: &'static str,
    pub description: &'static str,
    /// The test body.
    pub func: fn(&mut TestCaseRunner<'_>) -> CaseOutcome,
}

inventory::collect!(ConformanceTest);
