//! Verdicts and results.

use core::fmt;

/// Final outcome of one case. Produced once, by [`TestCaseRunner::finish`].
///
/// [`TestCaseRunner::finish`]: crate::runner::TestCaseRunner::finish
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TestVerdict {
    Pass,
    /// The platform deviated from the protocol.
    Fail,
    /// A prerequisite capability is absent.
    Skip,
    /// The harness or the channel failed; nothing is known about the platform.
    Error,
}

impl TestVerdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::Skip => "SKIP",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for TestVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// What a check compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckKind {
    Status,
    Header,
    ReservedBits,
    Value,
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Status => "status",
            Self::Header => "header",
            Self::ReservedBits => "reserved bits",
            Self::Value => "value",
        })
    }
}

/// The outcome of one assertion inside a case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    /// Index of the check (from `begin_check`) the assertion belongs to.
    pub check: u32,
    pub kind: CheckKind,
    pub passed: bool,
    pub detail: String,
}

/// Early exit from a case body, carried through `?`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Halt {
    Fail(String),
    Skip(String),
    Error(String),
}

impl Halt {
    pub fn verdict(&self) -> TestVerdict {
        match self {
            Self::Fail(_) => TestVerdict::Fail,
            Self::Skip(_) => TestVerdict::Skip,
            Self::Error(_) => TestVerdict::Error,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Fail(m) | Self::Skip(m) | Self::Error(m) => m,
        }
    }

    pub fn into_message(self) -> String {
        match self {
            Self::Fail(m) | Self::Skip(m) | Self::Error(m) => m,
        }
    }
}

impl fmt::Display for Halt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.verdict(), self.message())
    }
}

/// A bit range outside the 32-bit word is a defect in the case, not in the
/// platform.
impl From<scmi_core::RangeError> for Halt {
    fn from(e: scmi_core::RangeError) -> Self {
        Self::Error(format!("test case defect: {e}"))
    }
}

/// What a case body returns.
pub type CaseOutcome = Result<(), Halt>;

/// One resource instance whose remaining checks were skipped mid-case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialSkip {
    pub instance: u32,
    pub reason: String,
}

/// Result of running a single case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestResult {
    pub name: String,
    pub verdict: TestVerdict,
    /// Why the case did not pass (or restore trouble after it did).
    pub message: Option<String>,
    pub checks_run: u32,
    pub commands_sent: u32,
    pub partial_skips: Vec<PartialSkip>,
}

impl TestResult {
    pub fn passed(&self) -> bool {
        self.verdict == TestVerdict::Pass
    }
}
