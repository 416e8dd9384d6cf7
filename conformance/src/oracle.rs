//! Status comparison, deviation tracking and gate outcomes.

use core::fmt;

use scmi_core::StatusCode;
use tracing::{error, warn};

/// How failures affect the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Any FAIL makes the run non-compliant.
    #[default]
    Compliance,
    /// FAILs are reported as deviations only.
    Exploratory,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Compliance => "compliance",
            Self::Exploratory => "exploratory",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Pass,
    Fail,
}

/// A status that differed from the expected one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deviation {
    pub case: String,
    pub check: u32,
    pub expected: StatusCode,
    pub actual: StatusCode,
}

impl fmt::Display for Deviation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} check {}: expected {}, got {}",
            self.case, self.check, self.expected, self.actual
        )
    }
}

#[derive(Debug, Default)]
pub struct StatusOracle {
    mode: Mode,
    deviations: Vec<Deviation>,
}

impl StatusOracle {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            deviations: Vec::new(),
        }
    }

    /// Exact equality. No tolerance, no partial credit.
    pub fn compare(actual: StatusCode, expected: StatusCode) -> Comparison {
        if actual == expected {
            Comparison::Pass
        } else {
            Comparison::Fail
        }
    }

    /// Compare and remember the deviation if there is one.
    pub fn observe(
        &mut self,
        case: &str,
        check: u32,
        actual: StatusCode,
        expected: StatusCode,
    ) -> Comparison {
        let comparison = Self::compare(actual, expected);
        if comparison == Comparison::Fail {
            let deviation = Deviation {
                case: case.to_string(),
                check,
                expected,
                actual,
            };
            match self.mode {
                Mode::Compliance => error!(%deviation, "status mismatch"),
                Mode::Exploratory => warn!(%deviation, "status mismatch"),
            }
            self.deviations.push(deviation);
        }
        comparison
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn deviations(&self) -> &[Deviation] {
        &self.deviations
    }

    pub fn into_deviations(self) -> Vec<Deviation> {
        self.deviations
    }
}

/// How a capability probe answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Present,
    /// NOT_FOUND or NOT_SUPPORTED: the case does not apply.
    Absent(StatusCode),
    /// Any other status to a probe is itself a protocol deviation.
    Unexpected(StatusCode),
}

impl Gate {
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::SUCCESS => Self::Present,
            StatusCode::NOT_FOUND | StatusCode::NOT_SUPPORTED => Self::Absent(status),
            other => Self::Unexpected(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_is_reflexive() {
        for code in -20..=5 {
            let status = StatusCode(code);
            assert_eq!(StatusOracle::compare(status, status), Comparison::Pass);
        }
        assert_eq!(
            StatusOracle::compare(StatusCode::DENIED, StatusCode::NOT_FOUND),
            Comparison::Fail
        );
    }

    #[test]
    fn test_observe_records_deviations() {
        let mut oracle = StatusOracle::new(Mode::Exploratory);
        oracle.observe("base.x", 1, StatusCode::SUCCESS, StatusCode::SUCCESS);
        oracle.observe("base.x", 2, StatusCode::DENIED, StatusCode::SUCCESS);
        assert_eq!(
            oracle.deviations(),
            &[Deviation {
                case: "base.x".into(),
                check: 2,
                expected: StatusCode::SUCCESS,
                actual: StatusCode::DENIED,
            }]
        );
    }

    #[test]
    fn test_gate_from_status() {
        assert_eq!(Gate::from_status(StatusCode::SUCCESS), Gate::Present);
        assert_eq!(
            Gate::from_status(StatusCode::NOT_FOUND),
            Gate::Absent(StatusCode::NOT_FOUND)
        );
        assert_eq!(
            Gate::from_status(StatusCode::NOT_SUPPORTED),
            Gate::Absent(StatusCode::NOT_SUPPORTED)
        );
        assert_eq!(
            Gate::from_status(StatusCode::DENIED),
            Gate::Unexpected(StatusCode::DENIED)
        );
    }
}
