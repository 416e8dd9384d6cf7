//! Runs cases one after another against one platform.

use scmi_core::Transport;
use tracing::{error, info, info_span};

use crate::ConformanceTest;
use crate::config::PlatformInfo;
use crate::oracle::{Deviation, Mode, StatusOracle};
use crate::probe::CapabilityProbe;
use crate::runner::TestCaseRunner;
use crate::testcase::{TestResult, TestVerdict};

pub struct TestSuite<T, P> {
    transport: T,
    probe: P,
    platform: PlatformInfo,
    mode: Mode,
}

impl<T: Transport, P: CapabilityProbe> TestSuite<T, P> {
    pub fn new(transport: T, probe: P, platform: PlatformInfo, mode: Mode) -> Self {
        Self {
            transport,
            probe,
            platform,
            mode,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Run `cases` in order, each with a fresh runner. An ERROR verdict
    /// stops the run; the remaining cases are reported as not run.
    pub fn run(&mut self, cases: &[&ConformanceTest]) -> SuiteReport {
        let mut oracle = StatusOracle::new(self.mode);
        let mut results = Vec::with_capacity(cases.len());
        let mut not_run = Vec::new();

        for (index, case) in cases.iter().enumerate() {
            let span = info_span!("case", name = case.name);
            let _guard = span.enter();

            let mut runner = TestCaseRunner::new(
                case.name,
                &mut self.transport,
                &self.probe,
                &self.platform,
                &mut oracle,
            );
            let outcome = (case.func)(&mut runner);
            let result = runner.finish(outcome);

            info!(
                verdict = %result.verdict,
                checks = result.checks_run,
                commands = result.commands_sent,
                "case finished"
            );

            let fatal = result.verdict == TestVerdict::Error;
            results.push(result);
            if fatal {
                not_run = cases[index + 1..].iter().map(|c| c.name.to_string()).collect();
                error!(remaining = not_run.len(), "aborting run after ERROR");
                break;
            }
        }

        SuiteReport {
            results,
            not_run,
            deviations: oracle.into_deviations(),
            mode: self.mode,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SuiteReport {
    pub results: Vec<TestResult>,
    /// Cases left unrun after an ERROR.
    pub not_run: Vec<String>,
    pub deviations: Vec<Deviation>,
    pub mode: Mode,
}

impl SuiteReport {
    fn count(&self, verdict: TestVerdict) -> usize {
        self.results.iter().filter(|r| r.verdict == verdict).count()
    }

    pub fn passed(&self) -> usize {
        self.count(TestVerdict::Pass)
    }

    pub fn failed(&self) -> usize {
        self.count(TestVerdict::Fail)
    }

    pub fn skipped(&self) -> usize {
        self.count(TestVerdict::Skip)
    }

    pub fn errors(&self) -> usize {
        self.count(TestVerdict::Error)
    }

    pub fn aborted(&self) -> bool {
        !self.not_run.is_empty() || self.errors() > 0
    }

    /// ERROR is never compliant. FAIL only counts in compliance mode.
    pub fn is_compliant(&self) -> bool {
        if self.aborted() {
            return false;
        }
        match self.mode {
            Mode::Compliance => self.failed() == 0,
            Mode::Exploratory => true,
        }
    }
}
