//! The per-case state machine.
//!
//! A case drives one [`TestCaseRunner`] through
//! `Uninitialized → Initialized → Checking(n) → Finished(verdict)`:
//!
//! ```ignore
//! runner.initialize(&[Capability::TrustedAgent])?;
//! runner.begin_check("query protocol version")?;
//! let response = runner.exchange(header, StatusCode::SUCCESS)?;
//! ```
//!
//! Once a check fails the runner is finished and refuses to send anything
//! else, so later checks cannot mutate the platform. Restore commands
//! registered with [`TestCaseRunner::defer_restore`] still run from
//! [`TestCaseRunner::finish`].

use scmi_core::protocol::common;
use scmi_core::{MessageHeader, Response, StatusCode, Transport, bits, headers_match};
use tracing::{debug, info, warn};

use crate::config::PlatformInfo;
use crate::oracle::{Gate, StatusOracle};
use crate::probe::{Capability, CapabilityProbe};
use crate::testcase::{
    CaseOutcome, CheckKind, CheckResult, Halt, PartialSkip, TestResult, TestVerdict,
};

/// Parameter words one command may carry.
pub const MAX_PARAMETERS: usize = 16;
/// Return words one response may carry.
pub const MAX_RETURN_VALUES: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    Uninitialized,
    Initialized,
    Checking(u32),
    Finished(TestVerdict),
}

#[derive(Debug, Clone)]
struct Restore {
    header: MessageHeader,
    params: Vec<u32>,
}

pub struct TestCaseRunner<'a> {
    name: &'a str,
    transport: &'a mut dyn Transport,
    probe: &'a dyn CapabilityProbe,
    platform: &'a PlatformInfo,
    oracle: &'a mut StatusOracle,
    state: RunnerState,
    check: u32,
    params: Vec<u32>,
    return_values: Vec<u32>,
    commands_sent: u32,
    partial_skips: Vec<PartialSkip>,
    restores: Vec<Restore>,
    halt: Option<Halt>,
    channel_failed: bool,
}

impl<'a> TestCaseRunner<'a> {
    pub fn new(
        name: &'a str,
        transport: &'a mut dyn Transport,
        probe: &'a dyn CapabilityProbe,
        platform: &'a PlatformInfo,
        oracle: &'a mut StatusOracle,
    ) -> Self {
        Self {
            name,
            transport,
            probe,
            platform,
            oracle,
            state: RunnerState::Uninitialized,
            check: 0,
            params: Vec::with_capacity(MAX_PARAMETERS),
            return_values: Vec::with_capacity(MAX_RETURN_VALUES),
            commands_sent: 0,
            partial_skips: Vec::new(),
            restores: Vec::new(),
            halt: None,
            channel_failed: false,
        }
    }

    pub fn name(&self) -> &str {
        self.name
    }

    pub fn state(&self) -> RunnerState {
        self.state
    }

    pub fn platform(&self) -> &PlatformInfo {
        self.platform
    }

    pub fn check_index(&self) -> u32 {
        self.check
    }

    pub fn commands_sent(&self) -> u32 {
        self.commands_sent
    }

    /// Return words of the last response.
    pub fn return_values(&self) -> &[u32] {
        &self.return_values
    }

    /// One return word of the last response. A short response is a protocol
    /// deviation.
    pub fn return_value(&mut self, index: usize) -> Result<u32, Halt> {
        match self.return_values.get(index) {
            Some(&value) => Ok(value),
            None => {
                let detail = format!(
                    "response carries {} return values, expected at least {}",
                    self.return_values.len(),
                    index + 1
                );
                Err(self.halt_with(Halt::Fail(detail)))
            }
        }
    }

    fn halt_with(&mut self, halt: Halt) -> Halt {
        self.state = RunnerState::Finished(halt.verdict());
        self.halt = Some(halt.clone());
        halt
    }

    fn refuse(&mut self, operation: &str) -> Halt {
        if let Some(halt) = &self.halt {
            return halt.clone();
        }
        self.halt_with(Halt::Error(format!(
            "{operation} refused while runner is {:?}",
            self.state
        )))
    }

    // =========================================================================
    // Prerequisites
    // =========================================================================

    /// Evaluate every prerequisite. Only non-mutating probes reach the
    /// platform; an absent capability finishes the case as SKIP.
    pub fn initialize(&mut self, prerequisites: &[Capability]) -> CaseOutcome {
        if self.state != RunnerState::Uninitialized {
            return Err(self.refuse("initialize"));
        }

        for capability in prerequisites {
            let gate = match *capability {
                Capability::Command {
                    protocol_id,
                    message_id,
                } => self.probe_command(protocol_id, message_id)?,
                _ if self.probe.is_present(capability) => Gate::Present,
                _ => Gate::Absent(StatusCode::NOT_SUPPORTED),
            };

            match gate {
                Gate::Present => debug!(%capability, "prerequisite present"),
                Gate::Absent(status) => {
                    info!(%capability, %status, "prerequisite absent, skipping");
                    return Err(self.halt_with(Halt::Skip(format!("{capability} absent"))));
                }
                Gate::Unexpected(status) => {
                    let detail = format!("probing {capability} answered {status}");
                    return Err(self.halt_with(Halt::Fail(detail)));
                }
            }
        }

        self.state = RunnerState::Initialized;
        Ok(())
    }

    fn probe_command(&mut self, protocol_id: u8, message_id: u8) -> Result<Gate, Halt> {
        let header = MessageHeader::command(protocol_id, common::PROTOCOL_MESSAGE_ATTRIBUTES);
        let response = self.transmit(header, &[u32::from(message_id)])?;
        Ok(Gate::from_status(response.status))
    }

    // =========================================================================
    // Checks
    // =========================================================================

    /// Start the next check: clears both buffers.
    pub fn begin_check(&mut self, label: &str) -> CaseOutcome {
        match self.state {
            RunnerState::Initialized | RunnerState::Checking(_) => {}
            _ => return Err(self.refuse("begin_check")),
        }
        self.check += 1;
        self.state = RunnerState::Checking(self.check);
        self.params.clear();
        self.return_values.clear();
        info!(check = self.check, "{label}");
        Ok(())
    }

    pub fn push_param(&mut self, value: u32) -> CaseOutcome {
        if self.params.len() == MAX_PARAMETERS {
            let detail = format!("test case defect: more than {MAX_PARAMETERS} parameters");
            return Err(self.halt_with(Halt::Error(detail)));
        }
        self.params.push(value);
        Ok(())
    }

    /// Replace the parameter buffer.
    pub fn params(&mut self, values: &[u32]) -> CaseOutcome {
        self.params.clear();
        values.iter().try_for_each(|&v| self.push_param(v))
    }

    /// Send the current parameters with `header`.
    pub fn send(&mut self, header: MessageHeader) -> Result<Response, Halt> {
        if !matches!(self.state, RunnerState::Checking(_)) {
            return Err(self.refuse("send"));
        }
        let params = std::mem::take(&mut self.params);
        let result = self.transmit(header, &params);
        self.params = params;
        let response = result?;

        if response.return_values.len() > MAX_RETURN_VALUES {
            let detail = format!(
                "response carries {} return values, buffer holds {MAX_RETURN_VALUES}",
                response.return_values.len()
            );
            return Err(self.halt_with(Halt::Error(detail)));
        }
        self.return_values.clear();
        self.return_values.extend_from_slice(&response.return_values);
        Ok(response)
    }

    fn transmit(&mut self, header: MessageHeader, params: &[u32]) -> Result<Response, Halt> {
        self.commands_sent += 1;
        debug!(%header, ?params, "sending");
        match self.transport.send(header, params) {
            Ok(response) => {
                debug!(
                    header = %response.header,
                    status = %response.status,
                    values = response.return_values.len(),
                    "received"
                );
                Ok(response)
            }
            Err(e) => {
                self.channel_failed = true;
                Err(self.halt_with(Halt::Error(format!("channel error: {e}"))))
            }
        }
    }

    /// A failing result finishes the case.
    pub fn record(&mut self, result: CheckResult) -> CaseOutcome {
        if result.passed {
            debug!(check = result.check, kind = %result.kind, "{}", result.detail);
            return Ok(());
        }
        warn!(check = result.check, kind = %result.kind, "{}", result.detail);
        let detail = format!("check {} ({}): {}", result.check, result.kind, result.detail);
        Err(self.halt_with(Halt::Fail(detail)))
    }

    fn check_result(&self, kind: CheckKind, passed: bool, detail: String) -> CheckResult {
        CheckResult {
            check: self.check,
            kind,
            passed,
            detail,
        }
    }

    pub fn expect_status(&mut self, actual: StatusCode, expected: StatusCode) -> CaseOutcome {
        let passed = self
            .oracle
            .observe(self.name, self.check, actual, expected)
            == crate::oracle::Comparison::Pass;
        let result = self.check_result(
            CheckKind::Status,
            passed,
            format!("expected status {expected}, got {actual}"),
        );
        self.record(result)
    }

    pub fn expect_header(&mut self, sent: MessageHeader, received: MessageHeader) -> CaseOutcome {
        let passed = headers_match(sent, received);
        let result = self.check_result(
            CheckKind::Header,
            passed,
            format!("sent {sent}, received {received}"),
        );
        self.record(result)
    }

    /// Bits `low..=high` of `word` must be clear.
    pub fn expect_reserved_zero(&mut self, word: u32, low: u32, high: u32) -> CaseOutcome {
        let passed = match bits::reserved_zero(word, low, high) {
            Ok(passed) => passed,
            Err(e) => return Err(self.halt_with(e.into())),
        };
        let result = self.check_result(
            CheckKind::ReservedBits,
            passed,
            format!("reserved bits [{high}:{low}] of {word:#010x} must be zero"),
        );
        self.record(result)
    }

    pub fn expect_value(&mut self, what: &str, actual: u32, expected: u32) -> CaseOutcome {
        let result = self.check_result(
            CheckKind::Value,
            actual == expected,
            format!("{what}: expected {expected}, got {actual}"),
        );
        self.record(result)
    }

    /// Send, then check the status and then the header.
    pub fn exchange(
        &mut self,
        header: MessageHeader,
        expected: StatusCode,
    ) -> Result<Response, Halt> {
        let response = self.send(header)?;
        self.expect_status(response.status, expected)?;
        self.expect_header(header, response.header)?;
        Ok(response)
    }

    // =========================================================================
    // Partial skips and restores
    // =========================================================================

    /// Skip the remaining checks for one resource instance. The case can
    /// still pass.
    pub fn skip_remaining(&mut self, instance: u32, reason: impl Into<String>) {
        let reason = reason.into();
        info!(instance, "skipping remaining checks: {reason}");
        self.partial_skips.push(PartialSkip { instance, reason });
    }

    /// Register a command that undoes state this case just changed.
    pub fn defer_restore(&mut self, header: MessageHeader, params: &[u32]) {
        self.restores.push(Restore {
            header,
            params: params.to_vec(),
        });
    }

    /// The case undid its changes itself.
    pub fn restored(&mut self) {
        self.restores.clear();
    }

    /// Turn the case body's outcome into the final result.
    pub fn finish(mut self, outcome: CaseOutcome) -> TestResult {
        // A halt the body swallowed still decides the verdict.
        let outcome = match (outcome, self.halt.take()) {
            (Ok(()), Some(halt)) => Err(halt),
            (outcome, _) => outcome,
        };

        let (mut verdict, mut message) = match outcome {
            Ok(()) if self.state == RunnerState::Uninitialized => (
                TestVerdict::Error,
                Some("case returned without initializing".to_string()),
            ),
            Ok(()) => (TestVerdict::Pass, None),
            Err(halt) => (halt.verdict(), Some(halt.into_message())),
        };

        // Restores need a working channel; any other ending still undoes state.
        if !self.restores.is_empty() {
            let restore = match verdict {
                TestVerdict::Fail | TestVerdict::Skip => true,
                TestVerdict::Error => !self.channel_failed,
                TestVerdict::Pass => false,
            };
            if restore {
                if let Err(e) = self.run_restores() {
                    verdict = TestVerdict::Error;
                    message = Some(match message {
                        Some(m) => format!("{m}; {e}"),
                        None => e,
                    });
                }
            } else if verdict == TestVerdict::Pass {
                warn!(
                    outstanding = self.restores.len(),
                    "case passed with restores still registered"
                );
            }
        }

        self.state = RunnerState::Finished(verdict);
        TestResult {
            name: self.name.to_string(),
            verdict,
            message,
            checks_run: self.check,
            commands_sent: self.commands_sent,
            partial_skips: self.partial_skips,
        }
    }

    /// Best effort, newest first. Only a channel failure is an error.
    ///
    /// Not run after the channel itself failed.
    fn run_restores(&mut self) -> Result<(), String> {
        for restore in std::mem::take(&mut self.restores).into_iter().rev() {
            info!(header = %restore.header, "restoring platform state");
            self.commands_sent += 1;
            match self.transport.send(restore.header, &restore.params) {
                Ok(response) if response.status.is_success() => {}
                Ok(response) => {
                    warn!(header = %restore.header, status = %response.status, "restore rejected");
                }
                Err(e) => return Err(format!("restore failed: channel error: {e}")),
            }
        }
        Ok(())
    }
}
