//! System power protocol conformance tests.

use scmi_core::protocol::{protocol_id, system_power};
use scmi_core::{MessageHeader, StatusCode, bits};
use scmi_conformance_macros::conformance;
use tracing::debug;

use crate::runner::TestCaseRunner;
use crate::testcase::CaseOutcome;

// =============================================================================
// system_power.mandatory_command_support
// =============================================================================
// STATE_SET, STATE_GET and STATE_NOTIFY are mandatory. STATE_SET attributes
// carry the warm reset (31) and suspend (30) support bits over reserved
// bits 29:0; the other two attribute words are fully reserved.

#[conformance(
    name = "system_power.mandatory_command_support",
    description = "STATE_SET, STATE_GET and STATE_NOTIFY are implemented with valid attributes"
)]
pub fn mandatory_command_support(runner: &mut TestCaseRunner<'_>) -> CaseOutcome {
    runner.initialize(&[])?;

    let header = MessageHeader::command(
        protocol_id::SYSTEM_POWER,
        system_power::PROTOCOL_MESSAGE_ATTRIBUTES,
    );

    runner.begin_check("SYSTEM_POWER_STATE_SET support")?;
    runner.push_param(u32::from(system_power::SYSTEM_POWER_STATE_SET))?;
    runner.exchange(header, StatusCode::SUCCESS)?;
    let attributes = runner.return_value(0)?;
    runner.expect_reserved_zero(attributes, 0, 29)?;
    let warm_reset = bits::bit(attributes, system_power::ATTR_WARM_RESET_BIT)?;
    let suspend = bits::bit(attributes, system_power::ATTR_SUSPEND_BIT)?;
    debug!(warm_reset, suspend, "system power state set support");

    for (label, message_id) in [
        ("SYSTEM_POWER_STATE_GET support", system_power::SYSTEM_POWER_STATE_GET),
        ("SYSTEM_POWER_STATE_NOTIFY support", system_power::SYSTEM_POWER_STATE_NOTIFY),
    ] {
        runner.begin_check(label)?;
        runner.push_param(u32::from(message_id))?;
        runner.exchange(header, StatusCode::SUCCESS)?;
        let attributes = runner.return_value(0)?;
        runner.expect_reserved_zero(attributes, 0, 31)?;
    }
    Ok(())
}
