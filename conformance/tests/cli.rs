//! Command-line behaviour of `scmi-conformance`.
//!
//! Trials that talk to a platform process need `scmi-platform-sim`, looked up
//! next to the test binary. Build it first (`cargo build -p scmi-sim`), or
//! run the whole workspace with `cargo test --workspace`.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use facet::Facet;
use libtest_mimic::{Arguments, Failed, Trial};
use owo_colors::OwoColorize;

const RUNNER: &str = env!("CARGO_BIN_EXE_scmi-conformance");

/// Matches the simulator's default topology.
const DEFAULT_PLATFORM: &str = r#"{
  "agent_id": 1,
  "trusted_agent": true,
  "accessible_device": { "device_id": 0, "protocol_id": 21 },
  "reset_domains": [{ "async_supported": false }, { "async_supported": true }]
}"#;

#[derive(Facet)]
struct ListedCase {
    name: String,
    description: String,
}

#[derive(Facet)]
struct ListedResult {
    test: String,
    verdict: String,
    message: Option<String>,
    checks_run: u32,
    commands_sent: u32,
    partial_skips: Vec<u32>,
}

#[derive(Facet)]
struct ListedDeviation {
    case: String,
    check: u32,
    expected: i32,
    actual: i32,
}

#[derive(Facet)]
struct Report {
    mode: String,
    compliant: bool,
    results: Vec<ListedResult>,
    not_run: Vec<String>,
    deviations: Vec<ListedDeviation>,
}

fn runner(args: &[&str]) -> Result<Output, Failed> {
    Command::new(RUNNER)
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .map_err(|e| Failed::from(format!("failed to run {RUNNER}: {e}")))
}

fn expect_exit(output: &Output, code: i32) -> Result<(), Failed> {
    if output.status.code() == Some(code) {
        return Ok(());
    }
    Err(Failed::from(format!(
        "expected exit code {code}, got {:?}\nstdout:\n{}\nstderr:\n{}",
        output.status.code(),
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )))
}

fn stdout(output: &Output) -> Result<&str, Failed> {
    std::str::from_utf8(&output.stdout).map_err(|e| Failed::from(format!("stdout: {e}")))
}

/// Write a platform description into the temp dir.
fn write_config(name: &str, contents: &str) -> Result<PathBuf, Failed> {
    let file = format!("scmi-conformance-{}-{name}.json", std::process::id());
    let path = std::env::temp_dir().join(file);
    std::fs::write(&path, contents)
        .map_err(|e| Failed::from(format!("failed to write {}: {e}", path.display())))?;
    Ok(path)
}

fn path_str(path: &Path) -> Result<&str, Failed> {
    path.to_str()
        .ok_or_else(|| Failed::from(format!("non-UTF-8 path {}", path.display())))
}

// =============================================================================
// Listing and selection
// =============================================================================

fn list_json() -> Result<(), Failed> {
    let output = runner(&["--list", "--format", "json"])?;
    expect_exit(&output, 0)?;
    let listed: Vec<ListedCase> = facet_json::from_str(stdout(&output)?)
        .map_err(|e| Failed::from(format!("invalid listing: {e}")))?;

    let names: Vec<&str> = listed.iter().map(|c| c.name.as_str()).collect();
    for expected in [
        "base.protocol_version",
        "base.restore_device_access_with_reset_agent",
        "reset.invalid_flag",
        "system_power.mandatory_command_support",
    ] {
        if !names.contains(&expected) {
            return Err(format!("{expected} missing from {names:?}").into());
        }
    }
    let mut sorted = names.clone();
    sorted.sort_unstable();
    if sorted != names {
        return Err("listing is not sorted".into());
    }
    if listed.iter().any(|c| c.description.is_empty()) {
        return Err("a case has no description".into());
    }
    Ok(())
}

fn list_category() -> Result<(), Failed> {
    let output = runner(&["--list", "--category", "reset", "--format", "json"])?;
    expect_exit(&output, 0)?;
    let listed: Vec<ListedCase> = facet_json::from_str(stdout(&output)?)
        .map_err(|e| Failed::from(format!("invalid listing: {e}")))?;
    if listed.is_empty() || listed.iter().any(|c| !c.name.starts_with("reset.")) {
        return Err("category filter leaked other cases".into());
    }
    Ok(())
}

fn unknown_case() -> Result<(), Failed> {
    let output = runner(&["--case", "base.no_such_case"])?;
    expect_exit(&output, 2)
}

fn nothing_selected() -> Result<(), Failed> {
    let output = runner(&[])?;
    expect_exit(&output, 2)
}

fn invalid_config() -> Result<(), Failed> {
    let path = write_config("invalid", "{ \"agent_id\": ")?;
    let output = runner(&["--all", "--config", path_str(&path)?])?;
    let _ = std::fs::remove_file(&path);
    expect_exit(&output, 2)
}

// =============================================================================
// Runs against the built-in simulator
// =============================================================================

fn all_in_process() -> Result<(), Failed> {
    let output = runner(&["--all"])?;
    expect_exit(&output, 0)?;
    let text = stdout(&output)?;
    if !text.contains(" 0 failed") || text.contains("NOT COMPLIANT") {
        return Err(format!("unexpected report:\n{text}").into());
    }
    Ok(())
}

fn json_report() -> Result<(), Failed> {
    let output = runner(&["--category", "reset", "--format", "json"])?;
    expect_exit(&output, 0)?;
    let report: Report = facet_json::from_str(stdout(&output)?)
        .map_err(|e| Failed::from(format!("invalid report: {e}")))?;

    if report.mode != "compliance" || !report.compliant {
        return Err(format!("mode {} compliant {}", report.mode, report.compliant).into());
    }
    if !report.not_run.is_empty() || !report.deviations.is_empty() {
        return Err("clean run reported deviations or skipped cases".into());
    }
    let invalid_flag = report
        .results
        .iter()
        .find(|r| r.test == "reset.invalid_flag")
        .ok_or_else(|| Failed::from("reset.invalid_flag missing from report"))?;
    if invalid_flag.verdict != "PASS" || invalid_flag.message.is_some() {
        return Err(format!("reset.invalid_flag: {}", invalid_flag.verdict).into());
    }
    if invalid_flag.checks_run != 3 || invalid_flag.partial_skips != [1] {
        return Err(format!(
            "checks {} partial skips {:?}",
            invalid_flag.checks_run, invalid_flag.partial_skips
        )
        .into());
    }
    if invalid_flag.commands_sent == 0 {
        return Err("no commands counted".into());
    }
    Ok(())
}

// =============================================================================
// Runs against a platform process
// =============================================================================

fn all_over_process(sim: &Path) -> Result<(), Failed> {
    let config = write_config("default", DEFAULT_PLATFORM)?;
    let output = runner(&[
        "--all",
        "--config",
        path_str(&config)?,
        "--platform-cmd",
        path_str(sim)?,
    ])?;
    let _ = std::fs::remove_file(&config);
    expect_exit(&output, 0)
}

/// The description claims a trusted agent but the platform disagrees.
fn untrusted_platform(sim: &Path, mode: &str, code: i32) -> Result<(), Failed> {
    let config = write_config(&format!("untrusted-{mode}"), DEFAULT_PLATFORM)?;
    let output = runner(&[
        "--case",
        "base.restore_device_access_with_reset_agent",
        "--mode",
        mode,
        "--format",
        "json",
        "--config",
        path_str(&config)?,
        "--platform-cmd",
        path_str(sim)?,
        "--platform-arg",
        "--untrusted",
    ])?;
    let _ = std::fs::remove_file(&config);
    expect_exit(&output, code)?;

    let report: Report = facet_json::from_str(stdout(&output)?)
        .map_err(|e| Failed::from(format!("invalid report: {e}")))?;
    match report.results.as_slice() {
        [result] if result.verdict == "FAIL" => {}
        _ => return Err("expected a single FAIL".into()),
    }
    match report.deviations.as_slice() {
        [deviation] if deviation.expected == 0 && deviation.actual == -3 => {
            if deviation.case != "base.restore_device_access_with_reset_agent" || deviation.check != 1 {
                return Err(format!("deviation recorded at {} check {}", deviation.case, deviation.check).into());
            }
            Ok(())
        }
        _ => Err("expected SUCCESS vs DENIED deviation".into()),
    }
}

fn main() {
    let args = Arguments::from_args();

    let mut trials = vec![
        Trial::test("list::json", list_json),
        Trial::test("list::category", list_category),
        Trial::test("select::unknown_case", unknown_case),
        Trial::test("select::nothing_selected", nothing_selected),
        Trial::test("config::invalid", invalid_config),
        Trial::test("in_process::all", all_in_process),
        Trial::test("in_process::json_report", json_report),
    ];

    // The simulator binary lives next to ours once the workspace is built
    let self_exe = std::env::current_exe().expect("failed to get current exe");
    let mut bin_dir = self_exe.parent().expect("exe has no parent").to_path_buf();
    if bin_dir.ends_with("deps") {
        bin_dir = bin_dir.parent().expect("deps has no parent").to_path_buf();
    }
    let sim = bin_dir.join(format!("scmi-platform-sim{}", std::env::consts::EXE_SUFFIX));

    if sim.exists() {
        let s = sim.clone();
        trials.push(Trial::test("process::all", move || all_over_process(&s)));
        let s = sim.clone();
        trials.push(Trial::test("process::untrusted_compliance", move || {
            untrusted_platform(&s, "compliance", 1)
        }));
        let s = sim;
        trials.push(Trial::test("process::untrusted_exploratory", move || {
            untrusted_platform(&s, "exploratory", 0)
        }));
    } else {
        eprintln!(
            "{} {} not found, skipping platform process trials",
            "Warning:".yellow(),
            sim.display()
        );
    }

    libtest_mimic::run(&args, trials).exit();
}
