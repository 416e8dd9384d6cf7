//! SCMI conformance runner.
//!
//! # Usage
//!
//! Run every case against the built-in simulated platform:
//! ```bash
//! scmi-conformance --all
//! ```
//!
//! Run one category against a platform process:
//! ```bash
//! scmi-conformance --category reset --config platform.json \
//!     --platform-cmd scmi-platform-sim --platform-arg --reset-domains --platform-arg 4
//! ```
//!
//! List test cases:
//! ```bash
//! scmi-conformance --list [--category base] [--format json]
//! ```
//!
//! # Exit Codes
//!
//! - 0: Compliant
//! - 1: At least one case failed (compliance mode)
//! - 2: A case ended in ERROR, or the runner could not start

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use facet::Facet;
use owo_colors::OwoColorize;
use scmi_conformance::config::PlatformInfo;
use scmi_conformance::oracle::Mode;
use scmi_conformance::process::ProcessTransport;
use scmi_conformance::suite::{SuiteReport, TestSuite};
use scmi_conformance::testcase::TestVerdict;
use scmi_conformance::{ConformanceTest, tests};
use scmi_core::Transport;
use scmi_sim::{SimulatedPlatform, Topology};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "scmi-conformance")]
#[command(about = "SCMI platform conformance test runner")]
struct Args {
    /// Run a specific test case (e.g., "base.protocol_version")
    #[arg(long)]
    case: Option<String>,

    /// List available test cases
    #[arg(long)]
    list: bool,

    /// Filter by category (base, reset, system_power)
    #[arg(long)]
    category: Option<String>,

    /// Run every registered case
    #[arg(long)]
    all: bool,

    /// Output format (text, json)
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    format: String,

    /// compliance: any FAIL fails the run; exploratory: FAILs are only reported
    #[arg(long, default_value = "compliance", value_parser = ["compliance", "exploratory"])]
    mode: String,

    /// Platform description (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Platform process speaking length-prefixed frames on stdin/stdout
    #[arg(long)]
    platform_cmd: Option<String>,

    /// Argument passed to the platform process (repeatable)
    #[arg(long, allow_hyphen_values = true)]
    platform_arg: Vec<String>,

    /// Time to wait for each response from a platform process
    #[arg(long, default_value_t = 5000)]
    timeout_ms: u64,
}

/// JSON output for a test case listing.
#[derive(Facet)]
struct TestCaseJson {
    name: String,
    description: String,
}

/// JSON output for one case result.
#[derive(Facet)]
struct TestResultJson {
    test: String,
    verdict: String,
    message: Option<String>,
    checks_run: u32,
    commands_sent: u32,
    partial_skips: Vec<u32>,
}

#[derive(Facet)]
struct DeviationJson {
    case: String,
    check: u32,
    expected: i32,
    actual: i32,
}

/// JSON output for a whole run.
#[derive(Facet)]
struct ReportJson {
    mode: String,
    compliant: bool,
    results: Vec<TestResultJson>,
    not_run: Vec<String>,
    deviations: Vec<DeviationJson>,
}

fn main() {
    // Initialize tracing - output goes to stderr, no timestamps
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let args = Args::parse();

    if args.list {
        list_tests(&args);
        return;
    }

    let cases = select_cases(&args);
    if cases.is_empty() {
        eprintln!("Usage: scmi-conformance --case <test_name>");
        eprintln!("       scmi-conformance --category <category>");
        eprintln!("       scmi-conformance --all");
        eprintln!("       scmi-conformance --list");
        std::process::exit(2);
    }

    let report = run(&args, &cases);
    print_report(&report, &args);

    let code = if report.aborted() {
        2
    } else if report.is_compliant() {
        0
    } else {
        1
    };
    std::process::exit(code);
}

fn select_cases(args: &Args) -> Vec<&'static ConformanceTest> {
    if let Some(case) = &args.case {
        match tests::find(case) {
            Some(test) => vec![test],
            None => {
                eprintln!("unknown test case: {case}");
                std::process::exit(2);
            }
        }
    } else if let Some(category) = &args.category {
        tests::list_category(category)
    } else if args.all {
        tests::list_all()
    } else {
        Vec::new()
    }
}

fn run(args: &Args, cases: &[&ConformanceTest]) -> SuiteReport {
    let mode = match args.mode.as_str() {
        "exploratory" => Mode::Exploratory,
        _ => Mode::Compliance,
    };

    let platform = match &args.config {
        Some(path) => PlatformInfo::load(path).unwrap_or_else(|e| {
            eprintln!("{}: {e}", path.display());
            std::process::exit(2);
        }),
        None => {
            if args.platform_cmd.is_some() {
                tracing::warn!("no --config given, assuming the simulator's default topology");
            }
            PlatformInfo::from(&Topology::default())
        }
    };

    let transport: Box<dyn Transport> = match &args.platform_cmd {
        Some(program) => {
            let timeout = Duration::from_millis(args.timeout_ms);
            match ProcessTransport::spawn(program, &args.platform_arg, timeout) {
                Ok(transport) => Box::new(transport),
                Err(e) => {
                    eprintln!("failed to start platform {program}: {e}");
                    std::process::exit(2);
                }
            }
        }
        None => Box::new(SimulatedPlatform::default()),
    };

    tracing::info!(cases = cases.len(), %mode, "starting conformance run");
    let mut suite = TestSuite::new(transport, platform.clone(), platform, mode);
    suite.run(cases)
}

fn list_tests(args: &Args) {
    let tests = if let Some(category) = &args.category {
        tests::list_category(category)
    } else {
        tests::list_all()
    };

    if args.format == "json" {
        let output: Vec<TestCaseJson> = tests
            .iter()
            .map(|t| TestCaseJson {
                name: t.name.to_string(),
                description: t.description.to_string(),
            })
            .collect();
        println!(
            "{}",
            facet_json::to_string(&output).expect("JSON serialization failed")
        );
    } else {
        println!("Available test cases:\n");

        let mut current_category = "";
        for test in &tests {
            let category = test.name.split('.').next().unwrap_or("");
            if category != current_category {
                if !current_category.is_empty() {
                    println!();
                }
                println!("## {}", category);
                current_category = category;
            }
            println!("  {:<48} {}", test.name, test.description);
        }

        println!("\nTotal: {} tests", tests.len());
    }
}

fn print_report(report: &SuiteReport, args: &Args) {
    if args.format == "json" {
        let output = ReportJson {
            mode: report.mode.to_string(),
            compliant: report.is_compliant(),
            results: report
                .results
                .iter()
                .map(|r| TestResultJson {
                    test: r.name.clone(),
                    verdict: r.verdict.to_string(),
                    message: r.message.clone(),
                    checks_run: r.checks_run,
                    commands_sent: r.commands_sent,
                    partial_skips: r.partial_skips.iter().map(|s| s.instance).collect(),
                })
                .collect(),
            not_run: report.not_run.clone(),
            deviations: report
                .deviations
                .iter()
                .map(|d| DeviationJson {
                    case: d.case.clone(),
                    check: d.check,
                    expected: d.expected.code(),
                    actual: d.actual.code(),
                })
                .collect(),
        };
        println!(
            "{}",
            facet_json::to_string(&output).expect("JSON serialization failed")
        );
        return;
    }

    for result in &report.results {
        let label = format!("{:>5}", result.verdict);
        let verdict = match result.verdict {
            TestVerdict::Pass => label.green().to_string(),
            TestVerdict::Fail => label.red().to_string(),
            TestVerdict::Skip => label.yellow().to_string(),
            TestVerdict::Error => label.magenta().bold().to_string(),
        };
        println!("{verdict}  {}", result.name);
        if let Some(message) = &result.message {
            println!("       {}", message.dimmed());
        }
        for skip in &result.partial_skips {
            println!(
                "       {}",
                format!("instance {} skipped: {}", skip.instance, skip.reason).dimmed()
            );
        }
    }
    for name in &report.not_run {
        println!("{}  {}", format!("{:>5}", "-").dimmed(), name);
    }

    println!(
        "\n{} passed, {} failed, {} skipped, {} errors, {} not run ({} mode)",
        report.passed(),
        report.failed(),
        report.skipped(),
        report.errors(),
        report.not_run.len(),
        report.mode
    );
    if !report.deviations.is_empty() {
        println!("\nDeviations:");
        for deviation in &report.deviations {
            println!("  {deviation}");
        }
    }
    if report.is_compliant() {
        println!("{}", "COMPLIANT".green().bold());
    } else {
        println!("{}", "NOT COMPLIANT".red().bold());
    }
}
