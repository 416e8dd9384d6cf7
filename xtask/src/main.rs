use std::env;
use std::path::PathBuf;
use std::process::{Command, ExitCode};

/// Property targets under `fuzz/tests`.
const FUZZ_TARGETS: &[&str] = &["header_decode", "bit_field", "frame_decode"];

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();

    if args.is_empty() {
        print_help();
        return ExitCode::SUCCESS;
    }

    match args[0].as_str() {
        "fuzz" => fuzz(&args[1..]),
        "fuzz-list" => {
            for target in FUZZ_TARGETS {
                println!("{target}");
            }
            ExitCode::SUCCESS
        }
        "test" => test(&args[1..]),
        "conformance" => conformance(&args[1..]),
        "help" | "--help" | "-h" => {
            print_help();
            ExitCode::SUCCESS
        }
        cmd => {
            eprintln!("Unknown command: {cmd}");
            eprintln!();
            print_help();
            ExitCode::FAILURE
        }
    }
}

fn print_help() {
    eprintln!(
        r#"scmi xtask

USAGE:
    cargo xtask <COMMAND> [OPTIONS]

COMMANDS:
    fuzz [TARGET] [-- ARGS]    Run bolero property targets in fuzz/
                               TARGET: header_decode, bit_field, frame_decode
                               Without TARGET, runs every target once as a test
                               With TARGET, fuzzes it with cargo-bolero

    fuzz-list                  List available fuzz targets

    test                       Run all workspace tests (unit + integration)

    conformance [ARGS]         Build and run scmi-conformance (default: --all)

    help                       Print this help message

EXAMPLES:
    cargo xtask fuzz                              # Run every target as a test
    cargo xtask fuzz header_decode -- -T 60s      # Fuzz one target for a minute
    cargo xtask conformance --category reset --mode exploratory
"#
    );
}

fn project_root() -> PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .map(PathBuf::from)
        .unwrap_or(manifest_dir)
}

fn run(cmd: &mut Command, what: &str) -> ExitCode {
    match cmd.status() {
        Ok(s) if s.success() => ExitCode::SUCCESS,
        Ok(s) => {
            eprintln!("{what} exited with: {s}");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Failed to run {what}: {e}");
            ExitCode::FAILURE
        }
    }
}

fn fuzz(args: &[String]) -> ExitCode {
    let fuzz_dir = project_root().join("fuzz");

    let (target, fuzz_args) = match args.iter().position(|a| a == "--") {
        Some(0) => (None, args[1..].to_vec()),
        Some(pos) => (args.first().cloned(), args[pos + 1..].to_vec()),
        None => (args.first().cloned(), Vec::new()),
    };

    let Some(target) = target else {
        // Without an engine, bolero targets run their corpus and a batch of
        // random inputs under plain `cargo test`.
        eprintln!("==> Running all property targets");
        return run(
            Command::new("cargo").current_dir(&fuzz_dir).arg("test"),
            "cargo test (fuzz)",
        );
    };

    if !FUZZ_TARGETS.contains(&target.as_str()) {
        eprintln!("Unknown fuzz target: {target}");
        eprintln!("Run 'cargo xtask fuzz-list' to see available targets");
        return ExitCode::FAILURE;
    }

    let check = Command::new("cargo").args(["bolero", "--version"]).output();
    if !matches!(check, Ok(output) if output.status.success()) {
        eprintln!("cargo-bolero not found. Install with:");
        eprintln!("  cargo install cargo-bolero");
        return ExitCode::FAILURE;
    }

    eprintln!("==> Fuzzing target: {target}");
    let mut cmd = Command::new("cargo");
    cmd.current_dir(&fuzz_dir)
        .args(["bolero", "test", &target]);
    if !fuzz_args.is_empty() {
        cmd.args(&fuzz_args);
    }
    run(&mut cmd, &format!("fuzz target {target}"))
}

fn test(args: &[String]) -> ExitCode {
    let mut cmd = Command::new("cargo");
    cmd.current_dir(project_root()).args(["test", "--workspace"]);
    cmd.args(args);
    run(&mut cmd, "cargo test")
}

fn conformance(args: &[String]) -> ExitCode {
    let mut cmd = Command::new("cargo");
    cmd.current_dir(project_root())
        .args(["run", "--quiet", "-p", "scmi-conformance", "--bin", "scmi-conformance", "--"]);
    if args.is_empty() {
        cmd.arg("--all");
    } else {
        cmd.args(args);
    }
    run(&mut cmd, "scmi-conformance")
}
