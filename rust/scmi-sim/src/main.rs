//! Simulated SCMI platform speaking length-prefixed frames on stdin/stdout.
//!
//! Used as an out-of-process platform by the conformance CLI:
//!
//! ```bash
//! scmi-conformance --all --platform-cmd scmi-platform-sim --platform-arg --untrusted
//! ```

use std::io::{BufReader, BufWriter};
use std::process::ExitCode;

use clap::Parser;
use scmi_sim::{Features, ResetDomain, SimulatedPlatform, Topology};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "scmi-platform-sim")]
#[command(about = "Simulated SCMI platform for conformance testing")]
struct Args {
    /// The agent owning the channel is not trusted to change permissions
    #[arg(long)]
    untrusted: bool,

    /// Do not implement SET_DEVICE_PERMISSIONS
    #[arg(long)]
    without_device_permissions: bool,

    /// Do not implement RESET_AGENT_CONFIGURATION
    #[arg(long)]
    without_reset_agent_configuration: bool,

    /// Number of reset domains, replacing the default pair
    #[arg(long)]
    reset_domains: Option<u32>,

    /// With --reset-domains: domains that support asynchronous reset (repeatable)
    #[arg(long = "async-domain", requires = "reset_domains")]
    async_domains: Vec<u32>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let args = Args::parse();

    let mut topology = Topology {
        trusted: !args.untrusted,
        ..Topology::default()
    };
    if let Some(count) = args.reset_domains {
        topology.reset_domains = (0..count)
            .map(|id| ResetDomain {
                name: format!("domain{id}"),
                async_supported: args.async_domains.contains(&id),
            })
            .collect();
    }
    let features = Features {
        device_permissions: !args.without_device_permissions,
        reset_agent_configuration: !args.without_reset_agent_configuration,
    };

    let mut platform = SimulatedPlatform::new(topology).with_features(features);

    let stdin = BufReader::new(std::io::stdin().lock());
    let stdout = BufWriter::new(std::io::stdout().lock());

    match scmi_sim::serve(&mut platform, stdin, stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("channel error: {e}");
            ExitCode::from(2)
        }
    }
}
