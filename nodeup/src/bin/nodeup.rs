//! nodeup - bring a local storage node up from the source tree.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use nodeup::boot::{self, BootstrapOptions};
use nodeup::{RuntimeConfig, logging};

#[derive(Debug, Parser)]
#[command(
    name = "nodeup",
    version,
    about = "Bootstrap a local storage node: reconcile mounts, build, launch"
)]
struct Cli {
    /// Extra options forwarded verbatim to the build command
    /// (e.g. "-F abi-7-23").
    build_opts: Option<String>,

    /// Abort the build after this many seconds (unbounded when unset).
    #[arg(long, value_name = "SECS")]
    build_timeout: Option<u64>,

    /// Mirror logs to this file.
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Print the resolved runtime configuration as JSON and exit.
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let _guard = match logging::init(cli.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("failed to initialize logging: {e}");
            return ExitCode::from(1);
        }
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "bootstrap failed");
            for cause in e.chain().skip(1) {
                error!(cause = %cause, "caused by");
            }
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = RuntimeConfig::from_env()?;

    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let options = BootstrapOptions {
        build_opts: cli.build_opts,
        build_timeout: cli.build_timeout.map(Duration::from_secs),
    };

    let pid = boot::bootstrap(config, options).await?;
    info!(pid, "storage node running, orchestrator exiting");
    Ok(())
}
