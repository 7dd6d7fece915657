//! ratelimit-gateway - distributed multi-tier rate limiting gateway
//!
//! Loads the YAML configuration, installs tracing and serves the gated API.

#![allow(missing_docs)]

use clap::Parser;
use ratelimit_gateway::server::builder::{load_config, run_server};
use ratelimit_gateway::utils::logging::init_tracing;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "gateway", version, about = "Distributed multi-tier rate limiting gateway")]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long, env = "GATEWAY_CONFIG", default_value = "config/gateway.yaml")]
    config: PathBuf,

    /// Validate the configuration and exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = match load_config(&cli.config).await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if cli.check {
        println!("Configuration OK: {}", cli.config.display());
        return ExitCode::SUCCESS;
    }

    if let Err(e) = init_tracing(config.logging()) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    match run_server(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Display, not Debug, keeps multi-line messages readable
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
