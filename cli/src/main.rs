mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use platform_client::BackendClient;
use platform_obs::{ObsConfig, init_tracing};
use products_crm::Crm;
use tracing::debug;

use crate::{commands::Command, config::AppConfig};

#[derive(Parser, Debug)]
#[command(name = "suite", version, about = "Operate the suite CRM backend from the terminal")]
struct Cli {
    /// Skip confirmation prompts for destructive actions.
    #[arg(long, short = 'y', global = true)]
    yes: bool,
    /// Log request details to stderr.
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
    /// Export traces to this OTLP/HTTP endpoint.
    #[arg(long, env = "OTLP_ENDPOINT", global = true)]
    otlp_endpoint: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let obs = ObsConfig {
        otlp_endpoint: cli.otlp_endpoint.clone(),
        ..ObsConfig::default()
    };
    init_tracing(obs.verbose(cli.verbose))?;

    // Commands that never reach the backend run without configuration.
    if let Some(result) = commands::run_offline(&cli.command) {
        return result;
    }

    let config = AppConfig::load()?;
    debug!(url = %config.backend.url(), "backend configured");
    let client = BackendClient::new(config.backend.clone())?;
    let crm = Crm::new(client, &config.buckets);
    let ctx = commands::Context {
        crm,
        config,
        assume_yes: cli.yes,
    };
    commands::run(cli.command, &ctx).await
}
