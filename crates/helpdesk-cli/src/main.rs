mod cli;
mod commands;
mod scenario;

use anyhow::Result;
use clap::Parser;
use helpdesk_config::Config;

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_path(path)?,
        None => Config::load()?,
    };

    match cli.command {
        cli::Commands::Run { scenario, latest } => {
            commands::run::handle(&config, &scenario, latest)
        }
        cli::Commands::Tickets {
            scenario,
            filter,
            json,
        } => commands::tickets::list(&config, &scenario, &filter, json),
        cli::Commands::Stats { scenario, json } => {
            commands::stats::handle(&config, &scenario, json)
        }
        cli::Commands::History { scenario, ticket } => {
            commands::tickets::history(&config, &scenario, ticket)
        }
    }
}
