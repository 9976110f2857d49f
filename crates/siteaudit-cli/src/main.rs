mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use siteaudit_config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = cli::Cli::parse();

    let (config_path, config) = match &cli.config {
        Some(path) => (path.clone(), Config::load_from(path)?),
        None => (Config::config_path(), Config::load()?),
    };

    match cli.command {
        cli::Commands::Audit(args) => commands::audit::handle(args, &config).await,
        cli::Commands::Rate { metric, value } => commands::rate::handle(metric, value),
        cli::Commands::Compat { snapshot, format } => {
            commands::compat::handle(snapshot, format, &config).await
        }
        cli::Commands::Responsive { snapshot, format } => {
            commands::responsive::handle(snapshot, format, &config).await
        }
        cli::Commands::Compare {
            current,
            previous,
            format,
        } => commands::compare::handle(current, previous, format, &config),
        cli::Commands::Config => commands::config::handle(&config_path, &config),
    }
}
