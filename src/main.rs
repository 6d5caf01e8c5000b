use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use chanfeed::cli::{commands, Cli, Commands};
use chanfeed::config::{Config, ConfigError};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chanfeed=info")))
        .init();

    let cli = Cli::parse();
    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(ConfigError::CreatedTemplate(path)) => {
            println!("Wrote a template config to {}; edit it and run again", path.display());
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    match cli.command {
        Commands::Run => {
            tokio::select! {
                result = commands::run(config) => result?,
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Interrupted, exiting");
                }
            }
        }
        Commands::Check => commands::check(&config),
    }

    Ok(())
}
