//! aps-auth - Three-legged OAuth login for Autodesk Platform Services
//!
//! Main entry point for the aps-auth command.

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use aps_auth::cli::{Cli, Commands};
use aps_auth::commands;
use aps_auth::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    match cli.command {
        Commands::Login { .. } => {
            tracing::info!("Starting login");
            commands::login::run(config).await?;
            Ok(())
        }
        Commands::Url { .. } => {
            commands::authorize_url::run(&config)?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
///
/// Logs go to stderr so stdout carries only the command output.
fn init_tracing(verbose: bool) {
    let default_level = if verbose {
        "aps_auth=debug"
    } else {
        "aps_auth=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
