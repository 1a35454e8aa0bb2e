//! Command-line interface definition for aps-auth
//!
//! This module defines the CLI structure using clap's derive API.

use clap::{Parser, Subcommand};

/// aps-auth - Three-legged OAuth login for Autodesk Platform Services
///
/// Credentials are read from `APS_CLIENT_ID` and `APS_CLIENT_SECRET`
/// (or the `credentials` section of the config file).
#[derive(Parser, Debug, Clone)]
#[command(name = "aps-auth")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for aps-auth
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the browser login and print the resulting token
    Login {
        /// Redirect URI to listen on
        #[arg(long)]
        callback_url: Option<String>,

        /// Space-delimited scopes to request
        #[arg(long)]
        scopes: Option<String>,

        /// Seconds to wait for the browser callback (0 waits forever)
        #[arg(long)]
        timeout_seconds: Option<u64>,

        /// Print the authorization URL without launching a browser
        #[arg(long)]
        no_browser: bool,
    },

    /// Print the authorization URL only
    Url {
        /// Redirect URI the provider should send the browser to
        #[arg(long)]
        callback_url: Option<String>,

        /// Space-delimited scopes to request
        #[arg(long)]
        scopes: Option<String>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            command: Commands::Login {
                callback_url: None,
                scopes: None,
                timeout_seconds: None,
                no_browser: false,
            },
        }
    }
}
