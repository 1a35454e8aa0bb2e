//! Configuration management for aps-auth
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.
//! Later sources win: file, then environment, then command line.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::auth::authorize::{DEFAULT_CALLBACK_URL, DEFAULT_SCOPES};
use crate::auth::credentials::{Credentials, CLIENT_ID_ENV, CLIENT_SECRET_ENV};
use crate::auth::flow::{AuthOptions, DEFAULT_CALLBACK_TIMEOUT};
use crate::cli::{Cli, Commands};
use crate::error::{ApsAuthError, Result};

/// Main configuration structure for aps-auth
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Application credentials
    #[serde(default)]
    pub credentials: Credentials,

    /// Flow settings
    #[serde(default)]
    pub auth: AuthConfig,
}

/// Settings of the authorization flow
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Redirect URI the local listener binds
    #[serde(default = "default_callback_url")]
    pub callback_url: String,

    /// Space-delimited scopes to request
    #[serde(default = "default_scopes")]
    pub scopes: String,

    /// Seconds to wait for the browser callback; 0 waits forever
    #[serde(default = "default_callback_timeout_seconds")]
    pub callback_timeout_seconds: u64,

    /// Launch the system browser automatically
    #[serde(default = "default_open_browser")]
    pub open_browser: bool,
}

fn default_callback_url() -> String {
    DEFAULT_CALLBACK_URL.to_string()
}

fn default_scopes() -> String {
    DEFAULT_SCOPES.to_string()
}

fn default_callback_timeout_seconds() -> u64 {
    DEFAULT_CALLBACK_TIMEOUT.as_secs()
}

fn default_open_browser() -> bool {
    true
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            callback_url: default_callback_url(),
            scopes: default_scopes(),
            callback_timeout_seconds: default_callback_timeout_seconds(),
            open_browser: default_open_browser(),
        }
    }
}

impl AuthConfig {
    /// The callback deadline, or `None` when configured as `0`
    pub fn callback_timeout(&self) -> Option<Duration> {
        match self.callback_timeout_seconds {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// A missing file is not an error; defaults are used instead.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ApsAuthError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| ApsAuthError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(client_id) = std::env::var(CLIENT_ID_ENV) {
            self.credentials.client_id = client_id;
        }

        if let Ok(client_secret) = std::env::var(CLIENT_SECRET_ENV) {
            self.credentials.client_secret = client_secret;
        }

        if let Ok(callback_url) = std::env::var("APS_CALLBACK_URL") {
            self.auth.callback_url = callback_url;
        }

        if let Ok(scopes) = std::env::var("APS_SCOPES") {
            self.auth.scopes = scopes;
        }

        if let Ok(timeout) = std::env::var("APS_CALLBACK_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.auth.callback_timeout_seconds = value;
            } else {
                tracing::warn!("Invalid APS_CALLBACK_TIMEOUT_SECONDS: {}", timeout);
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &Cli) {
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }

        match &cli.command {
            Commands::Login {
                callback_url,
                scopes,
                timeout_seconds,
                no_browser,
            } => {
                self.override_url_and_scopes(callback_url.as_deref(), scopes.as_deref());
                if let Some(timeout) = timeout_seconds {
                    self.auth.callback_timeout_seconds = *timeout;
                }
                if *no_browser {
                    self.auth.open_browser = false;
                }
            }
            Commands::Url {
                callback_url,
                scopes,
            } => {
                self.override_url_and_scopes(callback_url.as_deref(), scopes.as_deref());
            }
        }
    }

    fn override_url_and_scopes(&mut self, callback_url: Option<&str>, scopes: Option<&str>) {
        if let Some(url) = callback_url {
            self.auth.callback_url = url.to_string();
        }
        if let Some(scopes) = scopes {
            self.auth.scopes = scopes.to_string();
        }
    }

    /// Validate the configuration
    ///
    /// Only the callback URL is checked. Missing credentials are allowed
    /// through; the provider rejects them.
    ///
    /// # Errors
    ///
    /// Returns error if the callback URL is not an `http` URL with a host
    pub fn validate(&self) -> Result<()> {
        let callback_url = self.auth.callback_url.trim();
        if callback_url.is_empty() {
            // Blank falls back to the default callback URL.
            return Ok(());
        }

        let url = Url::parse(callback_url).map_err(|e| {
            ApsAuthError::Config(format!("Invalid callback_url '{}': {}", callback_url, e))
        })?;

        if url.scheme() != "http" {
            return Err(ApsAuthError::Config(format!(
                "callback_url must use http, got '{}'",
                url.scheme()
            ))
            .into());
        }

        if url.host().is_none() {
            return Err(
                ApsAuthError::Config("callback_url must include a host".to_string()).into(),
            );
        }

        Ok(())
    }

    /// Flow options derived from this configuration
    pub fn auth_options(&self) -> AuthOptions {
        AuthOptions {
            callback_url: Some(self.auth.callback_url.clone()),
            scopes: Some(self.auth.scopes.clone()),
            callback_timeout: self.auth.callback_timeout(),
            open_browser: self.auth.open_browser,
        }
    }
}
