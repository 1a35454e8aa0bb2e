/*!
Command handlers for the CLI

- `login`         — Run the three-legged flow and print the token summary
- `authorize_url` — Print the consent URL only
*/

use anyhow::Context;

use crate::auth::flow::ThreeLeggedAuth;
use crate::auth::token::Token;
use crate::config::Config;
use crate::error::Result;

// Login command handler
pub mod login {
    //! Browser login handler.
    //!
    //! Runs one authorization flow with the configured credentials and
    //! prints the refresh token and expiry on success.

    use super::*;

    /// Run the login flow
    ///
    /// # Arguments
    ///
    /// * `config` - Loaded and validated configuration
    pub async fn run(config: Config) -> Result<()> {
        let auth = ThreeLeggedAuth::new(config.credentials.clone());
        let token = run_with(&auth, &config).await?;
        println!("{}", format_token_summary(&token));
        Ok(())
    }

    /// Runs the flow with a prepared [`ThreeLeggedAuth`]
    ///
    /// A failure is returned with `Authentication failed` context and is
    /// printed once, by the caller.
    pub async fn run_with(auth: &ThreeLeggedAuth, config: &Config) -> Result<Token> {
        let options = config.auth_options();
        tracing::info!("Starting APS three-legged authorization");

        auth.authorize(&options)
            .await
            .context("Authentication failed")
    }

    /// Console summary printed after a successful login
    pub fn format_token_summary(token: &Token) -> String {
        format!(
            "Authentication successful.\nRefresh token: {}\nExpires In: {}",
            token.refresh_token, token.expires_in
        )
    }

}

// Authorization URL command handler
pub mod authorize_url {
    use super::*;

    /// Print the authorization URL for the configured callback and scopes
    pub fn run(config: &Config) -> Result<()> {
        let auth = ThreeLeggedAuth::new(config.credentials.clone());
        let url = auth.authorization_url(
            Some(config.auth.callback_url.as_str()),
            Some(config.auth.scopes.as_str()),
        )?;
        println!("{}", url);
        Ok(())
    }
}
