//! Authorization code exchange at the token endpoint

use crate::auth::credentials::Credentials;
use crate::auth::token::Token;
use crate::error::{ApsAuthError, Result};

/// Performs the single `authorization_code` grant request.
///
/// # Examples
///
/// ```no_run
/// use aps_auth::auth::authorize::TOKEN_URL;
/// use aps_auth::auth::credentials::Credentials;
/// use aps_auth::auth::exchange::TokenExchanger;
///
/// # async fn example() -> aps_auth::error::Result<()> {
/// let exchanger = TokenExchanger::new(
///     reqwest::Client::new(),
///     TOKEN_URL,
///     Credentials::new("id", "secret"),
/// );
/// let token = exchanger
///     .exchange("code-from-callback", "http://localhost:8080/api/auth/callback")
///     .await?;
/// println!("{}", token.token_type);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TokenExchanger {
    http: reqwest::Client,
    token_url: String,
    credentials: Credentials,
}

impl TokenExchanger {
    /// Creates an exchanger posting to `token_url` with `credentials`
    pub fn new(
        http: reqwest::Client,
        token_url: impl Into<String>,
        credentials: Credentials,
    ) -> Self {
        Self {
            http,
            token_url: token_url.into(),
            credentials,
        }
    }

    /// Exchanges `code` for a [`Token`].
    ///
    /// The code is sent as received, including an empty code; the provider
    /// decides whether it is valid. `redirect_uri` must be the exact value
    /// used in the authorization URL.
    ///
    /// # Errors
    ///
    /// - [`ApsAuthError::Http`] if the request cannot be sent or the body
    ///   cannot be read.
    /// - [`ApsAuthError::TokenExchange`] on a non-success status, carrying
    ///   the raw response body.
    /// - [`ApsAuthError::TokenParse`] if the body is not a token document.
    pub async fn exchange(&self, code: &str, redirect_uri: &str) -> Result<Token> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("redirect_uri", redirect_uri),
        ];

        tracing::debug!(token_url = %self.token_url, redirect_uri, "Exchanging authorization code");

        let resp = self
            .http
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(ApsAuthError::Http)?;

        let status = resp.status();
        let body = resp.text().await.map_err(ApsAuthError::Http)?;

        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), "Token endpoint rejected the exchange");
            return Err(ApsAuthError::TokenExchange {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let token = Token::from_json(&body)?;
        tracing::info!(expires_in = token.expires_in, "Token exchange succeeded");
        Ok(token)
    }
}
