//! Three-legged authorization code flow against APS
//!
//! # Flow overview
//!
//! 1. Resolve the callback URL and scopes (falling back to the defaults).
//! 2. Bind the local callback listener.
//! 3. Build the authorization URL, print it, and open it in the browser.
//! 4. Wait (bounded by the callback timeout) for the one redirect request.
//! 5. Exchange the code for a [`Token`] and answer the browser.
//! 6. Stop the listener, on every exit path.
//!
//! [`ThreeLeggedAuth::authorize`] runs all of it; [`ThreeLeggedAuth::start`]
//! and [`PendingAuthorization::finish`] split it at the wait so callers can
//! inspect the bound address and URL first.

use std::net::SocketAddr;
use std::time::Duration;

use url::Url;

use crate::auth::authorize::{
    build_authorization_url, resolve_callback_url, resolve_scopes, ProviderEndpoints,
};
use crate::auth::browser;
use crate::auth::callback::CallbackListener;
use crate::auth::credentials::Credentials;
use crate::auth::exchange::TokenExchanger;
use crate::auth::token::Token;
use crate::error::Result;

/// Default deadline for the browser callback.
pub const DEFAULT_CALLBACK_TIMEOUT: Duration = Duration::from_secs(300);

// ---------------------------------------------------------------------------
// AuthOptions
// ---------------------------------------------------------------------------

/// Per-invocation parameters of the flow.
///
/// # Examples
///
/// ```
/// use aps_auth::auth::flow::{AuthOptions, DEFAULT_CALLBACK_TIMEOUT};
///
/// let options = AuthOptions::default();
/// assert!(options.callback_url.is_none());
/// assert_eq!(options.callback_timeout, Some(DEFAULT_CALLBACK_TIMEOUT));
/// assert!(options.open_browser);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthOptions {
    /// Redirect URI to listen on; default callback URL when `None` or blank.
    pub callback_url: Option<String>,

    /// Space-delimited scopes; default scope list when `None` or blank.
    pub scopes: Option<String>,

    /// How long to wait for the callback. `None` waits indefinitely.
    pub callback_timeout: Option<Duration>,

    /// Whether to launch the system browser.
    pub open_browser: bool,
}

impl Default for AuthOptions {
    fn default() -> Self {
        Self {
            callback_url: None,
            scopes: None,
            callback_timeout: Some(DEFAULT_CALLBACK_TIMEOUT),
            open_browser: true,
        }
    }
}

// ---------------------------------------------------------------------------
// ThreeLeggedAuth
// ---------------------------------------------------------------------------

/// Drives the three-legged flow for one set of application credentials.
///
/// Holds no token state; every call to [`authorize`](Self::authorize)
/// returns a fresh [`Token`] by value.
///
/// # Examples
///
/// ```no_run
/// use aps_auth::auth::credentials::Credentials;
/// use aps_auth::auth::flow::{AuthOptions, ThreeLeggedAuth};
///
/// # async fn example() -> aps_auth::error::Result<()> {
/// let auth = ThreeLeggedAuth::new(Credentials::from_env());
/// let token = auth.authorize(&AuthOptions::default()).await?;
/// println!("Refresh token: {}", token.refresh_token);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ThreeLeggedAuth {
    http: reqwest::Client,
    credentials: Credentials,
    endpoints: ProviderEndpoints,
}

impl ThreeLeggedAuth {
    /// Creates a flow against the fixed APS endpoints
    pub fn new(credentials: Credentials) -> Self {
        Self {
            http: reqwest::Client::new(),
            credentials,
            endpoints: ProviderEndpoints::default(),
        }
    }

    /// Replaces the provider endpoints
    pub fn with_endpoints(mut self, endpoints: ProviderEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Replaces the HTTP client used for the token exchange
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// Builds the consent URL without binding anything.
    pub fn authorization_url(
        &self,
        callback_url: Option<&str>,
        scopes: Option<&str>,
    ) -> Result<Url> {
        build_authorization_url(
            &self.endpoints.authorize_url,
            &self.credentials.client_id,
            resolve_callback_url(callback_url),
            resolve_scopes(scopes),
        )
    }

    /// Binds the callback listener and sends the user to the consent page.
    ///
    /// # Errors
    ///
    /// Fails if the callback URL is invalid or its port cannot be bound.
    /// A browser that fails to open is logged, not returned.
    pub async fn start(&self, options: &AuthOptions) -> Result<PendingAuthorization> {
        if !self.credentials.is_complete() {
            tracing::warn!(
                "APS client id or secret is empty; the provider will reject the request"
            );
        }

        let callback_url = resolve_callback_url(options.callback_url.as_deref());
        let mut listener = CallbackListener::new(callback_url)?;
        let local_addr = listener.start().await?;

        let authorization_url = build_authorization_url(
            &self.endpoints.authorize_url,
            &self.credentials.client_id,
            listener.redirect_uri(),
            resolve_scopes(options.scopes.as_deref()),
        )?;

        tracing::info!(
            callback = listener.redirect_uri(),
            %local_addr,
            "Listening for callback"
        );
        tracing::debug!(url = %authorization_url, "Authorization URL");

        eprintln!(
            "Open the following URL in your browser to authorize:\n{}",
            authorization_url
        );
        if options.open_browser {
            browser::try_open(authorization_url.as_str());
        }

        Ok(PendingAuthorization {
            exchanger: TokenExchanger::new(
                self.http.clone(),
                self.endpoints.token_url.clone(),
                self.credentials.clone(),
            ),
            listener,
            authorization_url,
            callback_timeout: options.callback_timeout,
        })
    }

    /// Runs the whole flow and returns the token.
    pub async fn authorize(&self, options: &AuthOptions) -> Result<Token> {
        self.start(options).await?.finish().await
    }
}

// ---------------------------------------------------------------------------
// PendingAuthorization
// ---------------------------------------------------------------------------

/// A started flow waiting for its browser callback.
///
/// Dropping it without calling [`finish`](Self::finish) releases the
/// listening socket.
#[derive(Debug)]
pub struct PendingAuthorization {
    listener: CallbackListener,
    exchanger: TokenExchanger,
    authorization_url: Url,
    callback_timeout: Option<Duration>,
}

impl PendingAuthorization {
    /// The consent URL the user must visit
    pub fn authorization_url(&self) -> &Url {
        &self.authorization_url
    }

    /// The redirect URI the listener answers on
    pub fn callback_url(&self) -> &str {
        self.listener.redirect_uri()
    }

    /// Address of the bound callback socket
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.local_addr()
    }

    /// Waits for the callback, exchanges the code and answers the browser.
    ///
    /// The listener is stopped before returning, whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns the timeout, exchange, or parse error of the failed step.
    pub async fn finish(mut self) -> Result<Token> {
        let result = self.complete().await;
        self.listener.stop();
        result
    }

    async fn complete(&mut self) -> Result<Token> {
        let request = self.listener.await_request(self.callback_timeout).await?;
        let redirect_uri = self.listener.redirect_uri().to_string();

        let exchanged = self.exchanger.exchange(request.code(), &redirect_uri).await;
        match exchanged {
            Ok(token) => {
                if let Err(e) = request.respond_success().await {
                    tracing::warn!(error = %e, "Failed to send confirmation page to the browser");
                }
                Ok(token)
            }
            Err(err) => {
                if let Err(e) = request.respond_failure().await {
                    tracing::warn!(error = %e, "Failed to send failure page to the browser");
                }
                Err(err)
            }
        }
    }
}
