//! Authorization URL construction for the APS consent page
//!
//! The consent URL carries exactly four query parameters: `response_type`,
//! `client_id`, `redirect_uri` and `scope`. Values are form-urlencoded so a
//! client id containing `&` or a scope list containing spaces cannot corrupt
//! the query string.

use url::Url;

use crate::error::{ApsAuthError, Result};

/// APS authorization (consent) endpoint.
pub const AUTHORIZE_URL: &str = "https://developer.api.autodesk.com/authentication/v2/authorize";

/// APS token endpoint.
pub const TOKEN_URL: &str = "https://developer.api.autodesk.com/authentication/v2/token";

/// Callback URL used when the caller does not supply one.
pub const DEFAULT_CALLBACK_URL: &str = "http://localhost:8080/api/auth/callback";

/// Scopes requested when the caller does not supply any.
pub const DEFAULT_SCOPES: &str = "data:read data:write data:create data:search bucket:create bucket:read bucket:update bucket:delete code:all";

// ---------------------------------------------------------------------------
// ProviderEndpoints
// ---------------------------------------------------------------------------

/// The two provider endpoints used by the flow.
///
/// [`Default`] yields the fixed APS endpoints. Overriding them is a library
/// concern only (tests point the token endpoint at a mock server); the
/// config file and CLI never expose it.
///
/// # Examples
///
/// ```
/// use aps_auth::auth::authorize::{ProviderEndpoints, TOKEN_URL};
///
/// let endpoints = ProviderEndpoints::default();
/// assert_eq!(endpoints.token_url, TOKEN_URL);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEndpoints {
    /// Consent page the browser is sent to.
    pub authorize_url: String,
    /// Endpoint the authorization code is exchanged at.
    pub token_url: String,
}

impl Default for ProviderEndpoints {
    fn default() -> Self {
        Self {
            authorize_url: AUTHORIZE_URL.to_string(),
            token_url: TOKEN_URL.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Returns `callback_url`, or [`DEFAULT_CALLBACK_URL`] when absent or blank.
pub fn resolve_callback_url(callback_url: Option<&str>) -> &str {
    match callback_url.map(str::trim) {
        Some(url) if !url.is_empty() => url,
        _ => DEFAULT_CALLBACK_URL,
    }
}

/// Returns `scopes`, or [`DEFAULT_SCOPES`] when absent or blank.
pub fn resolve_scopes(scopes: Option<&str>) -> &str {
    match scopes.map(str::trim) {
        Some(s) if !s.is_empty() => s,
        _ => DEFAULT_SCOPES,
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builds the consent URL the user's browser is sent to.
///
/// # Arguments
///
/// * `authorize_url` - The provider's authorization endpoint
/// * `client_id` - Application client id, passed through as-is
/// * `callback_url` - Redirect URI the provider sends the browser back to
/// * `scopes` - Space-delimited scope list
///
/// # Errors
///
/// Returns an error only if `authorize_url` itself is not a valid URL.
///
/// # Examples
///
/// ```
/// use aps_auth::auth::authorize::{build_authorization_url, AUTHORIZE_URL};
///
/// let url = build_authorization_url(
///     AUTHORIZE_URL,
///     "my-client",
///     "http://localhost:8080/api/auth/callback",
///     "data:read",
/// )
/// .unwrap();
///
/// assert!(url.as_str().starts_with(AUTHORIZE_URL));
/// assert!(url.as_str().contains("response_type=code"));
/// ```
pub fn build_authorization_url(
    authorize_url: &str,
    client_id: &str,
    callback_url: &str,
    scopes: &str,
) -> Result<Url> {
    let mut url = Url::parse(authorize_url).map_err(ApsAuthError::Url)?;

    url.query_pairs_mut()
        .clear()
        .append_pair("response_type", "code")
        .append_pair("client_id", client_id)
        .append_pair("redirect_uri", callback_url)
        .append_pair("scope", scopes);

    Ok(url)
}
