//! Token bundle returned by the APS token endpoint

use serde::{Deserialize, Serialize};

use crate::error::{ApsAuthError, Result};

/// Access/refresh token pair issued for one authorization code.
///
/// Built only from a successful token endpoint response and handed to the
/// caller by value. Extra fields in the response (`id_token`, `scope`, ...)
/// are ignored.
///
/// # Examples
///
/// ```
/// use aps_auth::auth::token::Token;
///
/// let token = Token::from_json(
///     r#"{"access_token":"a","token_type":"Bearer","expires_in":3600,"refresh_token":"r"}"#,
/// )
/// .unwrap();
///
/// assert_eq!(token.access_token, "a");
/// assert_eq!(token.expires_in, 3600);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Bearer token for APS API calls
    pub access_token: String,

    /// Token type, `"Bearer"` for APS
    pub token_type: String,

    /// Lifetime of the access token in seconds
    pub expires_in: u64,

    /// Token usable for a later refresh grant
    pub refresh_token: String,
}

impl Token {
    /// Parses a token endpoint response body.
    ///
    /// # Errors
    ///
    /// Returns [`ApsAuthError::TokenParse`] if the body is not JSON or lacks
    /// one of the four expected fields.
    pub fn from_json(body: &str) -> Result<Self> {
        serde_json::from_str(body).map_err(|e| ApsAuthError::TokenParse(e).into())
    }
}
