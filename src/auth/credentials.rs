//! Application credentials for the APS token endpoint

use std::fmt;

use serde::{Deserialize, Serialize};

/// Environment variable holding the APS client id.
pub const CLIENT_ID_ENV: &str = "APS_CLIENT_ID";

/// Environment variable holding the APS client secret.
pub const CLIENT_SECRET_ENV: &str = "APS_CLIENT_SECRET";

/// Client id and secret of a registered APS application.
///
/// Supplied once, never persisted by this crate. The secret is redacted
/// from `Debug` output and skipped when serializing, so credentials can sit
/// inside logged or written-out structs.
///
/// # Examples
///
/// ```
/// use aps_auth::auth::credentials::Credentials;
///
/// let creds = Credentials::new("my-id", "my-secret");
/// assert!(creds.is_complete());
/// assert!(!format!("{:?}", creds).contains("my-secret"));
/// ```
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Application client id
    #[serde(default)]
    pub client_id: String,

    /// Application client secret, never serialized
    #[serde(default, skip_serializing)]
    pub client_secret: String,
}

impl Credentials {
    /// Creates credentials from an id/secret pair
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Reads `APS_CLIENT_ID` and `APS_CLIENT_SECRET`.
    ///
    /// Missing variables become empty strings; nothing is validated here and
    /// the provider rejects incomplete credentials downstream.
    pub fn from_env() -> Self {
        Self {
            client_id: std::env::var(CLIENT_ID_ENV).unwrap_or_default(),
            client_secret: std::env::var(CLIENT_SECRET_ENV).unwrap_or_default(),
        }
    }

    /// Returns `true` when both the id and the secret are non-empty
    pub fn is_complete(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secret = if self.client_secret.is_empty() {
            "<empty>"
        } else {
            "<redacted>"
        };
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &secret)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_serialize_skips_secret() {
        let creds = Credentials::new("id", "s3cr3t");
        let yaml = serde_yaml::to_string(&creds).unwrap();
        assert!(yaml.contains("client_id: id"));
        assert!(!yaml.contains("s3cr3t"));
        assert!(!yaml.contains("client_secret"));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let creds = Credentials::new("id", "s3cr3t");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("id"));
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("s3cr3t"));
    }

    #[test]
    fn test_is_complete_requires_both_fields() {
        assert!(Credentials::new("id", "secret").is_complete());
        assert!(!Credentials::new("", "secret").is_complete());
        assert!(!Credentials::new("id", "").is_complete());
        assert!(!Credentials::default().is_complete());
    }

    #[test]
    #[serial]
    fn test_from_env_reads_both_variables() {
        std::env::set_var(CLIENT_ID_ENV, "env-id");
        std::env::set_var(CLIENT_SECRET_ENV, "env-secret");

        let creds = Credentials::from_env();

        std::env::remove_var(CLIENT_ID_ENV);
        std::env::remove_var(CLIENT_SECRET_ENV);

        assert_eq!(creds, Credentials::new("env-id", "env-secret"));
    }

    #[test]
    #[serial]
    fn test_from_env_missing_variables_are_empty() {
        std::env::remove_var(CLIENT_ID_ENV);
        std::env::remove_var(CLIENT_SECRET_ENV);

        let creds = Credentials::from_env();
        assert!(creds.client_id.is_empty());
        assert!(creds.client_secret.is_empty());
    }

    #[test]
    fn test_deserialize_with_missing_fields() {
        let creds: Credentials = serde_yaml::from_str("client_id: abc").unwrap();
        assert_eq!(creds.client_id, "abc");
        assert!(creds.client_secret.is_empty());
    }
}
