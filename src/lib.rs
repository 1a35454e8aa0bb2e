//! aps-auth - Three-legged OAuth for Autodesk Platform Services
//!
//! This library runs one authorization-code flow: it sends the user to the
//! APS consent page, captures the redirect on a short-lived local listener,
//! exchanges the code for a token bundle and hands that bundle back.
//!
//! # Architecture
//!
//! - `auth`: URL construction, callback listener, code exchange, flow
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//! - `commands`: Handlers invoked by the binary
//!
//! # Example
//!
//! ```no_run
//! use aps_auth::{AuthOptions, Credentials, ThreeLeggedAuth};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let auth = ThreeLeggedAuth::new(Credentials::from_env());
//!     let token = auth.authorize(&AuthOptions::default()).await?;
//!     println!("expires in {}s", token.expires_in);
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;

// Re-export commonly used types
pub use auth::credentials::Credentials;
pub use auth::flow::{AuthOptions, PendingAuthorization, ThreeLeggedAuth};
pub use auth::token::Token;
pub use config::Config;
pub use error::{ApsAuthError, Result};
