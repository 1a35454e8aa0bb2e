//! APS three-legged OAuth
//!
//! # Module Layout
//!
//! - [`authorize`]   -- Consent URL construction, endpoints and defaults
//! - [`browser`]     -- Best-effort system browser launch
//! - [`callback`]    -- Single-shot local listener for the redirect
//! - [`credentials`] -- Client id / secret pair
//! - [`exchange`]    -- Authorization code to token exchange
//! - [`flow`]        -- Orchestration of the whole flow
//! - [`token`]       -- Token bundle returned to the caller

pub mod authorize;
pub mod browser;
pub mod callback;
pub mod credentials;
pub mod exchange;
pub mod flow;
pub mod token;
