//! Webex implementation of the platform boundary.
//!
//! Three surfaces: the REST People API (roster enumeration), the XSI Actions
//! and Events APIs (per-user call control and the organization event
//! channel), and the OAuth authorization-code client used by the web layer.

pub mod client;
pub mod error;
pub mod events;
pub mod oauth;
pub mod roster;
pub mod xsi;

pub use client::{Person, WebexClient};
pub use error::WebexError;
pub use events::XsiEventSource;
pub use oauth::{OAuthClient, TokenResponse};
pub use roster::WebexRoster;
pub use xsi::XsiUserSession;
