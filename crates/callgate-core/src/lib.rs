use serde::{Deserialize, Serialize};

// Configuration types shared across all Callgate crates
pub mod config;
pub mod geofence;

pub use config::{
    CallgateConfig, ConfigError, MonitorConfig, ServerConfig, StorageConfig, WebexConfig,
};
pub use geofence::BoundingBox;

/// OAuth credential for the organization admin, stored as a single
/// replace-on-write record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminToken {
    pub access_token: String,
    /// Access-token lifetime in seconds, as reported by the token endpoint.
    pub expires_in: i64,
    pub refresh_token: String,
    /// Refresh-token lifetime in seconds, counted from `acquired_at`.
    pub refresh_token_expires_in: i64,
    pub token_type: String,
    pub scope: String,
    /// Epoch seconds at which the access token expires.
    pub expires_at: i64,
    /// Epoch seconds at which the token pair was obtained.
    pub acquired_at: i64,
    /// Web session token bound to the admin's browser session.
    pub session_token: String,
}

impl AdminToken {
    /// Whether the access token has expired at `now` (epoch seconds).
    pub fn is_expired(&self, now: i64) -> bool {
        now > self.expires_at
    }

    /// Whether the refresh token has expired at `now` (epoch seconds).
    pub fn is_refresh_expired(&self, now: i64) -> bool {
        now > self.acquired_at + self.refresh_token_expires_in
    }

    /// A token is usable when neither the access token nor the refresh token
    /// has expired.
    pub fn is_usable(&self, now: i64) -> bool {
        !self.is_expired(now) && !self.is_refresh_expired(now)
    }
}

/// Mapping from a platform account identity to its web session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSession {
    pub account_id: String,
    pub session_token: String,
}

/// Allow-list entry for one account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllowEntry {
    pub account_id: String,
    pub allow_caller: bool,
}

/// One reported geolocation sample. Only the latest sample per account is
/// retained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationSample {
    pub account_id: String,
    pub session_token: String,
    /// Client-reported wall-clock time (opaque, for diagnostics only).
    pub reported_at: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Epoch seconds at which the sample was recorded server-side. Staleness
    /// is evaluated against this field.
    pub last_update: i64,
}
