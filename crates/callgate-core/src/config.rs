//! Configuration types for the Callgate service.
//!
//! Configuration is loaded from a single YAML file (`callgate.yaml`) and
//! shared across all crates. Secrets (the OAuth client secret) live in the
//! file; do not commit a populated config.

use crate::geofence::BoundingBox;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Complete Callgate configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallgateConfig {
    /// Project name, for logs and page titles.
    #[serde(default)]
    pub project: Option<String>,

    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Webex integration settings.
    pub webex: WebexConfig,

    /// Permitted region.
    #[serde(default = "default_geofence")]
    pub geofence: BoundingBox,

    /// Call-monitor settings.
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// Persistence settings.
    #[serde(default)]
    pub storage: StorageConfig,
}

impl CallgateConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(ConfigError::from)
    }

    /// OAuth redirect URI for the user login flow.
    pub fn user_redirect_uri(&self) -> String {
        format!("{}/user/callback", self.server.public_url)
    }

    /// OAuth redirect URI for the admin login flow.
    pub fn admin_redirect_uri(&self) -> String {
        format!("{}/admin/callback", self.server.public_url)
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port to listen on.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Externally reachable base URL, used to build OAuth redirect URIs.
    #[serde(default = "default_public_url")]
    pub public_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_port: default_listen_port(),
            public_url: default_public_url(),
        }
    }
}

/// Webex integration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebexConfig {
    /// OAuth integration client id.
    pub client_id: String,

    /// OAuth integration client secret.
    pub client_secret: String,

    /// Platform user id of the one account allowed to act as admin.
    pub admin_user_id: String,

    /// OAuth scopes requested during login.
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,

    /// Authorization endpoint.
    #[serde(default = "default_authorization_url")]
    pub authorization_url: String,

    /// Token endpoint.
    #[serde(default = "default_token_url")]
    pub token_url: String,

    /// REST API base URL.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// XSI Actions API base URL for the organization.
    pub xsi_actions_url: String,

    /// XSI Events API base URL for the organization.
    pub xsi_events_url: String,
}

/// Call-monitor settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// A location sample older than this many seconds no longer grants
    /// permission. The boundary is inclusive.
    #[serde(default = "default_staleness_timeout")]
    pub staleness_timeout_secs: i64,

    /// Event package subscribed to on the events channel.
    #[serde(default = "default_event_package")]
    pub event_package: String,

    /// Pause after each processed event, to smooth bursts.
    #[serde(default = "default_event_pause_ms")]
    pub event_pause_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            staleness_timeout_secs: default_staleness_timeout(),
            event_package: default_event_package(),
            event_pause_ms: default_event_pause_ms(),
        }
    }
}

/// Persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            sqlite_path: default_sqlite_path(),
        }
    }
}

// Default value functions
fn default_listen_port() -> u16 {
    8000
}

fn default_public_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_scopes() -> Vec<String> {
    [
        "spark:all",
        "spark-admin:xsi",
        "spark:xsi",
        "spark-admin:locations_read",
        "spark-admin:people_read",
        "spark-admin:licenses_read",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

fn default_authorization_url() -> String {
    "https://api.ciscospark.com/v1/authorize".to_string()
}

fn default_token_url() -> String {
    "https://api.ciscospark.com/v1/access_token".to_string()
}

fn default_api_base() -> String {
    "https://webexapis.com/v1".to_string()
}

fn default_geofence() -> BoundingBox {
    BoundingBox {
        lat_min: 10.0,
        lat_max: 20.0,
        lon_min: 30.0,
        lon_max: 100.0,
    }
}

fn default_staleness_timeout() -> i64 {
    30
}

fn default_event_package() -> String {
    "Advanced Call".to_string()
}

fn default_event_pause_ms() -> u64 {
    500
}

fn default_sqlite_path() -> String {
    "callgate.db".to_string()
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}
