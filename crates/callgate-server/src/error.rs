//! Error types for the web layer.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use callgate_store::StoreError;
use serde_json::json;
use thiserror::Error;

/// Errors surfaced by route handlers.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The request carried no recognized session token.
    #[error("invalid session token")]
    InvalidSession,

    /// The caller is not the authenticated admin.
    #[error("unauthorized access, admin login required")]
    AdminRequired,

    /// The reported coordinates fall outside the permitted region.
    #[error("user location outside the boundaries of the permitted region")]
    OutOfBounds,

    /// No stored admin credential, or it has expired.
    #[error("invalid or expired admin token")]
    AdminTokenInvalid,

    /// An OAuth exchange failed.
    #[error("OAuth error: {0}")]
    OAuth(String),

    /// Monitor startup failed.
    #[error("failed to initiate call monitoring: {0}")]
    MonitorStartup(String),

    /// Database error.
    #[error("database error: {0}")]
    Store(#[from] StoreError),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServerError::InvalidSession => StatusCode::UNAUTHORIZED,
            ServerError::AdminRequired
            | ServerError::OutOfBounds
            | ServerError::AdminTokenInvalid => StatusCode::FORBIDDEN,
            ServerError::OAuth(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(json!({ "message": self.to_string() }))).into_response()
    }
}
