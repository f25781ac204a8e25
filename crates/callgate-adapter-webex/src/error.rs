//! Error types for the Webex adapter.

use thiserror::Error;

/// Errors that can occur talking to the Webex APIs.
#[derive(Debug, Error)]
pub enum WebexError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Webex API returned {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("missing field in API response: {0}")]
    MissingField(&'static str),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}
