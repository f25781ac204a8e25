//! Web application for the Callgate call-gating service.
//!
//! Thin HTTP surface around the monitoring core: OAuth login flows for the
//! admin and end users, the geolocation report endpoint that feeds the
//! permission state, and the administrative trigger that starts call
//! monitoring.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod monitoring;
pub mod permissions;
pub mod routes;
pub mod state;

pub use error::ServerError;
pub use routes::create_router;
pub use state::AppState;
