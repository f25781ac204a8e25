//! Error types for the monitoring pipeline.
//!
//! The taxonomy mirrors the failure-isolation contract: directory-build and
//! subscription failures abort the single startup attempt; everything else is
//! recovered inside one loop iteration and never crosses the loop boundary.

use thiserror::Error;

/// Errors fatal to starting the monitor. An already-running monitor is never
/// affected by these.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error(transparent)]
    DirectoryBuild(#[from] DirectoryBuildError),

    #[error(transparent)]
    Subscription(#[from] SubscriptionError),
}

/// The roster source could not be enumerated at all.
#[derive(Debug, Error)]
#[error("failed to build directory snapshot: {0}")]
pub struct DirectoryBuildError(#[from] pub anyhow::Error);

/// Opening the event channel or subscribing to the event package failed.
#[derive(Debug, Error)]
pub enum SubscriptionError {
    #[error("failed to open event channel: {0}")]
    Channel(String),

    #[error("event subscription rejected: {0}")]
    Rejected(String),
}

/// The raw event payload could not be inspected at all. Payloads that are
/// objects but lack expected fields classify to an ignorable event instead.
#[derive(Debug, Error)]
pub enum ClassificationError {
    #[error("event payload is not a JSON object")]
    NotAnObject,
}

/// The decision engine had nothing to evaluate. Recovered by the loop as
/// "no verdict".
#[derive(Debug, Error)]
pub enum DecisionError {
    #[error("actionable {kind} event carries no party identifiers (call {call_id:?})")]
    NoParties {
        kind: &'static str,
        call_id: Option<String>,
    },
}

/// One failed hangup attempt. Termination continues past individual failures.
#[derive(Debug, Clone)]
pub struct HangupFailure {
    pub call_id: String,
    pub reason: String,
}

/// Call termination could not be completed. Always recovered by the loop;
/// the call may simply have ended on its own.
#[derive(Debug, Error)]
pub enum TerminationError {
    #[error("no directory entry for internal user {0}")]
    UnknownUser(String),

    #[error("failed to list active calls for internal user {internal_id}: {reason}")]
    ListCalls { internal_id: String, reason: String },

    #[error("{} of {attempted} hangup attempt(s) failed", .failures.len())]
    Hangups {
        attempted: usize,
        failures: Vec<HangupFailure>,
    },
}
