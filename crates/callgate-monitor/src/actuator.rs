//! Call termination actuator.
//!
//! Executes a deny verdict by ending the denied user's active calls through
//! their platform session handle. Termination is best effort: the call may
//! already have ended naturally, and one failing hangup must not prevent
//! attempting the others.

use crate::directory::DirectorySnapshot;
use crate::error::{HangupFailure, TerminationError};
use std::sync::Arc;

/// Ends calls for users the decision engine has denied.
pub struct CallTerminator {
    directory: Arc<DirectorySnapshot>,
}

impl CallTerminator {
    pub fn new(directory: Arc<DirectorySnapshot>) -> Self {
        Self { directory }
    }

    /// Hang up every active call on the user's session, accumulating per-call
    /// failures instead of aborting at the first one.
    pub async fn terminate(
        &self,
        internal_id: &str,
        call_id: Option<&str>,
    ) -> Result<(), TerminationError> {
        let entry = self
            .directory
            .get(internal_id)
            .ok_or_else(|| TerminationError::UnknownUser(internal_id.to_string()))?;

        let active = entry.calls.active_calls().await.map_err(|e| {
            TerminationError::ListCalls {
                internal_id: internal_id.to_string(),
                reason: e.to_string(),
            }
        })?;

        if active.is_empty() {
            tracing::info!(internal_id, call_id = ?call_id, "no active calls to terminate");
            return Ok(());
        }

        let attempted = active.len();
        let mut failures = Vec::new();
        for call in active {
            match entry.calls.hangup(&call.call_id).await {
                Ok(()) => {
                    tracing::info!(internal_id, call_id = %call.call_id, "ended call");
                }
                Err(e) => {
                    tracing::warn!(internal_id, call_id = %call.call_id, error = %e, "failed to end call");
                    failures.push(HangupFailure {
                        call_id: call.call_id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(TerminationError::Hangups {
                attempted,
                failures,
            })
        }
    }
}
