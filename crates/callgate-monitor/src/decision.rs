//! Admission decision engine.
//!
//! Given a normalized event and the directory snapshot, determines whether
//! the call is wholly internal (always allowed) or has an external leg, in
//! which case the internal party's permission decides the verdict.

use crate::classifier::{CallEvent, CallEventKind};
use crate::directory::{DirectoryEntry, DirectorySnapshot};
use crate::error::DecisionError;
use crate::permission::PermissionOracle;
use std::sync::Arc;

/// Deny reason attached to geofence verdicts.
pub const REASON_GEOFENCE: &str = "geofence";

/// Outcome of an admission decision. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    /// The call must be terminated. Carries the identity the actuator needs
    /// to end precisely this user's call.
    Deny {
        internal_id: String,
        call_id: Option<String>,
        reason: &'static str,
    },
}

/// Decides whether a call may proceed.
pub struct DecisionEngine {
    directory: Arc<DirectorySnapshot>,
    oracle: PermissionOracle,
}

impl DecisionEngine {
    pub fn new(directory: Arc<DirectorySnapshot>, oracle: PermissionOracle) -> Self {
        Self { directory, oracle }
    }

    /// Issue a verdict for one event. `Ok(None)` means the event needs no
    /// decision (not actionable, or no internal party is involved).
    pub async fn decide(&self, event: &CallEvent) -> Result<Option<Verdict>, DecisionError> {
        if !event.kind.is_actionable() {
            return Ok(None);
        }

        let caller = self.resolve(event.caller_id.as_deref());
        let target = self.resolve(event.target_id.as_deref());

        match (caller, target) {
            // Both parties internal: the geofence policy only guards calls
            // with an external leg.
            (Some(caller), Some(target)) => {
                tracing::info!(
                    caller = %caller.display_name,
                    target = %target.display_name,
                    call_id = ?event.call_id,
                    "both parties internal, allowing call"
                );
                Ok(Some(Verdict::Allow))
            }

            // Exactly one party internal: that party's permission decides.
            (Some(internal), None) | (None, Some(internal)) => {
                Ok(Some(self.decide_external_leg(event, internal).await))
            }

            (None, None) => {
                if event.caller_id.is_none() && event.target_id.is_none() {
                    // Actionable event with no party to evaluate. Known
                    // upstream-schema ambiguity; surfaced so the loop logs it.
                    return Err(DecisionError::NoParties {
                        kind: event.kind.as_str(),
                        call_id: event.call_id.clone(),
                    });
                }
                tracing::debug!(
                    caller = ?event.caller_id,
                    target = ?event.target_id,
                    "no party resolves in the directory, ignoring fully external call"
                );
                Ok(None)
            }
        }
    }

    async fn decide_external_leg(&self, event: &CallEvent, internal: &DirectoryEntry) -> Verdict {
        let direction = match event.kind {
            CallEventKind::Received => "inbound",
            _ => "outbound",
        };

        if self.oracle.is_permitted(&internal.account_id).await {
            tracing::info!(
                direction,
                account_id = %internal.account_id,
                call_id = ?event.call_id,
                "internal user is permitted, allowing {direction} call"
            );
            Verdict::Allow
        } else {
            tracing::info!(
                direction,
                account_id = %internal.account_id,
                call_id = ?event.call_id,
                "internal user is not permitted, blocking {direction} call"
            );
            Verdict::Deny {
                internal_id: internal.internal_id.clone(),
                call_id: event.call_id.clone(),
                reason: REASON_GEOFENCE,
            }
        }
    }

    fn resolve(&self, id: Option<&str>) -> Option<&DirectoryEntry> {
        id.and_then(|id| self.directory.get(id))
    }
}
