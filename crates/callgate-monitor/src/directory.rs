//! Immutable snapshot of the monitored organization's users.
//!
//! Built once when monitoring starts and never mutated afterwards, so the
//! ingestion loop reads it without locking.

use crate::error::DirectoryBuildError;
use crate::platform::{RosterSource, UserCalls};
use std::collections::HashMap;
use std::sync::Arc;

/// One monitored user.
#[derive(Clone)]
pub struct DirectoryEntry {
    /// Identity used inside call events.
    pub internal_id: String,
    /// Stable platform account identity, used for permission lookups.
    pub account_id: String,
    pub display_name: String,
    /// Primary phone number; `None` when the member has no number assigned.
    pub phone_number: Option<String>,
    pub extension: Option<String>,
    /// Session handle used to enumerate and hang up this user's calls.
    pub calls: Arc<dyn UserCalls>,
}

/// Mapping from internal call identity to [`DirectoryEntry`], fixed for the
/// lifetime of one monitoring session.
pub struct DirectorySnapshot {
    entries: HashMap<String, DirectoryEntry>,
}

impl DirectorySnapshot {
    /// Enumerate the roster and activate each member's call-event
    /// subscription. A member whose activation fails is logged and skipped;
    /// only an unreachable roster is fatal.
    pub async fn build(roster: &dyn RosterSource) -> Result<Self, DirectoryBuildError> {
        let members = roster.members().await?;
        let mut entries = HashMap::with_capacity(members.len());

        for member in members {
            if let Err(e) = member.calls.subscribe_events().await {
                tracing::warn!(
                    internal_id = %member.internal_id,
                    name = %member.display_name,
                    error = %e,
                    "skipping member: event subscription activation failed"
                );
                continue;
            }

            let primary = member
                .phone_numbers
                .iter()
                .find(|n| n.primary)
                .or_else(|| member.phone_numbers.first());

            let entry = DirectoryEntry {
                internal_id: member.internal_id.clone(),
                account_id: member.account_id,
                display_name: member.display_name,
                phone_number: primary.map(|n| n.number.clone()),
                extension: primary.and_then(|n| n.extension.clone()),
                calls: member.calls,
            };
            entries.insert(member.internal_id, entry);
        }

        tracing::info!(users = entries.len(), "directory snapshot built");
        Ok(Self { entries })
    }

    /// Assemble a snapshot from pre-built entries, bypassing roster
    /// enumeration and subscription activation. Production code uses
    /// [`DirectorySnapshot::build`].
    pub fn from_entries(entries: impl IntoIterator<Item = DirectoryEntry>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|e| (e.internal_id.clone(), e))
                .collect(),
        }
    }

    /// Look up a member by internal call identity.
    pub fn get(&self, internal_id: &str) -> Option<&DirectoryEntry> {
        self.entries.get(internal_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DirectoryEntry> {
        self.entries.values()
    }
}
