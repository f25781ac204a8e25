//! Traits at the telephony-platform boundary.
//!
//! The monitor never talks HTTP itself; it consumes these capabilities and
//! the Webex adapter (or a test fake) provides them.

use crate::error::SubscriptionError;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;

/// One member of the organization roster, as enumerated at monitor start.
#[derive(Clone)]
pub struct RosterMember {
    /// Identity used inside call events (XSI user id).
    pub internal_id: String,
    /// Stable platform account identity.
    pub account_id: String,
    pub display_name: String,
    pub phone_numbers: Vec<PhoneNumber>,
    /// Session handle for this member's calls.
    pub calls: Arc<dyn UserCalls>,
}

/// A phone number attached to a roster member.
#[derive(Debug, Clone)]
pub struct PhoneNumber {
    pub number: String,
    pub extension: Option<String>,
    pub primary: bool,
}

/// An in-progress call on a user's session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveCall {
    pub call_id: String,
}

/// Enumerates the monitored organization's members.
#[async_trait]
pub trait RosterSource: Send + Sync {
    async fn members(&self) -> anyhow::Result<Vec<RosterMember>>;
}

/// Per-user call operations: event-subscription activation, enumeration of
/// active calls, and hangup of a specific call.
#[async_trait]
pub trait UserCalls: Send + Sync {
    /// Activate this user's call-event subscription. Required before any
    /// events for the user will flow.
    async fn subscribe_events(&self) -> anyhow::Result<()>;

    async fn active_calls(&self) -> anyhow::Result<Vec<ActiveCall>>;

    async fn hangup(&self, call_id: &str) -> anyhow::Result<()>;
}

/// Organization-wide call-event feed.
///
/// `subscribe` opens the channel and issues the subscription for the given
/// event package in one setup step; raw events then arrive on the returned
/// receiver until the source shuts down.
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn subscribe(
        &self,
        package: &str,
    ) -> Result<mpsc::Receiver<serde_json::Value>, SubscriptionError>;
}
