//! Normalization of raw call-event payloads.
//!
//! The upstream event schema is untrusted and only partially documented:
//! every key may be absent, and scalar fields sometimes arrive wrapped in a
//! `{"#text": ...}` object. Classification is therefore total: a missing
//! field becomes `None`, an unrecognized discriminator becomes
//! [`CallEventKind::Unknown`], and only a payload that is not an object at
//! all is rejected. A classification failure must never stop the ingestion
//! loop.

use crate::error::ClassificationError;
use serde_json::Value;

const RECEIVED_DISCRIMINATOR: &str = "xsi:CallReceivedEvent";
const ORIGINATED_DISCRIMINATOR: &str = "xsi:CallOriginatedEvent";

/// Kind of a normalized call event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallEventKind {
    /// Inbound call to a monitored user.
    Received,
    /// Outbound call from a monitored user.
    Originated,
    /// Anything else, including a missing discriminator. Ignored downstream.
    Unknown,
}

impl CallEventKind {
    /// Whether this kind drives an admission decision.
    pub fn is_actionable(&self) -> bool {
        matches!(self, Self::Received | Self::Originated)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "call-received",
            Self::Originated => "call-originated",
            Self::Unknown => "unknown",
        }
    }
}

/// Normalized call event. Ephemeral: produced and consumed within one
/// ingestion cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallEvent {
    pub kind: CallEventKind,
    /// Raw discriminator, kept for diagnostics.
    pub raw_kind: Option<String>,
    pub call_id: Option<String>,
    /// Internal identity of the remote party as reported by the event.
    pub caller_id: Option<String>,
    /// Internal identity of the subscription target.
    pub target_id: Option<String>,
}

/// Classify one raw event payload.
pub fn classify(raw: &Value) -> Result<CallEvent, ClassificationError> {
    if !raw.is_object() {
        return Err(ClassificationError::NotAnObject);
    }

    let event = raw.get("xsi:Event");
    let event_data = event.and_then(|e| e.get("xsi:eventData"));

    let raw_kind = event_data
        .and_then(|d| d.get("@xsi1:type"))
        .and_then(as_text);
    let kind = match raw_kind.as_deref() {
        Some(RECEIVED_DISCRIMINATOR) => CallEventKind::Received,
        Some(ORIGINATED_DISCRIMINATOR) => CallEventKind::Originated,
        _ => CallEventKind::Unknown,
    };

    let call = event_data.and_then(|d| d.get("xsi:call"));
    let call_id = call.and_then(|c| c.get("xsi:callId")).and_then(as_text);
    let caller_id = call
        .and_then(|c| c.get("xsi:remoteParty"))
        .and_then(|p| p.get("xsi:userId"))
        .and_then(as_text);
    let target_id = event.and_then(|e| e.get("xsi:targetId")).and_then(as_text);

    Ok(CallEvent {
        kind,
        raw_kind,
        call_id,
        caller_id,
        target_id,
    })
}

/// Extract a non-empty text value, tolerating the `{"#text": ...}` wrapping
/// the upstream serializer sometimes produces.
fn as_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => Some(s.as_str()),
        Value::Object(map) => map.get("#text").and_then(Value::as_str),
        _ => None,
    };
    text.filter(|s| !s.is_empty()).map(str::to_string)
}
