//! Per-user XSI session: call enumeration, hangup, and event-subscription
//! activation against the XSI Actions/Events APIs.
//!
//! XSI responses are requested as JSON but keep their XML heritage: single
//! elements and arrays are interchangeable, and any field may be missing.
//! Parsing is therefore defensive throughout.

use crate::error::WebexError;
use async_trait::async_trait;
use callgate_monitor::{ActiveCall, UserCalls};
use serde_json::Value;

/// Session handle for one user's calls.
pub struct XsiUserSession {
    http: reqwest::Client,
    actions_url: String,
    events_url: String,
    access_token: String,
    user_id: String,
    event_package: String,
}

impl XsiUserSession {
    pub fn new(
        http: reqwest::Client,
        actions_url: &str,
        events_url: &str,
        access_token: &str,
        user_id: &str,
        event_package: &str,
    ) -> Self {
        Self {
            http,
            actions_url: actions_url.trim_end_matches('/').to_string(),
            events_url: events_url.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
            user_id: user_id.to_string(),
            event_package: event_package.to_string(),
        }
    }

    /// The XSI identity for this user, read from their profile. This is the
    /// id call events refer to.
    pub async fn profile_user_id(&self) -> Result<String, WebexError> {
        let url = format!("{}/v2.0/user/{}/profile", self.actions_url, self.user_id);
        let body = self.get_json(&url).await?;
        parse_profile_user_id(&body).ok_or(WebexError::MissingField("Profile.details.userId"))
    }

    async fn get_json(&self, url: &str) -> Result<Value, WebexError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.access_token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WebexError::Api { status, body });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl UserCalls for XsiUserSession {
    async fn subscribe_events(&self) -> anyhow::Result<()> {
        let url = format!("{}/v2.0/user/{}", self.events_url, self.user_id);
        let body = serde_json::json!({
            "Subscription": {
                "event": self.event_package,
                "expires": 3600,
            }
        });
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("event subscription for user {} failed ({status}): {body}", self.user_id);
        }
        Ok(())
    }

    async fn active_calls(&self) -> anyhow::Result<Vec<ActiveCall>> {
        let url = format!("{}/v2.0/user/{}/calls", self.actions_url, self.user_id);
        let body = self.get_json(&url).await?;
        Ok(parse_calls(&body))
    }

    async fn hangup(&self, call_id: &str) -> anyhow::Result<()> {
        let url = format!(
            "{}/v2.0/user/{}/calls/callid/{}",
            self.actions_url, self.user_id, call_id
        );
        let response = self
            .http
            .delete(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("hangup of call {call_id} failed ({status}): {body}");
        }
        Ok(())
    }
}

/// Extract the XSI user id from a profile response.
fn parse_profile_user_id(body: &Value) -> Option<String> {
    body.get("Profile")
        .and_then(|p| p.get("details"))
        .and_then(|d| d.get("userId"))
        .and_then(as_text)
}

/// Extract active calls from a calls response. The `call` element may be a
/// single object, an array, or absent.
fn parse_calls(body: &Value) -> Vec<ActiveCall> {
    let call = body.get("Calls").and_then(|c| c.get("call"));
    let items: Vec<&Value> = match call {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(single @ Value::Object(_)) => vec![single],
        _ => Vec::new(),
    };

    items
        .into_iter()
        .filter_map(|item| item.get("callId").and_then(as_text))
        .map(|call_id| ActiveCall { call_id })
        .collect()
}

fn as_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => Some(s.as_str()),
        Value::Object(map) => map.get("#text").and_then(Value::as_str),
        _ => None,
    };
    text.filter(|s| !s.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn profile_user_id_is_extracted() {
        let body = json!({ "Profile": { "details": { "userId": "u100@example.com" } } });
        assert_eq!(parse_profile_user_id(&body).as_deref(), Some("u100@example.com"));

        assert!(parse_profile_user_id(&json!({})).is_none());
        assert!(parse_profile_user_id(&json!({ "Profile": {} })).is_none());
    }

    #[test]
    fn calls_list_handles_array_single_and_absent() {
        let array = json!({ "Calls": { "call": [
            { "callId": "c1" },
            { "callId": { "#text": "c2" } },
            { "remoteParty": {} }
        ] } });
        let calls = parse_calls(&array);
        assert_eq!(
            calls,
            vec![
                ActiveCall { call_id: "c1".into() },
                ActiveCall { call_id: "c2".into() }
            ]
        );

        let single = json!({ "Calls": { "call": { "callId": "only" } } });
        assert_eq!(parse_calls(&single).len(), 1);

        assert!(parse_calls(&json!({})).is_empty());
        assert!(parse_calls(&json!({ "Calls": {} })).is_empty());
    }
}
