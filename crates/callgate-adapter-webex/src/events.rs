//! Organization-wide XSI event channel.
//!
//! `subscribe` creates an event channel, registers the event-package
//! subscription, and spawns a forwarding task that polls the channel and
//! pushes each decoded event into an mpsc channel for the ingestion loop.
//! The forwarding task retries transient poll failures with a fixed backoff
//! and exits once the receiver side is dropped.

use crate::error::WebexError;
use async_trait::async_trait;
use callgate_monitor::{EventSource, SubscriptionError};
use serde_json::Value;
use std::time::Duration;
use tokio::sync::mpsc;
use uuid::Uuid;

const EVENT_BUFFER: usize = 256;
const POLL_BACKOFF: Duration = Duration::from_secs(2);
const CHANNEL_EXPIRES_SECS: u64 = 3600;

/// Event source backed by the XSI Events API.
pub struct XsiEventSource {
    http: reqwest::Client,
    events_url: String,
    access_token: String,
}

impl XsiEventSource {
    pub fn new(events_url: &str, access_token: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            events_url: events_url.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
        }
    }

    async fn open_channel(&self) -> Result<String, WebexError> {
        let url = format!("{}/v2.0/channel", self.events_url);
        let body = serde_json::json!({
            "Channel": {
                "channelSetId": Uuid::new_v4().to_string(),
                "expires": CHANNEL_EXPIRES_SECS,
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
            return Err(WebexError::Api { status, body });
        }

        let body: Value = response.json().await?;
        body.get("Channel")
            .and_then(|c| c.get("channelId"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or(WebexError::MissingField("Channel.channelId"))
    }

    async fn register_subscription(
        &self,
        channel_id: &str,
        package: &str,
    ) -> Result<(), WebexError> {
        let url = format!("{}/v2.0/subscription", self.events_url);
        let body = serde_json::json!({
            "Subscription": {
                "event": package,
                "channelId": channel_id,
                "expires": CHANNEL_EXPIRES_SECS,
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
            return Err(WebexError::Api { status, body });
        }
        Ok(())
    }

    /// Poll the channel until the receiver goes away.
    async fn forward_events(self, channel_id: String, tx: mpsc::Sender<Value>) {
        let url = format!("{}/v2.0/channel/{}/events", self.events_url, channel_id);

        loop {
            if tx.is_closed() {
                tracing::info!(channel_id = %channel_id, "event receiver dropped, closing channel poll");
                return;
            }

            let response = self
                .http
                .get(&url)
                .bearer_auth(&self.access_token)
                .header(reqwest::header::ACCEPT, "application/json")
                .send()
                .await;

            let body = match response {
                Ok(response) if response.status().is_success() => response.json::<Value>().await,
                Ok(response) => {
                    tracing::warn!(status = %response.status(), "event channel poll failed");
                    tokio::time::sleep(POLL_BACKOFF).await;
                    continue;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "event channel poll failed");
                    tokio::time::sleep(POLL_BACKOFF).await;
                    continue;
                }
            };

            match body {
                Ok(event) if event.get("xsi:Event").is_some() => {
                    if tx.send(event).await.is_err() {
                        return;
                    }
                }
                Ok(_) => {
                    // Heartbeats and empty poll responses carry no event.
                    tracing::trace!("event channel heartbeat");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "undecodable event channel payload");
                }
            }
        }
    }
}

#[async_trait]
impl EventSource for XsiEventSource {
    async fn subscribe(
        &self,
        package: &str,
    ) -> Result<mpsc::Receiver<Value>, SubscriptionError> {
        let channel_id = self
            .open_channel()
            .await
            .map_err(|e| SubscriptionError::Channel(e.to_string()))?;

        self.register_subscription(&channel_id, package)
            .await
            .map_err(|e| SubscriptionError::Rejected(e.to_string()))?;

        tracing::info!(channel_id = %channel_id, package, "event channel open and subscribed");

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let forwarder = Self {
            http: self.http.clone(),
            events_url: self.events_url.clone(),
            access_token: self.access_token.clone(),
        };
        tokio::spawn(forwarder.forward_events(channel_id, tx));

        Ok(rx)
    }
}
