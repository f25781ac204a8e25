//! The event ingestion loop.
//!
//! `Idle -> Subscribed -> Running`: subscription failure is fatal to the
//! single startup attempt; once running, the loop only ends on the stop
//! signal or when the event source closes its channel. Nothing inside one
//! iteration propagates past the loop boundary.

use crate::actuator::CallTerminator;
use crate::classifier::classify;
use crate::decision::{DecisionEngine, Verdict};
use crate::directory::DirectorySnapshot;
use crate::error::MonitorError;
use crate::permission::{PermissionOracle, PermissionStore};
use crate::platform::{EventSource, RosterSource};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// The assembled monitoring pipeline, ready to start.
pub struct CallMonitor {
    directory: Arc<DirectorySnapshot>,
    engine: DecisionEngine,
    terminator: CallTerminator,
    pause: Duration,
}

impl CallMonitor {
    /// Build the pipeline: enumerate the roster into the directory snapshot
    /// (activating per-member subscriptions) and wire the decision engine to
    /// the permission store.
    pub async fn build(
        roster: &dyn RosterSource,
        permissions: Arc<dyn PermissionStore>,
        staleness_timeout_secs: i64,
        pause: Duration,
    ) -> Result<Self, MonitorError> {
        let directory = Arc::new(DirectorySnapshot::build(roster).await?);
        let oracle = PermissionOracle::new(permissions, staleness_timeout_secs);
        let engine = DecisionEngine::new(directory.clone(), oracle);
        let terminator = CallTerminator::new(directory.clone());

        Ok(Self {
            directory,
            engine,
            terminator,
            pause,
        })
    }

    /// Number of users in the directory snapshot.
    pub fn monitored_users(&self) -> usize {
        self.directory.len()
    }

    /// Subscribe to the event package and spawn the consumer task.
    pub async fn start(
        self,
        events: &dyn EventSource,
        package: &str,
    ) -> Result<MonitorHandle, MonitorError> {
        let rx = events.subscribe(package).await?;
        tracing::info!(package, users = self.directory.len(), "subscribed, starting event loop");

        let users = self.directory.len();
        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(self.run(rx, stop_rx));

        Ok(MonitorHandle {
            stop: stop_tx,
            task,
            users,
        })
    }

    async fn run(self, mut rx: mpsc::Receiver<serde_json::Value>, mut stop: watch::Receiver<bool>) {
        loop {
            let raw = tokio::select! {
                _ = stop.changed() => {
                    tracing::info!("stop signal received, ending event loop");
                    break;
                }
                event = rx.recv() => match event {
                    Some(event) => event,
                    None => {
                        tracing::warn!("event channel closed, ending event loop");
                        break;
                    }
                },
            };

            self.process(&raw).await;
            tokio::time::sleep(self.pause).await;
        }
    }

    /// Handle one raw event. Every failure is logged and swallowed here; a
    /// single bad event must never terminate the loop.
    async fn process(&self, raw: &serde_json::Value) {
        let event = match classify(raw) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(error = %e, "dropping malformed event");
                return;
            }
        };

        if !event.kind.is_actionable() {
            tracing::trace!(raw_kind = ?event.raw_kind, "ignoring event");
            return;
        }

        tracing::debug!(
            kind = event.kind.as_str(),
            call_id = ?event.call_id,
            caller = ?event.caller_id,
            target = ?event.target_id,
            "processing call event"
        );

        let verdict = match self.engine.decide(&event).await {
            Ok(verdict) => verdict,
            Err(e) => {
                tracing::warn!(error = %e, "no verdict for event");
                return;
            }
        };

        if let Some(Verdict::Deny {
            internal_id,
            call_id,
            reason,
        }) = verdict
        {
            if let Err(e) = self
                .terminator
                .terminate(&internal_id, call_id.as_deref())
                .await
            {
                tracing::warn!(internal_id = %internal_id, reason, error = %e, "call termination incomplete");
            }
        }
    }
}

/// Handle to a running monitor.
pub struct MonitorHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
    users: usize,
}

impl MonitorHandle {
    /// Whether the consumer task is still alive.
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Number of users the running monitor covers.
    pub fn monitored_users(&self) -> usize {
        self.users
    }

    /// Signal the loop to stop at its next wait point and wait for it to
    /// finish.
    pub async fn stop(self) {
        let _ = self.stop.send(true);
        let _ = self.task.await;
    }
}
