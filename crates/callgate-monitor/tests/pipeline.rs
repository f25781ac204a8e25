//! End-to-end tests of the ingestion loop against in-memory fakes.

use async_trait::async_trait;
use callgate_core::{AllowEntry, LocationSample};
use callgate_monitor::{
    ActiveCall, CallMonitor, EventSource, MonitorError, PermissionStore, PhoneNumber, RosterMember,
    RosterSource, SubscriptionError, UserCalls,
};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

struct FakeCalls {
    active: Vec<ActiveCall>,
    hangups: Mutex<Vec<String>>,
}

impl FakeCalls {
    fn with_active(call_ids: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            active: call_ids
                .iter()
                .map(|id| ActiveCall {
                    call_id: id.to_string(),
                })
                .collect(),
            hangups: Mutex::new(Vec::new()),
        })
    }

    fn hangup_count(&self) -> usize {
        self.hangups.lock().unwrap().len()
    }
}

#[async_trait]
impl UserCalls for FakeCalls {
    async fn subscribe_events(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn active_calls(&self) -> anyhow::Result<Vec<ActiveCall>> {
        Ok(self.active.clone())
    }

    async fn hangup(&self, call_id: &str) -> anyhow::Result<()> {
        self.hangups.lock().unwrap().push(call_id.to_string());
        Ok(())
    }
}

struct FakeRoster {
    members: Vec<RosterMember>,
}

impl FakeRoster {
    fn single(internal_id: &str, account_id: &str, calls: Arc<FakeCalls>) -> Self {
        Self {
            members: vec![RosterMember {
                internal_id: internal_id.to_string(),
                account_id: account_id.to_string(),
                display_name: "Monitored User".to_string(),
                phone_numbers: vec![PhoneNumber {
                    number: "+15551234".to_string(),
                    extension: None,
                    primary: true,
                }],
                calls,
            }],
        }
    }
}

#[async_trait]
impl RosterSource for FakeRoster {
    async fn members(&self) -> anyhow::Result<Vec<RosterMember>> {
        Ok(self.members.clone())
    }
}

struct FakePermissions {
    permitted: HashSet<String>,
}

impl FakePermissions {
    fn permitting(accounts: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            permitted: accounts.iter().map(|s| s.to_string()).collect(),
        })
    }
}

#[async_trait]
impl PermissionStore for FakePermissions {
    async fn allow_entry(&self, account_id: &str) -> anyhow::Result<Option<AllowEntry>> {
        Ok(Some(AllowEntry {
            account_id: account_id.to_string(),
            allow_caller: self.permitted.contains(account_id),
        }))
    }

    async fn latest_sample(&self, account_id: &str) -> anyhow::Result<Option<LocationSample>> {
        Ok(self.permitted.contains(account_id).then(|| LocationSample {
            account_id: account_id.to_string(),
            session_token: "sess".into(),
            reported_at: "t".into(),
            latitude: 15.0,
            longitude: 60.0,
            last_update: chrono::Utc::now().timestamp(),
        }))
    }
}

/// Event source that delivers a scripted batch. With `hold_open` the channel
/// stays open after the batch so the loop keeps waiting.
struct FakeEvents {
    events: Vec<Value>,
    hold_open: bool,
    kept: Mutex<Option<mpsc::Sender<Value>>>,
    fail_subscribe: bool,
}

impl FakeEvents {
    fn scripted(events: Vec<Value>) -> Self {
        Self {
            events,
            hold_open: false,
            kept: Mutex::new(None),
            fail_subscribe: false,
        }
    }

    fn open_ended() -> Self {
        Self {
            events: Vec::new(),
            hold_open: true,
            kept: Mutex::new(None),
            fail_subscribe: false,
        }
    }

    fn rejecting() -> Self {
        Self {
            events: Vec::new(),
            hold_open: false,
            kept: Mutex::new(None),
            fail_subscribe: true,
        }
    }
}

#[async_trait]
impl EventSource for FakeEvents {
    async fn subscribe(
        &self,
        _package: &str,
    ) -> Result<mpsc::Receiver<Value>, SubscriptionError> {
        if self.fail_subscribe {
            return Err(SubscriptionError::Rejected("no such package".into()));
        }
        let (tx, rx) = mpsc::channel(64);
        for event in &self.events {
            tx.send(event.clone()).await.expect("receiver alive");
        }
        if self.hold_open {
            *self.kept.lock().unwrap() = Some(tx);
        }
        Ok(rx)
    }
}

fn inbound_external_call(target: &str, call_id: &str) -> Value {
    json!({
        "xsi:Event": {
            "xsi:eventData": {
                "@xsi1:type": "xsi:CallReceivedEvent",
                "xsi:call": { "xsi:callId": call_id }
            },
            "xsi:targetId": target
        }
    })
}

fn internal_call(caller: &str, target: &str, call_id: &str) -> Value {
    json!({
        "xsi:Event": {
            "xsi:eventData": {
                "@xsi1:type": "xsi:CallReceivedEvent",
                "xsi:call": {
                    "xsi:callId": call_id,
                    "xsi:remoteParty": { "xsi:userId": caller }
                }
            },
            "xsi:targetId": target
        }
    })
}

async fn run_to_completion(
    roster: &FakeRoster,
    permissions: Arc<FakePermissions>,
    events: FakeEvents,
) {
    let monitor = CallMonitor::build(roster, permissions, 30, Duration::ZERO)
        .await
        .unwrap();
    let handle = monitor.start(&events, "Advanced Call").await.unwrap();

    // The scripted channel closes once the batch is sent, so the loop drains
    // every event and exits on its own; wait for that rather than racing it
    // with the stop signal.
    tokio::time::timeout(Duration::from_secs(5), async {
        while handle.is_running() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("loop should drain the scripted events and exit");
    handle.stop().await;
}

#[tokio::test]
async fn permitted_user_keeps_the_call() {
    let calls = FakeCalls::with_active(&["call-1"]);
    let roster = FakeRoster::single("100", "acct-1", calls.clone());
    let permissions = FakePermissions::permitting(&["acct-1"]);

    let events = FakeEvents::scripted(vec![inbound_external_call("100", "call-1")]);
    run_to_completion(&roster, permissions, events).await;

    assert_eq!(calls.hangup_count(), 0);
}

#[tokio::test]
async fn unpermitted_user_gets_the_call_terminated() {
    let calls = FakeCalls::with_active(&["call-1"]);
    let roster = FakeRoster::single("100", "acct-1", calls.clone());
    let permissions = FakePermissions::permitting(&[]);

    let events = FakeEvents::scripted(vec![inbound_external_call("100", "call-1")]);
    run_to_completion(&roster, permissions, events).await;

    assert_eq!(*calls.hangups.lock().unwrap(), vec!["call-1"]);
}

#[tokio::test]
async fn malformed_event_between_good_events_does_not_break_the_loop() {
    let calls = FakeCalls::with_active(&["call-1"]);
    let roster = FakeRoster::single("100", "acct-1", calls.clone());
    let permissions = FakePermissions::permitting(&[]);

    let events = FakeEvents::scripted(vec![
        inbound_external_call("100", "call-a"),
        json!("not an event at all"),
        inbound_external_call("100", "call-b"),
    ]);
    run_to_completion(&roster, permissions, events).await;

    // Both well-formed events were fully processed.
    assert_eq!(calls.hangup_count(), 2);
}

#[tokio::test]
async fn internal_call_is_never_terminated_even_when_unpermitted() {
    let calls_a = FakeCalls::with_active(&["call-1"]);
    let calls_b = FakeCalls::with_active(&["call-1"]);
    let roster = FakeRoster {
        members: vec![
            RosterMember {
                internal_id: "100".into(),
                account_id: "acct-1".into(),
                display_name: "A".into(),
                phone_numbers: vec![],
                calls: calls_a.clone(),
            },
            RosterMember {
                internal_id: "200".into(),
                account_id: "acct-2".into(),
                display_name: "B".into(),
                phone_numbers: vec![],
                calls: calls_b.clone(),
            },
        ],
    };
    let permissions = FakePermissions::permitting(&[]);

    let events = FakeEvents::scripted(vec![internal_call("200", "100", "call-1")]);
    run_to_completion(&roster, permissions, events).await;

    assert_eq!(calls_a.hangup_count(), 0);
    assert_eq!(calls_b.hangup_count(), 0);
}

#[tokio::test]
async fn event_without_discriminator_is_ignored() {
    let calls = FakeCalls::with_active(&["call-1"]);
    let roster = FakeRoster::single("100", "acct-1", calls.clone());
    let permissions = FakePermissions::permitting(&[]);

    let events = FakeEvents::scripted(vec![json!({
        "xsi:Event": {
            "xsi:eventData": { "xsi:call": { "xsi:callId": "call-1" } },
            "xsi:targetId": "100"
        }
    })]);
    run_to_completion(&roster, permissions, events).await;

    assert_eq!(calls.hangup_count(), 0);
}

#[tokio::test]
async fn stop_signal_ends_an_idle_loop() {
    let calls = FakeCalls::with_active(&[]);
    let roster = FakeRoster::single("100", "acct-1", calls);
    let permissions = FakePermissions::permitting(&[]);

    let events = FakeEvents::open_ended();
    let monitor = CallMonitor::build(&roster, permissions, 30, Duration::ZERO)
        .await
        .unwrap();
    let handle = monitor.start(&events, "Advanced Call").await.unwrap();
    assert!(handle.is_running());
    assert_eq!(handle.monitored_users(), 1);

    tokio::time::timeout(Duration::from_secs(5), handle.stop())
        .await
        .expect("loop should end promptly on the stop signal");
}

#[tokio::test]
async fn subscription_failure_is_fatal_to_startup() {
    let calls = FakeCalls::with_active(&[]);
    let roster = FakeRoster::single("100", "acct-1", calls);
    let permissions = FakePermissions::permitting(&[]);

    let monitor = CallMonitor::build(&roster, permissions, 30, Duration::ZERO)
        .await
        .unwrap();
    let result = monitor.start(&FakeEvents::rejecting(), "Advanced Call").await;
    assert!(matches!(result, Err(MonitorError::Subscription(_))));
}
