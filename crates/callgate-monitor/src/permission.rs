//! Permission oracle: is this account currently authorized to converse?
//!
//! Fail-closed by contract. A user who cannot be verified — no allow-list
//! entry, no location sample, a stale sample, or a storage error — is not
//! permitted.

use async_trait::async_trait;
use callgate_core::{AllowEntry, LocationSample};
use std::sync::Arc;

/// Read side of the externally owned permission state. Implemented by the
/// persistence layer; the oracle only queries it.
#[async_trait]
pub trait PermissionStore: Send + Sync {
    async fn allow_entry(&self, account_id: &str) -> anyhow::Result<Option<AllowEntry>>;

    async fn latest_sample(&self, account_id: &str) -> anyhow::Result<Option<LocationSample>>;
}

/// Answers permission queries against the freshest stored location sample.
#[derive(Clone)]
pub struct PermissionOracle {
    store: Arc<dyn PermissionStore>,
    timeout_secs: i64,
}

impl PermissionOracle {
    pub fn new(store: Arc<dyn PermissionStore>, timeout_secs: i64) -> Self {
        Self {
            store,
            timeout_secs,
        }
    }

    /// Whether the account is permitted right now. Never errors.
    pub async fn is_permitted(&self, account_id: &str) -> bool {
        self.is_permitted_at(account_id, chrono::Utc::now().timestamp())
            .await
    }

    /// Permission check against an explicit clock, for deterministic tests.
    ///
    /// A sample is fresh iff `now - last_update <= timeout_secs`; the
    /// boundary counts as fresh.
    pub async fn is_permitted_at(&self, account_id: &str, now: i64) -> bool {
        let entry = match self.store.allow_entry(account_id).await {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(account_id, error = %e, "allow-list lookup failed; treating as not permitted");
                return false;
            }
        };

        match entry {
            Some(entry) if entry.allow_caller => {}
            _ => {
                tracing::info!(account_id, "not on the allow list");
                return false;
            }
        }

        let sample = match self.store.latest_sample(account_id).await {
            Ok(sample) => sample,
            Err(e) => {
                tracing::warn!(account_id, error = %e, "location lookup failed; treating as not permitted");
                return false;
            }
        };

        match sample {
            Some(sample) => {
                let age = now - sample.last_update;
                if age <= self.timeout_secs {
                    tracing::debug!(account_id, age, "location sample is fresh");
                    true
                } else {
                    tracing::info!(account_id, age, "location sample has gone stale");
                    false
                }
            }
            None => {
                tracing::info!(account_id, "no location sample on record");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FakeStore {
        allowed: HashMap<String, bool>,
        samples: HashMap<String, LocationSample>,
        fail: bool,
    }

    impl FakeStore {
        fn new() -> Self {
            Self {
                allowed: HashMap::new(),
                samples: HashMap::new(),
                fail: false,
            }
        }

        fn with_user(mut self, account_id: &str, allow: bool, last_update: Option<i64>) -> Self {
            self.allowed.insert(account_id.to_string(), allow);
            if let Some(last_update) = last_update {
                self.samples.insert(
                    account_id.to_string(),
                    LocationSample {
                        account_id: account_id.to_string(),
                        session_token: "sess".into(),
                        reported_at: "t".into(),
                        latitude: 15.0,
                        longitude: 60.0,
                        last_update,
                    },
                );
            }
            self
        }
    }

    #[async_trait]
    impl PermissionStore for FakeStore {
        async fn allow_entry(&self, account_id: &str) -> anyhow::Result<Option<AllowEntry>> {
            if self.fail {
                anyhow::bail!("storage offline");
            }
            Ok(self.allowed.get(account_id).map(|&allow_caller| AllowEntry {
                account_id: account_id.to_string(),
                allow_caller,
            }))
        }

        async fn latest_sample(&self, account_id: &str) -> anyhow::Result<Option<LocationSample>> {
            if self.fail {
                anyhow::bail!("storage offline");
            }
            Ok(self.samples.get(account_id).cloned())
        }
    }

    fn oracle(store: FakeStore, timeout: i64) -> PermissionOracle {
        PermissionOracle::new(Arc::new(store), timeout)
    }

    #[tokio::test]
    async fn unknown_account_is_not_permitted() {
        let oracle = oracle(FakeStore::new(), 30);
        assert!(!oracle.is_permitted_at("acct-1", 1000).await);
    }

    #[tokio::test]
    async fn allowed_account_without_sample_is_not_permitted() {
        let oracle = oracle(FakeStore::new().with_user("acct-1", true, None), 30);
        assert!(!oracle.is_permitted_at("acct-1", 1000).await);
    }

    #[tokio::test]
    async fn staleness_boundary_is_inclusive() {
        let oracle = oracle(FakeStore::new().with_user("acct-1", true, Some(1000)), 30);
        assert!(oracle.is_permitted_at("acct-1", 1030).await);
        assert!(!oracle.is_permitted_at("acct-1", 1031).await);
    }

    #[tokio::test]
    async fn allow_flag_false_denies_even_with_fresh_sample() {
        let oracle = oracle(FakeStore::new().with_user("acct-1", false, Some(1000)), 30);
        assert!(!oracle.is_permitted_at("acct-1", 1000).await);
    }

    #[tokio::test]
    async fn storage_failure_fails_closed() {
        let mut store = FakeStore::new().with_user("acct-1", true, Some(1000));
        store.fail = true;
        let oracle = oracle(store, 30);
        assert!(!oracle.is_permitted_at("acct-1", 1000).await);
    }
}
