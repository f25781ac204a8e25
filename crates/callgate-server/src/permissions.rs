//! Bridges the persistence layer to the monitor's permission boundary.

use async_trait::async_trait;
use callgate_core::{AllowEntry, LocationSample};
use callgate_monitor::PermissionStore;
use callgate_store::SqliteStore;

/// `PermissionStore` implementation backed by the SQLite store.
pub struct StorePermissions {
    store: SqliteStore,
}

impl StorePermissions {
    pub fn new(store: SqliteStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl PermissionStore for StorePermissions {
    async fn allow_entry(&self, account_id: &str) -> anyhow::Result<Option<AllowEntry>> {
        Ok(self.store.allow_entry(account_id).await?)
    }

    async fn latest_sample(&self, account_id: &str) -> anyhow::Result<Option<LocationSample>> {
        Ok(self.store.latest_sample(account_id).await?)
    }
}
