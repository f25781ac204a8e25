//! Shared application state.

use callgate_adapter_webex::OAuthClient;
use callgate_core::CallgateConfig;
use callgate_monitor::MonitorHandle;
use callgate_store::SqliteStore;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Application state shared across handlers. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: CallgateConfig,
    store: SqliteStore,
    oauth: OAuthClient,
    /// The running monitor, if any. The only cross-task mutable slot; the
    /// snapshot inside the monitor stays immutable.
    monitor: RwLock<Option<MonitorHandle>>,
}

impl AppState {
    /// Open the database and assemble the state.
    pub async fn init(config: CallgateConfig) -> anyhow::Result<Self> {
        let store = SqliteStore::open(&config.storage.sqlite_path).await?;
        Ok(Self::with_store(config, store))
    }

    /// Assemble state around an existing store. Used by tests.
    pub fn with_store(config: CallgateConfig, store: SqliteStore) -> Self {
        let oauth = OAuthClient::new(
            &config.webex.client_id,
            &config.webex.client_secret,
            &config.webex.authorization_url,
            &config.webex.token_url,
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                oauth,
                monitor: RwLock::new(None),
            }),
        }
    }

    pub fn config(&self) -> &CallgateConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &SqliteStore {
        &self.inner.store
    }

    pub fn oauth(&self) -> &OAuthClient {
        &self.inner.oauth
    }

    /// Whether a monitor is currently running.
    pub async fn monitor_running(&self) -> bool {
        self.inner
            .monitor
            .read()
            .await
            .as_ref()
            .is_some_and(|h| h.is_running())
    }

    /// Install a freshly started monitor, stopping any previous one first
    /// (monitoring restarts rebuild the directory snapshot).
    pub async fn install_monitor(&self, handle: MonitorHandle) {
        let mut slot = self.inner.monitor.write().await;
        if let Some(old) = slot.take() {
            tracing::info!("stopping previous call monitor before restart");
            old.stop().await;
        }
        *slot = Some(handle);
    }

    /// Stop the monitor if one is running. Called at shutdown.
    pub async fn stop_monitor(&self) {
        if let Some(handle) = self.inner.monitor.write().await.take() {
            handle.stop().await;
        }
    }
}
