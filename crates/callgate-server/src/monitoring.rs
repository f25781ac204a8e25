//! Assembly of the monitoring pipeline from the stored admin credential.

use crate::error::ServerError;
use crate::permissions::StorePermissions;
use crate::state::AppState;
use callgate_adapter_webex::{WebexClient, WebexRoster, XsiEventSource};
use callgate_monitor::CallMonitor;
use std::sync::Arc;
use std::time::Duration;

/// Build and start call monitoring for the organization. Returns the number
/// of monitored users. Any previously running monitor is stopped first.
pub async fn start(state: &AppState) -> Result<usize, ServerError> {
    let cfg = state.config();

    let token = state
        .store()
        .admin_token()
        .await?
        .ok_or(ServerError::AdminTokenInvalid)?;
    if !token.is_usable(chrono::Utc::now().timestamp()) {
        tracing::error!("stored admin token is expired, re-authentication required");
        return Err(ServerError::AdminTokenInvalid);
    }

    tracing::info!("admin token is valid, starting call monitoring");
    let access_token = token.access_token;

    let client = WebexClient::new(&cfg.webex.api_base, &access_token);
    let roster = WebexRoster::new(
        client,
        &cfg.webex.xsi_actions_url,
        &cfg.webex.xsi_events_url,
        &access_token,
        &cfg.monitor.event_package,
    );
    let events = XsiEventSource::new(&cfg.webex.xsi_events_url, &access_token);
    let permissions = Arc::new(StorePermissions::new(state.store().clone()));

    let monitor = CallMonitor::build(
        &roster,
        permissions,
        cfg.monitor.staleness_timeout_secs,
        Duration::from_millis(cfg.monitor.event_pause_ms),
    )
    .await
    .map_err(|e| ServerError::MonitorStartup(e.to_string()))?;

    let users = monitor.monitored_users();
    let handle = monitor
        .start(&events, &cfg.monitor.event_package)
        .await
        .map_err(|e| ServerError::MonitorStartup(e.to_string()))?;

    state.install_monitor(handle).await;
    tracing::info!(users, "call monitoring started");
    Ok(users)
}
