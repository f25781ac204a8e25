//! Route handlers: OAuth login flows, the geolocation report endpoint, and
//! the administrative monitoring trigger.

use crate::auth::{
    extract_cookie, generate_session_token, require_admin, session_cookie, OAUTH_STATE_COOKIE,
    SESSION_COOKIE,
};
use crate::error::ServerError;
use crate::monitoring;
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Json;
use callgate_adapter_webex::WebexClient;
use callgate_core::LocationSample;
use serde::Deserialize;
use serde_json::{json, Value};

/// Query parameters delivered to the OAuth callback legs.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: String,
    #[serde(default)]
    pub state: Option<String>,
}

/// Body of a geolocation report.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationReport {
    pub session_token: String,
    pub time: String,
    pub latitude: f64,
    pub longitude: f64,
}

pub async fn healthz() -> Json<Value> {
    Json(json!({ "ok": true, "service": "callgate" }))
}

// --- user OAuth flow ---

pub async fn user_login(State(state): State<AppState>) -> Result<Response, ServerError> {
    tracing::info!("initiating OAuth flow for user authentication");
    let csrf_state = generate_session_token(16);
    let url = state
        .oauth()
        .authorize_url(
            &state.config().user_redirect_uri(),
            &state.config().webex.scopes,
            &csrf_state,
        )
        .map_err(|e| ServerError::OAuth(e.to_string()))?;

    Ok((
        [(
            header::SET_COOKIE,
            session_cookie(OAUTH_STATE_COOKIE, &csrf_state),
        )],
        Redirect::to(&url),
    )
        .into_response())
}

pub async fn user_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<CallbackQuery>,
) -> Result<Response, ServerError> {
    verify_oauth_state(&headers, query.state.as_deref())?;

    let tokens = state
        .oauth()
        .exchange_code(&query.code, &state.config().user_redirect_uri())
        .await
        .map_err(|e| ServerError::OAuth(e.to_string()))?;
    tracing::info!("user access token obtained");

    let client = WebexClient::new(&state.config().webex.api_base, &tokens.access_token);
    let me = client
        .me()
        .await
        .map_err(|e| ServerError::OAuth(e.to_string()))?;

    let session_token = generate_session_token(24);
    state
        .store()
        .upsert_user_session(&me.id, &session_token)
        .await?;

    Ok((
        [(
            header::SET_COOKIE,
            session_cookie(SESSION_COOKIE, &session_token),
        )],
        Redirect::to("/user/success"),
    )
        .into_response())
}

pub async fn user_success(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Html<String>, ServerError> {
    let session_token =
        extract_cookie(&headers, SESSION_COOKIE).ok_or(ServerError::InvalidSession)?;
    state
        .store()
        .user_session_by_token(&session_token)
        .await?
        .ok_or(ServerError::InvalidSession)?;

    tracing::info!("user successfully authenticated");
    Ok(Html(success_page(
        "Signed in",
        "You are signed in. Location reports from this device will now be accepted.",
        &session_token,
    )))
}

// --- admin OAuth flow ---

pub async fn admin_login(State(state): State<AppState>) -> Result<Response, ServerError> {
    tracing::info!("initiating OAuth flow for admin authentication");
    let csrf_state = generate_session_token(16);
    let url = state
        .oauth()
        .authorize_url(
            &state.config().admin_redirect_uri(),
            &state.config().webex.scopes,
            &csrf_state,
        )
        .map_err(|e| ServerError::OAuth(e.to_string()))?;

    Ok((
        [(
            header::SET_COOKIE,
            session_cookie(OAUTH_STATE_COOKIE, &csrf_state),
        )],
        Redirect::to(&url),
    )
        .into_response())
}

pub async fn admin_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<CallbackQuery>,
) -> Result<Response, ServerError> {
    verify_oauth_state(&headers, query.state.as_deref())?;

    let tokens = state
        .oauth()
        .exchange_code(&query.code, &state.config().admin_redirect_uri())
        .await
        .map_err(|e| ServerError::OAuth(e.to_string()))?;

    let client = WebexClient::new(&state.config().webex.api_base, &tokens.access_token);
    let me = client
        .me()
        .await
        .map_err(|e| ServerError::OAuth(e.to_string()))?;

    if me.id != state.config().webex.admin_user_id {
        tracing::warn!(account_id = %me.id, "admin login attempt by a non-admin account");
        return Err(ServerError::AdminRequired);
    }

    let session_token = generate_session_token(32);
    let admin_token = tokens.into_admin_token(chrono::Utc::now().timestamp(), session_token.clone());
    state.store().replace_admin_token(&admin_token).await?;
    tracing::info!("admin successfully authenticated");

    Ok((
        [(
            header::SET_COOKIE,
            session_cookie(SESSION_COOKIE, &session_token),
        )],
        Redirect::to("/admin/success"),
    )
        .into_response())
}

pub async fn admin_success(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Html<String>, ServerError> {
    let token = require_admin(&state, &headers).await?;
    Ok(Html(success_page(
        "Admin signed in",
        "Admin authentication complete. POST /monitoring/start to begin call monitoring.",
        &token.session_token,
    )))
}

pub async fn admin_refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ServerError> {
    let token = match require_admin(&state, &headers).await {
        Ok(token) => token,
        Err(_) => return Ok(Redirect::to("/admin/login").into_response()),
    };

    tracing::info!("refreshing admin access token");
    match state.oauth().refresh(&token.refresh_token).await {
        Ok(tokens) => {
            let refreshed =
                tokens.into_admin_token(chrono::Utc::now().timestamp(), token.session_token);
            state.store().replace_admin_token(&refreshed).await?;
            Ok(Redirect::to("/admin/success").into_response())
        }
        Err(e) => {
            tracing::error!(error = %e, "token refresh failed");
            Ok(Redirect::to("/admin/login").into_response())
        }
    }
}

// --- monitoring trigger ---

pub async fn start_monitoring(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, ServerError> {
    require_admin(&state, &headers).await?;

    let users = monitoring::start(&state).await?;
    Ok(Json(json!({
        "message": "Call monitoring started successfully",
        "monitored_users": users,
    })))
}

// --- geolocation reports ---

pub async fn location_update(
    State(state): State<AppState>,
    Json(report): Json<LocationReport>,
) -> Result<Json<Value>, ServerError> {
    let session = state
        .store()
        .user_session_by_token(&report.session_token)
        .await?
        .ok_or(ServerError::InvalidSession)?;

    if !state
        .config()
        .geofence
        .contains(report.latitude, report.longitude)
    {
        tracing::warn!(
            account_id = %session.account_id,
            "geolocation report outside the permitted region"
        );
        return Err(ServerError::OutOfBounds);
    }

    let newly_enrolled = state.store().allow_entry(&session.account_id).await?.is_none();
    if newly_enrolled {
        tracing::info!(
            account_id = %session.account_id,
            "user within boundaries but not yet on the allow list, enrolling"
        );
        state
            .store()
            .set_allow_entry(&session.account_id, true)
            .await?;
    }

    state
        .store()
        .record_location_sample(&LocationSample {
            account_id: session.account_id.clone(),
            session_token: report.session_token,
            reported_at: report.time,
            latitude: report.latitude,
            longitude: report.longitude,
            last_update: chrono::Utc::now().timestamp(),
        })
        .await?;

    tracing::debug!(account_id = %session.account_id, "location sample recorded");
    let message = if newly_enrolled {
        "Geolocation updated and user added to the allow list"
    } else {
        "Geolocation updated successfully"
    };
    Ok(Json(json!({ "message": message })))
}

// --- helpers ---

fn verify_oauth_state(headers: &HeaderMap, received: Option<&str>) -> Result<(), ServerError> {
    let expected = extract_cookie(headers, OAUTH_STATE_COOKIE);
    match (expected.as_deref(), received) {
        (Some(expected), Some(received)) if expected == received => Ok(()),
        _ => Err(ServerError::OAuth("authorization state mismatch".into())),
    }
}

fn success_page(title: &str, body: &str, session_token: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - Callgate</title>
</head>
<body>
    <h1>{title}</h1>
    <p>{body}</p>
    <p><code>session: {session_token}</code></p>
</body>
</html>"#
    )
}
