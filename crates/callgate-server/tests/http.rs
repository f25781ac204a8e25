//! HTTP-level tests of the web surface against an in-memory store.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use callgate_core::{AdminToken, CallgateConfig};
use callgate_server::{create_router, AppState};
use callgate_store::SqliteStore;
use serde_json::{json, Value};
use tower::ServiceExt;

fn test_config() -> CallgateConfig {
    CallgateConfig::from_yaml(
        r#"
server:
  listen_port: 8000
  public_url: http://127.0.0.1:8000
webex:
  client_id: cid
  client_secret: secret
  admin_user_id: admin-1
  xsi_actions_url: http://127.0.0.1:1/xsi-actions
  xsi_events_url: http://127.0.0.1:1/xsi-events
geofence:
  lat_min: 10.0
  lat_max: 20.0
  lon_min: 30.0
  lon_max: 100.0
monitor:
  staleness_timeout_secs: 30
  event_pause_ms: 0
"#,
    )
    .unwrap()
}

async fn test_state() -> AppState {
    let store = SqliteStore::in_memory().await.unwrap();
    AppState::with_store(test_config(), store)
}

fn admin_token(session_token: &str, expires_at: i64) -> AdminToken {
    AdminToken {
        access_token: "at".into(),
        expires_in: 3600,
        refresh_token: "rt".into(),
        refresh_token_expires_in: 7200,
        token_type: "Bearer".into(),
        scope: "spark:all".into(),
        expires_at,
        acquired_at: expires_at - 3600,
        session_token: session_token.into(),
    }
}

fn location_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/location")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn healthz_reports_ok() {
    let app = create_router(test_state().await);
    let response = app
        .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["ok"], json!(true));
}

#[tokio::test]
async fn location_report_with_unknown_session_is_unauthorized() {
    let app = create_router(test_state().await);
    let response = app
        .oneshot(location_request(json!({
            "sessionToken": "nope",
            "time": "2024-05-01T12:00:00Z",
            "latitude": 15.0,
            "longitude": 60.0,
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn location_report_outside_the_region_is_rejected() {
    let state = test_state().await;
    state
        .store()
        .upsert_user_session("acct-1", "tok-1")
        .await
        .unwrap();

    let app = create_router(state.clone());
    let response = app
        .oneshot(location_request(json!({
            "sessionToken": "tok-1",
            "time": "2024-05-01T12:00:00Z",
            "latitude": 55.0,
            "longitude": 60.0,
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    // Nothing was recorded and the user was not enrolled.
    assert!(state.store().allow_entry("acct-1").await.unwrap().is_none());
    assert!(state.store().latest_sample("acct-1").await.unwrap().is_none());
}

#[tokio::test]
async fn in_bounds_report_enrolls_and_records_the_sample() {
    let state = test_state().await;
    state
        .store()
        .upsert_user_session("acct-1", "tok-1")
        .await
        .unwrap();

    let app = create_router(state.clone());
    let response = app
        .oneshot(location_request(json!({
            "sessionToken": "tok-1",
            "time": "2024-05-01T12:00:00Z",
            "latitude": 15.0,
            "longitude": 60.0,
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["message"].as_str().unwrap().contains("allow list"));

    let entry = state.store().allow_entry("acct-1").await.unwrap().unwrap();
    assert!(entry.allow_caller);
    let sample = state.store().latest_sample("acct-1").await.unwrap().unwrap();
    assert_eq!(sample.latitude, 15.0);
    assert_eq!(sample.session_token, "tok-1");
}

#[tokio::test]
async fn repeat_report_updates_without_reenrolling() {
    let state = test_state().await;
    state
        .store()
        .upsert_user_session("acct-1", "tok-1")
        .await
        .unwrap();

    let report = json!({
        "sessionToken": "tok-1",
        "time": "2024-05-01T12:00:00Z",
        "latitude": 15.0,
        "longitude": 60.0,
    });
    let app = create_router(state.clone());
    app.clone()
        .oneshot(location_request(report.clone()))
        .await
        .unwrap();

    let response = app.oneshot(location_request(report)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], json!("Geolocation updated successfully"));
}

#[tokio::test]
async fn monitoring_start_requires_the_admin_session() {
    let state = test_state().await;
    state
        .store()
        .replace_admin_token(&admin_token("good", i64::MAX / 2))
        .await
        .unwrap();

    // No cookie at all.
    let app = create_router(state.clone());
    let response = app
        .oneshot(
            Request::post("/monitoring/start")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Wrong session token.
    let app = create_router(state);
    let response = app
        .oneshot(
            Request::post("/monitoring/start")
                .header(header::COOKIE, "session_token=bad")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn monitoring_start_rejects_an_expired_admin_token() {
    let state = test_state().await;
    // Expired long ago; the admin cookie itself is correct.
    state
        .store()
        .replace_admin_token(&admin_token("good", 1_000))
        .await
        .unwrap();

    let app = create_router(state);
    let response = app
        .oneshot(
            Request::post("/monitoring/start")
                .header(header::COOKIE, "session_token=good")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert!(body["message"].as_str().unwrap().contains("admin token"));
}

#[tokio::test]
async fn admin_success_requires_the_matching_cookie() {
    let state = test_state().await;
    state
        .store()
        .replace_admin_token(&admin_token("good", i64::MAX / 2))
        .await
        .unwrap();

    let app = create_router(state.clone());
    let response = app
        .oneshot(
            Request::get("/admin/success")
                .header(header::COOKIE, "session_token=good")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let app = create_router(state);
    let response = app
        .oneshot(Request::get("/admin/success").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn user_success_checks_the_session_cookie() {
    let state = test_state().await;
    state
        .store()
        .upsert_user_session("acct-1", "tok-1")
        .await
        .unwrap();

    let app = create_router(state.clone());
    let response = app
        .oneshot(
            Request::get("/user/success")
                .header(header::COOKIE, "session_token=tok-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let app = create_router(state);
    let response = app
        .oneshot(
            Request::get("/user/success")
                .header(header::COOKIE, "session_token=unknown")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn user_login_redirects_to_the_authorize_url_with_state_cookie() {
    let app = create_router(test_state().await);
    let response = app
        .oneshot(Request::get("/user/login").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(location.starts_with("https://api.ciscospark.com/v1/authorize"));
    assert!(location.contains("client_id=cid"));

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(cookie.starts_with("oauth_state="));
}
