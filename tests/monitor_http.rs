mod common;

use axum::http::{Method, StatusCode};

use attention_monitor::perception::Perception;
use common::app::{spawn_scripted_app, spawn_test_app, spawn_with, test_config};
use common::http::{assert_json_error, request, response_json, websocket_headers};
use common::perception::ScriptedPerception;

#[tokio::test]
async fn it_monitor_status_reports_proxy_mode() {
    let app = spawn_test_app().await;

    let resp = request(&app.app, Method::GET, "/monitor/status", None, &[]).await;
    let (status, _, body) = response_json(resp).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
    assert_eq!(body["services"]["gaze"], "head-pose proxy");
    assert_eq!(body["services"]["perception"], "mock");
    assert_eq!(body["activeSessions"], 0);
}

#[tokio::test]
async fn it_monitor_status_reports_ready_gaze() {
    let app = spawn_scripted_app(ScriptedPerception::new(true)).await;

    let resp = request(&app.app, Method::GET, "/monitor/status", None, &[]).await;
    let (_, _, body) = response_json(resp).await;
    assert_eq!(body["services"]["gaze"], "ready");
    assert_eq!(body["services"]["perception"], "custom");
}

#[tokio::test]
async fn it_monitor_requires_websocket_upgrade() {
    let app = spawn_test_app().await;

    let resp = request(&app.app, Method::GET, "/ws/monitor", None, &[]).await;
    let (status, _, body) = response_json(resp).await;
    assert!(status.is_client_error(), "got {status}");
    assert_eq!(body["success"], false);
    assert!(body["traceId"].is_string());
    // the rejected upgrade must not hold a slot
    assert_eq!(app.state.active_monitor_sessions(), 0);
}

#[tokio::test]
async fn it_monitor_rejects_when_limit_reached() {
    let mut config = test_config();
    config.limits.max_monitor_connections = 0;
    let app = spawn_with(config, Perception::mock(2)).await;

    let resp = request(&app.app, Method::GET, "/ws/monitor", None, &websocket_headers()).await;
    let (status, _, body) = response_json(resp).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_json_error(&body, "RATE_LIMITED");
    assert_eq!(app.state.metrics().snapshot().sessions_rejected, 1);
}

#[tokio::test]
async fn it_monitor_limit_counts_held_slots() {
    let mut config = test_config();
    config.limits.max_monitor_connections = 1;
    let app = spawn_with(config, Perception::mock(2)).await;

    let _held = app.state.try_acquire_monitor_slot().expect("slot");
    let resp = request(&app.app, Method::GET, "/ws/detect/blink", None, &websocket_headers()).await;
    let (status, _, body) = response_json(resp).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_json_error(&body, "RATE_LIMITED");
}

#[tokio::test]
async fn it_unknown_route_is_json_404() {
    let app = spawn_test_app().await;

    let resp = request(&app.app, Method::GET, "/nope", None, &[]).await;
    let (status, _, body) = response_json(resp).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_json_error(&body, "NOT_FOUND");
}
