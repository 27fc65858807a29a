mod common;

use axum::http::{Method, StatusCode};

use common::app::spawn_test_app;
use common::http::{assert_status_ok_json, request, response_json};

#[tokio::test]
async fn it_blink_count_starts_at_zero() {
    let app = spawn_test_app().await;

    let resp = request(&app.app, Method::GET, "/api/blink/count", None, &[]).await;
    let (status, _, body) = response_json(resp).await;
    assert_status_ok_json(status, &body);
    assert_eq!(body["data"]["blinkCount"], 0);
}

#[tokio::test]
async fn it_blink_count_reflects_counter_and_resets() {
    let app = spawn_test_app().await;
    app.state.blink_counter().increment();
    app.state.blink_counter().increment();

    let resp = request(&app.app, Method::GET, "/api/blink/count", None, &[]).await;
    let (_, _, body) = response_json(resp).await;
    assert_eq!(body["data"]["blinkCount"], 2);

    let resp = request(&app.app, Method::POST, "/api/blink/count/reset", None, &[]).await;
    let (status, _, body) = response_json(resp).await;
    assert_status_ok_json(status, &body);
    assert_eq!(body["data"]["blinkCount"], 0);
    assert_eq!(app.state.blink_counter().get(), 0);
}

#[tokio::test]
async fn it_blink_reset_requires_post() {
    let app = spawn_test_app().await;

    let resp = request(&app.app, Method::GET, "/api/blink/count/reset", None, &[]).await;
    let (status, _, body) = response_json(resp).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["code"], "METHOD_NOT_ALLOWED");
}

#[tokio::test]
async fn it_blink_count_socket_requires_upgrade() {
    let app = spawn_test_app().await;

    let resp = request(&app.app, Method::GET, "/ws/blink/count", None, &[]).await;
    assert!(resp.status().is_client_error());
}
