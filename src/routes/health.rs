use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::metrics::Stage;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(health_check))
        .route("/live", get(liveness))
        .route("/ready", get(readiness))
        .route("/metrics", get(metrics))
}

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "uptimeSecs": state.uptime_secs(),
        "perception": {
            "mode": state.perception().mode(),
            "gazeReady": state.perception().gaze_ready(),
        }
    }))
}

pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

pub async fn readiness() -> StatusCode {
    StatusCode::OK
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let registry = state.metrics();
    let frames_total = registry
        .stage(Stage::Frame)
        .call_count
        .load(std::sync::atomic::Ordering::Relaxed);
    let gate = state.perception().gate();
    Json(serde_json::json!({
        "activeMonitorSessions": state.active_monitor_sessions(),
        "framesTotal": frames_total,
        "inference": {
            "capacity": gate.capacity(),
            "available": gate.available(),
        },
        "pipeline": registry.snapshot(),
    }))
}
