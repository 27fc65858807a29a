use std::collections::VecDeque;
use std::time::Instant;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use futures::{SinkExt, StreamExt};

use crate::monitor::protocol::ErrorMessage;
use crate::monitor::MonitorSession;
use crate::response::AppError;
use crate::routes::{next_inbound, race_frame, ws_text, Interrupted, WsUpgrade};
use crate::state::{AppState, MonitorSlot};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ws/monitor", get(ws_monitor))
        .route("/monitor/status", get(status))
}

/// Per-frame attention reports over a WebSocket.
///
/// Frames over `max_frame_bytes` get an `{"error"}` reply. Frames over twice
/// that are refused by the socket layer, which ends the session without a
/// reply. Closing the socket abandons any frame still in perception.
pub async fn ws_monitor(
    State(state): State<AppState>,
    ws: WsUpgrade,
) -> Result<Response, AppError> {
    let Some(slot) = state.try_acquire_monitor_slot() else {
        state.metrics().session_rejected();
        return Err(AppError::too_many_requests("Too many monitor sessions"));
    };
    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => return Ok(rejection.into_response()),
    };
    state.metrics().session_opened();
    let max_message = state.config().limits.max_frame_bytes.saturating_mul(2);
    Ok(ws
        .max_message_size(max_message)
        .on_upgrade(move |socket| run_monitor(socket, state, slot)))
}

async fn run_monitor(socket: WebSocket, state: AppState, slot: MonitorSlot) {
    let mut session = MonitorSession::new(
        state.attention_config().clone(),
        state.perception().clone(),
        state.metrics().clone(),
        state.config().limits.max_frame_bytes,
    );
    tracing::info!(session_id = %session.id(), "Monitor session opened");

    let started = Instant::now();
    let mut shutdown_rx = state.shutdown_rx();
    let (mut sender, mut receiver) = socket.split();
    let mut backlog = VecDeque::new();

    let ended = loop {
        let incoming = match next_inbound(&mut receiver, &mut shutdown_rx, &mut backlog).await {
            Ok(msg) => msg,
            Err(why) => break why,
        };

        let reply = match incoming {
            Message::Text(text) => {
                let timestamp = started.elapsed().as_secs_f64();
                let frame = session.handle_text(&text, timestamp);
                let outcome = race_frame(frame, &mut receiver, &mut shutdown_rx, &mut backlog).await;
                match outcome {
                    Ok(Ok(msg)) => ws_text(&msg),
                    Ok(Err(e)) => ws_text(&ErrorMessage::new(e.to_string())),
                    Err(why) => {
                        tracing::debug!(session_id = %session.id(), reason = ?why, "Frame abandoned");
                        break why;
                    }
                }
            }
            Message::Binary(_) => ws_text(&ErrorMessage::new("expected a JSON text frame")),
            _ => continue,
        };

        if let Some(reply) = reply {
            if sender.send(reply).await.is_err() {
                break Interrupted::Disconnected;
            }
        }
    };

    session.close();
    drop(slot);
    if ended == Interrupted::Shutdown {
        let _ = sender.send(Message::Close(None)).await;
    }
}

pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let perception = state.perception();
    let gaze = if perception.gaze_ready() {
        "ready"
    } else {
        "head-pose proxy"
    };
    Json(serde_json::json!({
        "status": "ready",
        "services": {
            "gaze": gaze,
            "perception": perception.mode(),
        },
        "activeSessions": state.active_monitor_sessions(),
    }))
}
