use std::collections::VecDeque;
use std::time::Duration;

use attention_core::ear::EyeClosureClassifier;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use futures::{SinkExt, StreamExt};

use crate::constants::BLINK_COUNT_KEEPALIVE_SECS;
use crate::monitor::decode_frame;
use crate::monitor::protocol::{BlinkCountMessage, BlinkMessage, ErrorMessage};
use crate::monitor::FrameError;
use crate::response::{ok, AppError};
use crate::routes::{next_inbound, race_frame, ws_text, Interrupted, WsUpgrade};
use crate::state::{AppState, MonitorSlot};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ws/detect/blink", get(ws_detect_blink))
        .route("/ws/blink/count", get(ws_blink_count))
        .route("/api/blink/count", get(get_count))
        .route("/api/blink/count/reset", post(reset_count))
}

/// Per-frame eye closure over a WebSocket; closure onsets bump the shared
/// blink counter. Frame size limits behave as on `/ws/monitor`.
pub async fn ws_detect_blink(
    State(state): State<AppState>,
    ws: WsUpgrade,
) -> Result<Response, AppError> {
    let Some(slot) = state.try_acquire_monitor_slot() else {
        state.metrics().session_rejected();
        return Err(AppError::too_many_requests("Too many detection sessions"));
    };
    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => return Ok(rejection.into_response()),
    };
    let max_message = state.config().limits.max_frame_bytes.saturating_mul(2);
    Ok(ws
        .max_message_size(max_message)
        .on_upgrade(move |socket| run_detect_blink(socket, state, slot)))
}

struct BlinkDetector {
    classifier: EyeClosureClassifier,
    was_closed: bool,
}

impl BlinkDetector {
    async fn detect(&mut self, state: &AppState, text: &str) -> Result<BlinkMessage, FrameError> {
        let image = decode_frame(text, state.config().limits.max_frame_bytes)?;
        let Some(face) = state.perception().landmarks().detect(&image).await? else {
            self.was_closed = false;
            return Ok(BlinkMessage {
                blinking: false,
                left_ear: 0.0,
                right_ear: 0.0,
            });
        };
        let closure = self
            .classifier
            .classify_landmarks(&face.left_eye_px(), &face.right_eye_px());
        if closure.closed && !self.was_closed {
            let total = state.blink_counter().increment();
            tracing::debug!(total, "blink detected");
        }
        self.was_closed = closure.closed;
        Ok(BlinkMessage {
            blinking: closure.closed,
            left_ear: closure.left_ear,
            right_ear: closure.right_ear,
        })
    }
}

async fn run_detect_blink(socket: WebSocket, state: AppState, slot: MonitorSlot) {
    let mut detector = BlinkDetector {
        classifier: EyeClosureClassifier::new(state.attention_config().ear_closed_threshold),
        was_closed: false,
    };
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
                let frame = detector.detect(&state, &text);
                let outcome = race_frame(frame, &mut receiver, &mut shutdown_rx, &mut backlog).await;
                match outcome {
                    Ok(Ok(msg)) => ws_text(&msg),
                    Ok(Err(e)) => {
                        tracing::warn!(error = %e, "blink frame rejected");
                        ws_text(&ErrorMessage::new(e.to_string()))
                    }
                    Err(why) => break why,
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

    drop(slot);
    if ended == Interrupted::Shutdown {
        let _ = sender.send(Message::Close(None)).await;
    }
}

pub async fn ws_blink_count(State(state): State<AppState>, ws: WsUpgrade) -> Response {
    match ws {
        Ok(ws) => ws.on_upgrade(move |socket| run_blink_count(socket, state)),
        Err(rejection) => rejection.into_response(),
    }
}

async fn run_blink_count(socket: WebSocket, state: AppState) {
    let mut counts = state.blink_counter().subscribe();
    let mut shutdown_rx = state.shutdown_rx();
    let (mut sender, mut receiver) = socket.split();
    let mut keepalive = tokio::time::interval(Duration::from_secs(BLINK_COUNT_KEEPALIVE_SECS));
    keepalive.tick().await;

    let initial = *counts.borrow_and_update();
    if let Some(msg) = ws_text(&BlinkCountMessage { blink_count: initial }) {
        if sender.send(msg).await.is_err() {
            return;
        }
    }

    loop {
        let outbound = tokio::select! {
            changed = counts.changed() => {
                if changed.is_err() {
                    break;
                }
                let blink_count = *counts.borrow_and_update();
                ws_text(&BlinkCountMessage { blink_count })
            }
            msg = receiver.next() => match msg {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                // client messages only keep the connection alive
                Some(Ok(_)) => None,
            },
            _ = keepalive.tick() => Some(Message::Ping(Vec::new())),
            _ = shutdown_rx.recv() => {
                let _ = sender.send(Message::Close(None)).await;
                break;
            }
        };

        if let Some(msg) = outbound {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    }
}

pub async fn get_count(State(state): State<AppState>) -> impl IntoResponse {
    ok(serde_json::json!({ "blinkCount": state.blink_counter().get() }))
}

pub async fn reset_count(State(state): State<AppState>) -> impl IntoResponse {
    state.blink_counter().reset();
    tracing::info!("Blink counter reset");
    ok(serde_json::json!({ "blinkCount": 0 }))
}
