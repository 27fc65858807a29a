pub mod blink;
pub mod health;
pub mod monitor;

use std::collections::VecDeque;
use std::future::Future;

use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::Router;
use futures::stream::SplitStream;
use futures::StreamExt;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::middleware::request_id;
use crate::response::AppError;
use crate::state::AppState;

/// Upgrade extractor that lets handlers run their own checks (such as the
/// session limit) before reporting a failed upgrade.
pub type WsUpgrade = Result<WebSocketUpgrade, WebSocketUpgradeRejection>;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .nest("/health", health::router())
        .merge(monitor::router())
        .merge(blink::router())
        .fallback(fallback_404)
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .with_state(state)
}

async fn fallback_404() -> impl IntoResponse {
    AppError::not_found("Not found")
}

pub(crate) fn ws_text<T: Serialize>(value: &T) -> Option<Message> {
    match serde_json::to_string(value) {
        Ok(json) => Some(Message::Text(json)),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize socket message");
            None
        }
    }
}

/// Why a frame was abandoned before it finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Interrupted {
    Disconnected,
    Shutdown,
}

/// Drives one frame while watching the socket and the shutdown broadcast.
///
/// A close, a socket error or shutdown drops `frame` on the spot. Data
/// frames that arrive meanwhile are queued on `backlog` in arrival order.
pub(crate) async fn race_frame<F: Future>(
    frame: F,
    receiver: &mut SplitStream<WebSocket>,
    shutdown_rx: &mut broadcast::Receiver<()>,
    backlog: &mut VecDeque<Message>,
) -> Result<F::Output, Interrupted> {
    tokio::pin!(frame);
    loop {
        tokio::select! {
            output = &mut frame => return Ok(output),
            msg = receiver.next() => match msg {
                Some(Ok(msg @ (Message::Text(_) | Message::Binary(_)))) => backlog.push_back(msg),
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => {
                    return Err(Interrupted::Disconnected)
                }
                Some(Ok(_)) => {}
            },
            _ = shutdown_rx.recv() => return Err(Interrupted::Shutdown),
        }
    }
}

/// Next inbound message: queued frames first, then the socket.
pub(crate) async fn next_inbound(
    receiver: &mut SplitStream<WebSocket>,
    shutdown_rx: &mut broadcast::Receiver<()>,
    backlog: &mut VecDeque<Message>,
) -> Result<Message, Interrupted> {
    if let Some(msg) = backlog.pop_front() {
        return Ok(msg);
    }
    tokio::select! {
        msg = receiver.next() => match msg {
            Some(Ok(Message::Close(_))) | None => Err(Interrupted::Disconnected),
            Some(Ok(msg)) => Ok(msg),
            Some(Err(e)) => {
                tracing::debug!(error = %e, "Socket read failed");
                Err(Interrupted::Disconnected)
            }
        },
        _ = shutdown_rx.recv() => Err(Interrupted::Shutdown),
    }
}
