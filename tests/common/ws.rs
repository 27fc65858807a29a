use std::net::SocketAddr;
use std::time::{Duration, Instant};

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use super::app::TestApp;

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

const READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Serves the app on an ephemeral local port.
pub async fn serve(app: &TestApp) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");
    let router = app.app.clone();
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve test app");
    });
    addr
}

pub async fn connect(addr: SocketAddr, path: &str) -> WsClient {
    let (client, _) = connect_async(format!("ws://{addr}{path}"))
        .await
        .expect("websocket handshake");
    client
}

pub async fn send_text(client: &mut WsClient, text: &str) {
    client
        .send(Message::Text(text.to_string()))
        .await
        .expect("send text frame");
}

/// Next text frame parsed as JSON, skipping control frames.
pub async fn next_json(client: &mut WsClient) -> Value {
    let read = async {
        loop {
            match client.next().await {
                Some(Ok(Message::Text(text))) => {
                    return serde_json::from_str::<Value>(&text).expect("json text frame")
                }
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
                other => panic!("expected a text frame, got {other:?}"),
            }
        }
    };
    tokio::time::timeout(READ_TIMEOUT, read)
        .await
        .expect("timed out waiting for a text frame")
}

/// Waits until the server closes the socket. Fails on any data frame.
pub async fn expect_closed(client: &mut WsClient) {
    let read = async {
        loop {
            match client.next().await {
                None | Some(Err(_)) | Some(Ok(Message::Close(_))) => return,
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
                Some(Ok(other)) => panic!("expected close, got {other:?}"),
            }
        }
    };
    tokio::time::timeout(READ_TIMEOUT, read)
        .await
        .expect("timed out waiting for close");
}

/// Polls `condition` every 10ms until it holds or `within` elapses.
/// Returns how long it took.
pub async fn wait_until<F>(within: Duration, mut condition: F) -> Option<Duration>
where
    F: FnMut() -> bool,
{
    let started = Instant::now();
    while started.elapsed() < within {
        if condition() {
            return Some(started.elapsed());
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition().then(|| started.elapsed())
}
