//! In-process server fixture shared by the integration tests.

#![allow(dead_code)]

use std::{net::SocketAddr, path::Path, sync::Arc, time::Duration};

use copimon_server::{infrastructure::repository::SqliteItemRepository, ui::Server};
use copimon_shared::{log_buffer::LogBuffer, time::SystemClock};
use futures_util::{SinkExt, StreamExt};
use tokio::{net::TcpStream, task::JoinHandle};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, tungstenite::Message};

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Server bound to an ephemeral port, stopped on drop
pub struct TestServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
    pub log_buffer: LogBuffer,
    _dir: Option<tempfile::TempDir>,
}

impl TestServer {
    /// Start with a fresh database in a temporary directory
    pub async fn start() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut server = Self::start_with_database(&dir.path().join("copimon.db")).await;
        server._dir = Some(dir);
        server
    }

    /// Start on an existing (or new) database file
    pub async fn start_with_database(path: &Path) -> Self {
        let repository = SqliteItemRepository::open(path).unwrap();
        let log_buffer = LogBuffer::default();
        let server = Server::with_repository(
            Arc::new(repository),
            Arc::new(SystemClock),
            log_buffer.clone(),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let _ = server.serve(listener, std::future::pending()).await;
        });

        Self {
            addr,
            handle,
            log_buffer,
            _dir: None,
        }
    }

    pub fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn ws_url(&self, room_id: Option<&str>) -> String {
        match room_id {
            Some(room_id) => format!("ws://{}/ws?roomId={}", self.addr, room_id),
            None => format!("ws://{}/ws", self.addr),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Open a WebSocket connection
pub async fn connect(url: &str) -> WsStream {
    let (stream, _) = tokio_tungstenite::connect_async(url).await.unwrap();
    stream
}

/// Next JSON text frame, skipping control frames
pub async fn next_event(ws: &mut WsStream) -> serde_json::Value {
    loop {
        let msg = tokio::time::timeout(RECV_TIMEOUT, ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("stream ended")
            .expect("websocket error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

/// `true` when no text frame arrives within `wait`
pub async fn assert_silent(ws: &mut WsStream, wait: Duration) {
    if let Ok(Some(Ok(Message::Text(text)))) = tokio::time::timeout(wait, ws.next()).await {
        panic!("unexpected frame: {}", text.as_str());
    }
}

/// Send a `new_item` frame
pub async fn send_new_item(ws: &mut WsStream, text: &str) {
    let frame = serde_json::json!({ "type": "new_item", "text": text }).to_string();
    ws.send(Message::Text(frame.into())).await.unwrap();
}

/// Send an arbitrary text frame
pub async fn send_raw(ws: &mut WsStream, frame: &str) {
    ws.send(Message::Text(frame.to_string().into())).await.unwrap();
}

/// POST an item over HTTP, returning the status and JSON body
pub async fn post_item(
    server: &TestServer,
    room_id: &str,
    body: serde_json::Value,
) -> (reqwest::StatusCode, serde_json::Value) {
    let response = reqwest::Client::new()
        .post(server.http_url(&format!("/rooms/{}/clipboard", room_id)))
        .json(&body)
        .send()
        .await
        .unwrap();
    let status = response.status();
    let body = response.json().await.unwrap();
    (status, body)
}

/// GET the history of a room
pub async fn history(server: &TestServer, room_id: &str) -> Vec<serde_json::Value> {
    let body: serde_json::Value = reqwest::get(server.http_url(&format!("/rooms/{}/history", room_id)))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    body["items"].as_array().cloned().unwrap_or_default()
}
