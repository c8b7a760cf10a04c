//! Network seams of the sync client.
//!
//! - [`Connector`] opens the streaming connection (WebSocket in production)
//! - [`ItemPoster`] delivers one item over the REST fallback
//!
//! The sync actor only talks to these traits, so tests drive it with fakes.

use std::sync::Arc;

use async_trait::async_trait;
use copimon_server::{
    domain::HISTORY_CAPACITY,
    infrastructure::dto::{http::PostItemRequest, websocket::MAX_ENCODED_ITEM_BYTES},
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{
    connect_async_with_config,
    tungstenite::protocol::{Message, WebSocketConfig},
};

use crate::{config::ClientConfig, error::ClientError};

/// What the reader side of a connection reports
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// One text frame
    Text(String),
    /// The connection ended, with the reason when there was one
    Closed(Option<String>),
}

/// Writer side of an open connection
pub trait FrameSink: Send + Sync {
    /// Hand one text frame to the writer. Fails once the writer is gone.
    fn send_frame(&self, text: String) -> Result<(), ClientError>;
}

impl FrameSink for mpsc::UnboundedSender<String> {
    fn send_frame(&self, text: String) -> Result<(), ClientError> {
        self.send(text)
            .map_err(|_| ClientError::Transport("connection writer is gone".to_string()))
    }
}

/// An established streaming connection
pub struct Connection {
    pub sink: Arc<dyn FrameSink>,
    pub inbound: mpsc::UnboundedReceiver<Inbound>,
}

/// Opens streaming connections
#[async_trait]
pub trait Connector: Send + Sync {
    /// Complete the handshake with `url`
    async fn connect(&self, url: &str) -> Result<Connection, ClientError>;
}

/// Delivers one item over the REST fallback
#[async_trait]
pub trait ItemPoster: Send + Sync {
    /// `Ok` only when the server accepted the item (2xx)
    async fn post_item(&self, text: &str) -> Result<(), ClientError>;
}

/// WebSocket connector (tokio-tungstenite)
#[derive(Debug, Default, Clone, Copy)]
pub struct WebSocketConnector;

#[async_trait]
impl Connector for WebSocketConnector {
    async fn connect(&self, url: &str) -> Result<Connection, ClientError> {
        // snapshot は最大 HISTORY_CAPACITY 件のアイテムを 1 フレームで運ぶ
        let limit = HISTORY_CAPACITY * MAX_ENCODED_ITEM_BYTES;
        let config = WebSocketConfig::default()
            .max_message_size(Some(limit))
            .max_frame_size(Some(limit));
        let (stream, _response) = connect_async_with_config(url, Some(config), false)
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        let (mut write, mut read) = stream.split();

        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();
        let (in_tx, in_rx) = mpsc::unbounded_channel();

        // sink が drop されると writer が終わり、ソケットを閉じる
        let writer = tokio::spawn(async move {
            while let Some(text) = out_rx.recv().await {
                if let Err(e) = write.send(Message::Text(text.into())).await {
                    tracing::debug!("WebSocket write failed: {}", e);
                    break;
                }
            }
            let _ = write.close().await;
        });

        tokio::spawn(async move {
            let reason = loop {
                match read.next().await {
                    Some(Ok(Message::Text(text))) => {
                        if in_tx.send(Inbound::Text(text.as_str().to_owned())).is_err() {
                            break None;
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        break Some("connection closed by server".to_string());
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => break Some(e.to_string()),
                    None => break Some("connection closed".to_string()),
                }
            };
            writer.abort();
            let _ = in_tx.send(Inbound::Closed(reason));
        });

        Ok(Connection {
            sink: Arc::new(out_tx),
            inbound: in_rx,
        })
    }
}

/// REST fallback over `POST /rooms/{room}/clipboard` (reqwest)
#[derive(Debug, Clone)]
pub struct HttpItemPoster {
    client: reqwest::Client,
    url: String,
}

impl HttpItemPoster {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            url: config.clipboard_url()?,
        })
    }
}

#[async_trait]
impl ItemPoster for HttpItemPoster {
    async fn post_item(&self, text: &str) -> Result<(), ClientError> {
        let response = self
            .client
            .post(&self.url)
            .json(&PostItemRequest {
                text: Some(text.to_string()),
            })
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ClientError::Http(status.as_u16()))
        }
    }
}
