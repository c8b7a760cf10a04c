//! WebSocket message DTOs for the clipboard relay.
//!
//! Server → client:
//! - `{"type":"snapshot","roomId":"...","items":[{id,text,ts}, ...]}`
//! - `{"type":"new_item","roomId":"...","item":{id,text,ts}}`
//!
//! Client → server:
//! - `{"type":"new_item","text":"..."}`
//!
//! Every inbound frame goes through [`decode_client_message`] /
//! [`decode_server_event`]; what to do with a [`ProtocolError`] is decided by
//! the caller.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::value_object::{MAX_ITEM_TEXT_BYTES, MAX_ROOM_ID_BYTES};

/// Upper bound of one encoded message carrying a single item.
///
/// JSON escapes a control character to six bytes (`\u0001`), so text and room
/// id may grow sixfold on the wire. The rest covers the envelope.
pub const MAX_ENCODED_ITEM_BYTES: usize = (MAX_ITEM_TEXT_BYTES + MAX_ROOM_ID_BYTES) * 6 + 1024;

/// Item as it appears on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDto {
    pub id: String,
    pub text: String,
    /// Unix timestamp (milliseconds since epoch)
    pub ts: i64,
}

/// Events pushed from the server to subscribed connections
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Recent history, sent once to a newly subscribed connection
    Snapshot {
        #[serde(rename = "roomId")]
        room_id: String,
        items: Vec<ItemDto>,
    },
    /// A newly accepted item, sent to every subscriber of the room
    NewItem {
        #[serde(rename = "roomId")]
        room_id: String,
        item: ItemDto,
    },
}

/// Messages sent from a client over the stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Request to create an item
    NewItem { text: String },
}

/// Malformed or unencodable stream message
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Malformed(String),

    #[error("failed to encode message: {0}")]
    Encode(String),
}

impl ServerEvent {
    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Encode(e.to_string()))
    }
}

impl ClientMessage {
    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Encode(e.to_string()))
    }
}

/// Decode one inbound client frame
pub fn decode_client_message(text: &str) -> Result<ClientMessage, ProtocolError> {
    serde_json::from_str(text).map_err(|e| ProtocolError::Malformed(e.to_string()))
}

/// Decode one inbound server frame
pub fn decode_server_event(text: &str) -> Result<ServerEvent, ProtocolError> {
    serde_json::from_str(text).map_err(|e| ProtocolError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_item() -> ItemDto {
        ItemDto {
            id: "1700000000000-abcdef01".to_string(),
            text: "hello".to_string(),
            ts: 1700000000000,
        }
    }

    #[test]
    fn test_snapshot_wire_format() {
        // テスト項目: snapshot イベントが仕様どおりの JSON になる
        // given (前提条件):
        let event = ServerEvent::Snapshot {
            room_id: "default".to_string(),
            items: vec![sample_item()],
        };

        // when (操作):
        let json: serde_json::Value = serde_json::from_str(&event.encode().unwrap()).unwrap();

        // then (期待する結果):
        assert_eq!(json["type"], "snapshot");
        assert_eq!(json["roomId"], "default");
        assert_eq!(json["items"][0]["id"], "1700000000000-abcdef01");
        assert_eq!(json["items"][0]["text"], "hello");
        assert_eq!(json["items"][0]["ts"], 1700000000000_i64);
    }

    #[test]
    fn test_new_item_wire_format() {
        // テスト項目: new_item イベントが仕様どおりの JSON になる
        // given (前提条件):
        let event = ServerEvent::NewItem {
            room_id: "default".to_string(),
            item: sample_item(),
        };

        // when (操作):
        let json: serde_json::Value = serde_json::from_str(&event.encode().unwrap()).unwrap();

        // then (期待する結果):
        assert_eq!(json["type"], "new_item");
        assert_eq!(json["roomId"], "default");
        assert_eq!(json["item"]["text"], "hello");
    }

    #[test]
    fn test_decode_client_new_item() {
        // テスト項目: クライアントの new_item メッセージをデコードできる
        // when (操作):
        let result = decode_client_message(r#"{"type":"new_item","text":"hello"}"#);

        // then (期待する結果):
        assert_eq!(
            result,
            Ok(ClientMessage::NewItem {
                text: "hello".to_string()
            })
        );
    }

    #[test]
    fn test_decode_client_message_rejects_garbage() {
        // テスト項目: JSON でないメッセージは ProtocolError になる
        // when (操作):
        let result = decode_client_message("hello, not json");

        // then (期待する結果):
        assert!(matches!(result, Err(ProtocolError::Malformed(_))));
    }

    #[test]
    fn test_decode_client_message_rejects_unknown_type() {
        // テスト項目: 未知の type は ProtocolError になる
        // when (操作):
        let result = decode_client_message(r#"{"type":"delete_item","id":"x"}"#);

        // then (期待する結果):
        assert!(matches!(result, Err(ProtocolError::Malformed(_))));
    }

    #[test]
    fn test_decode_client_message_rejects_missing_text() {
        // テスト項目: text のない new_item は ProtocolError になる
        // when (操作):
        let result = decode_client_message(r#"{"type":"new_item"}"#);

        // then (期待する結果):
        assert!(matches!(result, Err(ProtocolError::Malformed(_))));
    }

    #[test]
    fn test_worst_case_escaped_item_fits_encoded_limit() {
        // テスト項目: エスケープで最大まで膨らむテキストでも上限内に収まる
        // given (前提条件):
        let control = "\u{1}".repeat(MAX_ITEM_TEXT_BYTES);
        let quotes = "\"".repeat(MAX_ITEM_TEXT_BYTES);
        let room_id = "\u{1}".repeat(MAX_ROOM_ID_BYTES);

        // when (操作):
        let request = ClientMessage::NewItem { text: control.clone() }.encode().unwrap();
        let quoted = ClientMessage::NewItem { text: quotes }.encode().unwrap();
        let event = ServerEvent::NewItem {
            room_id,
            item: ItemDto {
                id: "1700000000000-abcdef01".to_string(),
                text: control,
                ts: 1700000000000,
            },
        }
        .encode()
        .unwrap();

        // then (期待する結果):
        assert!(request.len() > MAX_ITEM_TEXT_BYTES * 5);
        assert!(request.len() <= MAX_ENCODED_ITEM_BYTES);
        assert!(quoted.len() <= MAX_ENCODED_ITEM_BYTES);
        assert!(event.len() <= MAX_ENCODED_ITEM_BYTES);
    }

    #[test]
    fn test_decode_server_event_snapshot() {
        // テスト項目: サーバーからの snapshot をデコードできる
        // when (操作):
        let result = decode_server_event(r#"{"type":"snapshot","roomId":"default","items":[]}"#);

        // then (期待する結果):
        assert_eq!(
            result,
            Ok(ServerEvent::Snapshot {
                room_id: "default".to_string(),
                items: vec![],
            })
        );
    }
}
