//! WebSocket relay integration tests against an in-process server.

mod fixtures;

use std::time::Duration;

use fixtures::{
    TestServer, assert_silent, connect, history, next_event, post_item, send_new_item, send_raw,
};
use serde_json::json;

#[tokio::test]
async fn test_default_room_scenario() {
    // テスト項目: roomId 省略で default ルームに入り、投稿が全購読者と後続の snapshot に届く
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = connect(&server.ws_url(None)).await;
    let mut bob = connect(&server.ws_url(Some("default"))).await;
    assert_eq!(
        next_event(&mut alice).await,
        json!({ "type": "snapshot", "roomId": "default", "items": [] })
    );
    assert_eq!(next_event(&mut bob).await["items"], json!([]));

    // when (操作):
    send_new_item(&mut alice, "hello").await;

    // then (期待する結果):
    for ws in [&mut alice, &mut bob] {
        let event = next_event(ws).await;
        assert_eq!(event["type"], "new_item");
        assert_eq!(event["roomId"], "default");
        assert_eq!(event["item"]["text"], "hello");
    }

    let mut carol = connect(&server.ws_url(None)).await;
    let snapshot = next_event(&mut carol).await;
    assert_eq!(snapshot["type"], "snapshot");
    assert_eq!(snapshot["items"][0]["text"], "hello");
}

#[tokio::test]
async fn test_http_items_reach_subscribers_in_order() {
    // テスト項目: HTTP で受理された順に new_item が購読者へ届く
    // given (前提条件):
    let server = TestServer::start().await;
    let mut ws = connect(&server.ws_url(Some("ordered"))).await;
    next_event(&mut ws).await;

    // when (操作):
    for text in ["A", "B", "C"] {
        post_item(&server, "ordered", json!({ "text": text })).await;
    }

    // then (期待する結果):
    let mut received = Vec::new();
    for _ in 0..3 {
        received.push(next_event(&mut ws).await["item"]["text"].clone());
    }
    assert_eq!(received, vec![json!("A"), json!("B"), json!("C")]);
}

#[tokio::test]
async fn test_every_subscriber_sees_the_same_order() {
    // テスト項目: 複数の購読者がいずれも受理順（A → B）で new_item を受け取る
    // given (前提条件):
    let server = TestServer::start().await;
    let mut first = connect(&server.ws_url(Some("shared"))).await;
    let mut second = connect(&server.ws_url(Some("shared"))).await;
    next_event(&mut first).await;
    next_event(&mut second).await;

    // when (操作):
    let (status_a, _) = post_item(&server, "shared", json!({ "text": "A" })).await;
    send_new_item(&mut second, "B").await;

    // then (期待する結果):
    assert_eq!(status_a, 201);
    for ws in [&mut first, &mut second] {
        let a = next_event(ws).await;
        let b = next_event(ws).await;
        assert_eq!(a["item"]["text"], "A");
        assert_eq!(b["item"]["text"], "B");
    }
}

#[tokio::test]
async fn test_stream_accepts_text_that_grows_when_escaped() {
    // テスト項目: 制御文字だらけのテキストも上限以内ならストリーム経由で受理される
    // given (前提条件): 150 KiB の制御文字（JSON では 900 KiB になる）
    let server = TestServer::start().await;
    let mut ws = connect(&server.ws_url(None)).await;
    next_event(&mut ws).await;
    let text = "\u{1}".repeat(150 * 1024);

    // when (操作):
    send_new_item(&mut ws, &text).await;

    // then (期待する結果):
    let event = next_event(&mut ws).await;
    assert_eq!(event["type"], "new_item");
    assert_eq!(event["item"]["text"].as_str().unwrap(), text);
    assert_eq!(history(&server, "default").await.len(), 1);
}

#[tokio::test]
async fn test_malformed_frames_are_ignored() {
    // テスト項目: 不正なフレームは無視され、接続は維持される
    // given (前提条件):
    let server = TestServer::start().await;
    let mut ws = connect(&server.ws_url(None)).await;
    next_event(&mut ws).await;

    // when (操作):
    send_raw(&mut ws, "definitely not json").await;
    send_raw(&mut ws, r#"{"type":"delete_everything"}"#).await;
    send_new_item(&mut ws, "").await;
    send_new_item(&mut ws, "valid").await;

    // then (期待する結果):
    let event = next_event(&mut ws).await;
    assert_eq!(event["type"], "new_item");
    assert_eq!(event["item"]["text"], "valid");
    assert_eq!(history(&server, "default").await.len(), 1);
}

#[tokio::test]
async fn test_rooms_do_not_leak() {
    // テスト項目: 別ルームの購読者には配信されない
    // given (前提条件):
    let server = TestServer::start().await;
    let mut in_b = connect(&server.ws_url(Some("b"))).await;
    next_event(&mut in_b).await;

    // when (操作):
    post_item(&server, "a", json!({ "text": "only for a" })).await;

    // then (期待する結果):
    assert_silent(&mut in_b, Duration::from_millis(200)).await;
}

#[tokio::test]
async fn test_history_survives_restart() {
    // テスト項目: サーバーを再起動しても snapshot に以前の履歴が含まれる
    // given (前提条件):
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("copimon.db");
    {
        let server = TestServer::start_with_database(&path).await;
        let (status, _) = post_item(&server, "default", json!({ "text": "remember me" })).await;
        assert_eq!(status, 201);
    }

    // when (操作):
    let restarted = TestServer::start_with_database(&path).await;
    let mut ws = connect(&restarted.ws_url(None)).await;

    // then (期待する結果):
    let snapshot = next_event(&mut ws).await;
    assert_eq!(snapshot["type"], "snapshot");
    assert_eq!(snapshot["items"][0]["text"], "remember me");
}
