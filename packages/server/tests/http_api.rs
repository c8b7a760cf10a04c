//! HTTP API integration tests against an in-process server.

mod fixtures;

use fixtures::{TestServer, history, post_item};
use serde_json::json;

#[tokio::test]
async fn test_health_check() {
    // テスト項目: /health が {ok:true} を返す
    // given (前提条件):
    let server = TestServer::start().await;

    // when (操作):
    let response = reqwest::get(server.http_url("/health")).await.unwrap();

    // then (期待する結果):
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "ok": true }));
}

#[tokio::test]
async fn test_post_item_returns_created_item() {
    // テスト項目: POST /rooms/{id}/clipboard は 201 と保存されたアイテムを返す
    // given (前提条件):
    let server = TestServer::start().await;

    // when (操作):
    let (status, body) = post_item(&server, "default", json!({ "text": "hello" })).await;

    // then (期待する結果):
    assert_eq!(status, 201);
    assert_eq!(body["ok"], true);
    assert_eq!(body["item"]["text"], "hello");
    assert!(body["item"]["id"].as_str().unwrap().contains('-'));
    assert!(body["item"]["ts"].as_i64().unwrap() > 0);

    let items = history(&server, "default").await;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], body["item"]["id"]);
}

#[tokio::test]
async fn test_post_item_rejects_missing_or_empty_text() {
    // テスト項目: text がない・空・JSON でない場合は 400 {error} になり、何も保存されない
    // given (前提条件):
    let server = TestServer::start().await;
    let client = reqwest::Client::new();
    let url = server.http_url("/rooms/default/clipboard");

    // when (操作):
    let (empty_status, empty_body) = post_item(&server, "default", json!({ "text": "" })).await;
    let (missing_status, missing_body) = post_item(&server, "default", json!({})).await;
    let garbage = client
        .post(&url)
        .header("content-type", "application/json")
        .body("not json")
        .send()
        .await
        .unwrap();

    // then (期待する結果):
    assert_eq!(empty_status, 400);
    assert_eq!(empty_body, json!({ "error": "text is required" }));
    assert_eq!(missing_status, 400);
    assert_eq!(missing_body, json!({ "error": "text is required" }));
    assert_eq!(garbage.status(), 400);
    assert!(history(&server, "default").await.is_empty());
}

#[tokio::test]
async fn test_post_item_accepts_text_that_grows_when_escaped() {
    // テスト項目: JSON エスケープで膨らむテキストでも上限以内なら受理される
    // given (前提条件): 150 KiB の `"`（JSON では 300 KiB になる）
    let server = TestServer::start().await;
    let text = "\"".repeat(150 * 1024);

    // when (操作):
    let (status, body) = post_item(&server, "default", json!({ "text": text })).await;

    // then (期待する結果):
    assert_eq!(status, 201);
    assert_eq!(body["item"]["text"].as_str().unwrap().len(), text.len());
    assert_eq!(history(&server, "default").await.len(), 1);
}

#[tokio::test]
async fn test_history_of_unknown_room_is_empty() {
    // テスト項目: 投稿のないルームの履歴は空
    // given (前提条件):
    let server = TestServer::start().await;

    // when (操作):
    let items = history(&server, "nobody-here").await;

    // then (期待する結果):
    assert!(items.is_empty());
}

#[tokio::test]
async fn test_history_keeps_latest_100_newest_first() {
    // テスト項目: 150 件投稿すると最新の 100 件だけが新しい順に残る
    // given (前提条件):
    let server = TestServer::start().await;

    // when (操作):
    for i in 0..150 {
        let (status, _) = post_item(&server, "bulk", json!({ "text": format!("item-{}", i) })).await;
        assert_eq!(status, 201);
    }
    let items = history(&server, "bulk").await;

    // then (期待する結果):
    assert_eq!(items.len(), 100);
    assert_eq!(items[0]["text"], "item-149");
    assert_eq!(items[99]["text"], "item-50");
    let mut ids: Vec<&str> = items.iter().map(|i| i["id"].as_str().unwrap()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 100);
}

#[tokio::test]
async fn test_rooms_are_isolated() {
    // テスト項目: あるルームへの投稿は他のルームの履歴に現れない
    // given (前提条件):
    let server = TestServer::start().await;

    // when (操作):
    post_item(&server, "room-a", json!({ "text": "for a" })).await;

    // then (期待する結果):
    assert_eq!(history(&server, "room-a").await.len(), 1);
    assert!(history(&server, "room-b").await.is_empty());
}

#[tokio::test]
async fn test_logs_endpoint_returns_buffer() {
    // テスト項目: /logs はサーバーのログバッファを返す
    // given (前提条件):
    let server = TestServer::start().await;
    server.log_buffer.push("INFO", "relay started");

    // when (操作):
    let body: serde_json::Value = reqwest::get(server.http_url("/logs"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // then (期待する結果):
    let logs = body["logs"].as_array().unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0]["level"], "INFO");
    assert_eq!(logs[0]["message"], "relay started");
}

#[tokio::test]
async fn test_cors_is_permissive() {
    // テスト項目: 別オリジンからのリクエストに CORS ヘッダーが付く
    // given (前提条件):
    let server = TestServer::start().await;

    // when (操作):
    let response = reqwest::Client::new()
        .get(server.http_url("/health"))
        .header("origin", "chrome-extension://abcdef")
        .send()
        .await
        .unwrap();

    // then (期待する結果):
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "*"
    );
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    // テスト項目: 未定義のパスは 404
    // given (前提条件):
    let server = TestServer::start().await;

    // when (操作):
    let response = reqwest::get(server.http_url("/socket")).await.unwrap();

    // then (期待する結果):
    assert_eq!(response.status(), 404);
}
