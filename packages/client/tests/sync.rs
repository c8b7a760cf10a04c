//! End-to-end tests: sync clients against an in-process server.

use std::{future::Future, net::SocketAddr, sync::Arc, time::Duration};

use copimon_client::{ClientConfig, ConnectionState, SubmitOutcome, SyncClient};
use copimon_server::{
    infrastructure::{dto::http::HistoryResponse, repository::InMemoryItemRepository},
    ui::Server,
};
use copimon_shared::{log_buffer::LogBuffer, time::SystemClock};
use tokio::{net::TcpListener, task::JoinHandle};

async fn serve_on(listener: TcpListener) -> JoinHandle<()> {
    let server = Server::with_repository(
        Arc::new(InMemoryItemRepository::new()),
        Arc::new(SystemClock),
        LogBuffer::default(),
    );
    tokio::spawn(async move {
        let _ = server.serve(listener, std::future::pending()).await;
    })
}

async fn start_server() -> (SocketAddr, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (addr, serve_on(listener).await)
}

fn config(addr: SocketAddr, room_id: &str) -> ClientConfig {
    ClientConfig::new(format!("http://{}", addr), room_id)
        .with_reconnect_delay(Duration::from_millis(100))
}

async fn wait_until<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    tokio::time::timeout(Duration::from_secs(10), async {
        while !check().await {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("condition was not met in time");
}

async fn wait_connected(client: &SyncClient) {
    wait_until(|| async move {
        client.connection_status().await.unwrap().state == ConnectionState::Connected
    })
    .await;
}

async fn cached_texts(client: &SyncClient) -> Vec<String> {
    client
        .cached_items()
        .await
        .unwrap()
        .into_iter()
        .map(|item| item.text)
        .collect()
}

#[tokio::test]
async fn test_item_is_relayed_between_clients() {
    // テスト項目: 一方のクライアントで送ったアイテムが同じルームの他方に届く
    // given (前提条件):
    let (addr, server) = start_server().await;
    let alice = SyncClient::start(config(addr, "desk")).unwrap();
    let bob = SyncClient::start(config(addr, "desk")).unwrap();
    wait_connected(&alice).await;
    wait_connected(&bob).await;

    // when (操作):
    let outcome = alice.submit("copied on alice").await.unwrap();

    // then (期待する結果):
    assert_eq!(outcome, SubmitOutcome::Sent);
    let bob_ref = &bob;
    wait_until(|| async move { cached_texts(bob_ref).await == vec!["copied on alice"] }).await;
    let alice_ref = &alice;
    wait_until(|| async move { cached_texts(alice_ref).await == vec!["copied on alice"] }).await;

    alice.shutdown().await.unwrap();
    bob.shutdown().await.unwrap();
    server.abort();
}

#[tokio::test]
async fn test_snapshot_on_connect_matches_history() {
    // テスト項目: 接続時の snapshot で既存の履歴が新しい順にキャッシュされる
    // given (前提条件):
    let (addr, server) = start_server().await;
    let http = reqwest::Client::new();
    for text in ["first", "second"] {
        let response = http
            .post(format!("http://{}/rooms/desk/clipboard", addr))
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 201);
    }

    // when (操作):
    let client = SyncClient::start(config(addr, "desk")).unwrap();

    // then (期待する結果):
    let client_ref = &client;
    wait_until(|| async move { cached_texts(client_ref).await.len() == 2 }).await;
    assert_eq!(cached_texts(&client).await, vec!["second", "first"]);

    client.shutdown().await.unwrap();
    server.abort();
}

#[tokio::test]
async fn test_offline_item_is_delivered_once_server_is_up() {
    // テスト項目: サーバー停止中に送ったアイテムは、サーバー起動後にちょうど 1 回届く
    // given (前提条件): ポートだけ確保してサーバーはまだ起動しない
    let reserved = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = reserved.local_addr().unwrap();
    drop(reserved);

    let client = SyncClient::start(config(addr, "desk")).unwrap();
    let outcome = client.submit("typed while offline").await.unwrap();
    assert_eq!(outcome, SubmitOutcome::Queued);
    let client_ref = &client;
    wait_until(|| async move {
        client_ref
            .connection_status()
            .await
            .unwrap()
            .last_error
            .is_some()
    })
    .await;
    assert_eq!(client.pending_count().await.unwrap(), 1);

    // when (操作):
    let server = serve_on(TcpListener::bind(addr).await.unwrap()).await;

    // then (期待する結果):
    wait_until(|| async move { client_ref.pending_count().await.unwrap() == 0 }).await;
    wait_connected(&client).await;
    wait_until(|| async move { cached_texts(client_ref).await == vec!["typed while offline"] })
        .await;

    let history: HistoryResponse = reqwest::get(format!("http://{}/rooms/desk/history", addr))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(history.items.len(), 1);
    assert_eq!(history.items[0].text, "typed while offline");

    client.shutdown().await.unwrap();
    server.abort();
}
