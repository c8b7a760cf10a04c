//! Server execution logic.

use std::{future::Future, sync::Arc};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use copimon_shared::{log_buffer::LogBuffer, time::SharedClock};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    domain::{ItemRepository, MessagePusher},
    infrastructure::{
        dto::websocket::MAX_ENCODED_ITEM_BYTES, message_pusher::WebSocketMessagePusher,
    },
    usecase::{
        GetHistoryUseCase, PostItemUseCase, RoomTurns, SubscribeRoomUseCase,
        UnsubscribeRoomUseCase,
    },
};

use super::{
    handler::{get_history, get_logs, health_check, post_clipboard, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// Maximum request body and stream message size
///
/// Sized for the escaped JSON encoding of the largest accepted item, so any
/// text that passes validation also passes the transport.
pub const MAX_BODY_BYTES: usize = MAX_ENCODED_ITEM_BYTES;

/// Clipboard relay server
///
/// # Example
///
/// ```ignore
/// let repository = Arc::new(SqliteItemRepository::open("copimon.db")?);
/// let server = Server::with_repository(repository, Arc::new(SystemClock), LogBuffer::default());
/// server.run("127.0.0.1".to_string(), 3001).await?;
/// ```
pub struct Server {
    post_item_usecase: Arc<PostItemUseCase>,
    subscribe_room_usecase: Arc<SubscribeRoomUseCase>,
    unsubscribe_room_usecase: Arc<UnsubscribeRoomUseCase>,
    get_history_usecase: Arc<GetHistoryUseCase>,
    log_buffer: LogBuffer,
}

impl Server {
    /// Create a new Server instance from already wired use cases
    pub fn new(
        post_item_usecase: Arc<PostItemUseCase>,
        subscribe_room_usecase: Arc<SubscribeRoomUseCase>,
        unsubscribe_room_usecase: Arc<UnsubscribeRoomUseCase>,
        get_history_usecase: Arc<GetHistoryUseCase>,
        log_buffer: LogBuffer,
    ) -> Self {
        Self {
            post_item_usecase,
            subscribe_room_usecase,
            unsubscribe_room_usecase,
            get_history_usecase,
            log_buffer,
        }
    }

    /// Wire every use case around one store and a fresh room registry
    pub fn with_repository(
        repository: Arc<dyn ItemRepository>,
        clock: SharedClock,
        log_buffer: LogBuffer,
    ) -> Self {
        let message_pusher: Arc<dyn MessagePusher> = Arc::new(WebSocketMessagePusher::new());
        let room_turns = Arc::new(RoomTurns::new());

        Self::new(
            Arc::new(PostItemUseCase::new(
                repository.clone(),
                message_pusher.clone(),
                room_turns.clone(),
                clock,
            )),
            Arc::new(SubscribeRoomUseCase::new(
                repository.clone(),
                message_pusher.clone(),
                room_turns,
            )),
            Arc::new(UnsubscribeRoomUseCase::new(message_pusher)),
            Arc::new(GetHistoryUseCase::new(repository)),
            log_buffer,
        )
    }

    /// Build the router with every endpoint and middleware layer
    pub fn router(self) -> Router {
        let app_state = Arc::new(AppState {
            post_item_usecase: self.post_item_usecase,
            subscribe_room_usecase: self.subscribe_room_usecase,
            unsubscribe_room_usecase: self.unsubscribe_room_usecase,
            get_history_usecase: self.get_history_usecase,
            log_buffer: self.log_buffer,
        });

        Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/health", get(health_check))
            .route("/logs", get(get_logs))
            .route("/rooms/{room_id}/history", get(get_history))
            .route("/rooms/{room_id}/clipboard", post(post_clipboard))
            .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(app_state)
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
    }

    /// Bind to `host:port` and serve until Ctrl+C / SIGTERM
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Clipboard relay listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws?roomId=default", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
