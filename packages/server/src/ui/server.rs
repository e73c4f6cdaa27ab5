//! Server execution logic.

use std::sync::Arc;

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::usecase::{GetRoomDetailUseCase, GetRoomsUseCase};

use super::{
    GameGateway,
    handler::{get_room_detail, get_rooms, health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// Yonmoku session server
///
/// # Example
///
/// ```ignore
/// let server = Server::new(gateway, get_rooms_usecase, get_room_detail_usecase);
/// server.run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    /// GameGateway（WebSocket イベントの処理）
    gateway: Arc<GameGateway>,
    /// GetRoomsUseCase（ルーム一覧取得のユースケース）
    get_rooms_usecase: Arc<GetRoomsUseCase>,
    /// GetRoomDetailUseCase（ルーム詳細取得のユースケース）
    get_room_detail_usecase: Arc<GetRoomDetailUseCase>,
}

impl Server {
    pub fn new(
        gateway: Arc<GameGateway>,
        get_rooms_usecase: Arc<GetRoomsUseCase>,
        get_room_detail_usecase: Arc<GetRoomDetailUseCase>,
    ) -> Self {
        Self {
            gateway,
            get_rooms_usecase,
            get_room_detail_usecase,
        }
    }

    fn router(self) -> Router {
        let app_state = Arc::new(AppState {
            gateway: self.gateway,
            get_rooms_usecase: self.get_rooms_usecase,
            get_room_detail_usecase: self.get_room_detail_usecase,
        });

        Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/rooms", get(get_rooms))
            .route("/api/rooms/{room_id}", get(get_room_detail))
            .layer(TraceLayer::new_for_http())
            .with_state(app_state)
    }

    /// Run the server on `host:port`
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");
        self.serve(listener).await
    }

    /// Serve on an already bound listener (used by the integration tests with port 0)
    pub async fn serve(self, listener: TcpListener) -> Result<(), Box<dyn std::error::Error>> {
        tracing::info!("Yonmoku server listening on {}", listener.local_addr()?);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}
