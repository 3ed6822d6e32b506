//! Server execution logic.

use std::sync::Arc;

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::usecase::{SessionCoordinator, SyncClockUseCase};

use super::{
    handler::{get_room, get_stats, get_time, health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// Build the router with every endpoint mounted
pub fn router(coordinator: Arc<SessionCoordinator>, sync_clock: Arc<SyncClockUseCase>) -> Router {
    let app_state = Arc::new(AppState {
        coordinator,
        sync_clock,
    });

    Router::new()
        // WebSocket エンドポイント
        .route("/ws", get(websocket_handler))
        // HTTP エンドポイント
        .route("/api/health", get(health_check))
        .route("/api/time", get(get_time))
        .route("/api/room", get(get_room))
        .route("/api/stats", get(get_stats))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Playback coordination server
///
/// # Example
///
/// ```ignore
/// let server = Server::new(coordinator, sync_clock);
/// server.run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    /// SessionCoordinator（ルームのライフサイクル管理）
    coordinator: Arc<SessionCoordinator>,
    /// SyncClockUseCase（時刻同期のユースケース）
    sync_clock: Arc<SyncClockUseCase>,
}

impl Server {
    pub fn new(coordinator: Arc<SessionCoordinator>, sync_clock: Arc<SyncClockUseCase>) -> Self {
        Self {
            coordinator,
            sync_clock,
        }
    }

    /// Bind to `host:port` and serve until a shutdown signal arrives
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!(
            "Playback coordinator listening on {}",
            listener.local_addr()?
        );
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener).await
    }

    /// Serve on an already bound listener
    pub async fn serve(self, listener: TcpListener) -> Result<(), Box<dyn std::error::Error>> {
        let app = router(self.coordinator.clone(), self.sync_clock);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        // Pending fire must not outlive the server
        self.coordinator.shutdown().await;
        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
