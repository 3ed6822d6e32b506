//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{Json, extract::State};

use crate::{
    infrastructure::dto::http::{RoomResponse, StatsResponse, TimeResponse},
    ui::state::AppState,
};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Current coordinator time
pub async fn get_time(State(state): State<Arc<AppState>>) -> Json<TimeResponse> {
    Json(state.sync_clock.time())
}

/// Room snapshot for clients resynchronizing after (re)connect
pub async fn get_room(State(state): State<Arc<AppState>>) -> Json<RoomResponse> {
    let view = state.coordinator.snapshot().await;
    Json(RoomResponse {
        room: (&view).into(),
    })
}

/// Connection counts and room snapshot
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    let stats = state.coordinator.stats().await;
    Json(StatsResponse {
        connected_clients: stats.connected_clients,
        calibrated_clients: stats.calibrated_clients,
        room: (&stats.view).into(),
        uptime: state.sync_clock.uptime_secs(),
    })
}
