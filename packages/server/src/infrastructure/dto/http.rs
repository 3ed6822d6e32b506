//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

use super::websocket::RoomSnapshot;

/// `GET /api/room`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomResponse {
    pub room: RoomSnapshot,
}

/// `GET /api/time`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeResponse {
    pub timestamp: i64,
    pub hrtime: String,
    pub iso: String,
}

/// `GET /api/stats`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub connected_clients: usize,
    pub calibrated_clients: usize,
    pub room: RoomSnapshot,
    /// Seconds since the coordinator started
    pub uptime: f64,
}
