//! Data Transfer Objects (DTOs) for the coordinator.
//!
//! DTOs are organized by protocol:
//! - `websocket`: WebSocket message DTOs (both directions)
//! - `http`: HTTP API response DTOs

pub mod conversion;
pub mod http;
pub mod websocket;
