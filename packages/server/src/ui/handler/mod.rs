//! Request handlers.

mod http;
mod websocket;

pub use http::{get_room, get_stats, get_time, health_check};
pub use websocket::websocket_handler;
