//! Infrastructure layer: concrete transports and wire formats.

pub mod dto;
pub mod message_pusher;
