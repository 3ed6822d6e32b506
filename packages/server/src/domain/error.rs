//! Domain error types.

use thiserror::Error;

/// Errors raised when constructing value objects from untrusted input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{field} is too long ({len} > {max})")]
    TooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },
}

/// Errors raised while pushing messages to connected clients
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("Client '{0}' is not connected")]
    ClientNotFound(String),

    #[error("Failed to push message: {0}")]
    PushFailed(String),
}

/// Errors raised by room state transitions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    /// Target lies further from now than a countdown or seek can express
    #[error("target time {target_time} is too far from now ({now})")]
    TargetTimeOutOfRange { target_time: i64, now: i64 },
}
