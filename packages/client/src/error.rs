//! Error types for the playback client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// `GET /api/room` failed
    #[error("Failed to fetch room snapshot: {0}")]
    SnapshotFetch(String),

    /// `--server` could not be turned into a URL
    #[error("Invalid server address '{0}'")]
    InvalidServerAddress(String),
}

/// Local playback engine failures; never affect the shared room
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    #[error("No media file loaded")]
    NoMedia,

    #[error("Player rejected playback: {0}")]
    Rejected(String),
}

/// Rejected user input, reported before anything is sent
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandParseError {
    #[error("Empty command")]
    Empty,

    #[error("Unknown command '{0}' (type 'help' for a list)")]
    Unknown(String),

    #[error("'{command}' requires {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("Invalid number '{0}'")]
    InvalidNumber(String),

    #[error("'{value}' is out of range for '{command}' (at most {max})")]
    OutOfRange {
        command: &'static str,
        value: String,
        max: &'static str,
    },
}
