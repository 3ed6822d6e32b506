//! Value objects for the room domain.

use std::fmt;

use serde::Serialize;

use super::error::ValueObjectError;

const MAX_ID_LEN: usize = 128;
const MAX_MEDIA_FILE_NAME_LEN: usize = 512;

/// Name used when a participant joins without declaring a media file.
pub const UNKNOWN_MEDIA_FILE_NAME: &str = "unknown";

fn validate_id(field: &'static str, value: &str) -> Result<(), ValueObjectError> {
    if value.trim().is_empty() {
        return Err(ValueObjectError::Empty(field));
    }
    if value.len() > MAX_ID_LEN {
        return Err(ValueObjectError::TooLong {
            field,
            len: value.len(),
            max: MAX_ID_LEN,
        });
    }
    Ok(())
}

/// Identifier of the coordinated room
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        validate_id("RoomId", &value)?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of one transport connection.
///
/// A participant is identified by the connection it joined from, so a
/// reconnect shows up as a new participant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        validate_id("ConnectionId", &value)?;
        Ok(Self(value))
    }

    /// Generate a fresh random identifier for a new connection
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for ConnectionId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Media file name declared by a participant.
///
/// Never verified against other participants' files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MediaFileName(String);

impl MediaFileName {
    /// Build from client input; missing or blank names fall back to
    /// [`UNKNOWN_MEDIA_FILE_NAME`], overlong names are truncated.
    pub fn from_declared(value: Option<String>) -> Self {
        match value {
            Some(name) if !name.trim().is_empty() => {
                let mut name = name.trim().to_string();
                if name.len() > MAX_MEDIA_FILE_NAME_LEN {
                    let mut cut = MAX_MEDIA_FILE_NAME_LEN;
                    while !name.is_char_boundary(cut) {
                        cut -= 1;
                    }
                    name.truncate(cut);
                }
                Self(name)
            }
            _ => Self(UNKNOWN_MEDIA_FILE_NAME.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Instant in epoch milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(millis: i64) -> Self {
        Self(millis)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    /// Milliseconds from `earlier` to `self` (negative if `self` is earlier).
    ///
    /// Saturates at the `i64` bounds.
    pub fn millis_since(&self, earlier: Timestamp) -> i64 {
        self.0.saturating_sub(earlier.0)
    }

    /// Like [`Timestamp::millis_since`], but `None` when the difference does
    /// not fit in an `i64`
    pub fn checked_millis_since(&self, earlier: Timestamp) -> Option<i64> {
        self.0.checked_sub(earlier.0)
    }
}
