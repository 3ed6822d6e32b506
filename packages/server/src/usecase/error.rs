//! UseCase 層のエラー型

use thiserror::Error;

/// Rejected coordinator commands
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinatorError {
    /// setup-room arrived without a target time
    #[error("setup-room requires a targetTime")]
    MissingTargetTime,

    /// targetTime cannot be scheduled from the coordinator's current time
    #[error("targetTime {0} is out of range")]
    InvalidTargetTime(i64),
}
