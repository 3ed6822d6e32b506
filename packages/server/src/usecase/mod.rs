//! UseCase layer: commands applied to the room and clock-sync answers.

pub mod error;
pub mod session_coordinator;
pub mod sync_clock;

pub use error::CoordinatorError;
pub use session_coordinator::{CoordinatorStats, SessionCoordinator};
pub use sync_clock::SyncClockUseCase;
