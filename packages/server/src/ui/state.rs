//! Shared application state handed to every handler.

use std::sync::Arc;

use crate::usecase::{SessionCoordinator, SyncClockUseCase};

/// Shared application state
pub struct AppState {
    /// SessionCoordinator（ルーム状態の唯一の所有者）
    pub coordinator: Arc<SessionCoordinator>,
    /// SyncClockUseCase（時刻同期への応答）
    pub sync_clock: Arc<SyncClockUseCase>,
}
