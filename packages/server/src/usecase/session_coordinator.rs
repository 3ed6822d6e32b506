//! UseCase: ルームの状態遷移と配信
//!
//! `SessionCoordinator` は唯一の `Room` を所有し、全てのコマンド（タイマー発火を含む）を
//! 1 つの Mutex の下で最後まで（配信を含めて）実行します。
//!
//! ## 不変条件
//!
//! - 保留中のタイマーは常に高々 1 つ。新しいタイマーを張る前に既存のものを abort する
//! - タイマーは世代番号を持ち、古い世代の発火は何もしない（playback-start は一度だけ）
//!
//! ## 配信ポリシー
//!
//! - ルームのライフサイクルイベントは接続中の全クライアントに 1 回ずつ
//! - participant-state（再生状態のリレー）は参加者のみ（送信者を除く）

use std::{
    collections::HashMap,
    sync::{Arc, Weak},
    time::Duration,
};

use cuepoint_shared::time::Clock;
use tokio::{sync::Mutex, task::JoinHandle};

use crate::{
    domain::{
        ConfigureOutcome, ConnectionId, MediaFileName, MessagePusher, Participant, PusherChannel,
        Room, RoomView, Timestamp,
    },
    infrastructure::dto::websocket::{
        CountdownStarted, ErrorMessage, ParticipantInfo, ParticipantState, ParticipantsChanged,
        PlaybackStart, PlaybackState, RoomEnvelope, RoomSnapshot, ServerMessage,
    },
};

use super::error::CoordinatorError;

/// The single pending Fire transition
struct ScheduledFire {
    generation: u64,
    handle: JoinHandle<()>,
}

/// Per-connection bookkeeping, independent of room membership
#[derive(Debug, Clone)]
struct ConnectionInfo {
    connected_at: Timestamp,
    /// Latest clock offset reported by the client (milliseconds)
    offset_millis: Option<f64>,
}

/// Everything guarded by the coordinator's serialization point
struct RoomSession {
    room: Room,
    scheduled: Option<ScheduledFire>,
    generation: u64,
    connections: HashMap<ConnectionId, ConnectionInfo>,
}

impl RoomSession {
    fn cancel_timer(&mut self) {
        if let Some(scheduled) = self.scheduled.take() {
            scheduled.handle.abort();
            tracing::debug!("Cancelled pending timer (generation {})", scheduled.generation);
        }
    }

    fn participants_changed(&self, participant_id: &ConnectionId) -> ParticipantsChanged {
        let participants = self.room.participants();
        ParticipantsChanged {
            participant_id: participant_id.to_string(),
            total_participants: participants.count(),
            participants: participants.iter().map(ParticipantInfo::from).collect(),
        }
    }
}

/// Connection counts reported by `/api/stats`
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinatorStats {
    pub connected_clients: usize,
    pub calibrated_clients: usize,
    pub view: RoomView,
}

/// Owner of the room state machine
pub struct SessionCoordinator {
    session: Mutex<RoomSession>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl SessionCoordinator {
    /// 新しい SessionCoordinator を作成
    ///
    /// タイマーのコールバックが自分自身を参照するため `Arc` で返します。
    pub fn new(
        room: Room,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Arc<Self> {
        Arc::new(Self {
            session: Mutex::new(RoomSession {
                room,
                scheduled: None,
                generation: 0,
                connections: HashMap::new(),
            }),
            message_pusher,
            clock,
        })
    }

    fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now_millis())
    }

    // ========================================
    // Connections
    // ========================================

    /// Register a new transport connection for room-lifecycle broadcasts
    pub async fn connect(&self, connection_id: ConnectionId, sender: PusherChannel) {
        let mut session = self.session.lock().await;
        session.connections.insert(
            connection_id.clone(),
            ConnectionInfo {
                connected_at: self.now(),
                offset_millis: None,
            },
        );
        self.message_pusher
            .register_client(connection_id.clone(), sender)
            .await;
        tracing::info!("Connection '{}' established", connection_id);
    }

    /// Forget a connection; equivalent to leave-room if it had joined.
    ///
    /// Safe to call for connections that never joined or are already gone.
    pub async fn disconnect(&self, connection_id: &ConnectionId) {
        let mut session = self.session.lock().await;
        if let Some(info) = session.connections.remove(connection_id) {
            let lifetime = self.now().millis_since(info.connected_at);
            tracing::info!(
                "Connection '{}' closed after {} ms",
                connection_id,
                lifetime
            );
        }
        self.message_pusher.unregister_client(connection_id).await;

        if session.room.leave(connection_id).is_some() {
            let left = session.participants_changed(connection_id);
            self.broadcast_all(&ServerMessage::ParticipantLeft(left)).await;
            tracing::info!("Participant '{}' left on disconnect", connection_id);
        }
    }

    /// Store the clock offset a client reported after calibrating
    pub async fn record_offset(&self, connection_id: &ConnectionId, offset_millis: f64) {
        let mut session = self.session.lock().await;
        match session.connections.get_mut(connection_id) {
            Some(info) => {
                info.offset_millis = Some(offset_millis);
                tracing::debug!(
                    "Connection '{}' calibrated with offset {:.1} ms",
                    connection_id,
                    offset_millis
                );
            }
            None => {
                tracing::warn!("Offset update from unknown connection '{}'", connection_id);
            }
        }
    }

    // ========================================
    // Room commands
    // ========================================

    /// Configure the room to start playback at `target_time` (epoch ms).
    ///
    /// Valid from any phase. A future target arms the single timer; a past
    /// (or current) target fires immediately with the matching `seekTo`.
    /// A target the room rejects as out of range only earns the sender an
    /// `error`; the pending timer and the room stay as they were.
    pub async fn configure(
        self: &Arc<Self>,
        from: &ConnectionId,
        target_time: Option<i64>,
    ) -> Result<ConfigureOutcome, CoordinatorError> {
        let Some(target_time) = target_time else {
            self.push(
                from,
                &ServerMessage::Error(ErrorMessage {
                    message: CoordinatorError::MissingTargetTime.to_string(),
                }),
            )
            .await;
            return Err(CoordinatorError::MissingTargetTime);
        };

        let mut session = self.session.lock().await;
        let now = self.now();
        let outcome = match session.room.configure(Timestamp::new(target_time), now) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!("Room '{}' kept its state: {}", session.room.id, e);
                let error = CoordinatorError::InvalidTargetTime(target_time);
                self.push(
                    from,
                    &ServerMessage::Error(ErrorMessage {
                        message: error.to_string(),
                    }),
                )
                .await;
                return Err(error);
            }
        };
        session.cancel_timer();
        tracing::info!(
            "Room '{}' configured by '{}' for {} ({:?})",
            session.room.id,
            from,
            target_time,
            outcome
        );

        let snapshot: RoomSnapshot = (&session.room.view(now)).into();
        self.push(
            from,
            &ServerMessage::RoomSetup(RoomEnvelope {
                room: snapshot.clone(),
            }),
        )
        .await;
        self.broadcast_all(&ServerMessage::RoomUpdated(RoomEnvelope { room: snapshot }))
            .await;

        match outcome {
            ConfigureOutcome::Countdown { delay_ms } => {
                self.broadcast_all(&ServerMessage::CountdownStarted(CountdownStarted {
                    target_time,
                    time_remaining: i64::try_from(delay_ms).unwrap_or(i64::MAX),
                }))
                .await;
                self.arm_timer(&mut session, delay_ms);
            }
            ConfigureOutcome::Immediate { seek_to } => {
                let start_time = session.room.started_at().unwrap_or(now).value();
                self.broadcast_all(&ServerMessage::PlaybackStart(PlaybackStart {
                    start_time,
                    target_time,
                    immediate: true,
                    seek_to: Some(seek_to),
                }))
                .await;
                tracing::info!("Playback started immediately, {:.3}s into the media", seek_to);
            }
        }

        Ok(outcome)
    }

    /// Register `connection_id` as a participant and catch it up.
    ///
    /// The joining connection alone receives `room-joined` with the current
    /// position; everyone receives the new participant list.
    pub async fn join(
        &self,
        connection_id: &ConnectionId,
        media_file_name: MediaFileName,
    ) -> RoomView {
        let mut session = self.session.lock().await;
        let now = self.now();
        tracing::info!(
            "Connection '{}' joined with media '{}'",
            connection_id,
            media_file_name.as_str()
        );
        session
            .room
            .join(Participant::new(connection_id.clone(), media_file_name, now));

        let view = session.room.view(now);
        self.push(
            connection_id,
            &ServerMessage::RoomJoined(RoomEnvelope {
                room: (&view).into(),
            }),
        )
        .await;
        let joined = session.participants_changed(connection_id);
        self.broadcast_all(&ServerMessage::ParticipantJoined(joined))
            .await;

        view
    }

    /// Remove a participant. Returns `false` (and does nothing) if the
    /// connection had not joined.
    pub async fn leave(&self, connection_id: &ConnectionId) -> bool {
        let mut session = self.session.lock().await;
        if session.room.leave(connection_id).is_none() {
            tracing::info!("Connection '{}' was not in the room", connection_id);
            return false;
        }

        let left = session.participants_changed(connection_id);
        self.broadcast_all(&ServerMessage::ParticipantLeft(left)).await;
        tracing::info!("Participant '{}' left the room", connection_id);
        true
    }

    /// Return the room to Waiting and drop any pending timer
    pub async fn reconfigure(&self, from: &ConnectionId) {
        let mut session = self.session.lock().await;
        session.cancel_timer();
        session.room.reconfigure();

        self.broadcast_all(&ServerMessage::RoomReconfigured).await;
        let snapshot: RoomSnapshot = (&session.room.view(self.now())).into();
        self.broadcast_all(&ServerMessage::RoomUpdated(RoomEnvelope { room: snapshot }))
            .await;
        tracing::info!("Room '{}' reconfigured by '{}'", session.room.id, from);
    }

    /// Relay a participant's local playback state to the other participants
    pub async fn relay_playback_state(&self, from: &ConnectionId, state: PlaybackState) {
        let session = self.session.lock().await;
        let targets: Vec<ConnectionId> = session
            .room
            .participants()
            .ids()
            .into_iter()
            .filter(|id| id != from)
            .collect();

        let message = ServerMessage::ParticipantState(ParticipantState {
            participant_id: from.to_string(),
            state: state.state,
            current_time: state.current_time,
            timestamp: state.timestamp,
        });
        if let Some(json) = message.encode()
            && let Err(e) = self.message_pusher.broadcast(targets, &json).await
        {
            tracing::warn!("Failed to relay playback state from '{}': {}", from, e);
        }
    }

    // ========================================
    // Queries
    // ========================================

    /// Current room with its derived playback position
    pub async fn snapshot(&self) -> RoomView {
        let session = self.session.lock().await;
        session.room.view(self.now())
    }

    pub async fn stats(&self) -> CoordinatorStats {
        let session = self.session.lock().await;
        let connected_clients = self.message_pusher.connected_client_ids().await.len();
        let calibrated_clients = session
            .connections
            .values()
            .filter(|info| info.offset_millis.is_some())
            .count();
        CoordinatorStats {
            connected_clients,
            calibrated_clients,
            view: session.room.view(self.now()),
        }
    }

    /// Whether a Fire transition is armed and has not run yet
    pub async fn has_pending_timer(&self) -> bool {
        let session = self.session.lock().await;
        session
            .scheduled
            .as_ref()
            .is_some_and(|scheduled| !scheduled.handle.is_finished())
    }

    /// Cancel the pending timer (graceful shutdown)
    pub async fn shutdown(&self) {
        let mut session = self.session.lock().await;
        session.cancel_timer();
    }

    // ========================================
    // Timer
    // ========================================

    fn arm_timer(self: &Arc<Self>, session: &mut RoomSession, delay_ms: u64) {
        session.cancel_timer();
        session.generation += 1;
        let generation = session.generation;

        let coordinator: Weak<Self> = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            if let Some(coordinator) = coordinator.upgrade() {
                coordinator.fire_scheduled(generation).await;
            }
        });
        session.scheduled = Some(ScheduledFire { generation, handle });
        tracing::debug!("Armed timer generation {} for {} ms", generation, delay_ms);
    }

    /// Timer callback; goes through the same lock as every other command
    async fn fire_scheduled(&self, generation: u64) {
        let mut session = self.session.lock().await;
        match &session.scheduled {
            Some(scheduled) if scheduled.generation == generation => {}
            _ => {
                tracing::debug!("Ignoring stale timer generation {}", generation);
                return;
            }
        }
        session.scheduled = None;

        let now = self.now();
        let Some(target_time) = session.room.target_time() else {
            return;
        };
        if !session.room.fire(now) {
            return;
        }

        let snapshot: RoomSnapshot = (&session.room.view(now)).into();
        self.broadcast_all(&ServerMessage::RoomUpdated(RoomEnvelope { room: snapshot }))
            .await;
        self.broadcast_all(&ServerMessage::PlaybackStart(PlaybackStart {
            start_time: now.value(),
            target_time: target_time.value(),
            immediate: false,
            seek_to: None,
        }))
        .await;
        tracing::info!(
            "Playback started (target {}, late by {} ms)",
            target_time.value(),
            now.millis_since(target_time)
        );
    }

    // ========================================
    // Delivery
    // ========================================

    async fn push(&self, connection_id: &ConnectionId, message: &ServerMessage) {
        let Some(json) = message.encode() else {
            return;
        };
        if let Err(e) = self.message_pusher.push_to(connection_id, &json).await {
            tracing::warn!("Failed to push to '{}': {}", connection_id, e);
        }
    }

    /// Room-lifecycle delivery: every connected client, joined or not
    async fn broadcast_all(&self, message: &ServerMessage) {
        let Some(json) = message.encode() else {
            return;
        };
        let targets = self.message_pusher.connected_client_ids().await;
        if let Err(e) = self.message_pusher.broadcast(targets, &json).await {
            tracing::warn!("Broadcast failed: {}", e);
        }
    }
}
