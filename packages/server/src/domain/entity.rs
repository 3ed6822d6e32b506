//! Room entity: the authoritative state of the single coordinated session.
//!
//! Every operation takes the coordinator's notion of "now" as an argument,
//! so the state machine itself is free of clocks and timers.

use serde::Serialize;

use super::{
    error::RoomError,
    participant_registry::ParticipantRegistry,
    value_object::{ConnectionId, MediaFileName, RoomId, Timestamp},
};

/// Lifecycle stage of the room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Waiting,
    Countdown,
    Playing,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Waiting => "waiting",
            Phase::Countdown => "countdown",
            Phase::Playing => "playing",
        }
    }
}

/// A connection that joined the room with a declared media file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub id: ConnectionId,
    pub media_file_name: MediaFileName,
    pub joined_at: Timestamp,
}

impl Participant {
    pub fn new(id: ConnectionId, media_file_name: MediaFileName, joined_at: Timestamp) -> Self {
        Self {
            id,
            media_file_name,
            joined_at,
        }
    }
}

/// Result of applying a new target time
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigureOutcome {
    /// Target is in the future: a single timer must fire after `delay_ms`.
    Countdown { delay_ms: u64 },
    /// Target already passed: playback started now, `seek_to` seconds in.
    Immediate { seek_to: f64 },
}

/// Furthest a target time may lie from now, in either direction (30 days)
pub const MAX_TARGET_DISTANCE_MS: u64 = 30 * 24 * 60 * 60 * 1000;

/// Room state.
///
/// Invariants held after every operation:
/// - `phase == Playing` implies `started_at.is_some()`
/// - `phase == Waiting` implies `target_time` and `started_at` are `None`
#[derive(Debug, Clone, PartialEq)]
pub struct Room {
    pub id: RoomId,
    pub created_at: Timestamp,
    phase: Phase,
    target_time: Option<Timestamp>,
    started_at: Option<Timestamp>,
    participants: ParticipantRegistry,
}

impl Room {
    pub fn new(id: RoomId, created_at: Timestamp) -> Self {
        Self {
            id,
            created_at,
            phase: Phase::Waiting,
            target_time: None,
            started_at: None,
            participants: ParticipantRegistry::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn target_time(&self) -> Option<Timestamp> {
        self.target_time
    }

    pub fn started_at(&self) -> Option<Timestamp> {
        self.started_at
    }

    pub fn participants(&self) -> &ParticipantRegistry {
        &self.participants
    }

    /// Apply a new target time. Valid from any phase.
    ///
    /// A target more than [`MAX_TARGET_DISTANCE_MS`] away from `now` is
    /// rejected and the room is left exactly as it was.
    pub fn configure(
        &mut self,
        target_time: Timestamp,
        now: Timestamp,
    ) -> Result<ConfigureOutcome, RoomError> {
        let delay = target_time
            .checked_millis_since(now)
            .filter(|delay| delay.unsigned_abs() <= MAX_TARGET_DISTANCE_MS)
            .ok_or(RoomError::TargetTimeOutOfRange {
                target_time: target_time.value(),
                now: now.value(),
            })?;

        self.target_time = Some(target_time);
        self.started_at = None;

        if delay > 0 {
            self.phase = Phase::Countdown;
            Ok(ConfigureOutcome::Countdown {
                delay_ms: delay.unsigned_abs(),
            })
        } else {
            self.fire(now);
            Ok(ConfigureOutcome::Immediate {
                seek_to: delay.unsigned_abs() as f64 / 1000.0,
            })
        }
    }

    /// Enter `Playing`, recording the actual start instant.
    ///
    /// Returns `false` and leaves the room untouched when there is no target
    /// time to play towards.
    pub fn fire(&mut self, now: Timestamp) -> bool {
        if self.target_time.is_none() {
            return false;
        }
        self.phase = Phase::Playing;
        self.started_at = Some(now);
        true
    }

    /// Return to `Waiting`, dropping target and start instants
    pub fn reconfigure(&mut self) {
        self.phase = Phase::Waiting;
        self.target_time = None;
        self.started_at = None;
    }

    pub fn join(&mut self, participant: Participant) {
        self.participants.upsert(participant);
    }

    pub fn leave(&mut self, id: &ConnectionId) -> Option<Participant> {
        self.participants.remove(id)
    }

    pub fn is_participant(&self, id: &ConnectionId) -> bool {
        self.participants.contains(id)
    }

    /// Copy of the room with the playback position derived at `now`
    pub fn view(&self, now: Timestamp) -> RoomView {
        RoomView {
            room: self.clone(),
            current_position: self.current_position(now),
        }
    }

    /// Seconds since the actual start, or 0 when not playing
    pub fn current_position(&self, now: Timestamp) -> f64 {
        match (self.phase, self.started_at) {
            (Phase::Playing, Some(started_at)) => {
                now.millis_since(started_at).max(0) as f64 / 1000.0
            }
            _ => 0.0,
        }
    }
}

/// Room read at a given instant
#[derive(Debug, Clone, PartialEq)]
pub struct RoomView {
    pub room: Room,
    pub current_position: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room() -> Room {
        Room::new(RoomId::new("main".to_string()).unwrap(), Timestamp::new(0))
    }

    fn assert_invariants(room: &Room) {
        if room.phase() == Phase::Playing {
            assert!(room.started_at().is_some());
        }
        if room.phase() == Phase::Waiting {
            assert!(room.target_time().is_none());
            assert!(room.started_at().is_none());
        }
    }

    #[test]
    fn test_new_room_is_waiting() {
        // テスト項目: 作成直後の Room は waiting で目標時刻を持たない
        // when (操作):
        let room = room();

        // then (期待する結果):
        assert_eq!(room.phase(), Phase::Waiting);
        assert_eq!(room.current_position(Timestamp::new(10_000)), 0.0);
        assert_invariants(&room);
    }

    #[test]
    fn test_configure_future_target_enters_countdown() {
        // テスト項目: 未来の目標時刻で configure すると countdown になる
        // given (前提条件):
        let mut room = room();

        // when (操作):
        let outcome = room.configure(Timestamp::new(15_000), Timestamp::new(10_000)).unwrap();

        // then (期待する結果):
        assert_eq!(outcome, ConfigureOutcome::Countdown { delay_ms: 5_000 });
        assert_eq!(room.phase(), Phase::Countdown);
        assert_eq!(room.target_time(), Some(Timestamp::new(15_000)));
        assert_eq!(room.started_at(), None);
        assert_invariants(&room);
    }

    #[test]
    fn test_configure_past_target_starts_immediately() {
        // テスト項目: 過去の目標時刻で configure すると即座に playing になる
        // given (前提条件):
        let mut room = room();

        // when (操作):
        let outcome = room.configure(Timestamp::new(7_000), Timestamp::new(10_000)).unwrap();

        // then (期待する結果):
        assert_eq!(outcome, ConfigureOutcome::Immediate { seek_to: 3.0 });
        assert_eq!(room.phase(), Phase::Playing);
        assert_eq!(room.started_at(), Some(Timestamp::new(10_000)));
        assert_invariants(&room);
    }

    #[test]
    fn test_configure_exactly_now_starts_immediately_from_zero() {
        // テスト項目: 目標時刻 == 現在時刻 の場合は seek_to = 0 で即時開始
        // given (前提条件):
        let mut room = room();

        // when (操作):
        let outcome = room.configure(Timestamp::new(10_000), Timestamp::new(10_000)).unwrap();

        // then (期待する結果):
        assert_eq!(outcome, ConfigureOutcome::Immediate { seek_to: 0.0 });
        assert_eq!(room.phase(), Phase::Playing);
    }

    #[test]
    fn test_reconfigure_while_playing_resets_everything() {
        // テスト項目: 再生中に configure し直すと started_at がクリアされる
        // given (前提条件):
        let mut room = room();
        room.configure(Timestamp::new(5_000), Timestamp::new(10_000)).unwrap();

        // when (操作):
        let outcome = room.configure(Timestamp::new(20_000), Timestamp::new(11_000)).unwrap();

        // then (期待する結果):
        assert_eq!(outcome, ConfigureOutcome::Countdown { delay_ms: 9_000 });
        assert_eq!(room.started_at(), None);
        assert_invariants(&room);
    }

    #[test]
    fn test_configure_rejects_targets_beyond_i64_range_without_change() {
        // テスト項目: 差が i64 に収まらない目標時刻は拒否され、countdown 中の状態は変わらない
        // given (前提条件):
        let now = Timestamp::new(1_700_000_000_000);
        let mut room = room();
        room.configure(Timestamp::new(1_700_000_005_000), now).unwrap();
        let before = room.clone();

        for target in [i64::MIN, i64::MAX] {
            // when (操作):
            let result = room.configure(Timestamp::new(target), now);

            // then (期待する結果):
            assert_eq!(
                result,
                Err(RoomError::TargetTimeOutOfRange {
                    target_time: target,
                    now: now.value(),
                })
            );
            assert_eq!(room, before);
            assert_invariants(&room);
        }
    }

    #[test]
    fn test_configure_accepts_targets_up_to_the_distance_limit() {
        // テスト項目: 現在時刻から上限ちょうどの目標時刻は受け付け、1 ms 超えると拒否する
        // given (前提条件):
        let now = Timestamp::new(1_700_000_000_000);
        let limit = MAX_TARGET_DISTANCE_MS as i64;
        let mut room = room();

        // when (操作):
        let furthest_past = room.configure(Timestamp::new(now.value() - limit), now);
        let too_far_ahead = room.configure(Timestamp::new(now.value() + limit + 1), now);

        // then (期待する結果): 拒否された configure は直前の playing を残す
        assert_eq!(
            furthest_past,
            Ok(ConfigureOutcome::Immediate {
                seek_to: limit as f64 / 1000.0
            })
        );
        assert!(too_far_ahead.is_err());
        assert_eq!(room.phase(), Phase::Playing);
        assert_eq!(room.started_at(), Some(now));
        assert_invariants(&room);
    }

    #[test]
    fn test_reconfigure_returns_to_waiting_from_any_phase() {
        // テスト項目: reconfigure はどのフェーズからでも waiting に戻す
        for target in [15_000, 5_000] {
            // given (前提条件):
            let mut room = room();
            room.configure(Timestamp::new(target), Timestamp::new(10_000)).unwrap();

            // when (操作):
            room.reconfigure();

            // then (期待する結果):
            assert_eq!(room.phase(), Phase::Waiting);
            assert_eq!(room.target_time(), None);
            assert_eq!(room.started_at(), None);
        }
    }

    #[test]
    fn test_fire_without_target_is_ignored() {
        // テスト項目: 目標時刻がない状態での fire は何もしない
        // given (前提条件):
        let mut room = room();

        // when (操作):
        let fired = room.fire(Timestamp::new(1_000));

        // then (期待する結果):
        assert!(!fired);
        assert_eq!(room.phase(), Phase::Waiting);
        assert_invariants(&room);
    }

    #[test]
    fn test_current_position_uses_actual_start() {
        // テスト項目: 再生位置は目標時刻ではなく実際の開始時刻から計算される
        // given (前提条件):
        let mut room = room();
        room.configure(Timestamp::new(10_000), Timestamp::new(10_000)).unwrap();
        room.configure(Timestamp::new(9_000), Timestamp::new(10_500)).unwrap();

        // when (操作):
        let position = room.current_position(Timestamp::new(12_500));

        // then (期待する結果): started_at = 10_500
        assert_eq!(position, 2.0);
    }

    #[test]
    fn test_join_then_leave_restores_participants() {
        // テスト項目: join 直後の leave で参加者リストが元に戻る
        // given (前提条件):
        let mut room = room();
        let alice = ConnectionId::new("alice".to_string()).unwrap();
        room.join(Participant::new(
            alice.clone(),
            MediaFileName::from_declared(Some("a.mp4".to_string())),
            Timestamp::new(1),
        ));
        let before = room.participants().clone();
        let bob = ConnectionId::new("bob".to_string()).unwrap();

        // when (操作):
        room.join(Participant::new(
            bob.clone(),
            MediaFileName::from_declared(None),
            Timestamp::new(2),
        ));
        let removed = room.leave(&bob);

        // then (期待する結果):
        assert!(removed.is_some());
        assert_eq!(room.participants(), &before);
        assert!(room.is_participant(&alice));
        assert!(!room.is_participant(&bob));
    }
}
