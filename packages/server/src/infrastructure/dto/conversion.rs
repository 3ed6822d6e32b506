//! Conversion logic between DTOs and domain entities.

use crate::domain::{Participant, Phase, RoomView};
use crate::infrastructure::dto::websocket as dto;

// ========================================
// Domain Entity → DTO
// ========================================

impl From<Phase> for dto::RoomStatus {
    fn from(phase: Phase) -> Self {
        match phase {
            Phase::Waiting => Self::Waiting,
            Phase::Countdown => Self::Countdown,
            Phase::Playing => Self::Playing,
        }
    }
}

impl From<&Participant> for dto::ParticipantInfo {
    fn from(model: &Participant) -> Self {
        Self {
            id: model.id.as_str().to_string(),
            media_file_name: model.media_file_name.as_str().to_string(),
            joined_at: model.joined_at.value(),
        }
    }
}

impl From<&RoomView> for dto::RoomSnapshot {
    fn from(view: &RoomView) -> Self {
        let room = &view.room;
        Self {
            id: room.id.as_str().to_string(),
            status: room.phase().into(),
            created_at: room.created_at.value(),
            target_time: room.target_time().map(|t| t.value()),
            started_at: room.started_at().map(|t| t.value()),
            participants: room.participants().iter().map(Into::into).collect(),
            current_position: view.current_position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConnectionId, MediaFileName, Room, RoomId, Timestamp};

    #[test]
    fn test_domain_participant_to_dto() {
        // テスト項目: ドメインの Participant が DTO に変換される
        // given (前提条件):
        let participant = Participant::new(
            ConnectionId::new("bob".to_string()).unwrap(),
            MediaFileName::from_declared(Some("movie.mkv".to_string())),
            Timestamp::new(2000),
        );

        // when (操作):
        let dto_participant: dto::ParticipantInfo = (&participant).into();

        // then (期待する結果):
        assert_eq!(dto_participant.id, "bob");
        assert_eq!(dto_participant.media_file_name, "movie.mkv");
        assert_eq!(dto_participant.joined_at, 2000);
    }

    #[test]
    fn test_playing_room_view_to_snapshot() {
        // テスト項目: 再生中の Room が位置付きのスナップショットに変換される
        // given (前提条件):
        let mut room = Room::new(RoomId::new("main".to_string()).unwrap(), Timestamp::new(1));
        room
            .configure(Timestamp::new(8_000), Timestamp::new(10_000))
            .unwrap();
        room.join(Participant::new(
            ConnectionId::new("alice".to_string()).unwrap(),
            MediaFileName::from_declared(None),
            Timestamp::new(10_100),
        ));
        let view = room.view(Timestamp::new(11_500));

        // when (操作):
        let snapshot: dto::RoomSnapshot = (&view).into();

        // then (期待する結果):
        assert_eq!(snapshot.id, "main");
        assert_eq!(snapshot.status, dto::RoomStatus::Playing);
        assert_eq!(snapshot.created_at, 1);
        assert_eq!(snapshot.target_time, Some(8_000));
        assert_eq!(snapshot.started_at, Some(10_000));
        assert_eq!(snapshot.current_position, 1.5);
        assert_eq!(snapshot.participants.len(), 1);
        assert_eq!(snapshot.participants[0].media_file_name, "unknown");
    }
}
