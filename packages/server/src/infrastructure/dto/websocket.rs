//! WebSocket message DTOs.
//!
//! Every frame is a JSON object whose `type` field names the event
//! (`"sync-request"`, `"playback-start"`, ...); payload fields are camelCase.

use serde::{Deserialize, Serialize};

/// Room lifecycle status as seen on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Waiting,
    Countdown,
    Playing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantInfo {
    pub id: String,
    pub media_file_name: String,
    pub joined_at: i64,
}

/// Full room snapshot.
///
/// `currentPosition` is derived (seconds since the actual start) and only
/// meaningful while playing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub id: String,
    pub status: RoomStatus,
    pub created_at: i64,
    pub target_time: Option<i64>,
    pub started_at: Option<i64>,
    pub participants: Vec<ParticipantInfo>,
    pub current_position: f64,
}

// ========================================
// Client → Coordinator
// ========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    SyncRequest(SyncRequest),
    SetupRoom(SetupRoom),
    JoinRoom(JoinRoom),
    LeaveRoom,
    ReconfigureRoom,
    OffsetUpdate(OffsetUpdate),
    PlaybackState(PlaybackState),
    Ping(Ping),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    pub client_time: i64,
    pub sequence_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupRoom {
    #[serde(default)]
    pub target_time: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoom {
    #[serde(default)]
    pub media_file_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OffsetUpdate {
    pub offset: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    pub state: String,
    pub current_time: f64,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ping {
    #[serde(default)]
    pub timestamp: Option<i64>,
}

// ========================================
// Coordinator → Client
// ========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerMessage {
    ServerTime(ServerTime),
    SyncResponse(SyncResponse),
    Pong(Pong),
    RoomSetup(RoomEnvelope),
    RoomUpdated(RoomEnvelope),
    RoomJoined(RoomEnvelope),
    CountdownStarted(CountdownStarted),
    PlaybackStart(PlaybackStart),
    ParticipantJoined(ParticipantsChanged),
    ParticipantLeft(ParticipantsChanged),
    RoomReconfigured,
    ParticipantState(ParticipantState),
    Error(ErrorMessage),
}

impl ServerMessage {
    /// Serialize for the wire; failures are logged and yield `None`
    pub fn encode(&self) -> Option<String> {
        match serde_json::to_string(self) {
            Ok(json) => Some(json),
            Err(e) => {
                tracing::error!("Failed to serialize server message: {}", e);
                None
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerTime {
    pub timestamp: i64,
    pub hrtime: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    pub client_request_time: i64,
    pub server_time: i64,
    pub server_hr_time: String,
    pub sequence_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pong {
    pub client_time: Option<i64>,
    pub server_time: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomEnvelope {
    pub room: RoomSnapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountdownStarted {
    pub target_time: i64,
    pub time_remaining: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackStart {
    pub start_time: i64,
    pub target_time: i64,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub immediate: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seek_to: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantsChanged {
    pub participant_id: String,
    pub total_participants: usize,
    pub participants: Vec<ParticipantInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantState {
    pub participant_id: String,
    pub state: String,
    pub current_time: f64,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_message_uses_kebab_case_type_tag() {
        // テスト項目: クライアントメッセージが type タグ + camelCase で解釈される
        // given (前提条件):
        let raw = json!({"type": "sync-request", "clientTime": 1000, "sequenceId": "abc"});

        // when (操作):
        let msg: ClientMessage = serde_json::from_value(raw).unwrap();

        // then (期待する結果):
        assert_eq!(
            msg,
            ClientMessage::SyncRequest(SyncRequest {
                client_time: 1000,
                sequence_id: "abc".to_string(),
            })
        );
    }

    #[test]
    fn test_payloadless_client_messages() {
        // テスト項目: ペイロードのないメッセージ・欠けたフィールドを受け付ける
        // when (操作):
        let leave: ClientMessage = serde_json::from_value(json!({"type": "leave-room"})).unwrap();
        let setup: ClientMessage = serde_json::from_value(json!({"type": "setup-room"})).unwrap();
        let join: ClientMessage = serde_json::from_value(json!({"type": "join-room"})).unwrap();

        // then (期待する結果):
        assert_eq!(leave, ClientMessage::LeaveRoom);
        assert_eq!(
            setup,
            ClientMessage::SetupRoom(SetupRoom { target_time: None })
        );
        assert_eq!(
            join,
            ClientMessage::JoinRoom(JoinRoom {
                media_file_name: None
            })
        );
    }

    #[test]
    fn test_scheduled_playback_start_omits_immediate_fields() {
        // テスト項目: 通常の playback-start には immediate / seekTo が含まれない
        // given (前提条件):
        let msg = ServerMessage::PlaybackStart(PlaybackStart {
            start_time: 2000,
            target_time: 2000,
            immediate: false,
            seek_to: None,
        });

        // when (操作):
        let value: serde_json::Value = serde_json::from_str(&msg.encode().unwrap()).unwrap();

        // then (期待する結果):
        assert_eq!(
            value,
            json!({"type": "playback-start", "startTime": 2000, "targetTime": 2000})
        );
    }

    #[test]
    fn test_immediate_playback_start_wire_format() {
        // テスト項目: 即時開始の playback-start は immediate と seekTo を含む
        // given (前提条件):
        let msg = ServerMessage::PlaybackStart(PlaybackStart {
            start_time: 5000,
            target_time: 2000,
            immediate: true,
            seek_to: Some(3.0),
        });

        // when (操作):
        let value: serde_json::Value = serde_json::from_str(&msg.encode().unwrap()).unwrap();

        // then (期待する結果):
        assert_eq!(value["immediate"], json!(true));
        assert_eq!(value["seekTo"], json!(3.0));
    }

    #[test]
    fn test_room_reconfigured_has_no_payload() {
        // テスト項目: room-reconfigured は type のみを持つ
        // when (操作):
        let json = ServerMessage::RoomReconfigured.encode().unwrap();

        // then (期待する結果):
        assert_eq!(json, r#"{"type":"room-reconfigured"}"#);
    }

    #[test]
    fn test_room_snapshot_keeps_null_fields() {
        // テスト項目: スナップショットは未設定の時刻も null として含む
        // given (前提条件):
        let msg = ServerMessage::RoomUpdated(RoomEnvelope {
            room: RoomSnapshot {
                id: "main".to_string(),
                status: RoomStatus::Waiting,
                created_at: 1,
                target_time: None,
                started_at: None,
                participants: vec![],
                current_position: 0.0,
            },
        });

        // when (操作):
        let value: serde_json::Value = serde_json::from_str(&msg.encode().unwrap()).unwrap();

        // then (期待する結果):
        assert_eq!(value["type"], json!("room-updated"));
        assert_eq!(value["room"]["status"], json!("waiting"));
        assert!(value["room"]["targetTime"].is_null());
        assert!(value["room"]["startedAt"].is_null());
        assert_eq!(value["room"]["currentPosition"], json!(0.0));
    }
}
