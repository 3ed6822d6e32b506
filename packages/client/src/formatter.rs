//! Message formatting utilities for client display.

use cuepoint_server::infrastructure::dto::websocket::{
    ParticipantInfo, ParticipantState, ParticipantsChanged, RoomSnapshot, RoomStatus,
};
use cuepoint_shared::time::timestamp_to_rfc3339;

const RULE: &str = "============================================================";

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format a full room snapshot with its participant list
    pub fn format_room(room: &RoomSnapshot) -> String {
        let mut output = String::new();
        output.push_str(&format!("\n{}\n", RULE));
        output.push_str(&format!(
            "Room '{}' - {}\n",
            room.id,
            Self::status_label(room.status)
        ));
        if let Some(target_time) = room.target_time {
            output.push_str(&format!("Target:  {}\n", timestamp_to_rfc3339(target_time)));
        }
        if let Some(started_at) = room.started_at {
            output.push_str(&format!(
                "Started: {} (position {:.1}s)\n",
                timestamp_to_rfc3339(started_at),
                room.current_position
            ));
        }
        output.push_str(&Self::format_participants(&room.participants));
        output.push_str(&format!("{}\n", RULE));
        output
    }

    fn format_participants(participants: &[ParticipantInfo]) -> String {
        if participants.is_empty() {
            return "Participants: (none)\n".to_string();
        }
        let mut output = format!("Participants ({}):\n", participants.len());
        for participant in participants {
            output.push_str(&format!(
                "  {} [{}] - joined at {}\n",
                participant.id,
                participant.media_file_name,
                timestamp_to_rfc3339(participant.joined_at)
            ));
        }
        output
    }

    pub fn status_label(status: RoomStatus) -> &'static str {
        match status {
            RoomStatus::Waiting => "waiting",
            RoomStatus::Countdown => "countdown",
            RoomStatus::Playing => "playing",
        }
    }

    pub fn format_participant_joined(event: &ParticipantsChanged) -> String {
        format!(
            "+ {} joined ({} in room)",
            event.participant_id, event.total_participants
        )
    }

    pub fn format_participant_left(event: &ParticipantsChanged) -> String {
        format!(
            "- {} left ({} in room)",
            event.participant_id, event.total_participants
        )
    }

    pub fn format_participant_state(event: &ParticipantState) -> String {
        format!(
            "~ {} is {} at {:.1}s",
            event.participant_id, event.state, event.current_time
        )
    }

    pub fn format_countdown(target_time: i64) -> String {
        format!("Countdown started, playback at {}", timestamp_to_rfc3339(target_time))
    }

    pub fn format_playback_started(position: f64) -> String {
        format!("▶ Playing from {:.2}s", position)
    }

    /// Format a clock estimate
    pub fn format_clock(offset_millis: f64, rtt_millis: Option<f64>) -> String {
        match rtt_millis {
            Some(rtt) => format!("Clock offset {:+.1} ms (rtt {:.1} ms)", offset_millis, rtt),
            None => format!("Clock offset {:+.1} ms (not calibrated)", offset_millis),
        }
    }

    /// Format a raw text message (when parsing fails)
    pub fn format_raw_message(text: &str) -> String {
        format!("← Received: {}", text)
    }
}
