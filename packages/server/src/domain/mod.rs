//! Domain layer: room state machine, participants and the ports the
//! coordinator talks through.

pub mod entity;
pub mod error;
pub mod message_pusher;
pub mod participant_registry;
pub mod value_object;

pub use entity::{ConfigureOutcome, MAX_TARGET_DISTANCE_MS, Participant, Phase, Room, RoomView};
pub use error::{MessagePushError, RoomError, ValueObjectError};
pub use message_pusher::{MessagePusher, PusherChannel};
pub use participant_registry::ParticipantRegistry;
pub use value_object::{ConnectionId, MediaFileName, RoomId, Timestamp};

#[cfg(test)]
pub use message_pusher::MockMessagePusher;
