//! Participants who joined the room, in join order.

use super::{entity::Participant, value_object::ConnectionId};

/// Insertion-ordered set of participants keyed by connection.
///
/// Every broadcast that carries a participant list goes through
/// [`ParticipantRegistry::snapshot`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParticipantRegistry {
    entries: Vec<Participant>,
}

impl ParticipantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a participant, or replace the entry of a connection that
    /// already joined while keeping its position.
    pub fn upsert(&mut self, participant: Participant) {
        match self.entries.iter_mut().find(|p| p.id == participant.id) {
            Some(existing) => *existing = participant,
            None => self.entries.push(participant),
        }
    }

    /// Remove a participant, returning it if it was present
    pub fn remove(&mut self, id: &ConnectionId) -> Option<Participant> {
        let index = self.entries.iter().position(|p| &p.id == id)?;
        Some(self.entries.remove(index))
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.entries.iter().any(|p| &p.id == id)
    }

    pub fn snapshot(&self) -> Vec<Participant> {
        self.entries.clone()
    }

    pub fn ids(&self) -> Vec<ConnectionId> {
        self.entries.iter().map(|p| p.id.clone()).collect()
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.entries.iter()
    }
}
