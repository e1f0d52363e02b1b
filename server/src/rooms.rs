//! Two-seat rooms and first-come-first-served placement.

use crate::registry::ConnId;
use chrono::Utc;
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomId(String);

impl RoomId {
    fn generate() -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        RoomId(format!("room-{}-{}", Utc::now().timestamp_millis(), &suffix[..9]))
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomPhase {
    /// One member, open to the next arrival.
    Waiting,
    /// Two members playing rounds.
    Playing,
}

#[derive(Debug)]
pub struct Room {
    pub id: RoomId,
    /// Arrival order decides seat: `members[0]` is player 1.
    pub members: Vec<ConnId>,
    pub phase: RoomPhase,
    pub rounds_played: u32,
}

impl Room {
    fn new(first: ConnId) -> Self {
        Room {
            id: RoomId::generate(),
            members: vec![first],
            phase: RoomPhase::Waiting,
            rounds_played: 0,
        }
    }

    pub fn opponent_of(&self, id: ConnId) -> Option<ConnId> {
        if !self.members.contains(&id) {
            return None;
        }
        self.members.iter().copied().find(|m| *m != id)
    }

    pub fn seats(&self) -> Option<(ConnId, ConnId)> {
        match self.members.as_slice() {
            [a, b] => Some((*a, *b)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub room_id: RoomId,
    /// Both seats, present when this arrival filled the room.
    pub paired: Option<(ConnId, ConnId)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub room_id: RoomId,
    /// The member left behind, if any. Their room stays open for matching.
    pub remaining: Option<ConnId>,
    pub room_deleted: bool,
}

/// Rooms are kept in creation order so the placement scan is stable and
/// pairs arrivals FIFO.
#[derive(Debug, Default)]
pub struct RoomManager {
    rooms: Vec<Room>,
}

impl RoomManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seats `id` in the oldest waiting room, or opens a new room.
    pub fn place(&mut self, id: ConnId) -> Placement {
        // a waiting room always holds exactly one member
        if let Some(room) = self.rooms.iter_mut().find(|r| r.phase == RoomPhase::Waiting) {
            room.members.push(id);
            room.phase = RoomPhase::Playing;
            return Placement {
                room_id: room.id.clone(),
                paired: room.seats(),
            };
        }

        let room = Room::new(id);
        let room_id = room.id.clone();
        self.rooms.push(room);
        Placement {
            room_id,
            paired: None,
        }
    }

    /// Drops `id` from its room. Silent no-op when it sits in no room.
    pub fn remove(&mut self, id: ConnId) -> Option<Departure> {
        let idx = self.rooms.iter().position(|r| r.members.contains(&id))?;
        let room = &mut self.rooms[idx];
        room.members.retain(|m| *m != id);
        room.phase = RoomPhase::Waiting;
        let room_id = room.id.clone();

        if room.members.is_empty() {
            self.rooms.remove(idx);
            return Some(Departure {
                room_id,
                remaining: None,
                room_deleted: true,
            });
        }

        Some(Departure {
            room_id,
            remaining: room.members.first().copied(),
            room_deleted: false,
        })
    }

    pub fn room_of(&self, id: ConnId) -> Option<&Room> {
        self.rooms.iter().find(|r| r.members.contains(&id))
    }

    #[cfg(test)]
    pub fn get(&self, room_id: &RoomId) -> Option<&Room> {
        self.rooms.iter().find(|r| &r.id == room_id)
    }

    pub fn get_mut(&mut self, room_id: &RoomId) -> Option<&mut Room> {
        self.rooms.iter_mut().find(|r| &r.id == room_id)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }
}
