use crate::registry::{ConnId, ConnectionRegistry};
use crate::rooms::{RoomId, RoomManager};
use rps_protocol::{Choice, Outcome, RoundPlayer, RoundSummary};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Stored, but the room has no opponent to play against.
    Recorded,
    /// Stored; `opponent` has yet to choose.
    Waiting { opponent: ConnId },
    /// Both sides have chosen. Choices are already cleared for the next round.
    Resolved(RoundSummary),
}

/// Records `choice` for `id` and settles the round once both seats have chosen.
///
/// The room outlives the round: resolving bumps its round counter and leaves
/// the pairing in place for a rematch.
pub fn submit_choice(
    registry: &mut ConnectionRegistry,
    rooms: &mut RoomManager,
    room_id: &RoomId,
    id: ConnId,
    choice: Choice,
) -> Submission {
    registry.set_choice(id, choice);

    let Some(room) = rooms.get_mut(room_id) else {
        return Submission::Recorded;
    };
    let Some((first, second)) = room.seats() else {
        return Submission::Recorded;
    };
    let Some(opponent) = room.opponent_of(id) else {
        return Submission::Recorded;
    };

    let (Some(c1), Some(c2)) = (registry.choice_of(first), registry.choice_of(second)) else {
        return Submission::Waiting { opponent };
    };
    let (Some(p1), Some(p2)) = (registry.get(first), registry.get(second)) else {
        return Submission::Recorded;
    };

    room.rounds_played += 1;
    let summary = RoundSummary {
        room_id: room_id.to_string(),
        round: room.rounds_played,
        player1: RoundPlayer {
            profile: p1.profile(),
            choice: c1,
        },
        player2: RoundPlayer {
            profile: p2.profile(),
            choice: c2,
        },
        result: Outcome::resolve(c1, c2),
    };

    registry.clear_choice(first);
    registry.clear_choice(second);
    Submission::Resolved(summary)
}
