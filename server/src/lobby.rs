//! The single owner of connections, rooms and the leaderboard.
//!
//! Every intent runs to completion against `&mut Lobby`; the gateway keeps it
//! behind one mutex so player actions apply one at a time.

use crate::error::LobbyError;
use crate::leaderboard::Leaderboard;
use crate::registry::{ConnId, ConnectionRegistry, Identity, Outbox};
use crate::resolver::{self, Submission};
use crate::rooms::{RoomId, RoomManager};
use rps_protocol::{
    Choice, ClientToServer, CountryTag, LeaderboardEntry, PublicProfile, RoundSummary,
    ServerToClient,
};
use tracing::{debug, info};

#[derive(Debug)]
pub struct Lobby {
    registry: ConnectionRegistry,
    rooms: RoomManager,
    leaderboard: Leaderboard,
}

impl Lobby {
    pub fn new() -> Self {
        Lobby {
            registry: ConnectionRegistry::new(),
            rooms: RoomManager::new(),
            leaderboard: Leaderboard::new(),
        }
    }

    /// Routes one decoded intent. `tx` is the sender's own outbox, used for
    /// replies that do not need a registered connection.
    pub fn handle(
        &mut self,
        id: ConnId,
        cmd: ClientToServer,
        tx: &Outbox,
    ) -> Result<(), LobbyError> {
        match cmd {
            ClientToServer::Join {
                name,
                country,
                country_code,
                flag,
            } => {
                let country = CountryTag::from_parts(country, country_code, flag);
                self.join(id, name, country, tx.clone()).map(|_| ())
            }
            ClientToServer::Choose { choice } => self.choose(id, choice),
            ClientToServer::RequestRematch => self.request_rematch(id),
            ClientToServer::CountryStats { country_code } => {
                let _ = tx.send(ServerToClient::CountryStats {
                    stats: self.country_stats(&country_code),
                });
                Ok(())
            }
            ClientToServer::ActivePlayers => {
                let _ = tx.send(ServerToClient::ActivePlayers {
                    players: self.active_players(),
                });
                Ok(())
            }
        }
    }

    pub fn join(
        &mut self,
        id: ConnId,
        name: String,
        country: CountryTag,
        tx: Outbox,
    ) -> Result<RoomId, LobbyError> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(LobbyError::EmptyName);
        }
        if self.registry.contains(id) {
            return Err(LobbyError::AlreadyJoined);
        }

        // created up front so the first round of a new country is never dropped
        self.leaderboard.ensure(&country);
        self.registry.register(id, Identity { name, country }, tx);

        let placement = self.rooms.place(id);
        self.registry.send(
            id,
            ServerToClient::RoomAssigned {
                room_id: placement.room_id.to_string(),
            },
        );

        if let Some((first, second)) = placement.paired {
            self.announce_ready(&placement.room_id, first, second);
        }

        if let Some(conn) = self.registry.get(id) {
            info!(
                player = %conn.name,
                country = %conn.country.country_code,
                room = %placement.room_id,
                paired = placement.paired.is_some(),
                "player joined"
            );
        }
        Ok(placement.room_id)
    }

    fn announce_ready(&mut self, room_id: &RoomId, first: ConnId, second: ConnId) {
        let (Some(p1), Some(p2)) = (self.profile(first), self.profile(second)) else {
            return;
        };
        self.registry.set_ready(first, true);
        self.registry.set_ready(second, true);
        self.registry.send(
            first,
            ServerToClient::RoomReady {
                room_id: room_id.to_string(),
                you: p1.clone(),
                opponent: p2.clone(),
            },
        );
        self.registry.send(
            second,
            ServerToClient::RoomReady {
                room_id: room_id.to_string(),
                you: p2,
                opponent: p1,
            },
        );

        // a choice made while seated alone carries into the first round
        for (seated, newcomer) in [(first, second), (second, first)] {
            if self.registry.choice_of(seated).is_some() {
                self.registry.send(newcomer, ServerToClient::OpponentHasChosen);
            }
        }
    }

    pub fn choose(&mut self, id: ConnId, choice: Choice) -> Result<(), LobbyError> {
        let room_id = match self.rooms.room_of(id) {
            Some(room) if self.registry.contains(id) => room.id.clone(),
            _ => return Err(LobbyError::NotJoined),
        };

        match resolver::submit_choice(&mut self.registry, &mut self.rooms, &room_id, id, choice) {
            Submission::Recorded => {
                debug!(room = %room_id, "choice recorded without opponent");
            }
            Submission::Waiting { opponent } => {
                self.registry.send(opponent, ServerToClient::OpponentHasChosen);
            }
            Submission::Resolved(round) => self.settle(round),
        }
        Ok(())
    }

    fn settle(&mut self, round: RoundSummary) {
        let first = &round.player1.profile;
        let second = &round.player2.profile;
        self.leaderboard
            .record_outcome(&first.country, &second.country, round.result);

        let mut standings = Vec::with_capacity(2);
        for code in [&first.country.country_code, &second.country.country_code] {
            if standings.iter().any(|e: &LeaderboardEntry| &e.country_code == code) {
                continue;
            }
            if let Some(entry) = self.leaderboard.query_one(code) {
                standings.push(entry.clone());
            }
        }

        info!(
            room = %round.room_id,
            round = round.round,
            first = %first.name,
            second = %second.name,
            result = ?round.result,
            "round resolved"
        );

        let (a, b) = (first.id, second.id);
        let msg = ServerToClient::RoundResult { round, standings };
        self.registry.send(a, msg.clone());
        self.registry.send(b, msg);
    }

    /// Tells everyone in the caller's room a new round may start.
    pub fn request_rematch(&mut self, id: ConnId) -> Result<(), LobbyError> {
        let room = self.rooms.room_of(id).ok_or(LobbyError::NotJoined)?;
        for member in &room.members {
            self.registry.send(*member, ServerToClient::RematchReady);
        }
        Ok(())
    }

    /// Tears down everything `id` owns. Safe to call for ids that never joined.
    pub fn disconnect(&mut self, id: ConnId) {
        if let Some(departure) = self.rooms.remove(id) {
            if let Some(remaining) = departure.remaining {
                // the unfinished round is abandoned, not scored
                self.registry.clear_choice(remaining);
                self.registry.set_ready(remaining, false);
                self.registry.send(
                    remaining,
                    ServerToClient::OpponentLeft {
                        message: "Your opponent left the game".to_string(),
                    },
                );
            }
            debug!(room = %departure.room_id, deleted = departure.room_deleted, "room vacated");
        }

        if let Some(conn) = self.registry.unregister(id) {
            info!(player = %conn.name, "player left");
        }
    }

    /// Stats for one country; unknown codes get a zeroed placeholder.
    pub fn country_stats(&self, country_code: &str) -> LeaderboardEntry {
        self.leaderboard
            .query_one(country_code)
            .cloned()
            .unwrap_or_else(|| LeaderboardEntry::new(&CountryTag::unknown(country_code)))
    }

    pub fn active_players(&self) -> Vec<PublicProfile> {
        self.registry.profiles()
    }

    pub fn leaderboard(&self, limit: usize) -> Vec<LeaderboardEntry> {
        self.leaderboard.query(limit)
    }

    pub fn leaderboard_entry(&self, country_code: &str) -> Option<LeaderboardEntry> {
        self.leaderboard.query_one(country_code).cloned()
    }

    #[cfg(test)]
    pub fn room_of(&self, id: ConnId) -> Option<RoomId> {
        self.rooms.room_of(id).map(|r| r.id.clone())
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }

    pub fn playing_count(&self) -> usize {
        self.registry.ready_count()
    }

    pub fn country_count(&self) -> usize {
        self.leaderboard.len()
    }

    fn profile(&self, id: ConnId) -> Option<PublicProfile> {
        self.registry.get(id).map(|c| c.profile())
    }
}
