//! Live connections and their per-round state.

use chrono::{DateTime, Utc};
use rps_protocol::{Choice, CountryTag, PublicProfile, ServerToClient};
use std::collections::HashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

pub type ConnId = Uuid;
pub type Outbox = mpsc::UnboundedSender<ServerToClient>;

/// What a client tells us about itself when joining.
#[derive(Debug, Clone)]
pub struct Identity {
    pub name: String,
    pub country: CountryTag,
}

#[derive(Debug)]
pub struct Connection {
    pub id: ConnId,
    pub name: String,
    pub country: CountryTag,
    pub choice: Option<Choice>,
    /// Seated in a full room.
    pub ready: bool,
    pub joined_at: DateTime<Utc>,
    tx: Outbox,
}

impl Connection {
    pub fn profile(&self) -> PublicProfile {
        PublicProfile {
            id: self.id,
            name: self.name.clone(),
            country: self.country.clone(),
        }
    }

    pub fn send(&self, msg: ServerToClient) {
        // a closed outbox means the socket is already tearing down
        let _ = self.tx.send(msg);
    }
}

#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: HashMap<ConnId, Connection>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a fresh connection with no choice. Re-registering an id replaces
    /// the previous record.
    pub fn register(&mut self, id: ConnId, identity: Identity, tx: Outbox) -> ConnId {
        self.connections.insert(
            id,
            Connection {
                id,
                name: identity.name,
                country: identity.country,
                choice: None,
                ready: false,
                joined_at: Utc::now(),
                tx,
            },
        );
        id
    }

    pub fn unregister(&mut self, id: ConnId) -> Option<Connection> {
        self.connections.remove(&id)
    }

    pub fn contains(&self, id: ConnId) -> bool {
        self.connections.contains_key(&id)
    }

    pub fn get(&self, id: ConnId) -> Option<&Connection> {
        self.connections.get(&id)
    }

    /// No-op for unknown ids.
    pub fn set_choice(&mut self, id: ConnId, choice: Choice) {
        if let Some(c) = self.connections.get_mut(&id) {
            c.choice = Some(choice);
        }
    }

    pub fn choice_of(&self, id: ConnId) -> Option<Choice> {
        self.connections.get(&id).and_then(|c| c.choice)
    }

    pub fn clear_choice(&mut self, id: ConnId) {
        if let Some(c) = self.connections.get_mut(&id) {
            c.choice = None;
        }
    }

    pub fn set_ready(&mut self, id: ConnId, ready: bool) {
        if let Some(c) = self.connections.get_mut(&id) {
            c.ready = ready;
        }
    }

    pub fn send(&self, id: ConnId, msg: ServerToClient) {
        if let Some(c) = self.connections.get(&id) {
            c.send(msg);
        }
    }

    /// Public profiles of every live connection, oldest first.
    pub fn profiles(&self) -> Vec<PublicProfile> {
        let mut conns: Vec<&Connection> = self.connections.values().collect();
        conns.sort_by_key(|c| (c.joined_at, c.id));
        conns.into_iter().map(Connection::profile).collect()
    }

    /// Connections currently seated opposite someone.
    pub fn ready_count(&self) -> usize {
        self.connections.values().filter(|c| c.ready).count()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }
}
