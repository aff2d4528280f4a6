//! WebSocket session gateway

pub mod handler;
pub mod protocol;

use dashmap::DashMap;
use uuid::Uuid;

/// What a connection is bound to after a successful join
#[derive(Debug, Clone)]
pub struct Session {
    pub room_id: String,
    pub tank_id: Uuid,
    pub name: String,
}

/// Process-wide connection-to-session mapping, owned by the gateway.
/// Entries go in on join and come out on leave_game or disconnect; nothing
/// else writes here.
#[derive(Default)]
pub struct SessionTable {
    sessions: DashMap<Uuid, Session>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    pub fn insert(&self, conn_id: Uuid, session: Session) {
        self.sessions.insert(conn_id, session);
    }

    pub fn get(&self, conn_id: &Uuid) -> Option<Session> {
        self.sessions.get(conn_id).map(|entry| entry.clone())
    }

    pub fn remove(&self, conn_id: &Uuid) -> Option<Session> {
        self.sessions.remove(conn_id).map(|(_, session)| session)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
