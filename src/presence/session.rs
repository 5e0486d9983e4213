use serde::{Deserialize, Serialize};

use crate::utils::Timestamp;

/// Authenticated user identity, stable across reconnects.
pub type Principal = String;

/// Identifier of one physical transport connection; a reconnect gets a new one.
pub type ConnectionId = u64;

/// Row identifier of a session record. Random, so rows written by different
/// process runs never collide in the store.
pub type SessionId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    Online,
    Away,
    Busy,
    Offline,
}

/// Live-connection record binding a principal to its current connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: SessionId,
    pub principal: Principal,
    pub connection_id: ConnectionId,
    pub is_active: bool,
    /// True connectivity state.
    pub real_status: PresenceStatus,
    /// What other principals see; may be overridden while online.
    pub displayed_status: PresenceStatus,
    pub connected_at: Timestamp,
    pub disconnected_at: Option<Timestamp>,
}

impl Session {
    pub fn open(principal: impl Into<Principal>, connection_id: ConnectionId, now: Timestamp) -> Self {
        Self {
            id: rand::random(),
            principal: principal.into(),
            connection_id,
            is_active: true,
            real_status: PresenceStatus::Online,
            displayed_status: PresenceStatus::Online,
            connected_at: now,
            disconnected_at: None,
        }
    }

    /// Mark the session closed. Returns `false` (and changes nothing) if it
    /// was already inactive.
    pub fn close(&mut self, now: Timestamp) -> bool {
        if !self.is_active {
            return false;
        }
        self.is_active = false;
        self.real_status = PresenceStatus::Offline;
        self.displayed_status = PresenceStatus::Offline;
        self.disconnected_at = Some(now);
        true
    }
}

/// Result of resolving a principal. Offline is an answer, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Online(Session),
    Offline,
}

impl Lookup {
    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::Online(s) => Some(s),
            Self::Offline => None,
        }
    }

    pub fn is_online(&self) -> bool {
        matches!(self, Self::Online(_))
    }
}
