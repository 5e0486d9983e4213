use crate::presence::session::{ConnectionId, PresenceStatus, Principal};

/// Why a principal's visible status changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceCause {
    Connected,
    /// A new connection replaced a still-active one.
    Reconnected,
    Disconnected,
    StatusOverride,
}

/// Status change published by the registry. Delivering it to other
/// principals is up to the subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceEvent {
    pub principal: Principal,
    pub connection_id: ConnectionId,
    pub status: PresenceStatus,
    pub cause: PresenceCause,
}
