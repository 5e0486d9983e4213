use std::fmt;
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};

use crate::presence::ConnectionId;
use crate::signaling::protocol::ServerFrame;

/// Why a frame could not be queued for a connection. The relay treats both
/// as the peer being offline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportFailure {
    QueueFull,
    Closed,
}

impl fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QueueFull => write!(f, "outbound queue full"),
            Self::Closed => write!(f, "connection closed"),
        }
    }
}

impl std::error::Error for TransportFailure {}

/// Producer side of one connection's bounded outbound queue. The writer
/// thread owns the receiver.
#[derive(Debug, Clone)]
pub struct PeerChannel {
    connection_id: ConnectionId,
    tx: SyncSender<ServerFrame>,
}

impl PeerChannel {
    pub fn bounded(connection_id: ConnectionId, capacity: usize) -> (Self, Receiver<ServerFrame>) {
        let (tx, rx) = mpsc::sync_channel(capacity.max(1));
        (Self { connection_id, tx }, rx)
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    /// Queue `frame` without blocking.
    pub fn push(&self, frame: ServerFrame) -> Result<(), TransportFailure> {
        self.tx.try_send(frame).map_err(|e| match e {
            TrySendError::Full(_) => TransportFailure::QueueFull,
            TrySendError::Disconnected(_) => TransportFailure::Closed,
        })
    }
}
