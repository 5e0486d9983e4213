use crate::call::call_state::{CallState, EndReason, MediaFlags};
use crate::presence::{PresenceStatus, Principal};
use crate::signaling::protocol::{CallId, FailureReason, SignalKind, WireEnvelope};

/// Something the local user (through the presentation surface) asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallIntent {
    PlaceCall,
    Accept,
    Reject,
    Hangup,
    ToggleMic(bool),
    ToggleCam(bool),
    /// The local WebRTC page finished loading.
    LocalPageReady,
    /// SDP or ICE blob produced by the local page.
    LocalSignal { kind: SignalKind, payload: String },
}

/// Everything that can drive a [`CallStateMachine`](super::CallStateMachine).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallInput {
    Intent(CallIntent),
    Remote(WireEnvelope),
    RelayFailure(FailureReason),
    ConnectionLost,
}

impl From<CallIntent> for CallInput {
    fn from(intent: CallIntent) -> Self {
        Self::Intent(intent)
    }
}

/// Commands for the presentation surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiCommand {
    StatusChanged {
        call_id: CallId,
        state: CallState,
    },
    IncomingCall {
        call_id: CallId,
        from: Principal,
    },
    /// Load the WebRTC page; `initiator` creates the offer.
    StartMedia {
        call_id: CallId,
        initiator: bool,
    },
    ApplyRemoteSignal {
        call_id: CallId,
        kind: SignalKind,
        payload: String,
    },
    LocalMediaChanged {
        call_id: CallId,
        media: MediaFlags,
    },
    RemoteMediaChanged {
        call_id: CallId,
        media: MediaFlags,
    },
    PeerOffline {
        call_id: CallId,
    },
    PeerBusy {
        call_id: CallId,
    },
    CallEnded {
        call_id: CallId,
        reason: EndReason,
    },
    PresenceChanged {
        principal: Principal,
        status: PresenceStatus,
    },
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutput {
    /// Envelope for the peer.
    Signal(WireEnvelope),
    Ui(UiCommand),
}
