use serde::{Deserialize, Serialize};

use crate::presence::Principal;

/// Identifier of one call attempt, generated by the caller.
pub type CallId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignalKind {
    Offer,
    Answer,
    IceCandidate,
    PageReady,
    MicToggle,
    CamToggle,
    Reject,
    Hangup,
}

impl SignalKind {
    /// SDP/ICE blobs that the remote page has to apply.
    pub fn is_negotiation(self) -> bool {
        matches!(self, Self::Offer | Self::Answer | Self::IceCandidate)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Offer => "offer",
            Self::Answer => "answer",
            Self::IceCandidate => "ice-candidate",
            Self::PageReady => "page-ready",
            Self::MicToggle => "mic-toggle",
            Self::CamToggle => "cam-toggle",
            Self::Reject => "reject",
            Self::Hangup => "hangup",
        }
    }
}

/// Envelope as it travels on the wire. The payload is opaque to the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireEnvelope {
    pub kind: SignalKind,
    #[serde(default)]
    pub payload: String,
    pub call_id: CallId,
}

impl WireEnvelope {
    pub fn new(kind: SignalKind, call_id: impl Into<CallId>, payload: impl Into<String>) -> Self {
        Self {
            kind,
            payload: payload.into(),
            call_id: call_id.into(),
        }
    }
}

/// Envelope routed by the relay: the wire body plus both endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalEnvelope {
    pub source: Principal,
    pub target: Principal,
    pub body: WireEnvelope,
}

impl SignalEnvelope {
    pub fn kind(&self) -> SignalKind {
        self.body.kind
    }

    pub fn call_id(&self) -> &str {
        &self.body.call_id
    }
}
