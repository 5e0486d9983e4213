use serde::{Deserialize, Serialize};

use super::{CallId, FrameType, WireEnvelope};
use crate::presence::{ConnectionId, PresenceStatus, Principal};

/// Frames sent by a client. The first one on a connection must be `Hello`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientFrame {
    Hello { principal: Principal },
    Signal { to: Principal, envelope: WireEnvelope },
    SetStatus { status: PresenceStatus },
    Bye,
}

impl ClientFrame {
    pub fn frame_type(&self) -> FrameType {
        match self {
            Self::Hello { .. } => FrameType::Hello,
            Self::Signal { .. } => FrameType::Signal,
            Self::SetStatus { .. } => FrameType::SetStatus,
            Self::Bye => FrameType::Bye,
        }
    }
}

/// Why the relay could not deliver an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureReason {
    PeerOffline,
    PeerBusy,
}

/// Frames sent by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerFrame {
    #[serde(rename_all = "camelCase")]
    Welcome { connection_id: ConnectionId },
    Signal {
        from: Principal,
        envelope: WireEnvelope,
    },
    #[serde(rename_all = "camelCase")]
    DeliveryFailed {
        call_id: CallId,
        reason: FailureReason,
    },
    Presence {
        principal: Principal,
        status: PresenceStatus,
    },
}

impl ServerFrame {
    pub fn frame_type(&self) -> FrameType {
        match self {
            Self::Welcome { .. } => FrameType::Welcome,
            Self::Signal { .. } => FrameType::Relayed,
            Self::DeliveryFailed { .. } => FrameType::DeliveryFailed,
            Self::Presence { .. } => FrameType::Presence,
        }
    }

    /// Short name for logs; never includes SDP or candidates.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Welcome { .. } => "welcome",
            Self::Signal { .. } => "signal",
            Self::DeliveryFailed { .. } => "delivery-failed",
            Self::Presence { .. } => "presence",
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::signaling::protocol::SignalKind;

    #[test]
    fn client_frames_are_tagged_kebab_case() {
        let json = serde_json::to_string(&ClientFrame::SetStatus {
            status: PresenceStatus::Busy,
        })
        .unwrap();
        assert_eq!(json, r#"{"type":"set-status","status":"busy"}"#);

        let bye: ClientFrame = serde_json::from_str(r#"{"type":"bye"}"#).unwrap();
        assert_eq!(bye, ClientFrame::Bye);
    }

    #[test]
    fn delivery_failed_uses_camel_case_fields() {
        let frame = ServerFrame::DeliveryFailed {
            call_id: "call-1".into(),
            reason: FailureReason::PeerBusy,
        };
        let json = serde_json::to_string(&frame).unwrap();
        assert_eq!(
            json,
            r#"{"type":"delivery-failed","callId":"call-1","reason":"peer-busy"}"#
        );
    }

    #[test]
    fn signal_frame_parses_nested_envelope() {
        let raw = r#"{"type":"signal","to":"bob","envelope":{"kind":"offer","payload":"v=0","callId":"call-7"}}"#;
        match serde_json::from_str::<ClientFrame>(raw).unwrap() {
            ClientFrame::Signal { to, envelope } => {
                assert_eq!(to, "bob");
                assert_eq!(envelope.kind, SignalKind::Offer);
                assert_eq!(envelope.call_id, "call-7");
            }
            other => panic!("expected Signal, got {other:?}"),
        }
    }
}
