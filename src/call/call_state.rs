use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallRole {
    Caller,
    Callee,
}

/// Why a call ended. Every terminal transition carries one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    LocalHangup,
    RemoteHangup,
    /// We declined the incoming call.
    Rejected,
    /// The callee declined our call.
    RemoteRejected,
    PeerOffline,
    PeerBusy,
    /// The peer's transport dropped mid-call.
    PeerDisconnected,
    /// Our own signaling connection is gone.
    ConnectionLost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    Idle,
    Ringing,
    Connecting,
    InCall,
    Ended(EndReason),
}

impl CallState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Ended(_))
    }

    /// States in which media toggles are accepted.
    pub fn is_live(self) -> bool {
        matches!(self, Self::Connecting | Self::InCall)
    }

    pub fn end_reason(self) -> Option<EndReason> {
        match self {
            Self::Ended(r) => Some(r),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaFlags {
    pub mic: bool,
    pub cam: bool,
}

impl Default for MediaFlags {
    fn default() -> Self {
        Self {
            mic: true,
            cam: true,
        }
    }
}

/// Payload of `mic-toggle` / `cam-toggle` envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TogglePayload {
    pub on: bool,
}

impl TogglePayload {
    pub fn to_json(on: bool) -> String {
        serde_json::to_string(&Self { on }).unwrap_or_else(|_| format!("{{\"on\":{on}}}"))
    }

    pub fn parse(payload: &str) -> Option<bool> {
        serde_json::from_str::<Self>(payload).ok().map(|p| p.on)
    }
}

/// Reason string carried by a relay-synthesized hangup.
pub const PEER_DISCONNECTED_REASON: &str = "peer-disconnected";

/// Optional payload of `hangup` envelopes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HangupPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl HangupPayload {
    pub fn peer_disconnected() -> String {
        let payload = Self {
            reason: Some(PEER_DISCONNECTED_REASON.to_owned()),
        };
        serde_json::to_string(&payload)
            .unwrap_or_else(|_| format!("{{\"reason\":\"{PEER_DISCONNECTED_REASON}\"}}"))
    }

    /// True if `payload` is the relay's peer-disconnected marker. Empty or
    /// unparseable payloads are plain hangups.
    pub fn is_peer_disconnected(payload: &str) -> bool {
        serde_json::from_str::<Self>(payload)
            .ok()
            .and_then(|p| p.reason)
            .is_some_and(|r| r == PEER_DISCONNECTED_REASON)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn toggle_payload_shape() {
        assert_eq!(TogglePayload::to_json(false), r#"{"on":false}"#);
        assert_eq!(TogglePayload::parse(r#"{"on":true}"#), Some(true));
        assert_eq!(TogglePayload::parse("yes"), None);
    }

    #[test]
    fn hangup_reason_detection() {
        assert!(HangupPayload::is_peer_disconnected(&HangupPayload::peer_disconnected()));
        assert!(!HangupPayload::is_peer_disconnected(""));
        assert!(!HangupPayload::is_peer_disconnected(r#"{"reason":"bored"}"#));
    }
}
