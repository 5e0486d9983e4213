use crate::call::{CallRole, CallState, EndReason, MediaFlags, TogglePayload};
use crate::presence::Principal;
use crate::signaling::protocol::{CallId, SignalKind, WireEnvelope};
use crate::utils::{Timestamp, now_millis};

/// The relay's record of one call, updated from the envelopes it delivers.
///
/// End reasons are recorded from the relay's point of view: `Rejected` for a
/// declined call, `LocalHangup` when either party hung up.
#[derive(Debug, Clone)]
pub struct CallSession {
    pub call_id: CallId,
    pub caller: Principal,
    pub callee: Principal,
    pub state: CallState,
    pub caller_media: MediaFlags,
    pub callee_media: MediaFlags,
    pub started_at: Timestamp,
    caller_ready: bool,
    callee_ready: bool,
}

impl CallSession {
    /// Record created when the caller's offer has reached the callee.
    pub fn ringing(call_id: CallId, caller: Principal, callee: Principal) -> Self {
        Self {
            call_id,
            caller,
            callee,
            state: CallState::Ringing,
            caller_media: MediaFlags::default(),
            callee_media: MediaFlags::default(),
            started_at: now_millis(),
            caller_ready: false,
            callee_ready: false,
        }
    }

    pub fn side_of(&self, principal: &str) -> Option<CallRole> {
        if principal == self.caller {
            Some(CallRole::Caller)
        } else if principal == self.callee {
            Some(CallRole::Callee)
        } else {
            None
        }
    }

    pub fn counterpart(&self, side: CallRole) -> &Principal {
        match side {
            CallRole::Caller => &self.callee,
            CallRole::Callee => &self.caller,
        }
    }

    /// Advance the record after `envelope` from `side` was delivered.
    pub fn observe(&mut self, side: CallRole, envelope: &WireEnvelope) {
        if self.state.is_terminal() {
            return;
        }
        match envelope.kind {
            SignalKind::Answer => {
                if side == CallRole::Callee && self.state == CallState::Ringing {
                    self.state = CallState::Connecting;
                }
            }
            SignalKind::PageReady => {
                match side {
                    CallRole::Caller => self.caller_ready = true,
                    CallRole::Callee => self.callee_ready = true,
                }
                if self.state == CallState::Connecting && self.caller_ready && self.callee_ready {
                    self.state = CallState::InCall;
                }
            }
            SignalKind::MicToggle | SignalKind::CamToggle => {
                if !self.state.is_live() {
                    return;
                }
                let Some(on) = TogglePayload::parse(&envelope.payload) else {
                    return;
                };
                let media = match side {
                    CallRole::Caller => &mut self.caller_media,
                    CallRole::Callee => &mut self.callee_media,
                };
                if envelope.kind == SignalKind::MicToggle {
                    media.mic = on;
                } else {
                    media.cam = on;
                }
            }
            SignalKind::Reject => self.state = CallState::Ended(EndReason::Rejected),
            SignalKind::Hangup => self.state = CallState::Ended(EndReason::LocalHangup),
            SignalKind::Offer | SignalKind::IceCandidate => {}
        }
    }

    /// Force the call into `Ended`. Returns `false` if it already was.
    pub fn end(&mut self, reason: EndReason) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        self.state = CallState::Ended(reason);
        true
    }
}
