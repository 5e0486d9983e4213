use std::collections::VecDeque;

use crate::call::call_state::{
    CallRole, CallState, EndReason, HangupPayload, MediaFlags, TogglePayload,
};
use crate::call::events::{CallInput, CallIntent, CallOutput, UiCommand};
use crate::presence::Principal;
use crate::signaling::protocol::{CallId, FailureReason, SignalKind, WireEnvelope};

/// Lifecycle of one call attempt, seen from one side.
///
/// The machine is pure: [`handle`](Self::handle) consumes an input and
/// returns the envelopes to send and the surface commands to run, in order.
///
/// Two gates keep the remote page consistent:
/// - a caller holds every outbound envelope until its first `Offer` (the
///   invite) has been sent, and only sends that once the local page is ready;
/// - remote SDP/ICE is buffered until the local page is ready, then applied
///   in arrival order.
#[derive(Debug)]
pub struct CallStateMachine {
    call_id: CallId,
    role: CallRole,
    peer: Principal,
    state: CallState,
    local_media: MediaFlags,
    remote_media: MediaFlags,
    accepted: bool,
    local_ready: bool,
    remote_ready: bool,
    invite: Option<String>,
    invite_sent: bool,
    page_ready_sent: bool,
    held_outbound: VecDeque<WireEnvelope>,
    remote_backlog: VecDeque<(SignalKind, String)>,
}

impl CallStateMachine {
    /// Machine for a call we are about to place. Starts `Idle`; feed it
    /// [`CallIntent::PlaceCall`].
    pub fn outgoing(call_id: impl Into<CallId>, callee: impl Into<Principal>) -> Self {
        Self::new(call_id.into(), CallRole::Caller, callee.into())
    }

    /// Machine for a call someone offered us. Starts `Idle`; feed it the
    /// remote `Offer`.
    pub fn incoming(call_id: impl Into<CallId>, caller: impl Into<Principal>) -> Self {
        Self::new(call_id.into(), CallRole::Callee, caller.into())
    }

    fn new(call_id: CallId, role: CallRole, peer: Principal) -> Self {
        Self {
            call_id,
            role,
            peer,
            state: CallState::Idle,
            local_media: MediaFlags::default(),
            remote_media: MediaFlags::default(),
            accepted: false,
            local_ready: false,
            remote_ready: false,
            invite: None,
            invite_sent: false,
            page_ready_sent: false,
            held_outbound: VecDeque::new(),
            remote_backlog: VecDeque::new(),
        }
    }

    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }

    pub fn role(&self) -> CallRole {
        self.role
    }

    pub fn state(&self) -> CallState {
        self.state
    }

    pub fn local_media(&self) -> MediaFlags {
        self.local_media
    }

    pub fn remote_media(&self) -> MediaFlags {
        self.remote_media
    }

    /// Apply one input. Once `Ended`, every input is a no-op.
    pub fn handle(&mut self, input: CallInput) -> Vec<CallOutput> {
        let mut out = Vec::new();
        if self.state.is_terminal() {
            return out;
        }

        match input {
            CallInput::Intent(intent) => self.on_intent(intent, &mut out),
            CallInput::Remote(envelope) => {
                if envelope.call_id == self.call_id {
                    self.on_remote(envelope, &mut out);
                }
            }
            CallInput::RelayFailure(reason) => {
                let call_id = self.call_id.clone();
                let end = match reason {
                    FailureReason::PeerOffline => {
                        out.push(CallOutput::Ui(UiCommand::PeerOffline { call_id }));
                        EndReason::PeerOffline
                    }
                    FailureReason::PeerBusy => {
                        out.push(CallOutput::Ui(UiCommand::PeerBusy { call_id }));
                        EndReason::PeerBusy
                    }
                };
                self.end(end, &mut out);
            }
            CallInput::ConnectionLost => self.end(EndReason::ConnectionLost, &mut out),
        }
        out
    }

    fn on_intent(&mut self, intent: CallIntent, out: &mut Vec<CallOutput>) {
        match intent {
            CallIntent::PlaceCall => {
                if self.role == CallRole::Caller && self.state == CallState::Idle {
                    self.set_state(CallState::Connecting, out);
                    Self::ui(
                        UiCommand::StartMedia {
                            call_id: self.call_id.clone(),
                            initiator: true,
                        },
                        out,
                    );
                }
            }
            CallIntent::Accept => {
                if self.role == CallRole::Callee && self.state == CallState::Ringing {
                    self.accepted = true;
                    self.emit(SignalKind::Answer, String::new(), out);
                    self.set_state(CallState::Connecting, out);
                    Self::ui(
                        UiCommand::StartMedia {
                            call_id: self.call_id.clone(),
                            initiator: false,
                        },
                        out,
                    );
                    self.advance(out);
                }
            }
            CallIntent::Reject => {
                if self.state == CallState::Ringing {
                    self.emit(SignalKind::Reject, String::new(), out);
                    self.end(EndReason::Rejected, out);
                }
            }
            CallIntent::Hangup => match self.state {
                CallState::Ringing => {
                    self.emit(SignalKind::Reject, String::new(), out);
                    self.end(EndReason::Rejected, out);
                }
                _ => {
                    if self.peer_knows_call() {
                        out.push(CallOutput::Signal(self.envelope(
                            SignalKind::Hangup,
                            String::new(),
                        )));
                    }
                    self.end(EndReason::LocalHangup, out);
                }
            },
            CallIntent::ToggleMic(on) => {
                if self.state.is_live() {
                    self.local_media.mic = on;
                    self.emit(SignalKind::MicToggle, TogglePayload::to_json(on), out);
                    Self::ui(
                        UiCommand::LocalMediaChanged {
                            call_id: self.call_id.clone(),
                            media: self.local_media,
                        },
                        out,
                    );
                }
            }
            CallIntent::ToggleCam(on) => {
                if self.state.is_live() {
                    self.local_media.cam = on;
                    self.emit(SignalKind::CamToggle, TogglePayload::to_json(on), out);
                    Self::ui(
                        UiCommand::LocalMediaChanged {
                            call_id: self.call_id.clone(),
                            media: self.local_media,
                        },
                        out,
                    );
                }
            }
            CallIntent::LocalPageReady => {
                if !self.local_ready {
                    self.local_ready = true;
                    while let Some((kind, payload)) = self.remote_backlog.pop_front() {
                        self.apply_remote(kind, payload, out);
                    }
                    self.advance(out);
                }
            }
            CallIntent::LocalSignal { kind, payload } => {
                if !kind.is_negotiation() || !self.state.is_live() {
                    return;
                }
                if self.role == CallRole::Caller
                    && !self.invite_sent
                    && kind == SignalKind::Offer
                    && self.invite.is_none()
                {
                    self.invite = Some(payload);
                } else {
                    self.emit(kind, payload, out);
                }
                self.advance(out);
            }
        }
    }

    fn on_remote(&mut self, envelope: WireEnvelope, out: &mut Vec<CallOutput>) {
        let WireEnvelope { kind, payload, .. } = envelope;
        match kind {
            SignalKind::Offer => {
                if self.role == CallRole::Callee && self.state == CallState::Idle {
                    self.set_state(CallState::Ringing, out);
                    Self::ui(
                        UiCommand::IncomingCall {
                            call_id: self.call_id.clone(),
                            from: self.peer.clone(),
                        },
                        out,
                    );
                }
                if self.state != CallState::Idle {
                    self.queue_remote(kind, payload, out);
                }
            }
            SignalKind::Answer => {
                if self.role != CallRole::Caller || !self.state.is_live() {
                    return;
                }
                self.accepted = true;
                if !payload.is_empty() {
                    self.queue_remote(kind, payload, out);
                }
                self.advance(out);
            }
            SignalKind::IceCandidate => {
                if self.state != CallState::Idle {
                    self.queue_remote(kind, payload, out);
                }
            }
            SignalKind::PageReady => {
                self.remote_ready = true;
                self.advance(out);
            }
            SignalKind::MicToggle | SignalKind::CamToggle => {
                if !self.state.is_live() {
                    return;
                }
                let Some(on) = TogglePayload::parse(&payload) else {
                    return;
                };
                if kind == SignalKind::MicToggle {
                    self.remote_media.mic = on;
                } else {
                    self.remote_media.cam = on;
                }
                Self::ui(
                    UiCommand::RemoteMediaChanged {
                        call_id: self.call_id.clone(),
                        media: self.remote_media,
                    },
                    out,
                );
            }
            SignalKind::Reject => {
                let reason = match self.role {
                    CallRole::Caller => EndReason::RemoteRejected,
                    CallRole::Callee => EndReason::RemoteHangup,
                };
                self.end(reason, out);
            }
            SignalKind::Hangup => {
                let reason = if HangupPayload::is_peer_disconnected(&payload) {
                    EndReason::PeerDisconnected
                } else {
                    EndReason::RemoteHangup
                };
                self.end(reason, out);
            }
        }
    }

    /// Send the invite, the page-ready notice and `InCall` as soon as their
    /// preconditions hold.
    fn advance(&mut self, out: &mut Vec<CallOutput>) {
        if !self.state.is_live() {
            return;
        }

        if self.role == CallRole::Caller && !self.invite_sent && self.local_ready {
            if let Some(sdp) = self.invite.take() {
                self.invite_sent = true;
                out.push(CallOutput::Signal(self.envelope(SignalKind::Offer, sdp)));
                while let Some(held) = self.held_outbound.pop_front() {
                    out.push(CallOutput::Signal(held));
                }
            }
        }

        let may_announce = match self.role {
            CallRole::Caller => self.invite_sent,
            CallRole::Callee => self.accepted,
        };
        if self.local_ready && may_announce && !self.page_ready_sent {
            self.page_ready_sent = true;
            self.emit(SignalKind::PageReady, String::new(), out);
        }

        if self.state == CallState::Connecting
            && self.accepted
            && self.page_ready_sent
            && self.remote_ready
        {
            self.set_state(CallState::InCall, out);
        }
    }

    fn peer_knows_call(&self) -> bool {
        match self.role {
            CallRole::Caller => self.invite_sent,
            CallRole::Callee => self.state != CallState::Idle,
        }
    }

    fn queue_remote(&mut self, kind: SignalKind, payload: String, out: &mut Vec<CallOutput>) {
        if self.local_ready {
            self.apply_remote(kind, payload, out);
        } else {
            self.remote_backlog.push_back((kind, payload));
        }
    }

    fn apply_remote(&self, kind: SignalKind, payload: String, out: &mut Vec<CallOutput>) {
        Self::ui(
            UiCommand::ApplyRemoteSignal {
                call_id: self.call_id.clone(),
                kind,
                payload,
            },
            out,
        );
    }

    /// Queue an envelope for the peer, holding it while a caller's invite is
    /// still unsent.
    fn emit(&mut self, kind: SignalKind, payload: String, out: &mut Vec<CallOutput>) {
        let envelope = self.envelope(kind, payload);
        if self.role == CallRole::Caller && !self.invite_sent {
            self.held_outbound.push_back(envelope);
        } else {
            out.push(CallOutput::Signal(envelope));
        }
    }

    fn envelope(&self, kind: SignalKind, payload: String) -> WireEnvelope {
        WireEnvelope::new(kind, self.call_id.clone(), payload)
    }

    fn set_state(&mut self, state: CallState, out: &mut Vec<CallOutput>) {
        self.state = state;
        Self::ui(
            UiCommand::StatusChanged {
                call_id: self.call_id.clone(),
                state,
            },
            out,
        );
    }

    fn ui(command: UiCommand, out: &mut Vec<CallOutput>) {
        out.push(CallOutput::Ui(command));
    }

    fn end(&mut self, reason: EndReason, out: &mut Vec<CallOutput>) {
        self.held_outbound.clear();
        self.remote_backlog.clear();
        self.invite = None;
        self.set_state(CallState::Ended(reason), out);
        Self::ui(
            UiCommand::CallEnded {
                call_id: self.call_id.clone(),
                reason,
            },
            out,
        );
    }
}
