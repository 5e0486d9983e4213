use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use crate::call::{CallInput, CallIntent, CallOutput, CallState, CallStateMachine, UiCommand};
use crate::client::signal_sink::SignalSink;
use crate::client::surface::PresentationSurface;
use crate::log::log_sink::LogSink;
use crate::presence::Principal;
use crate::signaling::protocol::{CallId, FailureReason, ServerFrame, SignalKind};
use crate::utils::lock;
use crate::{sink_debug, sink_info, sink_warn};

#[derive(Default)]
struct AgentState {
    calls: HashMap<CallId, CallStateMachine>,
    /// Ids of ended calls; late envelopes for them are dropped instead of
    /// starting a new call.
    ended: HashSet<CallId>,
}

/// Client-side entry point for the presentation surface.
///
/// Keeps one [`CallStateMachine`] per call id, sends what the machines emit
/// through the [`SignalSink`] and hands UI commands to the surface. Outputs
/// of one call are dispatched under the agent lock, so envelopes leave in
/// the order the machine produced them.
pub struct CallAgent {
    me: Principal,
    state: Mutex<AgentState>,
    sink: Arc<dyn SignalSink>,
    surface: Arc<dyn PresentationSurface>,
    log: Arc<dyn LogSink>,
}

impl CallAgent {
    pub fn new(
        me: impl Into<Principal>,
        sink: Arc<dyn SignalSink>,
        surface: Arc<dyn PresentationSurface>,
        log: Arc<dyn LogSink>,
    ) -> Self {
        Self {
            me: me.into(),
            state: Mutex::new(AgentState::default()),
            sink,
            surface,
            log,
        }
    }

    pub fn principal(&self) -> &str {
        &self.me
    }

    /// Start calling `target`; returns the new call id.
    pub fn place_call(&self, target: &str) -> CallId {
        let call_id = new_call_id();
        sink_info!(self.log, "{} calling {} ({})", self.me, target, call_id);
        {
            let mut state = lock(&self.state);
            state
                .calls
                .insert(call_id.clone(), CallStateMachine::outgoing(call_id.clone(), target));
        }
        self.drive(&call_id, CallIntent::PlaceCall.into());
        call_id
    }

    pub fn accept(&self, call_id: &str) {
        self.drive(call_id, CallIntent::Accept.into());
    }

    pub fn reject(&self, call_id: &str) {
        self.drive(call_id, CallIntent::Reject.into());
    }

    pub fn hangup(&self, call_id: &str) {
        self.drive(call_id, CallIntent::Hangup.into());
    }

    pub fn toggle_mic(&self, call_id: &str, on: bool) {
        self.drive(call_id, CallIntent::ToggleMic(on).into());
    }

    pub fn toggle_cam(&self, call_id: &str, on: bool) {
        self.drive(call_id, CallIntent::ToggleCam(on).into());
    }

    pub fn local_page_ready(&self, call_id: &str) {
        self.drive(call_id, CallIntent::LocalPageReady.into());
    }

    /// SDP/ICE produced by the local page.
    pub fn local_signal(&self, call_id: &str, kind: SignalKind, payload: impl Into<String>) {
        self.drive(
            call_id,
            CallIntent::LocalSignal {
                kind,
                payload: payload.into(),
            }
            .into(),
        );
    }

    /// Feed one frame received from the signaling server.
    pub fn handle_server_frame(&self, frame: ServerFrame) {
        match frame {
            ServerFrame::Signal { from, envelope } => {
                let call_id = envelope.call_id.clone();
                {
                    let mut state = lock(&self.state);
                    if let Some(machine) = state.calls.get(&call_id) {
                        if machine.peer() != from {
                            sink_warn!(
                                self.log,
                                "{} sent {} on call {} owned by {}; dropped",
                                from,
                                envelope.kind.as_str(),
                                call_id,
                                machine.peer()
                            );
                            return;
                        }
                    } else if envelope.kind == SignalKind::Offer
                        && !state.ended.contains(&call_id)
                    {
                        sink_info!(self.log, "incoming call {} from {}", call_id, from);
                        state
                            .calls
                            .insert(call_id.clone(), CallStateMachine::incoming(call_id.clone(), from));
                    } else {
                        sink_debug!(
                            self.log,
                            "stale {} for call {} dropped",
                            envelope.kind.as_str(),
                            call_id
                        );
                        return;
                    }
                }
                self.drive(&call_id, CallInput::Remote(envelope));
            }
            ServerFrame::DeliveryFailed { call_id, reason } => {
                self.drive(&call_id, CallInput::RelayFailure(reason));
            }
            ServerFrame::Presence { principal, status } => {
                self.surface
                    .apply(UiCommand::PresenceChanged { principal, status });
            }
            ServerFrame::Welcome { connection_id } => {
                sink_debug!(self.log, "late welcome for conn {} ignored", connection_id);
            }
        }
    }

    /// Our signaling connection is gone: end every call.
    pub fn on_connection_lost(&self) {
        let ids: Vec<CallId> = lock(&self.state).calls.keys().cloned().collect();
        for id in ids {
            self.drive(&id, CallInput::ConnectionLost);
        }
    }

    pub fn call_state(&self, call_id: &str) -> Option<CallState> {
        let state = lock(&self.state);
        if let Some(machine) = state.calls.get(call_id) {
            return Some(machine.state());
        }
        None
    }

    /// Ids of calls that have not ended.
    pub fn active_calls(&self) -> Vec<CallId> {
        lock(&self.state).calls.keys().cloned().collect()
    }

    fn drive(&self, call_id: &str, input: CallInput) {
        let mut state = lock(&self.state);
        let Some(machine) = state.calls.get_mut(call_id) else {
            sink_debug!(self.log, "no live call {}; input dropped", call_id);
            return;
        };

        let mut pending = VecDeque::from([input]);
        while let Some(input) = pending.pop_front() {
            for output in machine.handle(input) {
                match output {
                    CallOutput::Signal(envelope) => {
                        let kind = envelope.kind;
                        if let Err(e) = self.sink.send_signal(machine.peer(), envelope) {
                            sink_warn!(
                                self.log,
                                "call {}: sending {} failed: {}",
                                call_id,
                                kind.as_str(),
                                e
                            );
                            pending.push_back(CallInput::RelayFailure(FailureReason::PeerOffline));
                        }
                    }
                    CallOutput::Ui(command) => self.surface.apply(command),
                }
            }
        }

        if let Some(reason) = machine.state().end_reason() {
            sink_info!(self.log, "call {} ended: {:?}", call_id, reason);
            state.calls.remove(call_id);
            state.ended.insert(call_id.to_owned());
        }
    }
}

/// `call-` followed by 16 random hex digits.
fn new_call_id() -> CallId {
    format!("call-{:016x}", rand::random::<u64>())
}
