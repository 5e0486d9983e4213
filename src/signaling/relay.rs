use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, RwLock};

use crate::call::{CallState, EndReason, HangupPayload, TogglePayload};
use crate::log::log_sink::LogSink;
use crate::presence::{
    ConnectionId, Lookup, PresenceEvent, PresenceStatus, RegistryError, Session, SessionRegistry,
};
use crate::signaling::call_session::CallSession;
use crate::signaling::line_table::LineTable;
use crate::signaling::peer_channel::{PeerChannel, TransportFailure};
use crate::signaling::protocol::{
    CallId, FailureReason, ServerFrame, SignalEnvelope, SignalKind, WireEnvelope,
};
use crate::utils::{lock, read, write};
use crate::{sink_debug, sink_info, sink_warn};

/// Ended call ids remembered before the oldest is forgotten.
const ENDED_CALLS_CAP: usize = 4096;

/// Outcome of relaying one envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    PeerOffline,
    PeerBusy,
    /// Unknown or ended call; dropped without telling anyone.
    Stale,
}

impl Delivery {
    /// Failure the source has to be told about.
    pub fn failure(self) -> Option<FailureReason> {
        match self {
            Self::PeerOffline => Some(FailureReason::PeerOffline),
            Self::PeerBusy => Some(FailureReason::PeerBusy),
            Self::Delivered | Self::Stale => None,
        }
    }
}

/// Ids of ended calls, oldest evicted first.
#[derive(Debug, Default)]
struct EndedCalls {
    order: VecDeque<CallId>,
    ids: HashSet<CallId>,
}

impl EndedCalls {
    fn insert(&mut self, call_id: &str) {
        if !self.ids.insert(call_id.to_owned()) {
            return;
        }
        self.order.push_back(call_id.to_owned());
        while self.order.len() > ENDED_CALLS_CAP {
            if let Some(oldest) = self.order.pop_front() {
                self.ids.remove(&oldest);
            }
        }
    }

    fn contains(&self, call_id: &str) -> bool {
        self.ids.contains(call_id)
    }
}

/// Routes envelopes between principals' connections and keeps the relay's
/// view of every call.
///
/// Principals are resolved through the registry at send time. A call's lock
/// is held while its state is checked and the frame is queued, so nothing is
/// delivered for a call after it ended.
pub struct SignalingRelay {
    registry: Arc<SessionRegistry>,
    calls: RwLock<HashMap<CallId, Arc<Mutex<CallSession>>>>,
    /// Locked after `calls` when both are held.
    ended: Mutex<EndedCalls>,
    lines: LineTable,
    channels: RwLock<HashMap<ConnectionId, PeerChannel>>,
    log: Arc<dyn LogSink>,
}

impl SignalingRelay {
    pub fn new(registry: Arc<SessionRegistry>, log: Arc<dyn LogSink>) -> Self {
        Self {
            registry,
            calls: RwLock::new(HashMap::new()),
            ended: Mutex::new(EndedCalls::default()),
            lines: LineTable::new(),
            channels: RwLock::new(HashMap::new()),
            log,
        }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Attach a freshly authenticated connection. The `welcome` frame is
    /// queued before the session becomes visible, so it is always the first
    /// frame the client reads.
    ///
    /// # Errors
    /// Propagates the registry's refusal (startup failed).
    pub fn on_connect(
        &self,
        principal: &str,
        connection_id: ConnectionId,
        channel: PeerChannel,
    ) -> Result<Session, RegistryError> {
        let _ = channel.push(ServerFrame::Welcome { connection_id });
        write(&self.channels).insert(connection_id, channel);

        match self.registry.connect_superseding(principal, connection_id) {
            Ok((session, superseded)) => {
                if let Some(prior) = superseded {
                    // dropping the channel ends the old writer
                    if write(&self.channels).remove(&prior.connection_id).is_some() {
                        sink_info!(
                            self.log,
                            "{}: conn {} superseded by conn {}",
                            principal,
                            prior.connection_id,
                            connection_id
                        );
                    }
                }
                Ok(session)
            }
            Err(e) => {
                write(&self.channels).remove(&connection_id);
                Err(e)
            }
        }
    }

    /// Whether `connection_id` still carries its principal's active session.
    pub fn is_current(&self, connection_id: ConnectionId) -> bool {
        self.registry.principal_for(connection_id).is_some()
    }

    /// Detach a connection. If it was its principal's active one, a call in
    /// progress ends and the other party gets a synthesized `hangup`.
    pub fn on_disconnect(&self, connection_id: ConnectionId) -> Option<Session> {
        let closed = self.registry.disconnect(connection_id);
        write(&self.channels).remove(&connection_id);
        let closed = closed?;

        if let Some(call_id) = self.lines.current(&closed.principal) {
            self.hang_up_for(&closed.principal, &call_id);
        }
        Some(closed)
    }

    fn hang_up_for(&self, principal: &str, call_id: &str) {
        let Some(call) = read(&self.calls).get(call_id).cloned() else {
            return;
        };
        let mut call = lock(&call);
        if call.state.is_terminal() {
            return;
        }
        let Some(side) = call.side_of(principal) else {
            return;
        };
        let other = call.counterpart(side).clone();

        let hangup = WireEnvelope::new(
            SignalKind::Hangup,
            call_id,
            HangupPayload::peer_disconnected(),
        );
        let notified = match self.registry.lookup(&other).session() {
            Some(peer) => self
                .push_to(
                    peer,
                    ServerFrame::Signal {
                        from: principal.to_owned(),
                        envelope: hangup,
                    },
                )
                .is_ok(),
            None => false,
        };
        sink_info!(
            self.log,
            "{} dropped mid-call {}; {} {}",
            principal,
            call_id,
            other,
            if notified { "notified" } else { "unreachable" }
        );
        self.finish(&mut call, EndReason::PeerDisconnected);
    }

    /// Relay an envelope coming from `source`'s connection and report
    /// `PeerOffline`/`PeerBusy` back to `source` with a `delivery-failed`
    /// frame.
    pub fn on_inbound_envelope(&self, source: &str, target: &str, body: WireEnvelope) -> Delivery {
        let call_id = body.call_id.clone();
        let delivery = self.send(SignalEnvelope {
            source: source.to_owned(),
            target: target.to_owned(),
            body,
        });

        if let Some(reason) = delivery.failure() {
            if let Lookup::Online(me) = self.registry.lookup(source) {
                if let Err(e) = self.push_to(&me, ServerFrame::DeliveryFailed { call_id, reason }) {
                    sink_debug!(self.log, "cannot report failure to {}: {}", source, e);
                }
            }
        }
        delivery
    }

    /// Route one envelope.
    ///
    /// An `Offer` for an unknown call starts one; anything else for an
    /// unknown call, and everything for an ended call id, is `Stale`.
    pub fn send(&self, envelope: SignalEnvelope) -> Delivery {
        let existing = read(&self.calls).get(envelope.call_id()).cloned();
        match existing {
            Some(call) => self.relay_in_call(&call, envelope),
            None if envelope.kind() == SignalKind::Offer
                && !lock(&self.ended).contains(envelope.call_id()) =>
            {
                self.start_call(envelope)
            }
            None => {
                sink_debug!(
                    self.log,
                    "dropping {} for unknown call {} from {}",
                    envelope.kind().as_str(),
                    envelope.call_id(),
                    envelope.source
                );
                Delivery::Stale
            }
        }
    }

    fn start_call(&self, envelope: SignalEnvelope) -> Delivery {
        let SignalEnvelope {
            source,
            target,
            body,
        } = envelope;

        let callee = match self.registry.lookup(&target) {
            Lookup::Online(s) => s,
            Lookup::Offline => {
                sink_info!(self.log, "{} called {} who is offline", source, target);
                return Delivery::PeerOffline;
            }
        };

        if let Err(held) = self.lines.claim_pair(&source, &target, &body.call_id) {
            sink_info!(
                self.log,
                "{} -> {} refused as busy (line held by {:?})",
                source,
                target,
                held
            );
            return Delivery::PeerBusy;
        }

        let call = Arc::new(Mutex::new(CallSession::ringing(
            body.call_id.clone(),
            source.clone(),
            target.clone(),
        )));
        let mut guard = lock(&call);
        {
            let mut calls = write(&self.calls);
            if calls.contains_key(&body.call_id) || lock(&self.ended).contains(&body.call_id) {
                drop(calls);
                self.lines.release(&source, &body.call_id);
                self.lines.release(&target, &body.call_id);
                return Delivery::Stale;
            }
            calls.insert(body.call_id.clone(), call.clone());
        }

        let call_id = body.call_id.clone();
        let frame = ServerFrame::Signal {
            from: source.clone(),
            envelope: body,
        };
        match self.push_to(&callee, frame) {
            Ok(()) => {
                sink_info!(self.log, "call {} ringing: {} -> {}", call_id, source, target);
                Delivery::Delivered
            }
            Err(e) => {
                sink_warn!(self.log, "call {}: offer to {} lost: {}", call_id, target, e);
                self.finish(&mut guard, EndReason::PeerOffline);
                Delivery::PeerOffline
            }
        }
    }

    fn relay_in_call(&self, call: &Arc<Mutex<CallSession>>, envelope: SignalEnvelope) -> Delivery {
        let mut call = lock(call);
        if call.state.is_terminal() {
            return Delivery::Stale;
        }
        let Some(side) = call.side_of(&envelope.source) else {
            sink_warn!(
                self.log,
                "{} is not a party to call {}; dropped",
                envelope.source,
                call.call_id
            );
            return Delivery::Stale;
        };
        if *call.counterpart(side) != envelope.target {
            sink_warn!(
                self.log,
                "{} addressed {} on call {} with {}; dropped",
                envelope.source,
                envelope.kind().as_str(),
                call.call_id,
                envelope.target
            );
            return Delivery::Stale;
        }

        if matches!(envelope.kind(), SignalKind::MicToggle | SignalKind::CamToggle)
            && TogglePayload::parse(&envelope.body.payload).is_none()
        {
            sink_warn!(
                self.log,
                "call {}: malformed {} payload from {}; dropped",
                call.call_id,
                envelope.kind().as_str(),
                envelope.source
            );
            return Delivery::Stale;
        }

        let peer = match self.registry.lookup(&envelope.target) {
            Lookup::Online(s) => s,
            Lookup::Offline => {
                sink_info!(self.log, "call {}: {} went offline", call.call_id, envelope.target);
                self.finish(&mut call, EndReason::PeerOffline);
                return Delivery::PeerOffline;
            }
        };

        let frame = ServerFrame::Signal {
            from: envelope.source.clone(),
            envelope: envelope.body.clone(),
        };
        if let Err(e) = self.push_to(&peer, frame) {
            sink_warn!(
                self.log,
                "call {}: {} to {} failed: {}",
                call.call_id,
                envelope.kind().as_str(),
                envelope.target,
                e
            );
            self.finish(&mut call, EndReason::PeerOffline);
            return Delivery::PeerOffline;
        }

        let before = call.state;
        call.observe(side, &envelope.body);
        if call.state != before {
            sink_debug!(
                self.log,
                "call {}: {:?} -> {:?}",
                call.call_id,
                before,
                call.state
            );
        }
        if call.state.is_terminal() {
            self.release(&call);
        }
        Delivery::Delivered
    }

    fn push_to(&self, session: &Session, frame: ServerFrame) -> Result<(), TransportFailure> {
        let channel = read(&self.channels).get(&session.connection_id).cloned();
        match channel {
            Some(ch) => ch.push(frame),
            None => Err(TransportFailure::Closed),
        }
    }

    /// End a call and free both lines. Caller holds the call's lock.
    fn finish(&self, call: &mut CallSession, reason: EndReason) {
        if call.end(reason) {
            self.release(call);
        }
    }

    fn release(&self, call: &CallSession) {
        self.lines.release(&call.caller, &call.call_id);
        self.lines.release(&call.callee, &call.call_id);
        {
            let mut calls = write(&self.calls);
            calls.remove(&call.call_id);
            lock(&self.ended).insert(&call.call_id);
        }
        sink_info!(
            self.log,
            "call {} between {} and {} ended: {:?}",
            call.call_id,
            call.caller,
            call.callee,
            call.state
        );
    }

    /// Apply a displayed-status override for `principal`.
    pub fn set_status(&self, principal: &str, status: PresenceStatus) -> Option<Session> {
        self.registry.set_displayed_status(principal, status)
    }

    /// Queue a `presence` frame on every connection except the one the event
    /// is about.
    pub fn broadcast_presence(&self, event: &PresenceEvent) {
        let channels: Vec<PeerChannel> = read(&self.channels)
            .values()
            .filter(|ch| ch.connection_id() != event.connection_id)
            .cloned()
            .collect();
        for ch in channels {
            let frame = ServerFrame::Presence {
                principal: event.principal.clone(),
                status: event.status,
            };
            if let Err(e) = ch.push(frame) {
                sink_debug!(
                    self.log,
                    "presence for {} not queued on conn {}: {}",
                    event.principal,
                    ch.connection_id(),
                    e
                );
            }
        }
    }

    /// State of a live call; `None` once it ended or was never started.
    pub fn call_state(&self, call_id: &str) -> Option<CallState> {
        let call = read(&self.calls).get(call_id).cloned()?;
        let state = lock(&call).state;
        Some(state)
    }

    pub fn call_of(&self, principal: &str) -> Option<CallId> {
        self.lines.current(principal)
    }

    pub fn live_calls(&self) -> usize {
        read(&self.calls).len()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::log::NoopLogSink;
    use crate::presence::InMemorySessionStore;
    use std::sync::mpsc::{Receiver, TryRecvError};

    struct Peer {
        rx: Receiver<ServerFrame>,
    }

    impl Peer {
        fn frames(&self) -> Vec<ServerFrame> {
            self.rx.try_iter().collect()
        }

        fn signals(&self) -> Vec<(String, WireEnvelope)> {
            self.frames()
                .into_iter()
                .filter_map(|f| match f {
                    ServerFrame::Signal { from, envelope } => Some((from, envelope)),
                    _ => None,
                })
                .collect()
        }
    }

    fn relay() -> SignalingRelay {
        let registry = Arc::new(SessionRegistry::new(
            Arc::new(InMemorySessionStore::new()),
            Arc::new(NoopLogSink),
        ));
        registry.reconcile_on_startup(Vec::new()).unwrap();
        SignalingRelay::new(registry, Arc::new(NoopLogSink))
    }

    fn join(relay: &SignalingRelay, who: &str, conn: ConnectionId) -> Peer {
        let (ch, rx) = PeerChannel::bounded(conn, 64);
        relay.on_connect(who, conn, ch).unwrap();
        let peer = Peer { rx };
        peer.frames(); // welcome
        peer
    }

    fn env(kind: SignalKind, call: &str, payload: &str) -> WireEnvelope {
        WireEnvelope::new(kind, call, payload)
    }

    #[test]
    fn welcome_is_the_first_frame() {
        let relay = relay();
        let (ch, rx) = PeerChannel::bounded(5, 8);
        relay.on_connect("alice", 5, ch).unwrap();
        assert_eq!(rx.try_recv().unwrap(), ServerFrame::Welcome { connection_id: 5 });
    }

    #[test]
    fn offer_to_offline_principal_reports_peer_offline() {
        let relay = relay();
        let alice = join(&relay, "alice", 1);

        let d = relay.on_inbound_envelope("alice", "bob", env(SignalKind::Offer, "call-1", "sdp"));
        assert_eq!(d, Delivery::PeerOffline);
        assert_eq!(
            alice.frames(),
            vec![ServerFrame::DeliveryFailed {
                call_id: "call-1".into(),
                reason: FailureReason::PeerOffline
            }]
        );
        assert_eq!(relay.call_of("alice"), None);
    }

    #[test]
    fn call_reaches_in_call_and_hangup_releases_lines() {
        let relay = relay();
        let _alice = join(&relay, "alice", 1);
        let bob = join(&relay, "bob", 2);

        assert_eq!(
            relay.on_inbound_envelope("alice", "bob", env(SignalKind::Offer, "c1", "sdp")),
            Delivery::Delivered
        );
        assert_eq!(relay.call_state("c1"), Some(CallState::Ringing));
        let got = bob.signals();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].0, "alice");

        relay.on_inbound_envelope("alice", "bob", env(SignalKind::PageReady, "c1", ""));
        relay.on_inbound_envelope("bob", "alice", env(SignalKind::Answer, "c1", ""));
        assert_eq!(relay.call_state("c1"), Some(CallState::Connecting));
        relay.on_inbound_envelope("bob", "alice", env(SignalKind::PageReady, "c1", ""));
        assert_eq!(relay.call_state("c1"), Some(CallState::InCall));

        relay.on_inbound_envelope("alice", "bob", env(SignalKind::Hangup, "c1", ""));
        assert_eq!(relay.call_state("c1"), None);
        assert_eq!(relay.call_of("alice"), None);
        assert_eq!(relay.call_of("bob"), None);

        // anything after the end is stale
        assert_eq!(
            relay.on_inbound_envelope("bob", "alice", env(SignalKind::IceCandidate, "c1", "x")),
            Delivery::Stale
        );
    }

    #[test]
    fn busy_callee_refuses_new_offer_without_disturbing_call() {
        let relay = relay();
        let _bob = join(&relay, "bob", 2);
        let carol = join(&relay, "carol", 3);
        let alice = join(&relay, "alice", 1);

        relay.on_inbound_envelope("bob", "carol", env(SignalKind::Offer, "bc", "sdp"));
        carol.frames();

        let d = relay.on_inbound_envelope("alice", "bob", env(SignalKind::Offer, "ab", "sdp"));
        assert_eq!(d, Delivery::PeerBusy);
        assert!(alice.frames().contains(&ServerFrame::DeliveryFailed {
            call_id: "ab".into(),
            reason: FailureReason::PeerBusy
        }));

        assert_eq!(relay.call_state("bc"), Some(CallState::Ringing));
        assert_eq!(
            relay.on_inbound_envelope("bob", "carol", env(SignalKind::IceCandidate, "bc", "c")),
            Delivery::Delivered
        );
        assert_eq!(carol.signals().len(), 1);
    }

    #[test]
    fn disconnect_mid_call_synthesizes_hangup() {
        let relay = relay();
        let alice = join(&relay, "alice", 1);
        let _bob = join(&relay, "bob", 2);

        relay.on_inbound_envelope("alice", "bob", env(SignalKind::Offer, "c1", "sdp"));
        relay.on_inbound_envelope("bob", "alice", env(SignalKind::Answer, "c1", ""));
        alice.frames();

        let closed = relay.on_disconnect(2).unwrap();
        assert!(!closed.is_active);

        let got = alice.signals();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].0, "bob");
        assert_eq!(got[0].1.kind, SignalKind::Hangup);
        assert!(HangupPayload::is_peer_disconnected(&got[0].1.payload));
        assert_eq!(relay.call_state("c1"), None);
        assert_eq!(relay.call_of("alice"), None);
    }

    #[test]
    fn superseded_connection_does_not_end_the_call() {
        let relay = relay();
        let _alice = join(&relay, "alice", 1);
        let _bob = join(&relay, "bob", 2);
        relay.on_inbound_envelope("alice", "bob", env(SignalKind::Offer, "c1", "sdp"));

        let bob2 = join(&relay, "bob", 3);
        assert!(relay.on_disconnect(2).is_none());
        assert_eq!(relay.call_state("c1"), Some(CallState::Ringing));

        relay.on_inbound_envelope("alice", "bob", env(SignalKind::IceCandidate, "c1", "c"));
        assert_eq!(bob2.signals().len(), 1);
    }

    #[test]
    fn ended_call_id_cannot_start_again() {
        let relay = relay();
        let _alice = join(&relay, "alice", 1);
        let bob = join(&relay, "bob", 2);
        let carol = join(&relay, "carol", 3);

        relay.on_inbound_envelope("alice", "bob", env(SignalKind::Offer, "c1", "sdp"));
        relay.on_inbound_envelope("alice", "bob", env(SignalKind::Hangup, "c1", ""));
        bob.frames();

        assert_eq!(
            relay.on_inbound_envelope("alice", "bob", env(SignalKind::Offer, "c1", "sdp")),
            Delivery::Stale
        );
        assert!(bob.frames().is_empty());
        assert_eq!(relay.call_state("c1"), None);
        assert_eq!(relay.call_of("alice"), None);
        assert_eq!(relay.call_of("bob"), None);

        assert_eq!(
            relay.on_inbound_envelope("alice", "carol", env(SignalKind::Offer, "c2", "sdp")),
            Delivery::Delivered
        );
        assert_eq!(carol.signals().len(), 1);
    }

    #[test]
    fn ended_calls_forget_the_oldest_ids_past_capacity() {
        let mut ended = EndedCalls::default();
        for i in 0..=ENDED_CALLS_CAP {
            ended.insert(&format!("c{i}"));
        }
        ended.insert("c1");
        assert!(!ended.contains("c0"));
        assert!(ended.contains("c1"));
        assert!(ended.contains(&format!("c{ENDED_CALLS_CAP}")));
        assert_eq!(ended.order.len(), ENDED_CALLS_CAP);
    }

    #[test]
    fn malformed_toggle_is_not_relayed() {
        let relay = relay();
        let _alice = join(&relay, "alice", 1);
        let bob = join(&relay, "bob", 2);
        relay.on_inbound_envelope("alice", "bob", env(SignalKind::Offer, "c1", "sdp"));
        relay.on_inbound_envelope("bob", "alice", env(SignalKind::Answer, "c1", ""));
        bob.frames();

        assert_eq!(
            relay.on_inbound_envelope("alice", "bob", env(SignalKind::MicToggle, "c1", "not-json")),
            Delivery::Stale
        );
        assert!(bob.frames().is_empty());
        assert_eq!(relay.call_state("c1"), Some(CallState::Connecting));

        let off = TogglePayload::to_json(false);
        assert_eq!(
            relay.on_inbound_envelope("alice", "bob", env(SignalKind::CamToggle, "c1", &off)),
            Delivery::Delivered
        );
        assert_eq!(bob.signals()[0].1.kind, SignalKind::CamToggle);
    }

    #[test]
    fn superseded_connection_loses_its_channel() {
        let relay = relay();
        let old = join(&relay, "bob", 2);
        let new = join(&relay, "bob", 3);
        assert!(!relay.is_current(2));
        assert!(relay.is_current(3));

        relay.broadcast_presence(&PresenceEvent {
            principal: "carol".into(),
            connection_id: 4,
            status: PresenceStatus::Online,
            cause: crate::presence::PresenceCause::Connected,
        });
        assert!(matches!(old.rx.try_recv(), Err(TryRecvError::Disconnected)));
        assert_eq!(new.frames().len(), 1);
    }

    #[test]
    fn full_queue_counts_as_offline_and_ends_call() {
        let relay = relay();
        let _alice = join(&relay, "alice", 1);
        let (ch, bob_rx) = PeerChannel::bounded(2, 1);
        relay.on_connect("bob", 2, ch).unwrap();
        // welcome still queued: bob's queue is full

        let d = relay.on_inbound_envelope("alice", "bob", env(SignalKind::Offer, "c1", "sdp"));
        assert_eq!(d, Delivery::PeerOffline);
        assert_eq!(relay.call_of("alice"), None);
        assert_eq!(relay.live_calls(), 0);
        drop(bob_rx);
    }

    #[test]
    fn outsider_cannot_inject_into_a_call() {
        let relay = relay();
        let _alice = join(&relay, "alice", 1);
        let bob = join(&relay, "bob", 2);
        let _mallory = join(&relay, "mallory", 3);
        relay.on_inbound_envelope("alice", "bob", env(SignalKind::Offer, "c1", "sdp"));
        bob.frames();

        assert_eq!(
            relay.on_inbound_envelope("mallory", "bob", env(SignalKind::Hangup, "c1", "")),
            Delivery::Stale
        );
        assert!(bob.frames().is_empty());
        assert_eq!(relay.call_state("c1"), Some(CallState::Ringing));
    }

    #[test]
    fn presence_is_fanned_out_to_others() {
        let relay = relay();
        let alice = join(&relay, "alice", 1);
        let event = PresenceEvent {
            principal: "bob".into(),
            connection_id: 2,
            status: PresenceStatus::Online,
            cause: crate::presence::PresenceCause::Connected,
        };
        relay.broadcast_presence(&event);
        assert_eq!(
            alice.frames(),
            vec![ServerFrame::Presence {
                principal: "bob".into(),
                status: PresenceStatus::Online
            }]
        );
    }
}
