use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Condvar, Mutex, RwLock};
use std::time::Duration;

use crate::log::log_sink::LogSink;
use crate::presence::errors::RegistryError;
use crate::presence::persistence_mirror::PersistenceMirror;
use crate::presence::presence_event::{PresenceCause, PresenceEvent};
use crate::presence::session::{ConnectionId, Lookup, PresenceStatus, Principal, Session};
use crate::presence::session_store::SessionStore;
use crate::utils::{lock, now_millis, read, write};
use crate::{sink_debug, sink_error, sink_info, sink_warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StartupPhase {
    /// Reconciliation has not finished; `connect` waits.
    Pending,
    Ready,
    /// Reconciliation failed; `connect` is refused for the process lifetime.
    Failed,
}

/// Outcome of startup reconciliation.
#[derive(Debug, Default)]
pub struct ReconcileReport {
    /// Orphaned rows that were forced offline, as written back to the store.
    pub recovered: Vec<Session>,
    /// Rows that were already inactive and left untouched.
    pub already_inactive: usize,
}

#[derive(Debug, Default)]
struct PrincipalSlot {
    active: Option<Session>,
}

/// Authoritative principal → live session map.
///
/// Each principal has its own slot lock; the maps are only locked long enough
/// to find or insert a slot, so unrelated principals never contend. Lock
/// order is slot → connection index → subscribers.
pub struct SessionRegistry {
    slots: RwLock<HashMap<Principal, Arc<Mutex<PrincipalSlot>>>>,
    connections: RwLock<HashMap<ConnectionId, Principal>>,
    startup: Mutex<StartupPhase>,
    startup_cv: Condvar,
    store: Arc<dyn SessionStore>,
    mirror: PersistenceMirror,
    subscribers: Mutex<Vec<Sender<PresenceEvent>>>,
    log: Arc<dyn LogSink>,
}

impl SessionRegistry {
    /// Build a registry over `store`. It accepts no connection until
    /// [`reconcile_on_startup`](Self::reconcile_on_startup) (or
    /// [`recover_from_store`](Self::recover_from_store)) has completed.
    pub fn new(store: Arc<dyn SessionStore>, log: Arc<dyn LogSink>) -> Self {
        let mirror = PersistenceMirror::spawn(store.clone(), log.clone());
        Self {
            slots: RwLock::new(HashMap::new()),
            connections: RwLock::new(HashMap::new()),
            startup: Mutex::new(StartupPhase::Pending),
            startup_cv: Condvar::new(),
            store,
            mirror,
            subscribers: Mutex::new(Vec::new()),
            log,
        }
    }

    /// Load the store's active rows and reconcile them.
    ///
    /// # Errors
    /// Any store failure is fatal: the registry stays closed.
    pub fn recover_from_store(&self) -> Result<ReconcileReport, RegistryError> {
        let persisted = match self.store.load_active_sessions() {
            Ok(rows) => rows,
            Err(e) => {
                sink_error!(self.log, "cannot load persisted sessions: {}", e);
                self.finish_startup(StartupPhase::Failed);
                return Err(e.into());
            }
        };
        self.reconcile_on_startup(persisted)
    }

    /// Force every persisted active session inactive and `Offline`: no
    /// connection survives a process restart.
    ///
    /// Runs exactly once. The startup lock is held for the whole pass, so no
    /// `connect` can mark a session active before it completes.
    ///
    /// # Errors
    /// `AlreadyReconciled` / `StartupFailed` on a second call, `Persistence`
    /// if a row cannot be written back (fatal).
    pub fn reconcile_on_startup(
        &self,
        persisted: Vec<Session>,
    ) -> Result<ReconcileReport, RegistryError> {
        let mut phase = lock(&self.startup);
        match *phase {
            StartupPhase::Pending => {}
            StartupPhase::Ready => return Err(RegistryError::AlreadyReconciled),
            StartupPhase::Failed => return Err(RegistryError::StartupFailed),
        }

        let now = now_millis();
        let mut report = ReconcileReport::default();

        for mut row in persisted {
            if !row.close(now) {
                report.already_inactive += 1;
                continue;
            }
            if let Err(e) = self.store.persist_session_change(&row) {
                sink_error!(
                    self.log,
                    "reconcile: cannot force session {} ({}) offline: {}",
                    row.id,
                    row.principal,
                    e
                );
                *phase = StartupPhase::Failed;
                self.startup_cv.notify_all();
                return Err(e.into());
            }
            report.recovered.push(row);
        }

        sink_info!(
            self.log,
            "reconcile: {} orphaned sessions forced offline ({} already inactive)",
            report.recovered.len(),
            report.already_inactive
        );

        *phase = StartupPhase::Ready;
        self.startup_cv.notify_all();
        Ok(report)
    }

    fn finish_startup(&self, outcome: StartupPhase) {
        let mut phase = lock(&self.startup);
        if *phase == StartupPhase::Pending {
            *phase = outcome;
            self.startup_cv.notify_all();
        }
    }

    fn wait_until_ready(&self) -> Result<(), RegistryError> {
        let phase = lock(&self.startup);
        let phase = self
            .startup_cv
            .wait_while(phase, |p| *p == StartupPhase::Pending)
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        match *phase {
            StartupPhase::Ready => Ok(()),
            _ => Err(RegistryError::StartupFailed),
        }
    }

    pub fn is_ready(&self) -> bool {
        *lock(&self.startup) == StartupPhase::Ready
    }

    /// Open a session for `principal` on `connection_id`, closing the prior
    /// active one first if the principal was still connected elsewhere.
    ///
    /// Blocks until startup reconciliation has finished.
    ///
    /// # Errors
    /// `StartupFailed` if reconciliation failed.
    pub fn connect(
        &self,
        principal: &str,
        connection_id: ConnectionId,
    ) -> Result<Session, RegistryError> {
        self.connect_superseding(principal, connection_id)
            .map(|(session, _)| session)
    }

    /// [`connect`](Self::connect), also returning the session it superseded,
    /// already closed.
    ///
    /// # Errors
    /// `StartupFailed` if reconciliation failed.
    pub fn connect_superseding(
        &self,
        principal: &str,
        connection_id: ConnectionId,
    ) -> Result<(Session, Option<Session>), RegistryError> {
        self.wait_until_ready()?;

        let slot = self.slot_for(principal);
        let mut slot = lock(&slot);
        let now = now_millis();

        let mut superseded = None;
        let cause = match slot.active.take() {
            Some(mut prior) => {
                prior.close(now);
                write(&self.connections).remove(&prior.connection_id);
                sink_info!(
                    self.log,
                    "{} reconnected: conn {} supersedes conn {}",
                    principal,
                    connection_id,
                    prior.connection_id
                );
                self.mirror.submit(prior.clone());
                superseded = Some(prior);
                PresenceCause::Reconnected
            }
            None => PresenceCause::Connected,
        };

        let session = Session::open(principal, connection_id, now);
        slot.active = Some(session.clone());
        write(&self.connections).insert(connection_id, session.principal.clone());
        self.mirror.submit(session.clone());

        sink_debug!(
            self.log,
            "session {} opened for {} on conn {}",
            session.id,
            principal,
            connection_id
        );
        self.publish(PresenceEvent {
            principal: session.principal.clone(),
            connection_id,
            status: session.displayed_status,
            cause,
        });
        Ok((session, superseded))
    }

    /// Close the session owning `connection_id`. Idempotent: unknown or
    /// already-superseded connections return `None`.
    pub fn disconnect(&self, connection_id: ConnectionId) -> Option<Session> {
        let principal = read(&self.connections).get(&connection_id).cloned()?;
        let slot = read(&self.slots).get(&principal).cloned()?;
        let mut slot = lock(&slot);

        let owns = slot
            .active
            .as_ref()
            .is_some_and(|s| s.connection_id == connection_id);
        if !owns {
            // superseded while we were getting here
            let mut conns = write(&self.connections);
            if conns.get(&connection_id) == Some(&principal) {
                conns.remove(&connection_id);
            }
            return None;
        }

        let mut closed = slot.active.take()?;
        closed.close(now_millis());
        write(&self.connections).remove(&connection_id);
        self.mirror.submit(closed.clone());

        sink_info!(
            self.log,
            "{} disconnected (conn {}, session {})",
            principal,
            connection_id,
            closed.id
        );
        self.publish(PresenceEvent {
            principal,
            connection_id,
            status: PresenceStatus::Offline,
            cause: PresenceCause::Disconnected,
        });
        Some(closed)
    }

    /// Current active session of `principal`, or `Offline`.
    pub fn lookup(&self, principal: &str) -> Lookup {
        let Some(slot) = read(&self.slots).get(principal).cloned() else {
            return Lookup::Offline;
        };
        let slot = lock(&slot);
        match &slot.active {
            Some(s) => Lookup::Online(s.clone()),
            None => Lookup::Offline,
        }
    }

    pub fn principal_for(&self, connection_id: ConnectionId) -> Option<Principal> {
        read(&self.connections).get(&connection_id).cloned()
    }

    /// Override what others see (e.g. `Busy` for Do Not Disturb). The real
    /// status is untouched. Returns `None` if the principal is offline.
    pub fn set_displayed_status(
        &self,
        principal: &str,
        status: PresenceStatus,
    ) -> Option<Session> {
        let slot = read(&self.slots).get(principal).cloned()?;
        let mut slot = lock(&slot);
        let Some(session) = slot.active.as_mut() else {
            sink_warn!(
                self.log,
                "status override for offline principal {} ignored",
                principal
            );
            return None;
        };
        if status == PresenceStatus::Offline {
            sink_warn!(
                self.log,
                "{} asked to appear offline; showing Away instead",
                principal
            );
        }
        session.displayed_status = match status {
            PresenceStatus::Offline => PresenceStatus::Away,
            other => other,
        };
        let updated = session.clone();
        self.mirror.submit(updated.clone());
        self.publish(PresenceEvent {
            principal: updated.principal.clone(),
            connection_id: updated.connection_id,
            status: updated.displayed_status,
            cause: PresenceCause::StatusOverride,
        });
        Some(updated)
    }

    /// Snapshot of every active session.
    pub fn active_sessions(&self) -> Vec<Session> {
        let slots: Vec<Arc<Mutex<PrincipalSlot>>> = read(&self.slots).values().cloned().collect();
        slots
            .iter()
            .filter_map(|slot| lock(slot).active.clone())
            .collect()
    }

    /// Receive every future presence change.
    pub fn subscribe(&self) -> Receiver<PresenceEvent> {
        let (tx, rx) = mpsc::channel();
        lock(&self.subscribers).push(tx);
        rx
    }

    /// Wait for the persistence mirror to catch up. Mostly for tests and
    /// orderly shutdown.
    pub fn flush_persistence(&self, timeout: Duration) -> bool {
        self.mirror.flush(timeout)
    }

    fn slot_for(&self, principal: &str) -> Arc<Mutex<PrincipalSlot>> {
        if let Some(slot) = read(&self.slots).get(principal) {
            return slot.clone();
        }
        write(&self.slots)
            .entry(principal.to_owned())
            .or_default()
            .clone()
    }

    fn publish(&self, event: PresenceEvent) {
        let mut subs = lock(&self.subscribers);
        subs.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::log::NoopLogSink;
    use crate::presence::session_store::InMemorySessionStore;
    use std::thread;

    fn ready_registry() -> (SessionRegistry, Arc<InMemorySessionStore>) {
        let store = Arc::new(InMemorySessionStore::new());
        let registry = SessionRegistry::new(store.clone(), Arc::new(NoopLogSink));
        registry.reconcile_on_startup(Vec::new()).unwrap();
        (registry, store)
    }

    #[test]
    fn connect_then_lookup_returns_online_session() {
        let (registry, _) = ready_registry();
        let s = registry.connect("alice", 1).unwrap();

        match registry.lookup("alice") {
            Lookup::Online(found) => {
                assert_eq!(found.id, s.id);
                assert_eq!(found.connection_id, 1);
                assert!(found.is_active);
            }
            Lookup::Offline => panic!("alice should be online"),
        }
        assert_eq!(registry.lookup("bob"), Lookup::Offline);
    }

    #[test]
    fn reconnect_supersedes_prior_session() {
        let (registry, store) = ready_registry();
        let first = registry.connect("alice", 1).unwrap();
        let second = registry.connect("alice", 2).unwrap();
        assert_ne!(first.id, second.id);

        let active = registry.active_sessions();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].connection_id, 2);
        assert_eq!(registry.principal_for(2).as_deref(), Some("alice"));
        assert_eq!(registry.principal_for(1), None);

        // the old connection closing later must not touch the new session
        assert!(registry.disconnect(1).is_none());
        assert!(registry.lookup("alice").is_online());

        assert!(registry.flush_persistence(Duration::from_secs(1)));
        let old_row = store.rows().into_iter().find(|r| r.id == first.id).unwrap();
        assert!(!old_row.is_active);
        assert!(old_row.disconnected_at.is_some());
    }

    #[test]
    fn disconnect_is_idempotent() {
        let (registry, _) = ready_registry();
        registry.connect("alice", 1).unwrap();

        let closed = registry.disconnect(1).expect("first disconnect closes");
        assert!(!closed.is_active);
        assert_eq!(closed.real_status, PresenceStatus::Offline);
        assert!(closed.disconnected_at.is_some());

        assert!(registry.disconnect(1).is_none());
        assert!(registry.disconnect(99).is_none());
        assert_eq!(registry.lookup("alice"), Lookup::Offline);
    }

    #[test]
    fn reconcile_forces_orphans_offline() {
        let orphans: Vec<Session> = (0..3)
            .map(|i| Session::open(format!("user{i}"), i, 1_000))
            .collect();
        let mut closed = Session::open("old", 9, 500);
        closed.close(600);

        let store = Arc::new(
            InMemorySessionStore::new().with_rows(orphans.iter().cloned().chain([closed.clone()])),
        );
        let registry = SessionRegistry::new(store.clone(), Arc::new(NoopLogSink));

        let report = registry.recover_from_store().unwrap();
        assert_eq!(report.recovered.len(), 3);

        for row in store.rows() {
            assert!(!row.is_active, "{row:?}");
            assert_eq!(row.real_status, PresenceStatus::Offline);
            assert_eq!(row.displayed_status, PresenceStatus::Offline);
            assert!(row.disconnected_at.is_some());
        }
        let untouched = store.rows().into_iter().find(|r| r.id == closed.id).unwrap();
        assert_eq!(untouched.disconnected_at, Some(600));
    }

    #[test]
    fn reconcile_runs_once() {
        let (registry, _) = ready_registry();
        match registry.reconcile_on_startup(Vec::new()) {
            Err(RegistryError::AlreadyReconciled) => {}
            other => panic!("expected AlreadyReconciled, got {other:?}"),
        }
    }

    #[test]
    fn reconcile_write_failure_is_fatal() {
        let store = Arc::new(InMemorySessionStore::new().with_rows([Session::open("alice", 1, 10)]));
        store.set_fail_writes(true);
        let registry = SessionRegistry::new(store.clone(), Arc::new(NoopLogSink));

        match registry.recover_from_store() {
            Err(RegistryError::Persistence(_)) => {}
            other => panic!("expected Persistence error, got {other:?}"),
        }
        assert!(!registry.is_ready());
        match registry.connect("bob", 2) {
            Err(RegistryError::StartupFailed) => {}
            other => panic!("expected StartupFailed, got {other:?}"),
        }
    }

    #[test]
    fn connect_waits_for_reconciliation() {
        let store = Arc::new(InMemorySessionStore::new());
        let registry = Arc::new(SessionRegistry::new(store, Arc::new(NoopLogSink)));

        let r = registry.clone();
        let waiter = thread::spawn(move || r.connect("alice", 1));

        thread::sleep(Duration::from_millis(50));
        assert!(registry.active_sessions().is_empty(), "connect must not run before reconcile");

        registry.reconcile_on_startup(Vec::new()).unwrap();
        let session = waiter.join().unwrap().unwrap();
        assert!(session.is_active);
    }

    #[test]
    fn subscribers_see_connect_and_disconnect() {
        let (registry, _) = ready_registry();
        let events = registry.subscribe();

        registry.connect("alice", 1).unwrap();
        registry.set_displayed_status("alice", PresenceStatus::Busy).unwrap();
        registry.disconnect(1).unwrap();

        let got: Vec<(PresenceStatus, PresenceCause)> =
            events.try_iter().map(|e| (e.status, e.cause)).collect();
        assert_eq!(
            got,
            vec![
                (PresenceStatus::Online, PresenceCause::Connected),
                (PresenceStatus::Busy, PresenceCause::StatusOverride),
                (PresenceStatus::Offline, PresenceCause::Disconnected),
            ]
        );
    }

    #[test]
    fn status_override_keeps_real_status() {
        let (registry, _) = ready_registry();
        registry.connect("alice", 1).unwrap();

        let s = registry.set_displayed_status("alice", PresenceStatus::Busy).unwrap();
        assert_eq!(s.displayed_status, PresenceStatus::Busy);
        assert_eq!(s.real_status, PresenceStatus::Online);

        assert!(registry.set_displayed_status("bob", PresenceStatus::Away).is_none());
    }
}
