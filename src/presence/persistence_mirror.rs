use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use crate::log::log_sink::LogSink;
use crate::presence::session::Session;
use crate::presence::session_store::SessionStore;
use crate::{sink_debug, sink_warn};

enum MirrorCmd {
    Persist(Session),
    Flush(Sender<()>),
}

/// Background writer that mirrors session changes into a [`SessionStore`].
///
/// `submit` never blocks the caller on store I/O. Writes happen in submission
/// order; a failed write is logged and skipped.
pub struct PersistenceMirror {
    tx: Sender<MirrorCmd>,
    log: Arc<dyn LogSink>,
    _thread: Option<thread::JoinHandle<()>>,
}

impl PersistenceMirror {
    pub fn spawn(store: Arc<dyn SessionStore>, log: Arc<dyn LogSink>) -> Self {
        let (tx, rx) = mpsc::channel::<MirrorCmd>();
        let worker_log = log.clone();

        let _thread = thread::Builder::new()
            .name("session-mirror".into())
            .spawn(move || run_mirror(&*store, &*worker_log, rx))
            .ok();

        Self { tx, log, _thread }
    }

    pub fn submit(&self, session: Session) {
        let id = session.id;
        if self.tx.send(MirrorCmd::Persist(session)).is_err() {
            sink_warn!(
                self.log,
                "session mirror worker is gone; session row {} not persisted",
                id
            );
        }
    }

    /// Wait until everything submitted so far has been handed to the store.
    /// Returns `false` on timeout or if the worker is gone.
    pub fn flush(&self, timeout: Duration) -> bool {
        let (ack_tx, ack_rx) = mpsc::channel();
        if self.tx.send(MirrorCmd::Flush(ack_tx)).is_err() {
            return false;
        }
        ack_rx.recv_timeout(timeout).is_ok()
    }
}

fn run_mirror(store: &dyn SessionStore, log: &dyn LogSink, rx: Receiver<MirrorCmd>) {
    while let Ok(cmd) = rx.recv() {
        match cmd {
            MirrorCmd::Persist(session) => match store.persist_session_change(&session) {
                Ok(()) => {
                    sink_debug!(
                        log,
                        "persisted session {} ({} conn={} active={})",
                        session.id,
                        session.principal,
                        session.connection_id,
                        session.is_active
                    );
                }
                Err(e) => {
                    sink_warn!(
                        log,
                        "failed to persist session {} ({}): {}",
                        session.id,
                        session.principal,
                        e
                    );
                }
            },
            MirrorCmd::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::log::NoopLogSink;
    use crate::presence::session_store::InMemorySessionStore;

    #[test]
    fn submitted_rows_reach_the_store_in_order() {
        let store = Arc::new(InMemorySessionStore::new());
        let mirror = PersistenceMirror::spawn(store.clone(), Arc::new(NoopLogSink));

        let mut s = Session::open("alice", 1, 10);
        mirror.submit(s.clone());
        s.close(20);
        mirror.submit(s.clone());

        assert!(mirror.flush(Duration::from_secs(1)));
        let rows = store.rows();
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].is_active, "last write wins");
    }

    #[test]
    fn failed_writes_do_not_stop_the_worker() {
        let store = Arc::new(InMemorySessionStore::new());
        let mirror = PersistenceMirror::spawn(store.clone(), Arc::new(NoopLogSink));

        store.set_fail_writes(true);
        mirror.submit(Session::open("alice", 1, 10));
        assert!(mirror.flush(Duration::from_secs(1)));
        assert!(store.rows().is_empty());

        store.set_fail_writes(false);
        mirror.submit(Session::open("bob", 2, 10));
        assert!(mirror.flush(Duration::from_secs(1)));
        assert_eq!(store.rows().len(), 1);
    }
}
