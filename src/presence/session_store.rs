use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::presence::errors::PersistenceError;
use crate::presence::session::{Session, SessionId};
use crate::utils::lock;

/// Persistence surface for session rows.
///
/// The registry reads active rows once at startup and mirrors every change
/// afterwards. Live routing never reads from the store.
pub trait SessionStore: Send + Sync {
    /// Rows still marked active, typically left behind by a previous run.
    fn load_active_sessions(&self) -> Result<Vec<Session>, PersistenceError>;

    /// Upsert one row, keyed by [`Session::id`].
    fn persist_session_change(&self, session: &Session) -> Result<(), PersistenceError>;
}

/// Store kept in memory, for tests and ephemeral servers.
///
/// Writes can be made to fail with [`set_fail_writes`](Self::set_fail_writes).
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    rows: Mutex<HashMap<SessionId, Session>>,
    fail_writes: AtomicBool,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style seeding, e.g. with orphans from a "previous run".
    pub fn with_rows(self, rows: impl IntoIterator<Item = Session>) -> Self {
        {
            let mut map = lock(&self.rows);
            for row in rows {
                map.insert(row.id, row);
            }
        }
        self
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Snapshot of every stored row, active or not.
    pub fn rows(&self) -> Vec<Session> {
        lock(&self.rows).values().cloned().collect()
    }
}

impl SessionStore for InMemorySessionStore {
    fn load_active_sessions(&self) -> Result<Vec<Session>, PersistenceError> {
        Ok(lock(&self.rows)
            .values()
            .filter(|s| s.is_active)
            .cloned()
            .collect())
    }

    fn persist_session_change(&self, session: &Session) -> Result<(), PersistenceError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PersistenceError::Backend("writes disabled".into()));
        }
        lock(&self.rows).insert(session.id, session.clone());
        Ok(())
    }
}
