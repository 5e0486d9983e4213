use std::{
    collections::HashMap,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Mutex,
};

use crate::presence::errors::PersistenceError;
use crate::presence::session::{Principal, Session, SessionId};
use crate::presence::session_store::SessionStore;
use crate::utils::lock;

/// Session rows stored as JSON lines, one row per line.
///
/// Every write rewrites the file through a temp file and an atomic rename.
/// Closed rows are archived one per principal: when a row is closed, older
/// closed rows of the same principal are dropped.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    rows: Mutex<HashMap<SessionId, Session>>,
}

impl FileSessionStore {
    /// Open the store at `path`. A missing file is an empty store; a line
    /// that does not parse aborts the open, since reconciliation must not
    /// run over a partial view.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let path = path.as_ref().to_path_buf();
        let mut rows = HashMap::new();

        match fs::read_to_string(&path) {
            Ok(contents) => {
                for line in contents.lines() {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    let row: Session = serde_json::from_str(line)?;
                    rows.insert(row.id, row);
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        Ok(Self {
            path,
            rows: Mutex::new(rows),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_all(&self, rows: &HashMap<SessionId, Session>) -> Result<(), PersistenceError> {
        let mut sorted: Vec<&Session> = rows.values().collect();
        sorted.sort_by_key(|s| (s.connected_at, s.id));

        let mut buf = String::new();
        for row in sorted {
            buf.push_str(&serde_json::to_string(row)?);
            buf.push('\n');
        }

        let tmp = self.path.with_extension("tmp");
        {
            let mut f = fs::File::create(&tmp)?;
            f.write_all(buf.as_bytes())?;
            f.sync_all()?;
        }
        fs::rename(tmp, &self.path)?;
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn load_active_sessions(&self) -> Result<Vec<Session>, PersistenceError> {
        Ok(lock(&self.rows)
            .values()
            .filter(|s| s.is_active)
            .cloned()
            .collect())
    }

    fn persist_session_change(&self, session: &Session) -> Result<(), PersistenceError> {
        let mut rows = lock(&self.rows);

        // Only commit to memory what made it to disk.
        let mut next = rows.clone();
        next.insert(session.id, session.clone());
        if !session.is_active {
            let principal: &Principal = &session.principal;
            next.retain(|id, s| *id == session.id || s.is_active || &s.principal != principal);
        }

        self.write_all(&next)?;
        *rows = next;
        Ok(())
    }
}
