use std::{fmt, io};

/// Failure of the persistence surface.
#[derive(Debug)]
pub enum PersistenceError {
    Io(io::Error),
    Corrupt(serde_json::Error),
    /// Store-specific failure (e.g. a backend refusing the write).
    Backend(String),
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "session store IO error: {e}"),
            Self::Corrupt(e) => write!(f, "session store row is corrupt: {e}"),
            Self::Backend(msg) => write!(f, "session store failure: {msg}"),
        }
    }
}

impl std::error::Error for PersistenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Corrupt(e) => Some(e),
            Self::Backend(_) => None,
        }
    }
}

impl From<io::Error> for PersistenceError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(e: serde_json::Error) -> Self {
        Self::Corrupt(e)
    }
}

#[derive(Debug)]
pub enum RegistryError {
    /// Startup reconciliation already ran.
    AlreadyReconciled,
    /// Startup reconciliation failed; the registry refuses connections.
    StartupFailed,
    /// Reconciliation could not read or write the store.
    Persistence(PersistenceError),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyReconciled => write!(f, "startup reconciliation already ran"),
            Self::StartupFailed => write!(f, "session registry failed to start"),
            Self::Persistence(e) => write!(f, "startup reconciliation failed: {e}"),
        }
    }
}

impl std::error::Error for RegistryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Persistence(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PersistenceError> for RegistryError {
    fn from(e: PersistenceError) -> Self {
        Self::Persistence(e)
    }
}
