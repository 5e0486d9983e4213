use std::{fmt, io};

use crate::presence::{PersistenceError, RegistryError};

/// Fatal failures while bringing the signaling server up.
#[derive(Debug)]
pub enum ServerError {
    Io(io::Error),
    Persistence(PersistenceError),
    Registry(RegistryError),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "signaling server IO error: {e}"),
            Self::Persistence(e) => write!(f, "cannot open session store: {e}"),
            Self::Registry(e) => write!(f, "session registry unavailable: {e}"),
        }
    }
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Persistence(e) => Some(e),
            Self::Registry(e) => Some(e),
        }
    }
}

impl From<io::Error> for ServerError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<PersistenceError> for ServerError {
    fn from(e: PersistenceError) -> Self {
        Self::Persistence(e)
    }
}

impl From<RegistryError> for ServerError {
    fn from(e: RegistryError) -> Self {
        Self::Registry(e)
    }
}
