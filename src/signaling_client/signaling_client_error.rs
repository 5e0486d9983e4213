use std::{fmt, io};

use crate::signaling::protocol::FrameError;

/// Errors of the blocking signaling client.
#[derive(Debug)]
pub enum SignalingClientError {
    Io(io::Error),
    Frame(FrameError),
    /// The server did not answer `hello` with `welcome`.
    Handshake(String),
    /// The connection is closed; nothing more can be sent.
    Disconnected,
}

impl fmt::Display for SignalingClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO error: {e}"),
            Self::Frame(e) => write!(f, "protocol error: {e}"),
            Self::Handshake(msg) => write!(f, "handshake failed: {msg}"),
            Self::Disconnected => write!(f, "signaling client disconnected"),
        }
    }
}

impl std::error::Error for SignalingClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Frame(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for SignalingClientError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<FrameError> for SignalingClientError {
    fn from(e: FrameError) -> Self {
        match e {
            FrameError::Io(io_e) => Self::Io(io_e),
            other => Self::Frame(other),
        }
    }
}
