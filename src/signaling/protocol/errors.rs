use std::{fmt, io};

use super::FrameType;

/// Protocol-level errors (header or body format issues).
#[derive(Debug)]
pub enum ProtoError {
    UnknownType(u8),
    BadVersion(u8),
    TooLarge { max: usize, actual: usize },
    Json(serde_json::Error),
    /// Header type byte and JSON `type` tag disagree.
    TypeMismatch { header: FrameType, body: FrameType },
}

impl fmt::Display for ProtoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownType(b) => write!(f, "unknown frame type 0x{b:02x}"),
            Self::BadVersion(v) => write!(f, "unsupported protocol version {v}"),
            Self::TooLarge { max, actual } => {
                write!(f, "frame body of {actual} bytes exceeds limit of {max}")
            }
            Self::Json(e) => write!(f, "malformed frame body: {e}"),
            Self::TypeMismatch { header, body } => {
                write!(f, "header says {header:?} but body is {body:?}")
            }
        }
    }
}

impl std::error::Error for ProtoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ProtoError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

/// Frame-level error wrapper: IO vs protocol.
#[derive(Debug)]
pub enum FrameError {
    Io(io::Error),
    Proto(ProtoError),
}

impl FrameError {
    /// True when the stream itself is gone (EOF, reset, closed socket), as
    /// opposed to a single bad frame the reader can skip.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Io(_) => true,
            Self::Proto(ProtoError::BadVersion(_) | ProtoError::TooLarge { .. }) => true,
            Self::Proto(_) => false,
        }
    }
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO error: {e}"),
            Self::Proto(e) => write!(f, "protocol error: {e}"),
        }
    }
}

impl std::error::Error for FrameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Proto(e) => Some(e),
        }
    }
}

impl From<io::Error> for FrameError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<ProtoError> for FrameError {
    fn from(e: ProtoError) -> Self {
        Self::Proto(e)
    }
}

impl From<serde_json::Error> for FrameError {
    fn from(e: serde_json::Error) -> Self {
        Self::Proto(ProtoError::Json(e))
    }
}
