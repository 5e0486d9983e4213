//! Framed JSON wire protocol between signaling clients and the server.

pub mod codec;
pub mod constants;
pub mod envelope;
pub mod errors;
pub mod frame_type;
pub mod frames;
pub mod framing;

pub use codec::{read_client_frame, read_server_frame, write_client_frame, write_server_frame};
pub use constants::{HEADER_LEN, MAX_BODY_LEN, PROTO_VERSION};
pub use envelope::{CallId, SignalEnvelope, SignalKind, WireEnvelope};
pub use errors::{FrameError, ProtoError};
pub use frame_type::FrameType;
pub use frames::{ClientFrame, FailureReason, ServerFrame};
pub use framing::{read_frame, write_frame};
