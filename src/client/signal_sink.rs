use crate::signaling::protocol::WireEnvelope;
use crate::signaling_client::{SignalingClient, SignalingClientError};

/// Where a [`CallAgent`](super::CallAgent) sends its envelopes.
pub trait SignalSink: Send + Sync {
    /// # Errors
    /// Any failure; the agent ends the call as if the peer were offline.
    fn send_signal(&self, to: &str, envelope: WireEnvelope) -> Result<(), SignalingClientError>;
}

impl SignalSink for SignalingClient {
    fn send_signal(&self, to: &str, envelope: WireEnvelope) -> Result<(), SignalingClientError> {
        SignalingClient::send_signal(self, to, envelope)
    }
}
