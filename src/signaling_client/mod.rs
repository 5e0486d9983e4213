pub mod signaling_client_c;
pub mod signaling_client_error;

pub use signaling_client_c::SignalingClient;
pub use signaling_client_error::SignalingClientError;
