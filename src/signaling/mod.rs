//! Signaling server: wire protocol, call relay and TCP transport.

pub mod call_session;
pub mod errors;
pub mod line_table;
pub mod peer_channel;
pub mod protocol;
pub mod relay;
pub mod run;
pub mod server_settings;
pub mod signaling_server;
pub mod transport;

pub use errors::ServerError;
pub use peer_channel::{PeerChannel, TransportFailure};
pub use relay::{Delivery, SignalingRelay};
pub use server_settings::ServerSettings;
pub use signaling_server::SignalingServer;
