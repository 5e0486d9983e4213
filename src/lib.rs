//! RustyCall is the call-signaling and presence core of a chat application.
//!
//! It provides one binary:
//! - `signaling_server`: relays WebRTC negotiation between connected clients
//!   and tracks who is online.
//!
//! Clients embed [`client::CallAgent`] over a
//! [`signaling_client::SignalingClient`].

/// Per-side call lifecycle and its state machine.
pub mod call;
/// Client-side call agent and presentation surface traits.
pub mod client;
/// Handles configuration loading and management.
pub mod config;
/// Logging utilities for the application.
pub mod log;
/// Session registry, presence events and session persistence.
pub mod presence;
/// Signaling server: wire protocol, relay and TCP transport.
pub mod signaling;
/// Signaling client for communicating with the signaling server.
pub mod signaling_client;
/// Small shared helpers (time, lock recovery).
pub mod utils;
