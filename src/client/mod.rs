//! Client side: one state machine per call, wired to a signal sink and a
//! presentation surface.

pub mod call_agent;
pub mod signal_sink;
pub mod surface;

pub use call_agent::CallAgent;
pub use signal_sink::SignalSink;
pub use surface::{ChannelSurface, PresentationSurface};
