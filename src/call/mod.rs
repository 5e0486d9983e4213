//! Per-side call lifecycle: states, inputs, outputs and the state machine.

pub mod call_state;
pub mod call_state_machine;
pub mod events;

pub use call_state::{CallRole, CallState, EndReason, HangupPayload, MediaFlags, TogglePayload};
pub use call_state_machine::CallStateMachine;
pub use events::{CallInput, CallIntent, CallOutput, UiCommand};
