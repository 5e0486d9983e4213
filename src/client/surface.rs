use std::sync::mpsc::{self, Receiver, Sender};

use crate::call::UiCommand;

/// Renders call UI. Implemented by the host application.
pub trait PresentationSurface: Send + Sync {
    fn apply(&self, command: UiCommand);
}

/// Surface that forwards every command into a channel, for hosts with their
/// own UI thread (and for tests).
#[derive(Debug, Clone)]
pub struct ChannelSurface {
    tx: Sender<UiCommand>,
}

impl ChannelSurface {
    pub fn new() -> (Self, Receiver<UiCommand>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }
}

impl PresentationSurface for ChannelSurface {
    fn apply(&self, command: UiCommand) {
        // a host that stopped listening has nothing left to render
        let _ = self.tx.send(command);
    }
}
