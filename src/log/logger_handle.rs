use std::sync::mpsc;

use crate::log::{log_level::LogLevel, log_msg::LogMsg, log_sink::LogSink};
use crate::utils::now_millis;

/// Cloneable, non-blocking producer side of the process [`Logger`].
///
/// Lines go into a bounded `SyncSender`; when the queue is full the line is
/// dropped rather than stalling a connection thread.
///
/// [`Logger`]: crate::log::logger::Logger
#[derive(Clone)]
pub struct LoggerHandle {
    pub(super) tx: mpsc::SyncSender<LogMsg>,
}

impl LogSink for LoggerHandle {
    #[inline]
    fn log(&self, level: LogLevel, msg: &str, target: &'static str) {
        let _ = self.try_log(level, msg, target);
    }
}

impl LoggerHandle {
    /// Enqueue a line stamped with the current time.
    ///
    /// # Errors
    /// `TrySendError::Full` when the queue is at capacity, and
    /// `TrySendError::Disconnected` once the worker has exited.
    pub fn try_log<S: Into<String>>(
        &self,
        level: LogLevel,
        text: S,
        target: &'static str,
    ) -> Result<(), mpsc::TrySendError<LogMsg>> {
        self.tx
            .try_send(LogMsg::new(level, text, target, now_millis()))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use std::sync::mpsc::{TrySendError, sync_channel};

    #[test]
    fn sink_log_enqueues_stamped_line() {
        let (tx, rx) = sync_channel::<LogMsg>(2);
        let h = LoggerHandle { tx };

        h.log(LogLevel::Info, "registry ready", "test::target");

        let msg = rx.recv().expect("a message should arrive");
        assert_eq!(msg.level, LogLevel::Info);
        assert_eq!(msg.text, "registry ready");
        assert_eq!(msg.target, "test::target");
        assert!(msg.ts_ms > 0);
    }

    #[test]
    fn full_queue_drops_instead_of_blocking() {
        let (tx, _rx) = sync_channel::<LogMsg>(1);
        let h = LoggerHandle { tx };

        h.try_log(LogLevel::Info, "first", "test::target")
            .expect("first send should succeed");

        match h.try_log(LogLevel::Info, "second", "test::target") {
            Err(TrySendError::Full(_)) => {}
            other => panic!("expected Full, got: {:?}", other),
        }
    }

    #[test]
    fn closed_worker_reports_disconnected() {
        let (tx, rx) = sync_channel::<LogMsg>(1);
        drop(rx);
        let h = LoggerHandle { tx };

        match h.try_log(LogLevel::Error, "won't send", "test::target") {
            Err(TrySendError::Disconnected(_)) => {}
            other => panic!("expected Disconnected, got: {:?}", other),
        }
    }
}
