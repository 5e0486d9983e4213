use crate::log::log_level::LogLevel;

/// Destination for log lines. Every component receives an `Arc<dyn LogSink>`
/// at construction time; tests pass a `NoopLogSink`.
pub trait LogSink: Send + Sync {
    fn log(&self, level: LogLevel, msg: &str, target: &'static str);
}
