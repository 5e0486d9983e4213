use crate::log::log_level::LogLevel;
use crate::utils::Timestamp;

/// One queued log line, as handed from producers to the logger worker.
#[derive(Debug, Clone)]
pub struct LogMsg {
    pub level: LogLevel,
    /// Milliseconds since the UNIX epoch.
    pub ts_ms: Timestamp,
    pub text: String,
    /// Module path of the producer.
    pub target: &'static str,
}

impl LogMsg {
    pub fn new(
        level: LogLevel,
        text: impl Into<String>,
        target: &'static str,
        ts_ms: Timestamp,
    ) -> Self {
        Self {
            level,
            ts_ms,
            text: text.into(),
            target,
        }
    }

    /// Render the line the way it lands in the log file.
    pub fn render(&self) -> String {
        format!(
            "[{}] {} {} | {}",
            self.level.as_str(),
            self.ts_ms,
            self.target,
            self.text
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_includes_level_target_and_text() {
        let msg = LogMsg::new(LogLevel::Warn, "peer offline", "rustycall::relay", 42);
        assert_eq!(msg.render(), "[WARN] 42 rustycall::relay | peer offline");
    }
}
