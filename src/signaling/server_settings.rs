use std::path::PathBuf;

use crate::config::Config;
use crate::signaling::protocol::MAX_BODY_LEN;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";
pub const DEFAULT_OUTBOUND_QUEUE: usize = 256;
pub const DEFAULT_SESSIONS_FILE: &str = "sessions.jsonl";

/// Environment variable overriding `[Persistence] sessions_path`.
pub const SESSIONS_PATH_ENV: &str = "RUSTYCALL_SESSIONS_PATH";

/// Runtime knobs of the signaling server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub bind_addr: String,
    /// Capacity of each connection's outbound queue, in frames.
    pub outbound_queue: usize,
    /// Largest accepted frame body, in bytes.
    pub max_frame_len: usize,
    pub sessions_path: PathBuf,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_owned(),
            outbound_queue: DEFAULT_OUTBOUND_QUEUE,
            max_frame_len: MAX_BODY_LEN,
            sessions_path: default_sessions_path(),
        }
    }
}

impl ServerSettings {
    /// Read `[Signaling]` and `[Persistence]`, honouring
    /// `RUSTYCALL_SESSIONS_PATH`.
    pub fn from_config(cfg: &Config) -> Self {
        Self::from_config_with_env(cfg, std::env::var(SESSIONS_PATH_ENV).ok())
    }

    pub fn from_config_with_env(cfg: &Config, sessions_env: Option<String>) -> Self {
        let defaults = Self::default();
        let sessions_path = sessions_env
            .filter(|p| !p.is_empty())
            .or_else(|| cfg.get_non_empty("Persistence", "sessions_path").map(str::to_owned))
            .map(PathBuf::from)
            .unwrap_or(defaults.sessions_path);

        Self {
            bind_addr: cfg
                .get_or_default("Signaling", "bind_addr", &defaults.bind_addr)
                .to_owned(),
            outbound_queue: cfg
                .get_parsed_or("Signaling", "outbound_queue", defaults.outbound_queue)
                .max(1),
            max_frame_len: cfg
                .get_parsed_or("Signaling", "max_frame_len", defaults.max_frame_len)
                .clamp(1, MAX_BODY_LEN),
            sessions_path,
        }
    }
}

/// `sessions.jsonl` next to the executable, so restarts find the same file
/// whatever the working directory.
fn default_sessions_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|dir| dir.join(DEFAULT_SESSIONS_FILE)))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSIONS_FILE))
}
