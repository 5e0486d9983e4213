use crate::{
    config::Config,
    log::{log_level::LogLevel, log_msg::LogMsg, logger_handle::LoggerHandle},
    utils::now_millis,
};

use std::{
    fs::{self, OpenOptions},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    sync::mpsc,
    thread,
};

/// Lines written between two flushes when nothing urgent arrives.
#[cfg(feature = "log-debug")]
const FLUSH_BATCH_SIZE: u32 = 100;

#[cfg(not(feature = "log-debug"))]
const FLUSH_BATCH_SIZE: u32 = 1_000;

/// Bounded, non-blocking process logger.
///
/// Producers enqueue through [`LoggerHandle`]s; a single `logger-worker`
/// thread appends the lines to a per-process file. Lines at or above
/// `echo_level` are also mirrored to stderr and force a flush, so a crash
/// right after a warning still leaves it on disk.
pub struct Logger {
    handle: LoggerHandle,
    _thread: Option<thread::JoinHandle<()>>,
    file_path: PathBuf,
}

impl Logger {
    /// Start the signaling server logger, honouring the `[Logging]` section:
    /// `server_log_filename` (file prefix) and `server_log_path` (directory).
    #[must_use]
    pub fn start_server(cap: usize, config: &Config) -> Self {
        let app_name = config.get_non_empty("Logging", "server_log_filename");

        match config.get_non_empty("Logging", "server_log_path") {
            Some(dir) => Self::start_in_dir(expand_path(dir), app_name, cap, LogLevel::Warn),
            None => Self::start_default(app_name, cap),
        }
    }

    /// Log into `logs/` next to the executable.
    #[must_use]
    pub fn start_default(app_name: Option<&str>, cap: usize) -> Self {
        let base = exe_dir_fallback_cwd().join("logs");
        Self::start_in_dir(base, app_name, cap, LogLevel::Warn)
    }

    /// Start the worker writing into `dir`, creating it when missing.
    ///
    /// The file is named `<app_name>-<unix_ms>-pid<pid>.log`.
    pub fn start_in_dir<D: AsRef<Path>>(
        dir: D,
        app_name: Option<&str>,
        cap: usize,
        echo_level: LogLevel,
    ) -> Self {
        let dir = dir.as_ref().to_path_buf();
        let _ = fs::create_dir_all(&dir);

        let fname = format!(
            "{}-{}-pid{}.log",
            app_name.unwrap_or("rustycall"),
            now_millis(),
            std::process::id()
        );
        let file_path = dir.join(fname);

        let (tx, rx) = mpsc::sync_channel::<LogMsg>(cap.max(1));
        let worker_path = file_path.clone();

        let _thread = thread::Builder::new()
            .name("logger-worker".into())
            .spawn(move || run_worker(&worker_path, &rx, echo_level))
            .ok();

        Self {
            handle: LoggerHandle { tx },
            _thread,
            file_path,
        }
    }

    #[must_use]
    pub fn handle(&self) -> LoggerHandle {
        self.handle.clone()
    }

    #[must_use]
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }
}

fn run_worker(path: &Path, rx: &mpsc::Receiver<LogMsg>, echo_level: LogLevel) {
    // Target file, then a temp fallback, then nowhere; the worker never panics.
    let writer: Box<dyn Write + Send> =
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => Box::new(f),
            Err(_) => {
                let fallback = std::env::temp_dir().join("rustycall-fallback.log");
                match OpenOptions::new().create(true).append(true).open(&fallback) {
                    Ok(f) => Box::new(f),
                    Err(_) => Box::new(io::sink()),
                }
            }
        };
    let mut out = BufWriter::new(writer);
    let mut since_flush: u32 = 0;

    while let Ok(m) = rx.recv() {
        let line = m.render();
        let _ = writeln!(&mut out, "{line}");
        since_flush = since_flush.wrapping_add(1);

        let urgent = m.level >= echo_level;
        if urgent {
            eprintln!("{line}");
        }
        if urgent || since_flush >= FLUSH_BATCH_SIZE {
            let _ = out.flush();
            since_flush = 0;
        }
    }

    let _ = out.flush();
}

fn exe_dir_fallback_cwd() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// Expand a leading `~` to the user's home directory.
fn expand_path(path_str: &str) -> PathBuf {
    let home = || {
        std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .ok()
            .map(PathBuf::from)
    };

    if path_str == "~" {
        if let Some(h) = home() {
            return h;
        }
    }
    if let Some(rest) = path_str
        .strip_prefix("~/")
        .or_else(|| path_str.strip_prefix("~\\"))
    {
        if let Some(h) = home() {
            return h.join(rest);
        }
    }
    PathBuf::from(path_str)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::log::log_sink::LogSink;
    use std::time::{Duration, Instant};

    #[test]
    fn warn_lines_are_flushed_to_the_log_file() {
        let dir = std::env::temp_dir().join(format!("rustycall_logger_{}", rand::random::<u64>()));
        let logger = Logger::start_in_dir(&dir, Some("test"), 16, LogLevel::Warn);

        logger.handle().log(LogLevel::Info, "first line", "logger::test");
        logger.handle().log(LogLevel::Warn, "peer offline", "logger::test");

        let deadline = Instant::now() + Duration::from_secs(2);
        let mut contents = String::new();
        while Instant::now() < deadline {
            contents = fs::read_to_string(logger.file_path()).unwrap_or_default();
            if contents.contains("peer offline") {
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }

        assert!(contents.contains("[INFO]"), "got: {contents}");
        assert!(contents.contains("[WARN]"), "got: {contents}");
        assert!(contents.contains("logger::test | peer offline"));

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn expand_path_keeps_plain_paths() {
        assert_eq!(expand_path("/var/log/rc"), PathBuf::from("/var/log/rc"));
        assert_eq!(expand_path("logs"), PathBuf::from("logs"));
    }
}
