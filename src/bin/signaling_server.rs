use std::sync::Arc;
use std::{env, process};

use rustycall::config::Config;
use rustycall::log::log_sink::LogSink;
use rustycall::log::logger::Logger;
use rustycall::signaling::ServerSettings;
use rustycall::signaling::run::run_signaling_server;

fn main() {
    // --- Parse CLI args ----------------------------------------------------
    //
    // Supported:
    //   signaling_server
    //      -> built-in defaults (binds 0.0.0.0:5000)
    //
    //   signaling_server server.conf
    //      -> settings from the INI file
    //
    //   signaling_server server.conf 127.0.0.1:7000
    //      -> settings from the file, bind address overridden

    let args: Vec<String> = env::args().collect();

    let (config, bind_override) = match args.len() {
        1 => (Config::empty(), None),
        2 | 3 => {
            let cfg = Config::load(&args[1]).unwrap_or_else(|e| {
                eprintln!("[signaling_server] {e}");
                process::exit(1);
            });
            (cfg, args.get(2).cloned())
        }
        _ => {
            eprintln!("Usage:");
            eprintln!("  {}                       # defaults", args[0]);
            eprintln!("  {} [CONFIG]              # e.g. server.conf", args[0]);
            eprintln!("  {} [CONFIG] [ADDR]       # e.g. server.conf 0.0.0.0:6000", args[0]);
            process::exit(1);
        }
    };

    let mut settings = ServerSettings::from_config(&config);
    if let Some(addr) = bind_override {
        settings.bind_addr = addr;
    }

    // --- Start process logger ----------------------------------------------
    let logger = Logger::start_server(1024, &config);
    let log_sink: Arc<dyn LogSink> = Arc::new(logger.handle());

    eprintln!(
        "[signaling_server] starting on {} (log: {})",
        settings.bind_addr,
        logger.file_path().display()
    );

    // --- Run signaling server (blocks) -------------------------------------
    if let Err(e) = run_signaling_server(&settings, log_sink) {
        eprintln!("[signaling_server] fatal: {e}");
        process::exit(1);
    }
}
