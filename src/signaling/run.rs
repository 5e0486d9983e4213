use std::sync::Arc;

use crate::log::log_sink::LogSink;
use crate::presence::{FileSessionStore, SessionRegistry};
use crate::signaling::errors::ServerError;
use crate::signaling::relay::SignalingRelay;
use crate::signaling::server_settings::ServerSettings;
use crate::signaling::signaling_server::SignalingServer;
use crate::{sink_error, sink_info};

/// Open the session store, reconcile orphaned sessions, then serve until the
/// listener fails.
///
/// # Errors
/// Store or reconciliation failures are fatal and returned before any
/// connection is accepted.
pub fn run_signaling_server(
    settings: &ServerSettings,
    log: Arc<dyn LogSink>,
) -> Result<(), ServerError> {
    let server = build_server(settings, log)?;
    server.run()?;
    Ok(())
}

/// Everything `run_signaling_server` does short of accepting connections.
pub fn build_server(
    settings: &ServerSettings,
    log: Arc<dyn LogSink>,
) -> Result<SignalingServer, ServerError> {
    let store = Arc::new(FileSessionStore::open(&settings.sessions_path)?);
    sink_info!(log, "using session store at {}", store.path().display());

    let registry = Arc::new(SessionRegistry::new(store, log.clone()));
    match registry.recover_from_store() {
        Ok(report) => {
            sink_info!(
                log,
                "startup: {} orphaned sessions recovered",
                report.recovered.len()
            );
        }
        Err(e) => {
            sink_error!(log, "startup reconciliation failed: {}", e);
            return Err(e.into());
        }
    }

    let relay = Arc::new(SignalingRelay::new(registry, log.clone()));
    Ok(SignalingServer::bind(settings, relay, log)?)
}
