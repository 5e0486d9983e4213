use std::io;
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::thread;

use crate::log::log_sink::LogSink;
use crate::presence::ConnectionId;
use crate::signaling::relay::SignalingRelay;
use crate::signaling::server_settings::ServerSettings;
use crate::signaling::transport::{ConnectionLimits, spawn_connection_threads};
use crate::{sink_info, sink_warn};

/// Top-level runtime object for the signaling service.
///
/// Owns the listening socket and the relay, fans presence events out to
/// every client, and spins up reader/writer threads per connection.
pub struct SignalingServer {
    listener: TcpListener,
    relay: Arc<SignalingRelay>,
    limits: ConnectionLimits,
    log: Arc<dyn LogSink>,
}

impl SignalingServer {
    /// Bind the listener and start presence fan-out. Connections are only
    /// accepted once [`run`](Self::run) is called.
    pub fn bind(
        settings: &ServerSettings,
        relay: Arc<SignalingRelay>,
        log: Arc<dyn LogSink>,
    ) -> io::Result<Self> {
        let listener = TcpListener::bind(&settings.bind_addr)?;

        let events = relay.registry().subscribe();
        let fanout_relay = relay.clone();
        thread::Builder::new()
            .name("presence-fanout".into())
            .spawn(move || {
                while let Ok(event) = events.recv() {
                    fanout_relay.broadcast_presence(&event);
                }
            })?;

        Ok(Self {
            listener,
            relay,
            limits: ConnectionLimits {
                outbound_queue: settings.outbound_queue,
                max_frame_len: settings.max_frame_len,
            },
            log,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Blocking accept loop.
    pub fn run(self) -> io::Result<()> {
        let Self {
            listener,
            relay,
            limits,
            log,
        } = self;

        sink_info!(log, "signaling server listening on {}", listener.local_addr()?);

        let mut next_connection_id: ConnectionId = 1;
        for stream in listener.incoming() {
            let stream = match stream {
                Ok(s) => s,
                Err(e) => {
                    sink_warn!(
                        log,
                        "incoming TCP accept failed: {:?} (continuing to accept)",
                        e
                    );
                    continue;
                }
            };
            let _ = stream.set_nodelay(true);

            let connection_id = next_connection_id;
            next_connection_id += 1;

            sink_info!(
                log,
                "accepted {} as conn {}",
                stream
                    .peer_addr()
                    .map(|a| a.to_string())
                    .unwrap_or_else(|_| "?".into()),
                connection_id
            );

            if let Err(e) =
                spawn_connection_threads(connection_id, stream, relay.clone(), limits, log.clone())
            {
                sink_warn!(
                    log,
                    "failed to spawn connection threads for conn {}: {:?}",
                    connection_id,
                    e
                );
            }
        }

        Ok(())
    }
}
