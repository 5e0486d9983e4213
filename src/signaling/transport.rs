use std::io::{self, BufReader, BufWriter};
use std::net::{Shutdown, TcpStream};
use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::thread;

use crate::log::log_sink::LogSink;
use crate::presence::{ConnectionId, Principal};
use crate::signaling::peer_channel::PeerChannel;
use crate::signaling::protocol::{
    ClientFrame, FrameError, ServerFrame, read_client_frame, write_server_frame,
};
use crate::signaling::relay::SignalingRelay;
use crate::{sink_debug, sink_info, sink_warn};

/// Per-connection limits.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionLimits {
    pub outbound_queue: usize,
    pub max_frame_len: usize,
}

/// Spawn the reader thread for one accepted TCP client. The reader spawns
/// the writer once the client said hello.
pub fn spawn_connection_threads(
    connection_id: ConnectionId,
    stream: TcpStream,
    relay: Arc<SignalingRelay>,
    limits: ConnectionLimits,
    log: Arc<dyn LogSink>,
) -> io::Result<()> {
    let write_stream = stream.try_clone()?;

    thread::Builder::new()
        .name(format!("conn-{connection_id}-reader"))
        .spawn(move || {
            run_reader(connection_id, stream, write_stream, &relay, limits, &log);
        })?;
    Ok(())
}

fn run_reader(
    connection_id: ConnectionId,
    stream: TcpStream,
    write_stream: TcpStream,
    relay: &SignalingRelay,
    limits: ConnectionLimits,
    log: &Arc<dyn LogSink>,
) {
    let shutdown = match stream.try_clone() {
        Ok(s) => s,
        Err(e) => {
            sink_warn!(log, "[conn {}] cannot clone stream: {}", connection_id, e);
            return;
        }
    };
    let mut reader = BufReader::new(stream);

    let Some(principal) = await_hello(connection_id, &mut reader, limits, log.as_ref()) else {
        let _ = shutdown.shutdown(Shutdown::Both);
        return;
    };

    let (channel, outbound) = PeerChannel::bounded(connection_id, limits.outbound_queue);
    if let Err(e) = spawn_writer(connection_id, write_stream, outbound, log.clone()) {
        sink_warn!(log, "[conn {}] cannot spawn writer: {}", connection_id, e);
        let _ = shutdown.shutdown(Shutdown::Both);
        return;
    }

    if let Err(e) = relay.on_connect(&principal, connection_id, channel) {
        sink_warn!(
            log,
            "[conn {}] refusing {}: {}",
            connection_id,
            principal,
            e
        );
        let _ = shutdown.shutdown(Shutdown::Both);
        return;
    }
    sink_info!(log, "[conn {}] {} connected", connection_id, principal);

    loop {
        let frame = read_client_frame(&mut reader, limits.max_frame_len);
        if frame.is_ok() && !relay.is_current(connection_id) {
            sink_info!(
                log,
                "[conn {}] {} reconnected elsewhere; closing",
                connection_id,
                principal
            );
            break;
        }
        match frame {
            Ok(ClientFrame::Signal { to, envelope }) => {
                let kind = envelope.kind;
                let delivery = relay.on_inbound_envelope(&principal, &to, envelope);
                sink_debug!(
                    log,
                    "[conn {}] {} {} -> {}: {:?}",
                    connection_id,
                    kind.as_str(),
                    principal,
                    to,
                    delivery
                );
            }
            Ok(ClientFrame::SetStatus { status }) => {
                if relay.set_status(&principal, status).is_none() {
                    sink_debug!(log, "[conn {}] status change ignored", connection_id);
                }
            }
            Ok(ClientFrame::Bye) => {
                sink_info!(log, "[conn {}] {} said bye", connection_id, principal);
                break;
            }
            Ok(ClientFrame::Hello { principal: again }) => {
                sink_warn!(
                    log,
                    "[conn {}] repeated hello ({}) ignored",
                    connection_id,
                    again
                );
            }
            Err(e) if e.is_fatal() => {
                log_read_end(connection_id, &e, log.as_ref());
                break;
            }
            Err(e) => {
                sink_warn!(
                    log,
                    "[conn {}] dropping malformed frame: {}",
                    connection_id,
                    e
                );
            }
        }
    }

    relay.on_disconnect(connection_id);
    let _ = shutdown.shutdown(Shutdown::Both);
    sink_info!(log, "[conn {}] {} disconnected", connection_id, principal);
}

/// Read until a `hello` arrives. Malformed frames are skipped; any other
/// well-formed frame first is a protocol violation.
fn await_hello(
    connection_id: ConnectionId,
    reader: &mut BufReader<TcpStream>,
    limits: ConnectionLimits,
    log: &dyn LogSink,
) -> Option<Principal> {
    loop {
        match read_client_frame(reader, limits.max_frame_len) {
            Ok(ClientFrame::Hello { principal }) => {
                let name = hello_principal(&principal);
                if name.is_none() {
                    sink_warn!(log, "[conn {}] blank principal in hello; closing", connection_id);
                }
                return name;
            }
            Ok(other) => {
                sink_warn!(
                    log,
                    "[conn {}] expected hello, got {:?}; closing",
                    connection_id,
                    other.frame_type()
                );
                return None;
            }
            Err(e) if e.is_fatal() => {
                log_read_end(connection_id, &e, log);
                return None;
            }
            Err(e) => {
                sink_warn!(
                    log,
                    "[conn {}] dropping malformed frame before hello: {}",
                    connection_id,
                    e
                );
            }
        }
    }
}

/// Principal named in `hello` with surrounding whitespace removed; `None`
/// if nothing is left.
fn hello_principal(raw: &str) -> Option<Principal> {
    let name = raw.trim();
    if name.is_empty() {
        return None;
    }
    Some(name.to_owned())
}

fn log_read_end(connection_id: ConnectionId, e: &FrameError, log: &dyn LogSink) {
    match e {
        FrameError::Io(io_e) if io_e.kind() == io::ErrorKind::UnexpectedEof => {
            sink_debug!(log, "[conn {}] peer closed the stream", connection_id);
        }
        other => {
            sink_warn!(log, "[conn {}] read loop ended: {}", connection_id, other);
        }
    }
}

fn spawn_writer(
    connection_id: ConnectionId,
    stream: TcpStream,
    outbound: Receiver<ServerFrame>,
    log: Arc<dyn LogSink>,
) -> io::Result<()> {
    thread::Builder::new()
        .name(format!("conn-{connection_id}-writer"))
        .spawn(move || {
            let shutdown = stream.try_clone().ok();
            let mut writer = BufWriter::new(stream);
            // ends when the relay drops the channel: disconnect or supersede
            while let Ok(frame) = outbound.recv() {
                if let Err(e) = write_server_frame(&mut writer, &frame) {
                    sink_warn!(
                        log,
                        "[conn {}] error sending {}: {}",
                        connection_id,
                        frame.name(),
                        e
                    );
                    break;
                }
            }
            // unblock the reader so it runs the disconnect path
            if let Some(s) = &shutdown {
                let _ = s.shutdown(Shutdown::Both);
            }
        })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hello_principal_is_trimmed() {
        assert_eq!(hello_principal("alice").as_deref(), Some("alice"));
        assert_eq!(hello_principal("  alice \t").as_deref(), Some("alice"));
        assert_eq!(hello_principal("   "), None);
        assert_eq!(hello_principal(""), None);
    }
}
