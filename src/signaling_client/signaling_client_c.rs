use std::io::{BufReader, BufWriter};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::log::log_sink::LogSink;
use crate::presence::{ConnectionId, PresenceStatus, Principal};
use crate::signaling::protocol::{
    ClientFrame, MAX_BODY_LEN, ServerFrame, WireEnvelope, read_server_frame, write_client_frame,
};
use crate::signaling_client::SignalingClientError;
use crate::utils::lock;
use crate::{sink_debug, sink_info, sink_warn};

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Blocking TCP client of the signaling server.
///
/// [`connect`](Self::connect) performs the hello/welcome handshake and
/// starts a reader thread that pushes every later server frame into the
/// returned channel. The channel disconnects when the server goes away.
pub struct SignalingClient {
    principal: Principal,
    connection_id: ConnectionId,
    writer: Mutex<BufWriter<TcpStream>>,
    control: TcpStream,
    closed: Arc<AtomicBool>,
    _reader: Option<JoinHandle<()>>,
    log: Arc<dyn LogSink>,
}

impl SignalingClient {
    /// # Errors
    /// IO failures, or `Handshake` if the first server frame is not
    /// `welcome`.
    pub fn connect<A: ToSocketAddrs>(
        addr: A,
        principal: &str,
        log: Arc<dyn LogSink>,
    ) -> Result<(Self, Receiver<ServerFrame>), SignalingClientError> {
        let stream = TcpStream::connect(addr)?;
        let _ = stream.set_nodelay(true);
        let control = stream.try_clone()?;
        let mut writer = BufWriter::new(stream.try_clone()?);
        let mut reader = BufReader::new(stream);

        write_client_frame(
            &mut writer,
            &ClientFrame::Hello {
                principal: principal.to_owned(),
            },
        )?;

        control.set_read_timeout(Some(HANDSHAKE_TIMEOUT))?;
        let connection_id = match read_server_frame(&mut reader, MAX_BODY_LEN)? {
            ServerFrame::Welcome { connection_id } => connection_id,
            other => {
                let _ = control.shutdown(Shutdown::Both);
                return Err(SignalingClientError::Handshake(format!(
                    "expected welcome, got {}",
                    other.name()
                )));
            }
        };
        control.set_read_timeout(None)?;
        sink_info!(
            log,
            "signaling: {} connected as conn {}",
            principal,
            connection_id
        );

        let (tx, rx) = mpsc::channel();
        let closed = Arc::new(AtomicBool::new(false));
        let reader_closed = closed.clone();
        let reader_log = log.clone();
        let reader_handle = thread::Builder::new()
            .name("signaling-client-reader".into())
            .spawn(move || run_reader(reader, &tx, &reader_closed, reader_log.as_ref()))?;

        Ok((
            Self {
                principal: principal.to_owned(),
                connection_id,
                writer: Mutex::new(writer),
                control,
                closed,
                _reader: Some(reader_handle),
                log,
            },
            rx,
        ))
    }

    pub fn principal(&self) -> &str {
        &self.principal
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// # Errors
    /// `Disconnected` once the connection is known to be closed.
    pub fn send(&self, frame: &ClientFrame) -> Result<(), SignalingClientError> {
        if self.is_closed() {
            return Err(SignalingClientError::Disconnected);
        }
        let mut writer = lock(&self.writer);
        write_client_frame(&mut *writer, frame).map_err(|e| {
            self.closed.store(true, Ordering::SeqCst);
            SignalingClientError::from(e)
        })
    }

    /// # Errors
    /// See [`send`](Self::send).
    pub fn send_signal(&self, to: &str, envelope: WireEnvelope) -> Result<(), SignalingClientError> {
        self.send(&ClientFrame::Signal {
            to: to.to_owned(),
            envelope,
        })
    }

    /// # Errors
    /// See [`send`](Self::send).
    pub fn set_status(&self, status: PresenceStatus) -> Result<(), SignalingClientError> {
        self.send(&ClientFrame::SetStatus { status })
    }

    /// Say bye and close the socket. Idempotent.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        {
            let mut writer = lock(&self.writer);
            if let Err(e) = write_client_frame(&mut *writer, &ClientFrame::Bye) {
                sink_debug!(self.log, "signaling: bye not sent: {}", e);
            }
        }
        let _ = self.control.shutdown(Shutdown::Both);
    }
}

impl Drop for SignalingClient {
    fn drop(&mut self) {
        self.close();
    }
}

fn run_reader(
    mut reader: BufReader<TcpStream>,
    tx: &Sender<ServerFrame>,
    closed: &AtomicBool,
    log: &dyn LogSink,
) {
    loop {
        match read_server_frame(&mut reader, MAX_BODY_LEN) {
            Ok(frame) => {
                if tx.send(frame).is_err() {
                    break;
                }
            }
            Err(e) if e.is_fatal() => {
                if !closed.load(Ordering::SeqCst) {
                    sink_warn!(log, "signaling: connection lost: {}", e);
                }
                break;
            }
            Err(e) => {
                sink_warn!(log, "signaling: dropping malformed server frame: {}", e);
            }
        }
    }
    closed.store(true, Ordering::SeqCst);
}
