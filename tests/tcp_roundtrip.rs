#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::io::Read;
use std::net::{SocketAddr, TcpStream};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use rustycall::log::NoopLogSink;
use rustycall::presence::PresenceStatus;
use rustycall::signaling::ServerSettings;
use rustycall::signaling::protocol::{
    ClientFrame, FailureReason, ServerFrame, SignalKind, WireEnvelope, write_client_frame,
};
use rustycall::signaling::run::build_server;
use rustycall::signaling_client::SignalingClient;

const WAIT: Duration = Duration::from_secs(5);

fn temp_sessions_path() -> PathBuf {
    std::env::temp_dir().join(format!(
        "rustycall-test-{:016x}.jsonl",
        rand::random::<u64>()
    ))
}

fn start_server() -> (SocketAddr, PathBuf) {
    let sessions_path = temp_sessions_path();
    let settings = ServerSettings {
        bind_addr: "127.0.0.1:0".into(),
        sessions_path: sessions_path.clone(),
        ..ServerSettings::default()
    };
    let server = build_server(&settings, Arc::new(NoopLogSink)).expect("server builds");
    let addr = server.local_addr().unwrap();
    thread::spawn(move || {
        let _ = server.run();
    });
    (addr, sessions_path)
}

/// Next frame that is not a presence notice.
fn next_non_presence(rx: &Receiver<ServerFrame>) -> ServerFrame {
    loop {
        match rx.recv_timeout(WAIT).expect("frame within timeout") {
            ServerFrame::Presence { .. } => continue,
            other => return other,
        }
    }
}

fn wait_for_presence(rx: &Receiver<ServerFrame>, who: &str, want: PresenceStatus) {
    loop {
        if let ServerFrame::Presence { principal, status } =
            rx.recv_timeout(WAIT).expect("presence within timeout")
        {
            if principal == who && status == want {
                return;
            }
        }
    }
}

#[test]
fn two_clients_exchange_signals_over_tcp() {
    let (addr, sessions_path) = start_server();

    let (alice, alice_rx) = SignalingClient::connect(addr, "alice", Arc::new(NoopLogSink)).unwrap();
    let (bob, bob_rx) = SignalingClient::connect(addr, "bob", Arc::new(NoopLogSink)).unwrap();
    assert_ne!(alice.connection_id(), bob.connection_id());

    wait_for_presence(&alice_rx, "bob", PresenceStatus::Online);

    let offer = WireEnvelope::new(SignalKind::Offer, "call-tcp", "v=0");
    alice.send_signal("bob", offer.clone()).unwrap();
    match next_non_presence(&bob_rx) {
        ServerFrame::Signal { from, envelope } => {
            assert_eq!(from, "alice");
            assert_eq!(envelope, offer);
        }
        other => panic!("unexpected frame {other:?}"),
    }

    let answer = WireEnvelope::new(SignalKind::Answer, "call-tcp", "");
    bob.send_signal("alice", answer.clone()).unwrap();
    match next_non_presence(&alice_rx) {
        ServerFrame::Signal { from, envelope } => {
            assert_eq!(from, "bob");
            assert_eq!(envelope, answer);
        }
        other => panic!("unexpected frame {other:?}"),
    }

    bob.set_status(PresenceStatus::Busy).unwrap();
    wait_for_presence(&alice_rx, "bob", PresenceStatus::Busy);

    bob.close();
    assert!(bob.is_closed());
    wait_for_presence(&alice_rx, "bob", PresenceStatus::Offline);

    alice.close();
    let _ = std::fs::remove_file(sessions_path);
}

#[test]
fn offer_to_unknown_principal_reports_delivery_failure() {
    let (addr, sessions_path) = start_server();
    let (alice, alice_rx) = SignalingClient::connect(addr, "alice", Arc::new(NoopLogSink)).unwrap();

    alice
        .send_signal(
            "nobody",
            WireEnvelope::new(SignalKind::Offer, "call-void", "v=0"),
        )
        .unwrap();

    assert_eq!(
        next_non_presence(&alice_rx),
        ServerFrame::DeliveryFailed {
            call_id: "call-void".into(),
            reason: FailureReason::PeerOffline,
        }
    );

    alice.close();
    let _ = std::fs::remove_file(sessions_path);
}

#[test]
fn hello_name_is_trimmed() {
    let (addr, sessions_path) = start_server();
    let (alice, _alice_rx) = SignalingClient::connect(addr, "alice", Arc::new(NoopLogSink)).unwrap();
    let (_bob, bob_rx) = SignalingClient::connect(addr, "  bob ", Arc::new(NoopLogSink)).unwrap();

    let offer = WireEnvelope::new(SignalKind::Offer, "call-trim", "v=0");
    alice.send_signal("bob", offer.clone()).unwrap();
    match next_non_presence(&bob_rx) {
        ServerFrame::Signal { from, envelope } => {
            assert_eq!(from, "alice");
            assert_eq!(envelope, offer);
        }
        other => panic!("unexpected frame {other:?}"),
    }

    let _ = std::fs::remove_file(sessions_path);
}

#[test]
fn reconnect_closes_the_superseded_connection() {
    let (addr, sessions_path) = start_server();
    let (old, old_rx) = SignalingClient::connect(addr, "bob", Arc::new(NoopLogSink)).unwrap();
    let (new, _new_rx) = SignalingClient::connect(addr, "bob", Arc::new(NoopLogSink)).unwrap();
    assert_ne!(old.connection_id(), new.connection_id());

    loop {
        match old_rx.recv_timeout(WAIT) {
            Ok(_) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => panic!("superseded connection left open"),
        }
    }
    assert!(old.is_closed());
    assert!(!new.is_closed());

    let _ = std::fs::remove_file(sessions_path);
}

#[test]
fn connection_that_skips_hello_is_closed() {
    let (addr, sessions_path) = start_server();

    let mut raw = TcpStream::connect(addr).unwrap();
    raw.set_read_timeout(Some(WAIT)).unwrap();
    write_client_frame(
        &mut raw,
        &ClientFrame::SetStatus {
            status: PresenceStatus::Away,
        },
    )
    .unwrap();

    let mut buf = [0u8; 16];
    let n = raw.read(&mut buf).unwrap_or(0);
    assert_eq!(n, 0, "server must close without writing");

    let _ = std::fs::remove_file(sessions_path);
}
