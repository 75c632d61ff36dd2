//! Integration tests for the room session runtime.
//!
//! These run the real event loop against in-process servers: a WebSocket
//! echo server standing in for the room channel and a minimal HTTP
//! responder standing in for the directory and playback provider.

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use auxroom_client::{ClientConfig, DirectoryError, RoomSession};
use auxroom_core::{ConnectionStatus, MessageOrigin, RoomIdentity, SessionConfig};
use futures_util::{SinkExt, StreamExt};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
    time::timeout,
};
use tokio_tungstenite::tungstenite::Message;

const WAIT: Duration = Duration::from_secs(5);

fn identity() -> RoomIdentity {
    RoomIdentity { id: "r1".into(), name: "late night".into(), host_name: "dj".into() }
}

/// Short reconnect delays so failure paths resolve within the test timeout.
fn fast_session_config() -> SessionConfig {
    SessionConfig {
        reconnect_base_delay: Duration::from_millis(20),
        reconnect_max_delay: Duration::from_millis(100),
        ..SessionConfig::default()
    }
}

fn config(ws_port: u16, http_port: u16) -> ClientConfig {
    let http_base = format!("http://127.0.0.1:{http_port}/").parse().unwrap();
    let ws_base = format!("ws://127.0.0.1:{ws_port}/").parse().unwrap();
    ClientConfig { http_base, ws_base, session: fast_session_config() }
}

/// WebSocket server that echoes every text frame back on the same
/// connection, like the room channel broadcasting to a room of one.
///
/// With `drop_first`, the first connection is dropped before the handshake
/// to exercise the reconnect path.
async fn spawn_echo_server(drop_first: bool) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        let mut first = true;
        loop {
            let Ok((stream, _)) = listener.accept().await else { break };
            if drop_first && first {
                first = false;
                drop(stream);
                continue;
            }
            tokio::spawn(async move {
                let Ok(mut socket) = tokio_tungstenite::accept_async(stream).await else {
                    return;
                };
                while let Some(Ok(message)) = socket.next().await {
                    if let Message::Text(text) = message {
                        if socket.send(Message::Text(text)).await.is_err() {
                            break;
                        }
                    }
                }
            });
        }
    });

    port
}

/// Minimal HTTP server answering every request with the same response.
async fn spawn_http_server(status_line: &'static str, body: &'static str) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else { break };
            tokio::spawn(async move {
                // Drain the request head; GETs carry no body.
                let mut buffer = [0u8; 4096];
                let mut head = Vec::new();
                loop {
                    let Ok(n) = stream.read(&mut buffer).await else { return };
                    if n == 0 {
                        return;
                    }
                    head.extend_from_slice(&buffer[..n]);
                    if head.windows(4).any(|w| w == b"\r\n\r\n") {
                        break;
                    }
                }
                let response = format!(
                    "{status_line}\r\ncontent-type: application/json\r\n\
                     content-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes()).await;
            });
        }
    });

    port
}

/// Playback responder that holds every reply open for `delay`, tracking how
/// many requests it is serving at once and how many it has served in total.
async fn spawn_slow_playback_server(
    delay: Duration,
) -> (u16, Arc<AtomicUsize>, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let total = Arc::new(AtomicUsize::new(0));

    let served = Arc::clone(&in_flight);
    let peak_seen = Arc::clone(&peak);
    let count = Arc::clone(&total);
    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else { break };
            let in_flight = Arc::clone(&served);
            let peak = Arc::clone(&peak_seen);
            let total = Arc::clone(&count);
            tokio::spawn(async move {
                let mut buffer = [0u8; 4096];
                let Ok(n) = stream.read(&mut buffer).await else { return };
                if n == 0 {
                    return;
                }
                total.fetch_add(1, Ordering::SeqCst);
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);

                tokio::time::sleep(delay).await;

                let body = "{}";
                let response = format!(
                    "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\n\
                     content-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes()).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
            });
        }
    });

    (port, peak, total)
}

/// Port with nothing listening, for endpoints a test wants to stay dark.
async fn dead_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

#[tokio::test]
async fn session_reaches_connected() {
    let ws_port = spawn_echo_server(false).await;
    let http_port = dead_port().await;

    let session =
        RoomSession::open_with_identity(config(ws_port, http_port), identity(), "guest").unwrap();
    let mut states = session.subscribe();

    let state = timeout(WAIT, states.wait_for(|s| s.connection == ConnectionStatus::Connected))
        .await
        .unwrap()
        .unwrap()
        .clone();
    assert_eq!(state.identity, identity());
    assert!(state.messages.is_empty());

    session.close().await;
}

#[tokio::test]
async fn sent_message_echoes_locally_then_remotely() {
    let ws_port = spawn_echo_server(false).await;
    let http_port = dead_port().await;

    let session =
        RoomSession::open_with_identity(config(ws_port, http_port), identity(), "guest").unwrap();
    let mut states = session.subscribe();
    timeout(WAIT, states.wait_for(|s| s.connection == ConnectionStatus::Connected))
        .await
        .unwrap()
        .unwrap();

    session.send_chat("hello").await.unwrap();

    // Local echo is immediate; the server's broadcast arrives as a second,
    // duplicate-looking entry. Both stay.
    let state =
        timeout(WAIT, states.wait_for(|s| s.messages.len() == 2)).await.unwrap().unwrap().clone();
    assert_eq!(state.messages[0].origin, MessageOrigin::Local);
    assert_eq!(state.messages[1].origin, MessageOrigin::Remote);
    assert_eq!(state.messages[0].text, "hello");
    assert_eq!(state.messages[1].text, "hello");
    assert_eq!(state.messages[0].sequence, 0);
    assert_eq!(state.messages[1].sequence, 1);
    assert_eq!(state.messages[0].sender, "guest");

    session.close().await;
}

#[tokio::test]
async fn blank_message_is_rejected() {
    let ws_port = spawn_echo_server(false).await;
    let http_port = dead_port().await;

    let session =
        RoomSession::open_with_identity(config(ws_port, http_port), identity(), "guest").unwrap();
    let mut states = session.subscribe();
    timeout(WAIT, states.wait_for(|s| s.connection == ConnectionStatus::Connected))
        .await
        .unwrap()
        .unwrap();

    let result = session.send_chat("   ").await;
    assert_eq!(result, Err(auxroom_core::SendError::EmptyText));

    session.close().await;
}

#[tokio::test]
async fn send_while_disconnected_fails_without_queueing() {
    let ws_port = dead_port().await;
    let http_port = dead_port().await;

    let session =
        RoomSession::open_with_identity(config(ws_port, http_port), identity(), "guest").unwrap();

    // The channel never comes up, so the send must fail rather than queue.
    let result = session.send_chat("hello").await;
    assert_eq!(result, Err(auxroom_core::SendError::NotConnected));

    let state = session.state();
    assert!(state.messages.is_empty());
    assert_ne!(state.connection, ConnectionStatus::Connected);

    session.close().await;
}

#[tokio::test]
async fn dropped_connection_reconnects() {
    let ws_port = spawn_echo_server(true).await;
    let http_port = dead_port().await;

    let session =
        RoomSession::open_with_identity(config(ws_port, http_port), identity(), "guest").unwrap();
    let mut states = session.subscribe();

    timeout(WAIT, states.wait_for(|s| matches!(s.connection, ConnectionStatus::Reconnecting(_))))
        .await
        .unwrap()
        .unwrap();
    timeout(WAIT, states.wait_for(|s| s.connection == ConnectionStatus::Connected))
        .await
        .unwrap()
        .unwrap();

    session.close().await;
}

#[tokio::test]
async fn close_publishes_disconnected_then_nothing() {
    let ws_port = spawn_echo_server(false).await;
    let http_port = dead_port().await;

    let session =
        RoomSession::open_with_identity(config(ws_port, http_port), identity(), "guest").unwrap();
    let mut states = session.subscribe();
    timeout(WAIT, states.wait_for(|s| s.connection == ConnectionStatus::Connected))
        .await
        .unwrap()
        .unwrap();

    session.close().await;

    let state = states.borrow_and_update().clone();
    assert_eq!(state.connection, ConnectionStatus::Disconnected);
    // The task is gone; no further updates can ever arrive.
    assert!(states.changed().await.is_err());
}

#[tokio::test]
async fn playback_poll_populates_view() {
    let ws_port = spawn_echo_server(false).await;
    let http_port = spawn_http_server(
        "HTTP/1.1 200 OK",
        r#"{"is_playing":true,"track_name":"Midnight City","artists":"M83","progress_ms":10000,"duration_ms":200000}"#,
    )
    .await;

    let session =
        RoomSession::open_with_identity(config(ws_port, http_port), identity(), "guest").unwrap();
    let mut states = session.subscribe();

    let state =
        timeout(WAIT, states.wait_for(|s| s.playback.is_some())).await.unwrap().unwrap().clone();
    let playback = state.playback.unwrap();
    assert!(playback.is_playing);
    assert_eq!(playback.track_name.as_deref(), Some("Midnight City"));
    assert_eq!(playback.duration_ms, Some(200_000));
    assert!(playback.progress_ms >= 10_000);
    assert!(!state.playback_stale);

    session.close().await;
}

#[tokio::test]
async fn overlapping_polls_are_skipped() {
    let ws_port = spawn_echo_server(false).await;
    let (http_port, peak, total) =
        spawn_slow_playback_server(Duration::from_millis(200)).await;

    // Each response is held open for several poll intervals; the ticks that
    // fire mid-fetch must be skipped, never stacked into a second request.
    let mut config = config(ws_port, http_port);
    config.session.poll_interval = Duration::from_millis(40);

    let session = RoomSession::open_with_identity(config, identity(), "guest").unwrap();

    let deadline = tokio::time::Instant::now() + WAIT;
    while total.load(Ordering::SeqCst) < 3 {
        assert!(tokio::time::Instant::now() < deadline, "expected at least 3 polls");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(peak.load(Ordering::SeqCst), 1, "polls overlapped");

    session.close().await;
}

#[tokio::test]
async fn missing_room_is_a_distinct_error() {
    let http_port = spawn_http_server("HTTP/1.1 404 Not Found", "").await;
    let ws_port = dead_port().await;

    let result = RoomSession::open(config(ws_port, http_port), "nope", "guest").await;
    match result {
        Err(DirectoryError::RoomNotFound { room_id }) => assert_eq!(room_id, "nope"),
        Err(other) => panic!("expected RoomNotFound, got {other:?}"),
        Ok(_) => panic!("expected RoomNotFound, got a session"),
    }
}

#[tokio::test]
async fn open_resolves_room_from_directory() {
    let http_port = spawn_http_server(
        "HTTP/1.1 200 OK",
        r#"{"id":"r1","name":"late night","host_name":"dj"}"#,
    )
    .await;
    let ws_port = spawn_echo_server(false).await;

    let session = RoomSession::open(config(ws_port, http_port), "r1", "guest").await.unwrap();
    let state = session.state();
    assert_eq!(state.identity.name, "late night");
    assert_eq!(state.identity.host_name, "dj");

    session.close().await;
}
