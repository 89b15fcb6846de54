//! Tests for the TCP peer transport over loopback.

use misere_games::{PeerEvent, PeerTransport, RetryPolicy, TcpPeer, UnsupportedPeer};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;

const WAIT: Duration = Duration::from_secs(5);

fn fast_retry() -> RetryPolicy {
    RetryPolicy::new(40, Duration::from_millis(25))
}

async fn next_event(events: &mut broadcast::Receiver<PeerEvent>) -> PeerEvent {
    tokio::time::timeout(WAIT, events.recv())
        .await
        .expect("Timed out waiting for peer event")
        .expect("Event channel closed")
}

async fn expect_connected(events: &mut broadcast::Receiver<PeerEvent>) {
    let event = next_event(events).await;
    assert!(matches!(event, PeerEvent::Connected(_)), "{}", event);
}

fn message(line: &str) -> PeerEvent {
    PeerEvent::Message(line.to_string())
}

async fn assert_quiet(events: &mut broadcast::Receiver<PeerEvent>) {
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(events.try_recv().unwrap_err(), TryRecvError::Empty);
}

async fn start_host(host: &TcpPeer) -> SocketAddr {
    host.start_hosting("host").await;
    let addr = host.listening_addr().await;
    addr.expect("Host should be listening")
}

/// Host and client linked over loopback, with their event receivers.
async fn linked_pair() -> (
    Arc<TcpPeer>,
    broadcast::Receiver<PeerEvent>,
    Arc<TcpPeer>,
    broadcast::Receiver<PeerEvent>,
) {
    let host = Arc::new(TcpPeer::new("127.0.0.1:0", fast_retry()));
    let client = Arc::new(TcpPeer::new("127.0.0.1:0", fast_retry()));
    let mut host_events = host.subscribe();
    let mut client_events = client.subscribe();

    let addr = start_host(&host).await;
    client.connect_to_peer(&addr.to_string()).await;

    expect_connected(&mut host_events).await;
    expect_connected(&mut client_events).await;
    (host, host_events, client, client_events)
}

#[tokio::test]
async fn test_lines_flow_both_ways() {
    let (host, mut host_events, client, mut client_events) = linked_pair().await;

    client.send("1,1").await;
    assert_eq!(next_event(&mut host_events).await, message("1,1"));

    // A trailing terminator is not doubled.
    host.send("0,2\n").await;
    assert_eq!(next_event(&mut client_events).await, message("0,2"));
}

#[tokio::test]
async fn test_stop_is_idempotent_and_peer_sees_close() {
    let (host, mut host_events, _client, mut client_events) = linked_pair().await;

    host.stop().await;
    assert_eq!(
        next_event(&mut host_events).await,
        PeerEvent::Disconnected("Stopped".to_string())
    );
    host.stop().await;
    assert_quiet(&mut host_events).await;

    assert!(matches!(
        next_event(&mut client_events).await,
        PeerEvent::Disconnected(_)
    ));
}

#[tokio::test]
async fn test_host_accepts_only_one_peer() {
    let (host, _host_events, _client, _client_events) = linked_pair().await;
    let addr = host.listening_addr().await.unwrap();
    assert!(TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn test_send_without_connection_is_silent() {
    let peer = TcpPeer::new("127.0.0.1:0", fast_retry());
    let mut events = peer.subscribe();
    peer.send("1,1").await;
    peer.stop().await;
    assert_quiet(&mut events).await;
}

#[tokio::test]
async fn test_multiline_payload_is_not_sent() {
    let (_host, mut host_events, client, _client_events) = linked_pair().await;
    client.send("1,1\n2,2").await;
    client.send("0,0").await;
    assert_eq!(next_event(&mut host_events).await, message("0,0"));
}

#[tokio::test]
async fn test_connect_gives_up_after_retries() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let retry = RetryPolicy::new(3, Duration::from_millis(10));
    let client = TcpPeer::new("127.0.0.1:0", retry);
    let mut events = client.subscribe();
    client.connect_to_peer(&addr.to_string()).await;

    match next_event(&mut events).await {
        PeerEvent::Error(message) => assert!(message.contains("after 3 attempts"), "{}", message),
        other => panic!("Expected Error, got {:?}", other),
    }

    // The link is free again.
    client.connect_to_peer(&addr.to_string()).await;
    assert!(matches!(next_event(&mut events).await, PeerEvent::Error(_)));
}

#[tokio::test]
async fn test_second_session_is_refused() {
    let host = TcpPeer::new("127.0.0.1:0", fast_retry());
    let mut events = host.subscribe();
    start_host(&host).await;
    host.start_hosting("again").await;
    match next_event(&mut events).await {
        PeerEvent::Error(message) => assert!(message.contains("already active")),
        other => panic!("Expected Error, got {:?}", other),
    }
    host.stop().await;
}

#[tokio::test]
async fn test_bind_failure_reports_error() {
    let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = taken.local_addr().unwrap();

    let host = TcpPeer::new(addr.to_string(), fast_retry());
    let mut events = host.subscribe();
    host.start_hosting("host").await;
    match next_event(&mut events).await {
        PeerEvent::Error(message) => assert!(message.starts_with("Host failed")),
        other => panic!("Expected Error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_raw_client_lines_are_split() {
    let host = TcpPeer::new("127.0.0.1:0", fast_retry());
    let mut events = host.subscribe();
    let addr = start_host(&host).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    expect_connected(&mut events).await;
    stream.write_all(b"0,0\n2,1\n").await.unwrap();
    assert_eq!(next_event(&mut events).await, message("0,0"));
    assert_eq!(next_event(&mut events).await, message("2,1"));

    host.send("1,2").await;
    let mut reader = BufReader::new(&mut stream);
    let mut line = String::new();
    reader.read_line(&mut line).await.unwrap();
    assert_eq!(line, "1,2\n");

    drop(reader);
    drop(stream);
    assert_eq!(
        next_event(&mut events).await,
        PeerEvent::Disconnected("Peer closed the connection".to_string())
    );
}

#[tokio::test]
async fn test_unsupported_transport_reports_error() {
    let peer = UnsupportedPeer::new("radio");
    let mut events = peer.subscribe();

    peer.start_hosting("host").await;
    match next_event(&mut events).await {
        PeerEvent::Error(message) => assert!(message.contains("not supported")),
        other => panic!("Expected Error, got {:?}", other),
    }
    peer.connect_to_peer("anywhere").await;
    assert!(matches!(next_event(&mut events).await, PeerEvent::Error(_)));

    peer.send("1,1").await;
    peer.stop().await;
    assert_quiet(&mut events).await;
}
