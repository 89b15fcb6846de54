//! Tests for the session coordinator.

use misere_games::{
    ConnectionState, PeerTransport, RetryPolicy, SessionCoordinator, SessionStatus, TcpPeer,
    UnsupportedPeer,
};
use misere_tictactoe::Position;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::broadcast;

const WAIT: Duration = Duration::from_secs(5);

fn tcp_peer() -> Arc<TcpPeer> {
    let retry = RetryPolicy::new(40, Duration::from_millis(25));
    Arc::new(TcpPeer::new("127.0.0.1:0", retry))
}

async fn wait_for_status<F>(coordinator: &SessionCoordinator, predicate: F) -> SessionStatus
where
    F: FnMut(&SessionStatus) -> bool,
{
    let mut status = coordinator.subscribe_status();
    tokio::time::timeout(WAIT, status.wait_for(predicate))
        .await
        .expect("Timed out waiting for status")
        .expect("Coordinator gone")
        .clone()
}

async fn next_move(moves: &mut broadcast::Receiver<Position>) -> Position {
    tokio::time::timeout(WAIT, moves.recv())
        .await
        .expect("Timed out waiting for move")
        .expect("Move channel closed")
}

async fn hosting() -> (SessionCoordinator, SocketAddr) {
    let peer = tcp_peer();
    let coordinator = SessionCoordinator::spawn(peer.clone() as Arc<dyn PeerTransport>);
    coordinator.host("alice").await;
    let addr = peer.listening_addr().await;
    let addr = addr.expect("Host should be listening");
    (coordinator, addr)
}

fn is_connected(status: &SessionStatus) -> bool {
    matches!(status.state(), ConnectionState::Connected(_))
}

fn is_disconnected(status: &SessionStatus) -> bool {
    matches!(status.state(), ConnectionState::Disconnected(_))
}

fn is_failed(status: &SessionStatus) -> bool {
    matches!(status.state(), ConnectionState::Failed(_))
}

#[tokio::test]
async fn test_starts_idle() {
    let coordinator = SessionCoordinator::spawn(tcp_peer());
    let status = coordinator.status();
    assert_eq!(*status.state(), ConnectionState::Idle);
    assert_eq!(status.text(), "Idle");
}

#[tokio::test]
async fn test_host_and_join_exchange_moves() {
    let (host, addr) = hosting().await;
    assert_eq!(*host.status().state(), ConnectionState::Listening);
    assert_eq!(host.status().text(), "Hosting as alice...");

    let guest = SessionCoordinator::spawn(tcp_peer());
    let mut host_moves = host.subscribe_moves();
    let mut guest_moves = guest.subscribe_moves();
    guest.connect(&addr.to_string()).await;

    let status = wait_for_status(&guest, is_connected).await;
    assert!(status.text().starts_with("Connected to "));
    wait_for_status(&host, is_connected).await;

    let center = Position::new(1, 1).unwrap();
    guest.send_move(center);
    assert_eq!(next_move(&mut host_moves).await, center);
    let received = |s: &SessionStatus| s.text() == "Received: 1,1";
    wait_for_status(&host, received).await;

    let corner = Position::new(2, 2).unwrap();
    host.send_move(corner);
    assert_eq!(next_move(&mut guest_moves).await, corner);
}

#[tokio::test]
async fn test_malformed_messages_are_dropped() {
    let (host, addr) = hosting().await;
    let mut moves = host.subscribe_moves();

    let mut stream = TcpStream::connect(addr).await.unwrap();
    wait_for_status(&host, is_connected).await;
    let garbage = b"hello\n9,9\n1,2,3\n 0 , 1 \n";
    stream.write_all(garbage).await.unwrap();

    assert_eq!(next_move(&mut moves).await, Position::new(0, 1).unwrap());
    let status = host.status();
    assert!(is_connected(&status));
}

#[tokio::test]
async fn test_peer_hangup_marks_disconnected() {
    let (host, addr) = hosting().await;
    let stream = TcpStream::connect(addr).await.unwrap();
    wait_for_status(&host, is_connected).await;
    drop(stream);

    let status = wait_for_status(&host, is_disconnected).await;
    assert_eq!(status.text(), "Disconnected: Peer closed the connection");
}

#[tokio::test]
async fn test_stop_returns_to_idle_and_stays_there() {
    let (host, addr) = hosting().await;
    let _stream = TcpStream::connect(addr).await.unwrap();
    wait_for_status(&host, is_connected).await;

    host.stop().await;
    assert_eq!(*host.status().state(), ConnectionState::Idle);
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(*host.status().state(), ConnectionState::Idle);

    // A fresh session can start after stopping.
    host.host("alice").await;
    assert_eq!(*host.status().state(), ConnectionState::Listening);
    host.stop().await;
}

#[tokio::test]
async fn test_host_while_busy_is_ignored() {
    let (host, _addr) = hosting().await;
    host.host("again").await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    let status = host.status();
    assert_eq!(*status.state(), ConnectionState::Listening);
    assert_eq!(status.text(), "Hosting as alice...");
}

#[tokio::test]
async fn test_connect_failure_marks_failed() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let retry = RetryPolicy::new(2, Duration::from_millis(10));
    let peer = Arc::new(TcpPeer::new("127.0.0.1:0", retry));
    let coordinator = SessionCoordinator::spawn(peer);
    coordinator.connect(&addr.to_string()).await;
    let status = wait_for_status(&coordinator, is_failed).await;
    assert!(status.text().starts_with("Error: Client error"));
}

#[tokio::test]
async fn test_unsupported_transport_fails() {
    let coordinator = SessionCoordinator::spawn(Arc::new(UnsupportedPeer::new("radio")));
    coordinator.host("alice").await;
    let status = wait_for_status(&coordinator, is_failed).await;
    assert_eq!(status.text(), "Error: Hosting is not supported for radio");
}
