//! Peer transport: a line-oriented byte stream to one remote device.
//!
//! Every backing exposes the same [`PeerTransport`] capability set and
//! reports progress only through [`PeerEvent`]s; I/O failures never
//! surface as `Err` to callers.

mod link;
mod tcp;
mod unsupported;

pub use link::{MAX_LINE_BYTES, PeerLink, WRITE_TIMEOUT};
pub use tcp::{RetryPolicy, TcpPeer};
pub use unsupported::UnsupportedPeer;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::instrument;

/// Something that happened on a peer link.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum PeerEvent {
    /// A stream to the peer is open; carries the peer's label.
    #[display("Connected({})", _0)]
    Connected(String),
    /// The stream ended.
    #[display("Disconnected({})", _0)]
    Disconnected(String),
    /// One line received from the peer, without its terminator.
    #[display("Message({})", _0)]
    Message(String),
    /// Hosting, connecting or writing failed.
    #[display("Error({})", _0)]
    Error(String),
}

/// Capability set shared by all transport backings.
#[async_trait::async_trait]
pub trait PeerTransport: Send + Sync + std::fmt::Debug {
    /// Starts waiting for exactly one inbound peer. Returns once listening
    /// has begun; the accept and the read loop run on a worker task.
    async fn start_hosting(&self, display_name: &str);

    /// Starts reaching out to `target`. Returns immediately; attempts run on
    /// a worker task.
    async fn connect_to_peer(&self, target: &str);

    /// Writes one line to the peer.
    async fn send(&self, line: &str);

    /// Closes everything. Idempotent.
    async fn stop(&self);

    /// Receives every event emitted from now on.
    fn subscribe(&self) -> broadcast::Receiver<PeerEvent>;
}

/// Which transport backing to build.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TransportKind {
    /// TCP socket (loopback or LAN).
    #[default]
    Tcp,
    /// Placeholder for a medium this build cannot drive.
    Unsupported,
}

/// Builds the configured transport.
#[instrument]
pub fn build_transport(
    kind: TransportKind,
    bind_addr: &str,
    retry: RetryPolicy,
) -> Arc<dyn PeerTransport> {
    match kind {
        TransportKind::Tcp => Arc::new(TcpPeer::new(bind_addr, retry)),
        TransportKind::Unsupported => Arc::new(UnsupportedPeer::new("short-range radio")),
    }
}
