//! TCP backing: one host accepts exactly one client.

use super::{PeerEvent, PeerLink, PeerTransport};
use derive_getters::Getters;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, broadcast};
use tracing::{Instrument, debug, info, info_span, instrument, warn};

/// How persistently a client retries before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Getters, derive_new::new)]
pub struct RetryPolicy {
    /// Total connection attempts.
    attempts: u32,
    /// Pause between attempts.
    delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 30,
            delay: Duration::from_millis(300),
        }
    }
}

/// Peer transport over a TCP socket.
#[derive(Debug)]
pub struct TcpPeer {
    link: PeerLink,
    bind_addr: String,
    retry: RetryPolicy,
    listening: Mutex<Option<SocketAddr>>,
}

impl TcpPeer {
    /// Creates an idle peer that hosts on `bind_addr` (port 0 picks a free one).
    pub fn new(bind_addr: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            link: PeerLink::new(),
            bind_addr: bind_addr.into(),
            retry,
            listening: Mutex::new(None),
        }
    }

    /// Address of the most recent listening socket.
    pub async fn listening_addr(&self) -> Option<SocketAddr> {
        *self.listening.lock().await
    }

    async fn claim(&self) -> Option<u64> {
        let generation = self.link.begin().await;
        if generation.is_none() {
            let reason = "A peer session is already active".to_string();
            self.link.emit(PeerEvent::Error(reason));
        }
        generation
    }
}

#[async_trait::async_trait]
impl PeerTransport for TcpPeer {
    #[instrument(skip(self), fields(bind = %self.bind_addr))]
    async fn start_hosting(&self, display_name: &str) {
        let Some(generation) = self.claim().await else {
            return;
        };

        let listener = match TcpListener::bind(self.bind_addr.as_str()).await {
            Ok(listener) => listener,
            Err(e) => {
                warn!(error = %e, "Bind failed");
                let reason = format!("Host failed: {}", e);
                self.link.fail(generation, reason).await;
                return;
            }
        };
        let local = listener.local_addr().ok();
        *self.listening.lock().await = local;
        info!(?local, display_name, "Hosting; waiting for one peer");

        let link = self.link.clone();
        let worker = async move {
            match listener.accept().await {
                Ok((stream, remote)) => {
                    // Exactly one peer per session.
                    drop(listener);
                    let _ = stream.set_nodelay(true);
                    let label = remote.to_string();
                    if let Some(reader) = link.attach(generation, stream, label).await {
                        link.run_reader(generation, reader).await;
                    }
                }
                Err(e) => {
                    let reason = format!("Host failed: {}", e);
                    link.fail(generation, reason).await;
                }
            }
        };
        let worker = worker.instrument(info_span!("host_worker", generation));
        self.link.spawn_worker(generation, worker).await;
    }

    #[instrument(skip(self))]
    async fn connect_to_peer(&self, target: &str) {
        let Some(generation) = self.claim().await else {
            return;
        };

        let link = self.link.clone();
        let retry = self.retry;
        let target = target.to_string();
        let worker = async move {
            for attempt in 1..=*retry.attempts() {
                match TcpStream::connect(target.as_str()).await {
                    Ok(stream) => {
                        info!(attempt, "Connected to host");
                        let _ = stream.set_nodelay(true);
                        let label = stream
                            .peer_addr()
                            .map(|addr| addr.to_string())
                            .unwrap_or_else(|_| target.clone());
                        if let Some(reader) = link.attach(generation, stream, label).await {
                            link.run_reader(generation, reader).await;
                        }
                        return;
                    }
                    Err(e) => {
                        debug!(attempt, error = %e, "Connect attempt failed");
                        if attempt < *retry.attempts() {
                            tokio::time::sleep(*retry.delay()).await;
                        }
                    }
                }
            }
            let reason = format!(
                "Client error: failed to connect to {} after {} attempts",
                target,
                retry.attempts()
            );
            link.fail(generation, reason).await;
        };
        let worker = worker.instrument(info_span!("connect_worker", generation));
        self.link.spawn_worker(generation, worker).await;
    }

    async fn send(&self, line: &str) {
        self.link.send(line).await;
    }

    #[instrument(skip(self))]
    async fn stop(&self) {
        self.link.stop().await;
    }

    fn subscribe(&self) -> broadcast::Receiver<PeerEvent> {
        self.link.subscribe()
    }
}
