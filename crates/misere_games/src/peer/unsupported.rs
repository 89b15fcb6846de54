//! Stand-in for a medium this build cannot drive.

use super::{PeerEvent, PeerLink, PeerTransport};
use tokio::sync::broadcast;
use tracing::{debug, instrument, warn};

/// Transport that reports every host/connect attempt as unsupported.
#[derive(Debug)]
pub struct UnsupportedPeer {
    medium: String,
    link: PeerLink,
}

impl UnsupportedPeer {
    /// Creates a stub for the named medium.
    pub fn new(medium: impl Into<String>) -> Self {
        Self {
            medium: medium.into(),
            link: PeerLink::new(),
        }
    }

    fn unsupported(&self, operation: &str) {
        warn!(medium = %self.medium, operation, "Transport not supported");
        self.link.emit(PeerEvent::Error(format!(
            "{} is not supported for {}",
            operation, self.medium
        )));
    }
}

#[async_trait::async_trait]
impl PeerTransport for UnsupportedPeer {
    #[instrument(skip(self))]
    async fn start_hosting(&self, display_name: &str) {
        self.unsupported("Hosting");
    }

    #[instrument(skip(self))]
    async fn connect_to_peer(&self, target: &str) {
        self.unsupported("Connecting");
    }

    async fn send(&self, line: &str) {
        debug!(line, "Send on unsupported transport ignored");
    }

    async fn stop(&self) {
        debug!("Stop on unsupported transport ignored");
    }

    fn subscribe(&self) -> broadcast::Receiver<PeerEvent> {
        self.link.subscribe()
    }
}
