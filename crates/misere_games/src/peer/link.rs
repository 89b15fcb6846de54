//! Medium-independent half of a peer transport.
//!
//! A [`PeerLink`] owns the write half of the active stream, the worker task
//! doing blocking accept/connect/read, and the event broadcast. Each
//! host/connect claims a new generation; teardown happens once per
//! generation no matter whether the read loop, a failed write, or
//! [`PeerLink::stop`] gets there first.

use super::PeerEvent;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader, ReadHalf,
};
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Buffered events per subscriber before it starts lagging.
const EVENT_CAPACITY: usize = 64;

/// Default upper bound on a single line write.
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Longest line accepted from a peer, terminator excluded.
pub const MAX_LINE_BYTES: usize = 64;

type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Shared link state; cheap to clone.
#[derive(Clone)]
pub struct PeerLink {
    shared: Arc<Shared>,
}

struct Shared {
    events: broadcast::Sender<PeerEvent>,
    state: Mutex<LinkState>,
    write_timeout: Duration,
}

#[derive(Default)]
struct LinkState {
    generation: u64,
    active: bool,
    writer: Option<BoxedWriter>,
    worker: Option<JoinHandle<()>>,
}

impl LinkState {
    fn is_current(&self, generation: u64) -> bool {
        self.active && self.generation == generation
    }
}

impl std::fmt::Debug for PeerLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeerLink")
            .field("subscribers", &self.shared.events.receiver_count())
            .finish_non_exhaustive()
    }
}

impl Default for PeerLink {
    fn default() -> Self {
        Self::new()
    }
}

impl PeerLink {
    /// Creates an idle link.
    pub fn new() -> Self {
        Self::with_write_timeout(WRITE_TIMEOUT)
    }

    /// Creates an idle link whose writes give up after `write_timeout`.
    pub fn with_write_timeout(write_timeout: Duration) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                events,
                state: Mutex::new(LinkState::default()),
                write_timeout,
            }),
        }
    }

    /// Receives every event emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<PeerEvent> {
        self.shared.events.subscribe()
    }

    /// Broadcasts an event. Having no subscribers is not an error.
    pub fn emit(&self, event: PeerEvent) {
        debug!(%event, "Peer event");
        let _ = self.shared.events.send(event);
    }

    /// Claims the link for a new session and returns its generation, or
    /// `None` if a session is already running.
    #[instrument(skip(self))]
    pub async fn begin(&self) -> Option<u64> {
        let mut state = self.shared.state.lock().await;
        if state.active {
            warn!(
                generation = state.generation,
                "Link already has an active session"
            );
            return None;
        }
        state.generation += 1;
        state.active = true;
        debug!(generation = state.generation, "Session claimed");
        Some(state.generation)
    }

    /// Runs `worker` on its own task, owned by `generation`.
    ///
    /// If the session ended before the task could be registered, the task is
    /// aborted straight away.
    pub async fn spawn_worker<F>(&self, generation: u64, worker: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(worker);
        let mut state = self.shared.state.lock().await;
        if state.is_current(generation) {
            state.worker = Some(handle);
        } else {
            debug!(generation, "Session ended before worker registered");
            handle.abort();
        }
    }

    /// Installs a freshly opened stream: keeps the write half, emits
    /// `Connected(label)` and hands back the read half.
    ///
    /// Returns `None` if the session was stopped in the meantime.
    #[instrument(skip(self, stream))]
    pub async fn attach<S>(
        &self,
        generation: u64,
        stream: S,
        label: String,
    ) -> Option<ReadHalf<S>>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (reader, writer) = tokio::io::split(stream);
        let mut state = self.shared.state.lock().await;
        if !state.is_current(generation) {
            debug!("Stream arrived after stop; dropping it");
            return None;
        }
        state.writer = Some(Box::new(writer));
        info!(peer = %label, "Peer connected");
        self.emit(PeerEvent::Connected(label));
        Some(reader)
    }

    /// Emits one `Message` per line until the stream ends, then tears the
    /// session down with a `Disconnected` event.
    ///
    /// A line longer than [`MAX_LINE_BYTES`] ends the session as well.
    #[instrument(skip(self, reader))]
    pub async fn run_reader<R>(&self, generation: u64, reader: R)
    where
        R: AsyncRead + Unpin,
    {
        let mut reader = BufReader::new(reader);
        // Room for the longest line plus a CRLF terminator.
        let limit = MAX_LINE_BYTES + 2;
        let mut buf = Vec::with_capacity(limit);
        let reason = loop {
            buf.clear();
            let read = (&mut reader)
                .take(limit as u64)
                .read_until(b'\n', &mut buf)
                .await;
            match read {
                Ok(0) => break "Peer closed the connection".to_string(),
                Ok(_) => {
                    if buf.last() == Some(&b'\n') {
                        buf.pop();
                        if buf.last() == Some(&b'\r') {
                            buf.pop();
                        }
                    }
                    if buf.len() > MAX_LINE_BYTES {
                        warn!(limit = MAX_LINE_BYTES, "Peer sent an oversized line");
                        break format!("Line exceeds {} bytes", MAX_LINE_BYTES);
                    }
                    let line = String::from_utf8_lossy(&buf).into_owned();
                    let state = self.shared.state.lock().await;
                    if !state.is_current(generation) {
                        return;
                    }
                    self.emit(PeerEvent::Message(line));
                }
                Err(e) => break format!("Read loop ended: {}", e),
            }
        };
        let event = PeerEvent::Disconnected(reason);
        self.release(generation, event, Caller::Worker).await;
    }

    /// Ends a session that could not be established.
    #[instrument(skip(self))]
    pub async fn fail(&self, generation: u64, message: String) {
        let event = PeerEvent::Error(message);
        self.release(generation, event, Caller::Worker).await;
    }

    /// Writes `line` plus a newline to the connected peer.
    ///
    /// Not being connected is a logged no-op. A failed or stalled write
    /// emits `Error` and ends the session.
    #[instrument(skip(self))]
    pub async fn send(&self, line: &str) {
        let payload = line.trim_end_matches(['\r', '\n']);
        if payload.contains('\n') {
            warn!("Refusing to send a payload that spans multiple lines");
            return;
        }

        let mut framed = String::with_capacity(payload.len() + 1);
        framed.push_str(payload);
        framed.push('\n');

        let mut state = self.shared.state.lock().await;
        let generation = state.generation;
        let Some(writer) = state.writer.as_mut() else {
            debug!("Not connected; dropping outgoing line");
            return;
        };

        let result = tokio::time::timeout(self.shared.write_timeout, async {
            writer.write_all(framed.as_bytes()).await?;
            writer.flush().await
        })
        .await;

        let failure = match result {
            Ok(Ok(())) => {
                debug!("Line sent");
                return;
            }
            Ok(Err(e)) => format!("Send failed: {}", e),
            Err(_) => "Send failed: timed out".to_string(),
        };
        drop(state);
        warn!(%failure, "Write to peer failed");
        let event = PeerEvent::Error(failure);
        self.release(generation, event, Caller::Other).await;
    }

    /// Closes the stream, cancels the worker and emits `Disconnected`.
    ///
    /// Does nothing when no session is running.
    #[instrument(skip(self))]
    pub async fn stop(&self) {
        let mut state = self.shared.state.lock().await;
        if !state.active {
            debug!("Stop on idle link");
            return;
        }
        state.active = false;
        if let Some(worker) = state.worker.take() {
            worker.abort();
        }
        let writer = state.writer.take();
        info!(generation = state.generation, "Link stopped");
        self.emit(PeerEvent::Disconnected("Stopped".to_string()));
        drop(state);

        self.close(writer).await;
    }

    /// Tears down `generation` once, emitting `event`. Later calls for the
    /// same generation are ignored.
    async fn release(&self, generation: u64, event: PeerEvent, caller: Caller) {
        let mut state = self.shared.state.lock().await;
        if !state.is_current(generation) {
            debug!(generation, "Session already released");
            return;
        }
        state.active = false;
        if let Some(worker) = state.worker.take() {
            match caller {
                // Aborting would cancel the teardown in progress.
                Caller::Worker => drop(worker),
                Caller::Other => worker.abort(),
            }
        }
        let writer = state.writer.take();
        info!(generation, %event, "Session ended");
        self.emit(event);
        drop(state);

        self.close(writer).await;
    }

    /// Shuts the write half down, giving up after the write timeout.
    async fn close(&self, writer: Option<BoxedWriter>) {
        let Some(mut writer) = writer else {
            return;
        };
        let deadline = self.shared.write_timeout;
        let shutdown = tokio::time::timeout(deadline, writer.shutdown());
        if shutdown.await.is_err() {
            debug!("Shutdown of write half timed out");
        }
    }
}

/// Who is tearing a session down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Caller {
    /// The session's own worker task.
    Worker,
    /// Anyone else, e.g. a failed send.
    Other,
}
