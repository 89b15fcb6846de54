//! Session coordinator: ties one peer transport to the game.
//!
//! The coordinator runs as a task that owns the transport. Host, connect,
//! send and stop requests arrive over a command channel and are applied in
//! order with the transport's events, so a status update from an old
//! session can never overwrite a newer one.

use crate::peer::{PeerEvent, PeerTransport};
use crate::protocol::{decode_move, encode_move};
use derive_getters::Getters;
use misere_tictactoe::Position;
use std::sync::Arc;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::{debug, info, instrument, warn};

/// Buffered remote moves per subscriber.
const MOVE_CAPACITY: usize = 16;

/// Connection lifecycle as seen by the UI.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum ConnectionState {
    /// No session.
    #[display("Idle")]
    Idle,
    /// Hosting, waiting for a peer.
    #[display("Listening")]
    Listening,
    /// Reaching out to a host.
    #[display("Connecting")]
    Connecting,
    /// Linked to the named peer.
    #[display("Connected({})", _0)]
    Connected(String),
    /// Link ended.
    #[display("Disconnected({})", _0)]
    Disconnected(String),
    /// Hosting, connecting or writing failed.
    #[display("Failed({})", _0)]
    Failed(String),
}

impl ConnectionState {
    /// True while a host/connect session holds the transport.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            Self::Listening | Self::Connecting | Self::Connected(_)
        )
    }
}

/// Current connection state plus a human-readable status line.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct SessionStatus {
    state: ConnectionState,
    text: String,
}

impl SessionStatus {
    fn new(state: ConnectionState, text: impl Into<String>) -> Self {
        Self {
            state,
            text: text.into(),
        }
    }

    fn idle() -> Self {
        Self::new(ConnectionState::Idle, "Idle")
    }
}

enum Command {
    Host {
        display_name: String,
        done: oneshot::Sender<()>,
    },
    Connect {
        target: String,
        done: oneshot::Sender<()>,
    },
    Send(Position),
    Stop {
        done: oneshot::Sender<()>,
    },
}

/// Handle to a running coordinator. Clones share the same session.
///
/// The coordinator stops its transport and exits once every handle is
/// dropped.
#[derive(Debug, Clone)]
pub struct SessionCoordinator {
    commands: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<SessionStatus>,
    moves: broadcast::Sender<Position>,
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Host { display_name, .. } => write!(f, "Host({})", display_name),
            Command::Connect { target, .. } => write!(f, "Connect({})", target),
            Command::Send(position) => write!(f, "Send{}", position),
            Command::Stop { .. } => write!(f, "Stop"),
        }
    }
}

impl SessionCoordinator {
    /// Starts a coordinator owning `transport`. Must be called inside a
    /// tokio runtime.
    #[instrument(skip(transport))]
    pub fn spawn(transport: Arc<dyn PeerTransport>) -> Self {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(SessionStatus::idle());
        let (moves_tx, _) = broadcast::channel(MOVE_CAPACITY);

        let events = transport.subscribe();
        let worker = Worker {
            transport,
            status: status_tx,
            moves: moves_tx.clone(),
        };
        tokio::spawn(worker.run(commands_rx, events));

        Self {
            commands: commands_tx,
            status: status_rx,
            moves: moves_tx,
        }
    }

    /// Latest status.
    pub fn status(&self) -> SessionStatus {
        self.status.borrow().clone()
    }

    /// Watches status changes.
    pub fn subscribe_status(&self) -> watch::Receiver<SessionStatus> {
        self.status.clone()
    }

    /// Receives every well-formed move the peer sends from now on.
    pub fn subscribe_moves(&self) -> broadcast::Receiver<Position> {
        self.moves.subscribe()
    }

    /// Starts hosting. Returns once listening has begun or failed.
    #[instrument(skip(self))]
    pub async fn host(&self, display_name: &str) {
        let (done, wait) = oneshot::channel();
        self.request(
            Command::Host {
                display_name: display_name.to_string(),
                done,
            },
            wait,
        )
        .await;
    }

    /// Starts connecting to `target`. Returns once the attempt is under way.
    #[instrument(skip(self))]
    pub async fn connect(&self, target: &str) {
        let (done, wait) = oneshot::channel();
        self.request(
            Command::Connect {
                target: target.to_string(),
                done,
            },
            wait,
        )
        .await;
    }

    /// Queues a local move for the peer. Moves go out in call order.
    #[instrument(skip(self))]
    pub fn send_move(&self, position: Position) {
        if self.commands.send(Command::Send(position)).is_err() {
            warn!("Coordinator has shut down; move not sent");
        }
    }

    /// Ends the session. The status becomes `Idle` and stays there until the
    /// next host or connect.
    #[instrument(skip(self))]
    pub async fn stop(&self) {
        let (done, wait) = oneshot::channel();
        self.request(Command::Stop { done }, wait).await;
    }

    async fn request(&self, command: Command, wait: oneshot::Receiver<()>) {
        if self.commands.send(command).is_err() {
            warn!("Coordinator has shut down");
            return;
        }
        let _ = wait.await;
    }
}

struct Worker {
    transport: Arc<dyn PeerTransport>,
    status: watch::Sender<SessionStatus>,
    moves: broadcast::Sender<Position>,
}

impl Worker {
    async fn run(
        self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut events: broadcast::Receiver<PeerEvent>,
    ) {
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command, &mut events).await,
                    None => break,
                },
                event = events.recv() => match event {
                    Ok(event) => self.handle_event(event),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Coordinator fell behind peer events");
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }
        debug!("Coordinator shutting down");
        self.transport.stop().await;
    }

    async fn handle_command(&self, command: Command, events: &mut broadcast::Receiver<PeerEvent>) {
        debug!(?command, "Coordinator command");
        match command {
            Command::Host { display_name, done } => {
                if self.refuse_while_busy() {
                    let _ = done.send(());
                    return;
                }
                let text = format!("Hosting as {}...", display_name);
                self.set(ConnectionState::Listening, text);
                self.transport.start_hosting(&display_name).await;
                let _ = done.send(());
            }
            Command::Connect { target, done } => {
                if self.refuse_while_busy() {
                    let _ = done.send(());
                    return;
                }
                let text = format!("Connecting to {}...", target);
                self.set(ConnectionState::Connecting, text);
                self.transport.connect_to_peer(&target).await;
                let _ = done.send(());
            }
            Command::Send(position) => {
                self.transport.send(&encode_move(position)).await;
            }
            Command::Stop { done } => {
                self.transport.stop().await;
                // Anything the old session emitted is already queued; apply it
                // before going idle so it cannot land afterwards.
                loop {
                    match events.try_recv() {
                        Ok(event) => self.handle_event(event),
                        Err(TryRecvError::Lagged(_)) => continue,
                        Err(_) => break,
                    }
                }
                self.status.send_replace(SessionStatus::idle());
                info!("Peer session stopped");
                let _ = done.send(());
            }
        }
    }

    fn refuse_while_busy(&self) -> bool {
        let busy = self.status.borrow().state().is_busy();
        if busy {
            warn!("Peer session already in progress; stop it first");
        }
        busy
    }

    fn handle_event(&self, event: PeerEvent) {
        match event {
            PeerEvent::Connected(peer) => {
                let text = format!("Connected to {}", peer);
                self.set(ConnectionState::Connected(peer), text);
            }
            PeerEvent::Message(raw) => {
                let raw = raw.trim();
                let text = format!("Received: {}", raw);
                self.status.send_modify(|status| status.text = text);
                match decode_move(raw) {
                    Ok(position) => {
                        debug!(%position, "Remote move");
                        let _ = self.moves.send(position);
                    }
                    Err(e) => debug!(error = %e, raw, "Dropping malformed peer message"),
                }
            }
            PeerEvent::Disconnected(reason) => {
                let text = format!("Disconnected: {}", reason);
                self.set_unless_idle(ConnectionState::Disconnected(reason), text);
            }
            PeerEvent::Error(message) => {
                let text = format!("Error: {}", message);
                self.set_unless_idle(ConnectionState::Failed(message), text);
            }
        }
    }

    fn set(&self, state: ConnectionState, text: String) {
        info!(%state, %text, "Session status");
        self.status.send_replace(SessionStatus::new(state, text));
    }

    fn set_unless_idle(&self, state: ConnectionState, text: String) {
        if *self.status.borrow().state() == ConnectionState::Idle {
            debug!(%state, "Ignoring event for a session that is not running");
            return;
        }
        self.set(state, text);
    }
}
