//! Game session: owns the game, drives the AI, relays remote moves.
//!
//! The session runs as a single task. Local input, remote moves and AI turns
//! are applied one at a time in arrival order, and every change is
//! published as a [`GameSnapshot`].

use crate::coordinator::SessionCoordinator;
use crate::db::{HistoryRepository, NewGameResult};
use crate::settings::ModeKind;
use derive_getters::Getters;
use derive_setters::Setters;
use misere_tictactoe::{Board, Difficulty, Game, Move, Outcome, Position, Symbol, select_move};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::{debug, info, instrument, warn};

/// Symbol the human plays against the computer.
pub const HUMAN: Symbol = Symbol::X;

/// Symbol the computer plays.
pub const AI: Symbol = Symbol::O;

/// How the two sides of a game are played.
#[derive(Debug, Clone)]
pub enum GameMode {
    /// Human (`X`) against the computer (`O`).
    SoloVsAi(Difficulty),
    /// Two humans alternating on one device.
    LocalTwoPlayer,
    /// Two humans on linked devices; moves travel through the coordinator.
    RemoteTwoPlayer(SessionCoordinator),
}

impl GameMode {
    /// Mode without its payload.
    pub fn kind(&self) -> ModeKind {
        match self {
            GameMode::SoloVsAi(_) => ModeKind::VsAi,
            GameMode::LocalTwoPlayer => ModeKind::LocalTwoPlayer,
            GameMode::RemoteTwoPlayer(_) => ModeKind::RemoteTwoPlayer,
        }
    }

    /// AI difficulty, for games against the computer.
    pub fn difficulty(&self) -> Option<Difficulty> {
        match self {
            GameMode::SoloVsAi(difficulty) => Some(*difficulty),
            _ => None,
        }
    }
}

/// Everything a view needs to draw the game.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct GameSnapshot {
    board: Board,
    turn: u32,
    outcome: Outcome,
    mode: ModeKind,
    difficulty: Option<Difficulty>,
    /// The computer is about to move; input is queued until it has.
    thinking: bool,
    last_move: Option<Move>,
}

/// Tunables for a session.
#[derive(Debug, Clone, Setters)]
#[setters(prefix = "with_")]
pub struct SessionOptions {
    /// Pause before the computer answers.
    ai_delay: Duration,
    /// Where finished games are recorded.
    #[setters(strip_option)]
    history: Option<HistoryRepository>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            ai_delay: Duration::from_secs(1),
            history: None,
        }
    }
}

enum Command {
    Play {
        position: Position,
        reply: oneshot::Sender<bool>,
    },
    NewGame,
    SetMode(GameMode),
}

/// Handle to a running game session. Clones drive the same game.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<GameSnapshot>,
}

impl SessionHandle {
    /// Starts a session in `mode`. Must be called inside a tokio runtime.
    #[instrument(skip(options), fields(mode = %mode.kind()))]
    pub fn spawn(mode: GameMode, options: SessionOptions) -> Self {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let game = Game::new();
        let (snapshots_tx, snapshots_rx) = watch::channel(GameSnapshot {
            board: game.board().clone(),
            turn: game.turn(),
            outcome: game.outcome(),
            mode: mode.kind(),
            difficulty: mode.difficulty(),
            thinking: false,
            last_move: None,
        });

        let remote = remote_moves(&mode);
        let session = GameSession {
            game,
            mode,
            options,
            thinking: false,
            remote,
            snapshots: snapshots_tx,
        };
        tokio::spawn(session.run(commands_rx));
        info!("Game session started");

        Self {
            commands: commands_tx,
            snapshots: snapshots_rx,
        }
    }

    /// Plays `position` for whoever is to move locally.
    ///
    /// Returns `false` when the move was ignored: occupied cell, finished
    /// game, or a session that has shut down.
    #[instrument(skip(self))]
    pub async fn play(&self, position: Position) -> bool {
        let (reply, applied) = oneshot::channel();
        let command = Command::Play { position, reply };
        if self.commands.send(command).is_err() {
            warn!("Session has shut down");
            return false;
        }
        applied.await.unwrap_or(false)
    }

    /// Clears the board and starts again in the current mode.
    #[instrument(skip(self))]
    pub fn new_game(&self) {
        self.command(Command::NewGame);
    }

    /// Switches mode and starts a fresh game.
    #[instrument(skip(self), fields(mode = %mode.kind()))]
    pub fn set_mode(&self, mode: GameMode) {
        self.command(Command::SetMode(mode));
    }

    /// Latest published state.
    pub fn snapshot(&self) -> GameSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Watches published state.
    pub fn subscribe(&self) -> watch::Receiver<GameSnapshot> {
        self.snapshots.clone()
    }

    fn command(&self, command: Command) {
        if self.commands.send(command).is_err() {
            warn!("Session has shut down");
        }
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Play { position, .. } => write!(f, "Play{}", position),
            Command::NewGame => write!(f, "NewGame"),
            Command::SetMode(mode) => write!(f, "SetMode({})", mode.kind()),
        }
    }
}

fn remote_moves(mode: &GameMode) -> Option<broadcast::Receiver<Position>> {
    match mode {
        GameMode::RemoteTwoPlayer(coordinator) => Some(coordinator.subscribe_moves()),
        _ => None,
    }
}

/// Waits for the next remote move, or forever when there is no peer.
async fn next_remote(remote: &mut Option<broadcast::Receiver<Position>>) -> Position {
    loop {
        let received = match remote.as_mut() {
            Some(moves) => moves.recv().await,
            None => return std::future::pending().await,
        };
        match received {
            Ok(position) => return position,
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "Remote moves dropped"),
            Err(RecvError::Closed) => *remote = None,
        }
    }
}

struct GameSession {
    game: Game,
    mode: GameMode,
    options: SessionOptions,
    thinking: bool,
    remote: Option<broadcast::Receiver<Position>>,
    snapshots: watch::Sender<GameSnapshot>,
}

impl GameSession {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle(command).await,
                    None => break,
                },
                position = next_remote(&mut self.remote) => self.apply_remote(position).await,
            }
        }
        debug!("Game session ended");
    }

    async fn handle(&mut self, command: Command) {
        debug!(?command, "Session command");
        match command {
            Command::Play { position, reply } => {
                let applied = self.apply_local(position).await;
                let _ = reply.send(applied);
                if applied
                    && !self.game.outcome().is_over()
                    && let Some(difficulty) = self.mode.difficulty()
                {
                    self.ai_turn(difficulty).await;
                }
            }
            Command::NewGame => {
                self.game.reset();
                info!("New game");
                self.publish();
            }
            Command::SetMode(mode) => {
                info!(mode = %mode.kind(), "Mode changed");
                self.remote = remote_moves(&mode);
                self.mode = mode;
                self.game.reset();
                self.publish();
            }
        }
    }

    fn local_symbol(&self) -> Symbol {
        match self.mode {
            GameMode::SoloVsAi(_) => HUMAN,
            GameMode::LocalTwoPlayer | GameMode::RemoteTwoPlayer(_) => self.game.next_symbol(),
        }
    }

    #[instrument(skip(self))]
    async fn apply_local(&mut self, position: Position) -> bool {
        let symbol = self.local_symbol();
        let outcome = match self.game.place(position, symbol) {
            Ok(outcome) => outcome,
            Err(e) => {
                debug!(error = %e, "Local move ignored");
                return false;
            }
        };
        self.publish();

        if let GameMode::RemoteTwoPlayer(coordinator) = &self.mode {
            coordinator.send_move(position);
        }
        if outcome.is_over() {
            self.record(outcome).await;
        }
        true
    }

    #[instrument(skip(self))]
    async fn apply_remote(&mut self, position: Position) {
        if !matches!(self.mode, GameMode::RemoteTwoPlayer(_)) {
            return;
        }
        let symbol = self.game.next_symbol();
        match self.game.place(position, symbol) {
            Ok(outcome) => {
                debug!(%symbol, "Remote move applied");
                self.publish();
                if outcome.is_over() {
                    self.record(outcome).await;
                }
            }
            Err(e) => debug!(error = %e, "Remote move ignored"),
        }
    }

    #[instrument(skip(self))]
    async fn ai_turn(&mut self, difficulty: Difficulty) {
        self.thinking = true;
        self.publish();
        tokio::time::sleep(self.options.ai_delay).await;

        match select_move(self.game.board(), difficulty, AI) {
            Some(position) => match self.game.place(position, AI) {
                Ok(outcome) => {
                    debug!(%position, "AI moved");
                    if outcome.is_over() {
                        self.record(outcome).await;
                    }
                }
                Err(e) => warn!(error = %e, "AI chose an illegal move"),
            },
            None => debug!("AI has no legal move"),
        }

        self.thinking = false;
        self.publish();
    }

    async fn record(&self, outcome: Outcome) {
        info!(%outcome, "Game over");
        let Some(history) = self.options.history.clone() else {
            return;
        };
        let difficulty = self.mode.difficulty();
        let Some(record) = NewGameResult::finished(outcome, difficulty, self.mode.kind()) else {
            return;
        };
        let stored = tokio::task::spawn_blocking(move || history.append(record));
        match stored.await {
            Ok(Ok(result)) => debug!(id = result.id(), "Result recorded"),
            Ok(Err(e)) => warn!(error = %e, "Failed to record result"),
            Err(e) => warn!(error = %e, "History task failed"),
        }
    }

    fn publish(&self) {
        self.snapshots.send_replace(GameSnapshot {
            board: self.game.board().clone(),
            turn: self.game.turn(),
            outcome: self.game.outcome(),
            mode: self.mode.kind(),
            difficulty: self.mode.difficulty(),
            thinking: self.thinking,
            last_move: self.game.history().last().copied(),
        });
    }
}
