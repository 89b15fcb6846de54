//! Misère tic-tac-toe application layer.
//!
//! Sits on top of the pure game logic in `misere_tictactoe` and adds the
//! parts that talk to the outside world.
//!
//! # Architecture
//!
//! - **Session**: single-task game orchestrator for solo, local and remote play
//! - **Peer**: line-oriented transports to one remote device (TCP, stub)
//! - **Coordinator**: maps transport events to connection status and remote moves
//! - **Db**: SQLite match history via diesel
//! - **Settings / Config**: TOML-backed preferences and runtime configuration
//!
//! # Example
//!
//! ```no_run
//! use misere_games::{GameMode, SessionHandle, SessionOptions};
//! use misere_tictactoe::{Difficulty, Position};
//!
//! # async fn example() {
//! let session = SessionHandle::spawn(
//!     GameMode::SoloVsAi(Difficulty::Hard),
//!     SessionOptions::default(),
//! );
//! let center = Position::new(1, 1).expect("on the board");
//! assert!(session.play(center).await);
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod console;
pub mod db;
pub mod peer;
pub mod protocol;

mod config;
mod coordinator;
mod error;
mod session;
mod settings;

// Crate-level exports - Configuration
pub use config::AppConfig;
pub use error::{ConfigError, DbError, ErrorKind, LocatedError};

// Crate-level exports - Settings
pub use settings::{ModeKind, SettingsStore};

// Crate-level exports - Peer-to-peer play
pub use coordinator::{ConnectionState, SessionCoordinator, SessionStatus};
pub use peer::{
    PeerEvent, PeerLink, PeerTransport, RetryPolicy, TcpPeer, TransportKind, UnsupportedPeer,
    build_transport,
};
pub use protocol::{ProtocolError, decode_move, encode_move};

// Crate-level exports - Game session
pub use session::{AI, GameMode, GameSnapshot, HUMAN, SessionHandle, SessionOptions};

// Crate-level exports - History
pub use db::{GameResult, HistoryRepository, NewGameResult};
