//! Command-line interface for misere_games.

use clap::{Parser, Subcommand};
use misere_games::ModeKind;
use misere_tictactoe::Difficulty;

/// Misère tic-tac-toe: complete a line of three and you lose.
#[derive(Parser, Debug)]
#[command(name = "misere_games")]
#[command(
    about = "Misère tic-tac-toe against the computer, a friend, or a linked peer",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true, env = "MISERE_CONFIG", default_value = "misere.toml")]
    pub config: std::path::PathBuf,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play against the computer
    Solo {
        /// AI strength (easy, medium, hard); defaults to the saved setting
        #[arg(short, long)]
        difficulty: Option<Difficulty>,
    },

    /// Two players taking turns at this terminal
    Local,

    /// Host a game and wait for one peer to join
    Host {
        /// Address to listen on; defaults to the configured listen address
        #[arg(long)]
        bind: Option<String>,

        /// Name shown while hosting
        #[arg(long, default_value = "host")]
        name: String,
    },

    /// Join a hosted game
    Join {
        /// Host address, e.g. 192.168.1.20:47474
        target: String,
    },

    /// List finished games, newest first
    History,

    /// Delete all recorded games
    ClearHistory,

    /// Show or change saved settings
    Settings {
        /// New AI difficulty
        #[arg(long)]
        difficulty: Option<Difficulty>,

        /// New default mode (vs-ai, local-two-player, remote-two-player)
        #[arg(long)]
        mode: Option<ModeKind>,
    },
}
