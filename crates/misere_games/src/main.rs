//! Misère tic-tac-toe - terminal front end
//!
//! Solo, hot-seat and peer-to-peer play, plus history and settings.

#![warn(missing_docs)]

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use misere_games::{
    AppConfig, GameMode, HistoryRepository, ModeKind, SessionCoordinator, SessionHandle,
    SessionOptions, SettingsStore, build_transport, console,
};
use misere_tictactoe::Difficulty;
use tracing::{info, instrument, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    initialize_tracing();

    let config = AppConfig::load_or_default(&cli.config)?;
    let settings = SettingsStore::new(config.settings_path());

    match cli.command {
        Command::Solo { difficulty } => {
            let difficulty = difficulty.unwrap_or_else(|| settings.difficulty());
            run_solo(&config, &settings, difficulty).await
        }
        Command::Local => run_local(&config, &settings).await,
        Command::Host { bind, name } => {
            let bind = bind.unwrap_or_else(|| config.listen_addr().clone());
            run_remote(&config, &settings, Link::Host { bind, name }).await
        }
        Command::Join { target } => {
            let bind = config.listen_addr().clone();
            run_remote(&config, &settings, Link::Join { bind, target }).await
        }
        Command::History => show_history(&config).await,
        Command::ClearHistory => clear_history(&config).await,
        Command::Settings { difficulty, mode } => update_settings(&settings, difficulty, mode),
    }
}

/// Logs to stderr so the board on stdout stays readable.
fn initialize_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,misere_games=debug")),
        )
        .with_writer(std::io::stderr)
        .init();
}

enum Link {
    Host { bind: String, name: String },
    Join { bind: String, target: String },
}

/// Opens the history store, applying migrations. Play continues without
/// history if the database is unusable.
#[instrument(skip(config), fields(db = %config.history_db()))]
async fn open_history(config: &AppConfig) -> Option<HistoryRepository> {
    let repo = HistoryRepository::new(config.history_db().clone());
    let migrated = repo.clone();
    let migration = tokio::task::spawn_blocking(move || migrated.run_migrations());
    match migration.await {
        Ok(Ok(())) => Some(repo),
        Ok(Err(e)) => {
            warn!(error = %e, "History unavailable");
            None
        }
        Err(e) => {
            warn!(error = %e, "History setup task failed");
            None
        }
    }
}

async fn session_options(config: &AppConfig) -> SessionOptions {
    let options = SessionOptions::default().with_ai_delay(config.ai_delay());
    match open_history(config).await {
        Some(history) => options.with_history(history),
        None => options,
    }
}

fn remember_mode(settings: &SettingsStore, mode: ModeKind) {
    if let Err(e) = settings.set_mode(mode) {
        warn!(error = %e, "Could not save mode");
    }
}

#[instrument(skip(config, settings))]
async fn run_solo(
    config: &AppConfig,
    settings: &SettingsStore,
    difficulty: Difficulty,
) -> Result<()> {
    info!("Starting game against the computer");
    remember_mode(settings, ModeKind::VsAi);
    if let Err(e) = settings.set_difficulty(difficulty) {
        warn!(error = %e, "Could not save difficulty");
    }
    let options = session_options(config).await;
    let session = SessionHandle::spawn(GameMode::SoloVsAi(difficulty), options);
    console::run_console(session, None).await
}

#[instrument(skip(config, settings))]
async fn run_local(config: &AppConfig, settings: &SettingsStore) -> Result<()> {
    info!("Starting local two-player game");
    remember_mode(settings, ModeKind::LocalTwoPlayer);
    let options = session_options(config).await;
    let session = SessionHandle::spawn(GameMode::LocalTwoPlayer, options);
    console::run_console(session, None).await
}

#[instrument(skip_all)]
async fn run_remote(config: &AppConfig, settings: &SettingsStore, link: Link) -> Result<()> {
    remember_mode(settings, ModeKind::RemoteTwoPlayer);

    let bind = match &link {
        Link::Host { bind, .. } | Link::Join { bind, .. } => bind.as_str(),
    };
    let transport = build_transport(*config.transport(), bind, config.retry_policy());
    let coordinator = SessionCoordinator::spawn(transport);
    match &link {
        Link::Host { name, .. } => {
            info!(bind, "Hosting remote game");
            coordinator.host(name).await;
        }
        Link::Join { target, .. } => {
            info!(%target, "Joining remote game");
            coordinator.connect(target).await;
        }
    }

    let session = SessionHandle::spawn(
        GameMode::RemoteTwoPlayer(coordinator.clone()),
        session_options(config).await,
    );
    console::run_console(session, Some(coordinator)).await
}

#[instrument(skip(config))]
async fn show_history(config: &AppConfig) -> Result<()> {
    let Some(repo) = open_history(config).await else {
        anyhow::bail!("History database {} is unavailable", config.history_db());
    };
    let results = tokio::task::spawn_blocking(move || repo.list_all()).await??;
    if results.is_empty() {
        println!("No games recorded yet.");
    }
    for result in &results {
        let winner = match result.winner_symbol() {
            Ok(Some(symbol)) => format!("{} won", symbol),
            Ok(None) => "Draw".to_string(),
            Err(e) => {
                warn!(error = %e, "Skipping unreadable winner");
                "?".to_string()
            }
        };
        let difficulty = result.difficulty().as_deref().unwrap_or("-");
        println!(
            "{}  {:<8}  {:<18}  {}",
            result.played_at().format("%Y-%m-%d %H:%M:%S"),
            winner,
            result.mode(),
            difficulty
        );
    }
    Ok(())
}

#[instrument(skip(config))]
async fn clear_history(config: &AppConfig) -> Result<()> {
    let Some(repo) = open_history(config).await else {
        anyhow::bail!("History database {} is unavailable", config.history_db());
    };
    let deletion = tokio::task::spawn_blocking(move || repo.delete_all());
    let deleted = deletion.await??;
    println!("Deleted {} game(s).", deleted);
    Ok(())
}

#[instrument(skip(settings))]
fn update_settings(
    settings: &SettingsStore,
    difficulty: Option<Difficulty>,
    mode: Option<ModeKind>,
) -> Result<()> {
    if let Some(difficulty) = difficulty {
        settings.set_difficulty(difficulty)?;
    }
    if let Some(mode) = mode {
        settings.set_mode(mode)?;
    }
    println!("difficulty = {}", settings.difficulty());
    println!("mode = {}", settings.mode());
    Ok(())
}
