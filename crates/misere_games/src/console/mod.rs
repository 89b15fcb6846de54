//! Interactive terminal front end.

mod input;
mod render;

pub use input::{Input, parse_input};
pub use render::{render, status_line};

use crate::coordinator::{SessionCoordinator, SessionStatus};
use crate::session::SessionHandle;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{info, instrument};

const HELP: &str = "Enter a cell as `row,col` (0-2), `new` to restart, `quit` to leave.\n\
Misère rules: whoever completes a line of three loses.";

/// Plays on stdin/stdout until the user quits or input ends.
///
/// # Errors
///
/// Returns an error if reading stdin fails.
#[instrument(skip_all)]
pub async fn run_console(
    session: SessionHandle,
    coordinator: Option<SessionCoordinator>,
) -> anyhow::Result<()> {
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut snapshots = session.subscribe();
    let mut status = coordinator
        .as_ref()
        .map(SessionCoordinator::subscribe_status);

    println!("{}", HELP);
    println!("{}", render(&snapshots.borrow_and_update()));

    loop {
        tokio::select! {
            line = input.next_line() => {
                let Some(line) = line? else { break };
                match parse_input(&line) {
                    Input::Play(position) => {
                        if !session.play(position).await {
                            println!("That move is not allowed.");
                        }
                    }
                    Input::NewGame => session.new_game(),
                    Input::Help => println!("{}", HELP),
                    Input::Quit => break,
                    Input::Empty => {}
                    Input::Unknown => println!("Unrecognised input. Type `help`."),
                }
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                println!("{}", render(&snapshots.borrow_and_update()));
            }
            update = next_status(&mut status) => println!("[peer] {}", update.text()),
        }
    }

    if let Some(coordinator) = coordinator {
        coordinator.stop().await;
    }
    info!("Console closed");
    Ok(())
}

async fn next_status(status: &mut Option<watch::Receiver<SessionStatus>>) -> SessionStatus {
    let Some(receiver) = status.as_mut() else {
        return std::future::pending().await;
    };
    if receiver.changed().await.is_err() {
        *status = None;
        return std::future::pending().await;
    }
    receiver.borrow_and_update().clone()
}
