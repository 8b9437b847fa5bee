use std::sync::mpsc::{Receiver, Sender};
use std::thread;

use gridiron_paths::session::{GameSession, RoundOutcome};

use crate::app::{Delta, SessionCommand, SessionView};

/// Run the session on its own thread. Every network wait happens here; the UI
/// only sees `Delta`s.
pub fn spawn_session_worker(
    mut session: GameSession,
    tx: Sender<Delta>,
    cmd_rx: Receiver<SessionCommand>,
) {
    thread::spawn(move || {
        if session.load_pool().is_ok() {
            start_round(&mut session);
        }
        if tx.send(Delta::Session(SessionView::capture(&session))).is_err() {
            return;
        }

        while let Ok(cmd) = cmd_rx.recv() {
            match cmd {
                SessionCommand::NewRound => start_round(&mut session),
                SessionCommand::Retry => {
                    let ready = !session.pool().is_empty() || session.load_pool().is_ok();
                    if ready {
                        start_round(&mut session);
                    }
                }
                SessionCommand::Guess { player_id } => {
                    if let Some(correct) = session.guess(&player_id) {
                        let streak = session.streak();
                        log::info!(
                            "{} | streak {} (best {})",
                            if correct { "Correct" } else { "Incorrect" },
                            streak.current,
                            streak.best
                        );
                    }
                }
                SessionCommand::Skip => {
                    if session.skip() {
                        log::info!("Skipped; streak reset");
                    }
                }
                SessionCommand::CycleDifficulty => {
                    let next = session.difficulty().next();
                    log::info!("Switching to {next}");
                    if session.set_difficulty(next).is_ok() {
                        start_round(&mut session);
                    }
                }
            }
            if tx.send(Delta::Session(SessionView::capture(&session))).is_err() {
                break;
            }
        }
    });
}

fn start_round(session: &mut GameSession) {
    match session.start_new_round() {
        Ok(RoundOutcome::Started) => {}
        Ok(RoundOutcome::Superseded) => log::debug!("round request superseded"),
        // surfaced through the state's load error
        Err(_) => {}
    }
}
