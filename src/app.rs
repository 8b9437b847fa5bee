use std::collections::VecDeque;

use gridiron_paths::game::{GamePhase, GameState};
use gridiron_paths::model::{Difficulty, StreakData};
use gridiron_paths::session::GameSession;

const MAX_LOGS: usize = 200;

/// What the UI knows about the session. Rebuilt by the worker after every
/// command and shipped whole.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionView {
    pub difficulty: Difficulty,
    pub streak: StreakData,
    pub pool_size: usize,
    pub game: GameState,
}

impl SessionView {
    pub fn capture(session: &GameSession) -> Self {
        Self {
            difficulty: session.difficulty(),
            streak: session.streak(),
            pool_size: session.pool().len(),
            game: session.state().clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    NewRound,
    Retry,
    Guess { player_id: String },
    Skip,
    CycleDifficulty,
}

#[derive(Debug, Clone)]
pub enum Delta {
    Session(SessionView),
    Log(String),
}

#[derive(Debug, Default)]
pub struct AppState {
    pub session: SessionView,
    pub logs: VecDeque<String>,
    /// Display name of the last submitted guess, for the reveal.
    pub last_guess: Option<String>,
    pub busy: bool,
    /// Commands (plus the startup load) the worker has not answered yet.
    pending: usize,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            busy: true,
            pending: 1,
            ..Self::default()
        }
    }

    pub fn command_sent(&mut self) {
        self.pending += 1;
        self.busy = true;
    }

    pub fn phase(&self) -> GamePhase {
        self.session.game.phase
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::Session(view) => {
            if view.difficulty != state.session.difficulty {
                state.last_guess = None;
            }
            if view.game.phase == GamePhase::Loading {
                state.last_guess = None;
            }
            state.pending = state.pending.saturating_sub(1);
            state.busy = state.pending > 0;
            state.session = view;
        }
        Delta::Log(line) => state.push_log(line),
    }
}
