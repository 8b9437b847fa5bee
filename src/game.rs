//! Round state machine: `loading -> guessing -> correct | incorrect`, back to
//! `loading` for the next round.

use std::sync::mpsc::{self, Receiver, Sender};

use serde::{Deserialize, Serialize};

use crate::error::GameError;
use crate::model::{GamePlayer, RosterPlayer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GamePhase {
    #[default]
    Loading,
    Guessing,
    Correct,
    Incorrect,
}

impl GamePhase {
    pub fn is_resolved(self) -> bool {
        matches!(self, GamePhase::Correct | GamePhase::Incorrect)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameState {
    pub phase: GamePhase,
    pub current_player: Option<GamePlayer>,
    pub guessed_player_id: Option<String>,
    pub load_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    RoundLoading,
    RoundStarted { player_id: String },
    RoundFailed { message: String },
    Guessed { player_id: Option<String>, correct: bool },
}

#[derive(Debug, Default)]
pub struct GameMachine {
    state: GameState,
    subscribers: Vec<Sender<GameEvent>>,
}

impl GameMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn current_player(&self) -> Option<&GamePlayer> {
        self.state.current_player.as_ref()
    }

    /// Receive every transition from now on. Dropping the receiver
    /// unsubscribes.
    pub fn subscribe(&mut self) -> Receiver<GameEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    fn publish(&mut self, event: GameEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Enter `loading` for a new round, clearing the previous guess and error.
    pub fn begin_round(&mut self) {
        self.state.phase = GamePhase::Loading;
        self.state.guessed_player_id = None;
        self.state.load_error = None;
        self.publish(GameEvent::RoundLoading);
    }

    /// Apply the outcome of building the round's player. On failure the
    /// machine stays in `loading` with the error recorded and the error is
    /// handed back so the caller can try another candidate.
    pub fn resolve_round(&mut self, built: Result<GamePlayer, GameError>) -> Result<(), GameError> {
        let player = built.and_then(|player| {
            if player.career_path.is_empty() {
                Err(GameError::not_playable(&player.id, "no career data"))
            } else {
                Ok(player)
            }
        });
        match player {
            Ok(player) => {
                let player_id = player.id.clone();
                self.state.current_player = Some(player);
                self.state.phase = GamePhase::Guessing;
                self.state.load_error = None;
                self.publish(GameEvent::RoundStarted { player_id });
                Ok(())
            }
            Err(err) => {
                self.fail_round(err.to_string());
                Err(err)
            }
        }
    }

    /// Stay in `loading` with a user-facing error.
    pub fn fail_round(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.state.phase = GamePhase::Loading;
        self.state.load_error = Some(message.clone());
        self.publish(GameEvent::RoundFailed { message });
    }

    pub fn start_round(
        &mut self,
        candidate: &RosterPlayer,
        build: impl FnOnce(&str) -> Result<GamePlayer, GameError>,
    ) -> Result<(), GameError> {
        self.begin_round();
        let built = build(&candidate.id);
        self.resolve_round(built)
    }

    pub fn submit_guess(&mut self, guessed_id: &str) -> bool {
        let correct = self
            .state
            .current_player
            .as_ref()
            .is_some_and(|p| p.id == guessed_id);
        self.state.guessed_player_id = Some(guessed_id.to_string());
        self.state.phase = if correct {
            GamePhase::Correct
        } else {
            GamePhase::Incorrect
        };
        self.publish(GameEvent::Guessed {
            player_id: Some(guessed_id.to_string()),
            correct,
        });
        correct
    }

    pub fn skip_player(&mut self) {
        self.state.guessed_player_id = None;
        self.state.phase = GamePhase::Incorrect;
        self.publish(GameEvent::Guessed {
            player_id: None,
            correct: false,
        });
    }
}
