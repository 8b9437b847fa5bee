use std::sync::Arc;
use std::sync::mpsc::Receiver;

use anyhow::Context;

use crate::error::GameError;
use crate::game::{GameEvent, GameMachine, GamePhase, GameState};
use crate::model::{Difficulty, RosterPlayer, StreakData};
use crate::sampler::{MAX_ROUND_ATTEMPTS, RoundSampler, RoundSequencer, RoundToken};
use crate::service::PlayerService;
use crate::store::{DurableStore, best_effort};
use crate::streak::StreakTracker;

pub const DIFFICULTY_KEY: &str = "nfl-game-difficulty";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    Started,
    /// A newer round request arrived first; nothing was applied.
    Superseded,
}

#[derive(Debug, Clone)]
pub struct RoundHandle {
    rounds: RoundSequencer,
}

impl RoundHandle {
    pub fn supersede(&self) {
        self.rounds.invalidate();
    }
}

pub struct GameSession {
    service: Arc<PlayerService>,
    store: Arc<dyn DurableStore>,
    difficulty: Difficulty,
    pool: Vec<RosterPlayer>,
    sampler: RoundSampler,
    machine: GameMachine,
    streaks: StreakTracker,
    rounds: RoundSequencer,
}

impl GameSession {
    /// Restore the persisted difficulty and streaks. The pool is not loaded
    /// until [`GameSession::load_pool`].
    pub fn new(service: Arc<PlayerService>, store: Arc<dyn DurableStore>) -> Self {
        let difficulty = load_difficulty(store.as_ref());
        let streaks = StreakTracker::load(Arc::clone(&store));
        Self {
            service,
            store,
            difficulty,
            pool: Vec::new(),
            sampler: RoundSampler::new(),
            machine: GameMachine::new(),
            streaks,
            rounds: RoundSequencer::new(),
        }
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn pool(&self) -> &[RosterPlayer] {
        &self.pool
    }

    pub fn state(&self) -> &GameState {
        self.machine.state()
    }

    pub fn phase(&self) -> GamePhase {
        self.machine.phase()
    }

    pub fn streak(&self) -> StreakData {
        self.streaks.get(self.difficulty)
    }

    pub fn subscribe(&mut self) -> Receiver<GameEvent> {
        self.machine.subscribe()
    }

    pub fn round_handle(&self) -> RoundHandle {
        RoundHandle {
            rounds: self.rounds.clone(),
        }
    }

    /// Load the pool for the current tier. On failure the pool is left empty
    /// and the error is shown as a load error.
    pub fn load_pool(&mut self) -> Result<usize, GameError> {
        let loaded = self
            .service
            .load_player_pool(self.difficulty)
            .and_then(|pool| {
                if pool.is_empty() {
                    Err(GameError::EmptyPool(self.difficulty))
                } else {
                    Ok(pool)
                }
            });
        match loaded {
            Ok(pool) => {
                log::info!("{} pool ready: {} players", self.difficulty, pool.len());
                self.pool = pool;
                Ok(self.pool.len())
            }
            Err(err) => {
                log::warn!("{err:#}");
                self.pool.clear();
                self.machine.fail_round(err.to_string());
                Err(err)
            }
        }
    }

    /// Sample up to [`MAX_ROUND_ATTEMPTS`] candidates until one builds into a
    /// playable player.
    pub fn start_new_round(&mut self) -> Result<RoundOutcome, GameError> {
        let token = self.rounds.next();
        self.machine.begin_round();
        if self.pool.is_empty() {
            let err = GameError::EmptyPool(self.difficulty);
            self.machine.fail_round(err.to_string());
            return Err(err);
        }

        let mut rng = rand::thread_rng();
        for attempt in 1..=MAX_ROUND_ATTEMPTS {
            if self.superseded(token) {
                return Ok(self.superseded_outcome());
            }
            let Some(candidate) = self.sampler.pick_random_player(&self.pool, &mut rng) else {
                break;
            };
            let built = self.service.build_game_player(&candidate.id);
            let Some(resolved) = self
                .rounds
                .apply_if_current(token, || self.machine.resolve_round(built))
            else {
                return Ok(self.superseded_outcome());
            };
            match resolved {
                Ok(()) => {
                    log::debug!("round ready after {attempt} attempt(s)");
                    return Ok(RoundOutcome::Started);
                }
                Err(err) => {
                    log::info!("attempt {attempt}/{MAX_ROUND_ATTEMPTS} skipped: {err}");
                }
            }
        }

        let err = GameError::NoPlayerAvailable {
            attempts: MAX_ROUND_ATTEMPTS,
        };
        let message = err.to_string();
        if self
            .rounds
            .apply_if_current(token, || self.machine.fail_round(message))
            .is_none()
        {
            return Ok(self.superseded_outcome());
        }
        log::warn!("{err}");
        Err(err)
    }

    /// Resolve the round with a guess. Returns `None` when no round is being
    /// guessed.
    pub fn guess(&mut self, player_id: &str) -> Option<bool> {
        if self.machine.phase() != GamePhase::Guessing {
            return None;
        }
        let correct = self.machine.submit_guess(player_id);
        if correct {
            self.streaks.record_correct(self.difficulty);
        } else {
            self.streaks.record_incorrect(self.difficulty);
        }
        Some(correct)
    }

    pub fn skip(&mut self) -> bool {
        if self.machine.phase() != GamePhase::Guessing {
            return false;
        }
        self.machine.skip_player();
        self.streaks.record_incorrect(self.difficulty);
        true
    }

    /// Switch tiers: persist the choice, drop any in-flight round, forget the
    /// recency history and load the new pool.
    pub fn set_difficulty(&mut self, difficulty: Difficulty) -> Result<usize, GameError> {
        let write = serde_json::to_string(&difficulty)
            .context("serialize difficulty")
            .and_then(|json| self.store.set(DIFFICULTY_KEY, &json));
        best_effort("difficulty save", write);
        self.rounds.invalidate();
        self.sampler.reset();
        self.difficulty = difficulty;
        self.machine.begin_round();
        self.load_pool()
    }

    fn superseded(&self, token: RoundToken) -> bool {
        !self.rounds.is_current(token)
    }

    fn superseded_outcome(&self) -> RoundOutcome {
        log::debug!("round superseded; dropping its result");
        RoundOutcome::Superseded
    }
}

fn load_difficulty(store: &dyn DurableStore) -> Difficulty {
    let Some(raw) = best_effort("difficulty load", store.get(DIFFICULTY_KEY)).flatten() else {
        return Difficulty::default();
    };
    serde_json::from_str(&raw).unwrap_or_else(|err| {
        log::warn!("ignoring stored difficulty {raw:?}: {err}");
        Difficulty::default()
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{DIFFICULTY_KEY, load_difficulty};
    use crate::model::Difficulty;
    use crate::store::{DurableStore, MemoryStore};

    #[test]
    fn persisted_difficulty_falls_back_to_easy() {
        let store = Arc::new(MemoryStore::new());
        assert_eq!(load_difficulty(store.as_ref()), Difficulty::Easy);
        store.set(DIFFICULTY_KEY, r#""hard""#).expect("seed");
        assert_eq!(load_difficulty(store.as_ref()), Difficulty::Hard);
        store.set(DIFFICULTY_KEY, r#""legendary""#).expect("seed");
        assert_eq!(load_difficulty(store.as_ref()), Difficulty::Easy);
        store.set(DIFFICULTY_KEY, "hard").expect("seed");
        assert_eq!(load_difficulty(store.as_ref()), Difficulty::Easy);
    }
}
