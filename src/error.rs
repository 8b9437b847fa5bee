use thiserror::Error;

use crate::model::Difficulty;

/// Outcomes the game flow branches on. Transport and parse failures stay as
/// `anyhow::Error` and are wrapped here only where a round or pool build gives
/// up on them.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("player {player_id} is not playable: {reason}")]
    NotPlayable { player_id: String, reason: String },

    #[error("failed to build player {player_id}: {source}")]
    Build {
        player_id: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("no player available after {attempts} attempts")]
    NoPlayerAvailable { attempts: usize },

    #[error("player pool for {0} is empty")]
    EmptyPool(Difficulty),

    #[error("failed to load {difficulty} player pool: {source}")]
    PoolLoad {
        difficulty: Difficulty,
        #[source]
        source: anyhow::Error,
    },
}

impl GameError {
    pub fn not_playable(player_id: impl Into<String>, reason: impl Into<String>) -> Self {
        GameError::NotPlayable {
            player_id: player_id.into(),
            reason: reason.into(),
        }
    }
}
