use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::cache::TtlCache;
use crate::career;
use crate::config::GameConfig;
use crate::error::GameError;
use crate::model::{Difficulty, GamePlayer, RosterPlayer, SearchResult, TeamRecord};
use crate::pool;
use crate::source::{PlayerDataSource, is_searchable};

const PLAYER_TTL: Duration = Duration::from_secs(24 * 60 * 60);
const POOL_TTL: Duration = Duration::from_secs(12 * 60 * 60);
const TEAMS_TTL: Duration = Duration::from_secs(12 * 60 * 60);
const SEARCH_TTL: Duration = Duration::from_secs(10 * 60);

/// Cached access to player data. Every remote read goes through the shared
/// [`TtlCache`].
pub struct PlayerService {
    source: Arc<dyn PlayerDataSource>,
    cache: Arc<TtlCache>,
    fetch_parallelism: usize,
    master_team_count: usize,
    search_limit: usize,
}

impl PlayerService {
    pub fn new(source: Arc<dyn PlayerDataSource>, cache: Arc<TtlCache>, config: &GameConfig) -> Self {
        Self {
            source,
            cache,
            fetch_parallelism: config.fetch_parallelism,
            master_team_count: config.master_team_count,
            search_limit: config.search_limit,
        }
    }

    pub fn cache(&self) -> &Arc<TtlCache> {
        &self.cache
    }

    pub fn teams(&self) -> Result<Vec<TeamRecord>> {
        if let Some(teams) = self.cache.get::<Vec<TeamRecord>>("teams") {
            return Ok(teams);
        }
        let teams = self.source.list_teams()?;
        if !teams.is_empty() {
            self.cache.set_with_ttl("teams", &teams, TEAMS_TTL);
        }
        Ok(teams)
    }

    /// Fetch and validate a playable player. Rejects athletes with no
    /// professional team history.
    pub fn build_game_player(&self, player_id: &str) -> Result<GamePlayer, GameError> {
        let key = format!("player-{player_id}");
        if let Some(player) = self.cache.get::<GamePlayer>(&key) {
            return Ok(player);
        }

        let detail = self
            .source
            .athlete_detail(player_id)
            .map_err(|source| GameError::Build {
                player_id: player_id.to_string(),
                source,
            })?;
        let bio = self
            .source
            .athlete_bio(player_id)
            .map_err(|source| GameError::Build {
                player_id: player_id.to_string(),
                source,
            })?;

        let player = career::build_game_player(&detail, &bio)?;
        self.cache.set_with_ttl(&key, &player, PLAYER_TTL);
        Ok(player)
    }

    pub fn load_player_pool(&self, difficulty: Difficulty) -> Result<Vec<RosterPlayer>, GameError> {
        let key = format!("pool-{}", difficulty.key());
        if let Some(pool) = self.cache.get::<Vec<RosterPlayer>>(&key) {
            return Ok(pool);
        }

        let teams = self.teams().map_err(|source| GameError::PoolLoad {
            difficulty,
            source,
        })?;
        let players = pool::build_pool(
            self.source.as_ref(),
            &teams,
            difficulty,
            self.master_team_count,
            self.fetch_parallelism,
            &mut rand::thread_rng(),
        )
        .map_err(|source| GameError::PoolLoad { difficulty, source })?;

        // An empty pool usually means every team fetch failed; don't pin that for 12h.
        if !players.is_empty() {
            self.cache.set_with_ttl(&key, &players, POOL_TTL);
        }
        Ok(players)
    }

    pub fn search_players(&self, query: &str) -> Result<Vec<SearchResult>> {
        let query = query.trim();
        if !is_searchable(query) {
            return Ok(Vec::new());
        }
        let key = format!("search-{}", query.to_lowercase());
        if let Some(results) = self.cache.get::<Vec<SearchResult>>(&key) {
            return Ok(results);
        }
        let results = self.source.search(query, self.search_limit)?;
        self.cache.set_with_ttl(&key, &results, SEARCH_TTL);
        Ok(results)
    }
}
