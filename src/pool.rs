use std::collections::HashSet;

use anyhow::Result;
use rand::Rng;
use rand::seq::SliceRandom;
use rayon::prelude::*;

use crate::model::{DepthChart, Difficulty, RosterPlayer, RosterRecord, TeamRecord};
use crate::source::PlayerDataSource;

const EASY_SLOTS: &[&str] = &["qb", "rb", "wr1", "wr2", "te"];
const MEDIUM_SLOTS: &[&str] = &[
    "qb", "rb", "wr1", "wr2", "te", "wr3", "lde", "rde", "mlb", "wlb", "slb",
];
const HARD_SLOTS: &[&str] = &[
    "qb", "rb", "wr1", "wr2", "te", "wr3", "lde", "rde", "mlb", "wlb", "slb", "lcb", "rcb", "fs",
    "ss", "ldt", "rdt", "nt", "pk", "p",
];

pub const MIN_EXPERIENCE_YEARS: u32 = 1;

/// How a tier sources its candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolStrategy {
    /// Starters at a fixed set of depth-chart slots across every team.
    DepthChart(&'static [&'static str]),
    /// Full rosters of a random subset of teams.
    RandomRosters,
}

pub fn pool_strategy(difficulty: Difficulty) -> PoolStrategy {
    match difficulty {
        Difficulty::Easy => PoolStrategy::DepthChart(EASY_SLOTS),
        Difficulty::Medium => PoolStrategy::DepthChart(MEDIUM_SLOTS),
        Difficulty::Hard => PoolStrategy::DepthChart(HARD_SLOTS),
        Difficulty::Master => PoolStrategy::RandomRosters,
    }
}

/// `wr2` -> `WR`, `lde` -> `LDE`.
pub fn slot_position(slot_key: &str) -> String {
    slot_key
        .trim()
        .trim_end_matches(|c: char| c.is_ascii_digit())
        .to_ascii_uppercase()
}

/// One team's contribution: the starter at each requested slot, each athlete
/// counted once even when listed at several slots.
pub fn starters_from_depth_chart(chart: &DepthChart, slots: &[&str]) -> Vec<RosterPlayer> {
    let mut seen = HashSet::new();
    let mut players = Vec::new();
    for slot in slots {
        let Some(starter) = chart.slot(slot).and_then(|athletes| athletes.first()) else {
            continue;
        };
        if !seen.insert(starter.id.clone()) {
            continue;
        }
        players.push(RosterPlayer {
            id: starter.id.clone(),
            full_name: starter.full_name.clone(),
            position: slot_position(slot),
            headshot: starter.headshot.clone(),
        });
    }
    players
}

pub fn experienced_players(roster: &[RosterRecord]) -> Vec<RosterPlayer> {
    roster
        .iter()
        .filter(|p| p.experience_years >= MIN_EXPERIENCE_YEARS)
        .map(|p| RosterPlayer {
            id: p.id.clone(),
            full_name: p.full_name.clone(),
            position: p.position.clone(),
            headshot: p.headshot.clone(),
        })
        .collect()
}

pub fn pick_random_teams<R: Rng + ?Sized>(
    teams: &[TeamRecord],
    count: usize,
    rng: &mut R,
) -> Vec<TeamRecord> {
    teams.choose_multiple(rng, count).cloned().collect()
}

/// Starters across every team. A team whose depth chart cannot be fetched
/// contributes nothing.
pub fn depth_chart_pool(
    source: &dyn PlayerDataSource,
    teams: &[TeamRecord],
    slots: &[&str],
    parallelism: usize,
) -> Vec<RosterPlayer> {
    let per_team: Vec<Vec<RosterPlayer>> = with_fetch_pool(parallelism, || {
        teams
            .par_iter()
            .map(|team| match source.depth_chart(&team.id) {
                Ok(chart) => starters_from_depth_chart(&chart, slots),
                Err(err) => {
                    log::warn!("{} depth chart fetch failed: {err:#}", team.name);
                    Vec::new()
                }
            })
            .collect()
    });
    per_team.into_iter().flatten().collect()
}

/// Experienced players from the given teams' full rosters. A failing roster
/// counts as empty.
pub fn roster_pool(
    source: &dyn PlayerDataSource,
    teams: &[TeamRecord],
    parallelism: usize,
) -> Vec<RosterPlayer> {
    let per_team: Vec<Vec<RosterPlayer>> = with_fetch_pool(parallelism, || {
        teams
            .par_iter()
            .map(|team| match source.roster(&team.id) {
                Ok(roster) => experienced_players(&roster),
                Err(err) => {
                    log::warn!("{} roster fetch failed: {err:#}", team.name);
                    Vec::new()
                }
            })
            .collect()
    });
    per_team.into_iter().flatten().collect()
}

/// Build the candidate pool for a tier from scratch. Only a failing team list
/// fails the whole build.
pub fn build_pool<R: Rng + ?Sized>(
    source: &dyn PlayerDataSource,
    teams: &[TeamRecord],
    difficulty: Difficulty,
    master_team_count: usize,
    parallelism: usize,
    rng: &mut R,
) -> Result<Vec<RosterPlayer>> {
    let pool = match pool_strategy(difficulty) {
        PoolStrategy::DepthChart(slots) => depth_chart_pool(source, teams, slots, parallelism),
        PoolStrategy::RandomRosters => {
            let selected = pick_random_teams(teams, master_team_count, rng);
            roster_pool(source, &selected, parallelism)
        }
    };
    log::info!("built {} pool with {} players", difficulty.key(), pool.len());
    Ok(pool)
}

fn with_fetch_pool<T>(threads: usize, action: impl FnOnce() -> T + Send) -> T
where
    T: Send,
{
    match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
        Ok(pool) => pool.install(action),
        Err(_) => action(),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        EASY_SLOTS, HARD_SLOTS, MEDIUM_SLOTS, PoolStrategy, pool_strategy, slot_position,
    };
    use crate::model::Difficulty;

    #[test]
    fn slot_keys_normalize_to_positions() {
        assert_eq!(slot_position("wr2"), "WR");
        assert_eq!(slot_position("qb"), "QB");
        assert_eq!(slot_position("lde"), "LDE");
        assert_eq!(slot_position("wr10"), "WR");
    }

    #[test]
    fn tiers_are_strict_supersets() {
        for (lower, higher) in [(EASY_SLOTS, MEDIUM_SLOTS), (MEDIUM_SLOTS, HARD_SLOTS)] {
            assert!(higher.len() > lower.len());
            assert!(lower.iter().all(|slot| higher.contains(slot)));
            assert_eq!(&higher[..lower.len()], lower);
        }
    }

    #[test]
    fn master_uses_rosters() {
        assert_eq!(pool_strategy(Difficulty::Master), PoolStrategy::RandomRosters);
        assert!(matches!(pool_strategy(Difficulty::Easy), PoolStrategy::DepthChart(slots) if slots.contains(&"qb")));
    }
}
