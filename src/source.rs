use anyhow::Result;

use crate::model::{AthleteBio, AthleteDetail, DepthChart, RosterRecord, SearchResult, TeamRecord};

/// Upstream player data. Every call may fail with a transient transport or
/// HTTP error; implementations apply their own retry policy.
pub trait PlayerDataSource: Send + Sync {
    fn list_teams(&self) -> Result<Vec<TeamRecord>>;
    fn roster(&self, team_id: &str) -> Result<Vec<RosterRecord>>;
    fn depth_chart(&self, team_id: &str) -> Result<DepthChart>;
    fn athlete_detail(&self, athlete_id: &str) -> Result<AthleteDetail>;
    fn athlete_bio(&self, athlete_id: &str) -> Result<AthleteBio>;
    fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>>;
}

/// Queries shorter than this (after trimming) never reach a data source.
pub const MIN_QUERY_LEN: usize = 2;

pub fn is_searchable(query: &str) -> bool {
    query.trim().chars().count() >= MIN_QUERY_LEN
}
