use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use anyhow::{Result, anyhow};

use crate::espn::headshot_url;
use crate::model::{
    AthleteBio, AthleteDetail, College, DepthChart, DepthChartAthlete, RosterRecord,
    SearchResult, TeamHistoryEntry, TeamRecord,
};
use crate::source::{PlayerDataSource, is_searchable};

#[derive(Default)]
pub struct FakeSource {
    teams: Vec<TeamRecord>,
    rosters: HashMap<String, Vec<RosterRecord>>,
    depth_charts: HashMap<String, DepthChart>,
    details: HashMap<String, AthleteDetail>,
    bios: HashMap<String, AthleteBio>,
    failing: Mutex<HashSet<String>>,
    calls: Mutex<HashMap<String, usize>>,
    search_delays: Mutex<HashMap<String, Duration>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_team(mut self, id: &str, name: &str) -> Self {
        self.teams.push(TeamRecord {
            id: id.to_string(),
            name: name.to_string(),
            abbreviation: name
                .split_whitespace()
                .last()
                .map(|w| w.chars().take(3).collect::<String>().to_ascii_uppercase())
                .unwrap_or_default(),
            logo: team_logo(id),
        });
        self
    }

    pub fn with_depth_chart(mut self, team_id: &str, chart: DepthChart) -> Self {
        self.depth_charts.insert(team_id.to_string(), chart);
        self
    }

    pub fn with_roster(mut self, team_id: &str, roster: Vec<RosterRecord>) -> Self {
        self.rosters.insert(team_id.to_string(), roster);
        self
    }

    pub fn with_athlete(mut self, detail: AthleteDetail, bio: AthleteBio) -> Self {
        self.bios.insert(detail.id.clone(), bio);
        self.details.insert(detail.id.clone(), detail);
        self
    }

    /// Make every call with this key fail until [`FakeSource::recover`].
    /// Keys: `teams`, `roster:<team>`, `depth_chart:<team>`, `athlete:<id>`,
    /// `search`.
    pub fn fail(&self, call_key: &str) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.insert(call_key.to_string());
        }
    }

    pub fn recover(&self, call_key: &str) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.remove(call_key);
        }
    }

    pub fn calls(&self, call_key: &str) -> usize {
        self.calls
            .lock()
            .map(|calls| calls.get(call_key).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Hold searches for `query` for `delay` before answering.
    pub fn delay_search(&self, query: &str, delay: Duration) {
        if let Ok(mut delays) = self.search_delays.lock() {
            delays.insert(query.to_lowercase(), delay);
        }
    }

    fn record(&self, call_key: &str) -> Result<()> {
        if let Ok(mut calls) = self.calls.lock() {
            *calls.entry(call_key.to_string()).or_insert(0) += 1;
        }
        let failing = self
            .failing
            .lock()
            .map(|failing| failing.contains(call_key))
            .unwrap_or(false);
        if failing {
            return Err(anyhow!("http 503: {call_key}"));
        }
        Ok(())
    }

    fn team_name(&self, team_id: &str) -> Option<&str> {
        self.teams
            .iter()
            .find(|t| t.id == team_id)
            .map(|t| t.name.as_str())
    }
}

impl PlayerDataSource for FakeSource {
    fn list_teams(&self) -> Result<Vec<TeamRecord>> {
        self.record("teams")?;
        Ok(self.teams.clone())
    }

    fn roster(&self, team_id: &str) -> Result<Vec<RosterRecord>> {
        self.record(&format!("roster:{team_id}"))?;
        Ok(self.rosters.get(team_id).cloned().unwrap_or_default())
    }

    fn depth_chart(&self, team_id: &str) -> Result<DepthChart> {
        self.record(&format!("depth_chart:{team_id}"))?;
        Ok(self.depth_charts.get(team_id).cloned().unwrap_or_default())
    }

    fn athlete_detail(&self, athlete_id: &str) -> Result<AthleteDetail> {
        self.record(&format!("athlete:{athlete_id}"))?;
        self.details
            .get(athlete_id)
            .cloned()
            .ok_or_else(|| anyhow!("http 404: athlete {athlete_id}"))
    }

    fn athlete_bio(&self, athlete_id: &str) -> Result<AthleteBio> {
        self.record(&format!("bio:{athlete_id}"))?;
        Ok(self.bios.get(athlete_id).cloned().unwrap_or_default())
    }

    fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        if !is_searchable(query) {
            return Ok(Vec::new());
        }
        let needle = query.trim().to_lowercase();
        let delay = self
            .search_delays
            .lock()
            .ok()
            .and_then(|delays| delays.get(&needle).copied());
        if let Some(delay) = delay {
            thread::sleep(delay);
        }
        self.record("search")?;

        let mut results: Vec<SearchResult> = self
            .details
            .values()
            .filter(|d| d.full_name.to_lowercase().contains(&needle))
            .map(|d| SearchResult {
                id: d.id.clone(),
                full_name: d.full_name.clone(),
                position: d.position.clone(),
                team_name: self
                    .bios
                    .get(&d.id)
                    .and_then(|bio| bio.team_history.first())
                    .and_then(|entry| entry.team_id.as_deref())
                    .and_then(|id| self.team_name(id))
                    .unwrap_or_default()
                    .to_string(),
                headshot: d.headshot.clone(),
            })
            .collect();
        results.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        results.truncate(limit);
        Ok(results)
    }
}

pub fn team_logo(team_id: &str) -> String {
    format!("https://a.espncdn.com/i/teamlogos/nfl/500/{team_id}.png")
}

pub fn history_entry(team_id: &str, name: &str, seasons: &str) -> TeamHistoryEntry {
    TeamHistoryEntry {
        team_id: Some(team_id.to_string()),
        name: name.to_string(),
        logo: team_logo(team_id),
        seasons: seasons.to_string(),
    }
}

pub fn athlete(id: &str, name: &str, position: &str, college: Option<(&str, &str)>) -> AthleteDetail {
    AthleteDetail {
        id: id.to_string(),
        full_name: name.to_string(),
        headshot: headshot_url(id),
        position: position.to_string(),
        college: college.map(|(college_id, college_name)| College {
            id: Some(college_id.to_string()),
            name: college_name.to_string(),
        }),
    }
}

pub fn depth_chart(slots: &[(&str, &[(&str, &str)])]) -> DepthChart {
    DepthChart {
        slots: slots
            .iter()
            .map(|(key, athletes)| {
                (
                    key.to_string(),
                    athletes
                        .iter()
                        .map(|(id, name)| DepthChartAthlete {
                            id: id.to_string(),
                            full_name: name.to_string(),
                            headshot: headshot_url(id),
                        })
                        .collect(),
                )
            })
            .collect(),
    }
}

struct SeedPlayer {
    id: &'static str,
    name: &'static str,
    position: &'static str,
    slot: &'static str,
    college: Option<(&'static str, &'static str)>,
    /// Newest first, as the bio endpoint returns it.
    history: &'static [(&'static str, &'static str, &'static str)],
}

const SEED_TEAMS: &[(&str, &str)] = &[
    ("12", "Kansas City Chiefs"),
    ("2", "Buffalo Bills"),
    ("21", "Philadelphia Eagles"),
    ("25", "San Francisco 49ers"),
    ("14", "Los Angeles Rams"),
    ("28", "Washington Commanders"),
];

const SEED_PLAYERS: &[(&str, SeedPlayer)] = &[
    ("12", SeedPlayer { id: "3139477", name: "Patrick Mahomes", position: "QB", slot: "qb", college: Some(("2641", "Texas Tech")), history: &[("12", "Kansas City Chiefs", "2017-2024")] }),
    ("12", SeedPlayer { id: "15847", name: "Travis Kelce", position: "TE", slot: "te", college: Some(("2132", "Cincinnati")), history: &[("12", "Kansas City Chiefs", "2013-2024")] }),
    ("12", SeedPlayer { id: "4361529", name: "Isiah Pacheco", position: "RB", slot: "rb", college: Some(("164", "Rutgers")), history: &[("12", "Kansas City Chiefs", "2022-2024")] }),
    ("2", SeedPlayer { id: "3918298", name: "Josh Allen", position: "QB", slot: "qb", college: Some(("2751", "Wyoming")), history: &[("2", "Buffalo Bills", "2018-2024")] }),
    ("2", SeedPlayer { id: "4379399", name: "James Cook", position: "RB", slot: "rb", college: Some(("61", "Georgia")), history: &[("2", "Buffalo Bills", "2022-2024")] }),
    ("2", SeedPlayer { id: "2976212", name: "Stefon Diggs", position: "WR", slot: "wr1", college: Some(("120", "Maryland")), history: &[("34", "Houston Texans", "2024"), ("2", "Buffalo Bills", "2020-2023"), ("16", "Minnesota Vikings", "2015-2019")] }),
    ("21", SeedPlayer { id: "4040715", name: "Jalen Hurts", position: "QB", slot: "qb", college: Some(("201", "Oklahoma")), history: &[("21", "Philadelphia Eagles", "2020-2024")] }),
    ("21", SeedPlayer { id: "3929630", name: "Saquon Barkley", position: "RB", slot: "rb", college: Some(("213", "Penn State")), history: &[("21", "Philadelphia Eagles", "2024"), ("19", "New York Giants", "2018-2023")] }),
    ("21", SeedPlayer { id: "4047646", name: "A.J. Brown", position: "WR", slot: "wr1", college: Some(("145", "Ole Miss")), history: &[("21", "Philadelphia Eagles", "2022-2024"), ("10", "Tennessee Titans", "2019-2021")] }),
    ("25", SeedPlayer { id: "4361741", name: "Brock Purdy", position: "QB", slot: "qb", college: Some(("66", "Iowa State")), history: &[("25", "San Francisco 49ers", "2022-2024")] }),
    ("25", SeedPlayer { id: "3117251", name: "Christian McCaffrey", position: "RB", slot: "rb", college: Some(("24", "Stanford")), history: &[("25", "San Francisco 49ers", "2022-2024"), ("29", "Carolina Panthers", "2017-2022")] }),
    ("25", SeedPlayer { id: "9000001", name: "Jordan Walkon", position: "WR", slot: "wr2", college: Some(("2", "Auburn")), history: &[] }),
    ("14", SeedPlayer { id: "12483", name: "Matthew Stafford", position: "QB", slot: "qb", college: Some(("61", "Georgia")), history: &[("14", "Los Angeles Rams", "2021-2024"), ("8", "Detroit Lions", "2009-2020")] }),
    ("14", SeedPlayer { id: "4426515", name: "Puka Nacua", position: "WR", slot: "wr1", college: Some(("252", "BYU")), history: &[("14", "Los Angeles Rams", "2023-2024")] }),
    ("28", SeedPlayer { id: "3121422", name: "Terry McLaurin", position: "WR", slot: "wr1", college: Some(("194", "Ohio State")), history: &[("28", "Washington Commanders", "2022-2024"), ("28", "Washington Football Team", "2020-2021"), ("28", "Washington Redskins", "2019")] }),
    ("28", SeedPlayer { id: "4432577", name: "Jayden Daniels", position: "QB", slot: "qb", college: Some(("99", "LSU")), history: &[("28", "Washington Commanders", "2024")] }),
];

impl FakeSource {
    /// A small offline league: six teams, starters at the skill positions,
    /// one undrafted rookie with no professional history.
    pub fn seeded() -> Self {
        let mut source = FakeSource::new();
        for (id, name) in SEED_TEAMS {
            source = source.with_team(id, name);
        }

        for (team_id, _) in SEED_TEAMS {
            let players: Vec<&SeedPlayer> = SEED_PLAYERS
                .iter()
                .filter(|(t, _)| t == team_id)
                .map(|(_, p)| p)
                .collect();

            let chart = DepthChart {
                slots: players
                    .iter()
                    .map(|p| {
                        (
                            p.slot.to_string(),
                            vec![DepthChartAthlete {
                                id: p.id.to_string(),
                                full_name: p.name.to_string(),
                                headshot: headshot_url(p.id),
                            }],
                        )
                    })
                    .collect(),
            };
            let roster = players
                .iter()
                .map(|p| RosterRecord {
                    id: p.id.to_string(),
                    full_name: p.name.to_string(),
                    position: p.position.to_string(),
                    headshot: headshot_url(p.id),
                    experience_years: seasons_played(p.history),
                })
                .collect();
            source = source
                .with_depth_chart(team_id, chart)
                .with_roster(team_id, roster);
        }

        for (_, p) in SEED_PLAYERS {
            let detail = athlete(p.id, p.name, p.position, p.college);
            let bio = AthleteBio {
                team_history: p
                    .history
                    .iter()
                    .map(|(team_id, name, seasons)| history_entry(team_id, name, seasons))
                    .collect(),
            };
            source = source.with_athlete(detail, bio);
        }
        source
    }
}

fn seasons_played(history: &[(&str, &str, &str)]) -> u32 {
    let years: Vec<i32> = history
        .iter()
        .flat_map(|(_, _, seasons)| seasons.split('-'))
        .filter_map(|y| y.trim().parse::<i32>().ok())
        .collect();
    match (years.iter().min(), years.iter().max()) {
        (Some(min), Some(max)) => u32::try_from(max - min).unwrap_or(0),
        _ => 0,
    }
}
