use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopKind {
    College,
    Affiliation,
}

/// One entry of a player's chronological history, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CareerStop {
    pub kind: StopKind,
    pub name: String,
    pub logo: String,
    /// Empty for college stops, otherwise `"2019"` or `"2019-2023"`.
    pub seasons: String,
    #[serde(default)]
    pub team_id: Option<String>,
}

impl CareerStop {
    pub fn is_affiliation(&self) -> bool {
        self.kind == StopKind::Affiliation
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GamePlayer {
    pub id: String,
    pub full_name: String,
    pub headshot: String,
    pub position: String,
    pub career_path: Vec<CareerStop>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterPlayer {
    pub id: String,
    pub full_name: String,
    pub position: String,
    pub headshot: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub full_name: String,
    pub position: String,
    pub team_name: String,
    pub headshot: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
    Master,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::Master,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Master => "master",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
            Difficulty::Master => "Master",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Difficulty::Easy => Difficulty::Medium,
            Difficulty::Medium => Difficulty::Hard,
            Difficulty::Hard => Difficulty::Master,
            Difficulty::Master => Difficulty::Easy,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StreakData {
    pub current: u32,
    pub best: u32,
}

// Normalized upstream records. These are what a `PlayerDataSource` hands back,
// independent of the provider's wire shapes.

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRecord {
    pub id: String,
    pub name: String,
    pub abbreviation: String,
    pub logo: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterRecord {
    pub id: String,
    pub full_name: String,
    pub position: String,
    pub headshot: String,
    pub experience_years: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthChartAthlete {
    pub id: String,
    pub full_name: String,
    pub headshot: String,
}

/// Slot key (e.g. `qb`, `wr2`) to athletes in depth order. Groups keep the
/// provider's order; slots within a group are sorted by key. Lookups go
/// through [`DepthChart::slot`], so slot order never matters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthChart {
    pub slots: Vec<(String, Vec<DepthChartAthlete>)>,
}

impl DepthChart {
    pub fn slot(&self, key: &str) -> Option<&[DepthChartAthlete]> {
        self.slots
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, athletes)| athletes.as_slice())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct College {
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AthleteDetail {
    pub id: String,
    pub full_name: String,
    pub headshot: String,
    pub position: String,
    pub college: Option<College>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamHistoryEntry {
    pub team_id: Option<String>,
    /// Empty when the provider omitted it.
    pub name: String,
    pub logo: String,
    pub seasons: String,
}

/// Team history arrives newest-first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AthleteBio {
    pub team_history: Vec<TeamHistoryEntry>,
}
