use crate::error::GameError;
use crate::espn::college_logo_url;
use crate::model::{
    AthleteBio, AthleteDetail, CareerStop, GamePlayer, StopKind, TeamHistoryEntry,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeasonSpan {
    pub start: i32,
    pub end: i32,
    pub ongoing: bool,
}

impl SeasonSpan {
    /// Accepts `"2020"`, `"2020-2023"` and `"2020-Present"`. A missing end
    /// year reuses the start year.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let (start_raw, end_raw) = match raw.split_once('-') {
            Some((start, end)) => (start.trim(), Some(end.trim())),
            None => (raw, None),
        };
        let start = start_raw.parse::<i32>().ok()?;
        match end_raw {
            None | Some("") => Some(Self {
                start,
                end: start,
                ongoing: false,
            }),
            Some(end) if end.eq_ignore_ascii_case("present") || end.eq_ignore_ascii_case("current") => {
                Some(Self {
                    start,
                    end: start,
                    ongoing: true,
                })
            }
            Some(end) => {
                let end = end.parse::<i32>().ok()?;
                Some(Self {
                    start: start.min(end),
                    end: start.max(end),
                    ongoing: false,
                })
            }
        }
    }

    pub fn merge(self, other: SeasonSpan) -> SeasonSpan {
        SeasonSpan {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
            ongoing: self.ongoing || other.ongoing,
        }
    }

    pub fn format(&self) -> String {
        if self.ongoing {
            format!("{}-Present", self.start)
        } else {
            format_season_range(self.start, self.end)
        }
    }
}

pub fn format_season_range(start: i32, end: i32) -> String {
    if start == end {
        start.to_string()
    } else {
        format!("{start}-{end}")
    }
}

const UNKNOWN_TEAM: &str = "Unknown Team";

struct Stint {
    team_id: Option<String>,
    name: String,
    logo: String,
    span: Option<SeasonSpan>,
    raw_seasons: String,
}

impl Stint {
    fn from_entry(entry: &TeamHistoryEntry) -> Self {
        Self {
            team_id: entry.team_id.clone(),
            name: entry.name.clone(),
            logo: entry.logo.clone(),
            span: SeasonSpan::parse(&entry.seasons),
            raw_seasons: entry.seasons.trim().to_string(),
        }
    }

    fn same_team(&self, entry: &TeamHistoryEntry) -> bool {
        matches!((&self.team_id, &entry.team_id), (Some(a), Some(b)) if a == b)
    }

    /// `entry` is chronologically later, so its branding wins.
    fn absorb(&mut self, entry: &TeamHistoryEntry) {
        if !entry.name.trim().is_empty() {
            self.name = entry.name.clone();
        }
        if !entry.logo.trim().is_empty() {
            self.logo = entry.logo.clone();
        }
        self.span = match (self.span, SeasonSpan::parse(&entry.seasons)) {
            (Some(ours), Some(theirs)) => Some(ours.merge(theirs)),
            (None, theirs) => theirs,
            (ours, None) => ours,
        };
    }

    fn into_stop(self) -> CareerStop {
        let name = if self.name.trim().is_empty() {
            UNKNOWN_TEAM.to_string()
        } else {
            self.name
        };
        CareerStop {
            kind: StopKind::Affiliation,
            name,
            logo: self.logo,
            seasons: self.span.map(|s| s.format()).unwrap_or(self.raw_seasons),
            team_id: self.team_id,
        }
    }
}

/// Reverse a newest-first team history into chronological stops, merging
/// consecutive entries that share a team id.
pub fn merge_team_history(newest_first: &[TeamHistoryEntry]) -> Vec<CareerStop> {
    let mut stints: Vec<Stint> = Vec::new();
    for entry in newest_first.iter().rev() {
        match stints.last_mut() {
            Some(last) if last.same_team(entry) => last.absorb(entry),
            _ => stints.push(Stint::from_entry(entry)),
        }
    }
    stints.into_iter().map(Stint::into_stop).collect()
}

pub fn build_career_path(
    detail: &AthleteDetail,
    bio: &AthleteBio,
) -> Result<Vec<CareerStop>, GameError> {
    let mut path = Vec::new();

    if let Some(college) = &detail.college {
        path.push(CareerStop {
            kind: StopKind::College,
            name: college.name.clone(),
            logo: college
                .id
                .as_deref()
                .map(college_logo_url)
                .unwrap_or_default(),
            seasons: String::new(),
            team_id: None,
        });
    }

    path.extend(merge_team_history(&bio.team_history));

    if !path.iter().any(CareerStop::is_affiliation) {
        return Err(GameError::not_playable(&detail.id, "no professional team history"));
    }
    Ok(path)
}

pub fn build_game_player(detail: &AthleteDetail, bio: &AthleteBio) -> Result<GamePlayer, GameError> {
    let career_path = build_career_path(detail, bio)?;
    Ok(GamePlayer {
        id: detail.id.clone(),
        full_name: detail.full_name.clone(),
        headshot: detail.headshot.clone(),
        position: detail.position.clone(),
        career_path,
    })
}

#[cfg(test)]
mod tests {
    use super::{SeasonSpan, format_season_range};

    #[test]
    fn season_formats() {
        assert_eq!(format_season_range(2022, 2022), "2022");
        assert_eq!(format_season_range(2019, 2023), "2019-2023");
    }

    #[test]
    fn season_parse_variants() {
        assert_eq!(
            SeasonSpan::parse("2022"),
            Some(SeasonSpan { start: 2022, end: 2022, ongoing: false })
        );
        assert_eq!(
            SeasonSpan::parse(" 2018 - 2020 "),
            Some(SeasonSpan { start: 2018, end: 2020, ongoing: false })
        );
        assert_eq!(
            SeasonSpan::parse("2021-"),
            Some(SeasonSpan { start: 2021, end: 2021, ongoing: false })
        );
        assert_eq!(SeasonSpan::parse("2017-Present").map(|s| s.format()).as_deref(), Some("2017-Present"));
        assert_eq!(SeasonSpan::parse(""), None);
        assert_eq!(SeasonSpan::parse("rookie"), None);
    }

    #[test]
    fn merge_keeps_earliest_start_and_latest_end() {
        let a = SeasonSpan::parse("2020-2021").expect("span");
        let b = SeasonSpan::parse("2022").expect("span");
        assert_eq!(a.merge(b).format(), "2020-2022");
    }
}
