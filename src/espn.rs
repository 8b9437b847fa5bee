use anyhow::{Context, Result, anyhow};
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::config::{GameConfig, RetryPolicy};
use crate::http_client::http_client;
use crate::model::{
    AthleteBio, AthleteDetail, College, DepthChart, DepthChartAthlete, RosterRecord,
    SearchResult, TeamHistoryEntry, TeamRecord,
};
use crate::retry::with_retry;
use crate::source::{PlayerDataSource, is_searchable};

const NFL_SITE_PATH: &str = "site/v2/sports/football/nfl";
const NFL_ATHLETES_PATH: &str = "common/v3/sports/football/nfl/athletes";
const HEADSHOT_URL: &str = "https://a.espncdn.com/i/headshots/nfl/players/full";
const COLLEGE_LOGO_URL: &str = "https://a.espncdn.com/i/teamlogos/ncaa/500";

pub struct EspnSource {
    client: &'static Client,
    site_base: String,
    web_base: String,
    retry: RetryPolicy,
}

impl EspnSource {
    pub fn from_config(config: &GameConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(config.http_timeout)?,
            site_base: config.site_base.clone(),
            web_base: config.web_base.clone(),
            retry: config.retry,
        })
    }

    fn fetch_body(&self, url: &str, query: &[(&str, &str)]) -> Result<String> {
        let resp = self
            .client
            .get(url)
            .query(query)
            .send()
            .context("request failed")?;
        let status = resp.status();
        let body = resp.text().context("failed reading body")?;
        if !status.is_success() {
            return Err(anyhow!("http {status}: {url}"));
        }
        Ok(body)
    }

    fn fetch_parsed<T>(
        &self,
        label: &str,
        url: &str,
        query: &[(&str, &str)],
        parse: impl Fn(&str) -> Result<T>,
    ) -> Result<T> {
        with_retry(self.retry, label, || {
            let body = self.fetch_body(url, query)?;
            parse(&body)
        })
        .with_context(|| format!("{label} fetch failed"))
    }
}

impl PlayerDataSource for EspnSource {
    fn list_teams(&self) -> Result<Vec<TeamRecord>> {
        let url = format!("{}/{NFL_SITE_PATH}/teams", self.site_base);
        self.fetch_parsed("teams", &url, &[], parse_teams_json)
    }

    fn roster(&self, team_id: &str) -> Result<Vec<RosterRecord>> {
        let url = format!("{}/{NFL_SITE_PATH}/teams/{team_id}/roster", self.site_base);
        self.fetch_parsed("roster", &url, &[], parse_roster_json)
    }

    fn depth_chart(&self, team_id: &str) -> Result<DepthChart> {
        let url = format!("{}/{NFL_SITE_PATH}/teams/{team_id}/depthcharts", self.site_base);
        self.fetch_parsed("depth chart", &url, &[], parse_depth_chart_json)
    }

    fn athlete_detail(&self, athlete_id: &str) -> Result<AthleteDetail> {
        let url = format!("{}/{NFL_ATHLETES_PATH}/{athlete_id}", self.site_base);
        self.fetch_parsed("athlete detail", &url, &[], parse_athlete_detail_json)
    }

    fn athlete_bio(&self, athlete_id: &str) -> Result<AthleteBio> {
        let url = format!("{}/{NFL_ATHLETES_PATH}/{athlete_id}/bio", self.web_base);
        self.fetch_parsed("athlete bio", &url, &[], parse_athlete_bio_json)
    }

    fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        if !is_searchable(query) {
            return Ok(Vec::new());
        }
        let url = format!("{}/common/v3/search", self.site_base);
        let limit = limit.to_string();
        let params = [
            ("query", query.trim()),
            ("limit", limit.as_str()),
            ("type", "player"),
            ("sport", "football"),
            ("league", "nfl"),
        ];
        self.fetch_parsed("search", &url, &params, parse_search_json)
    }
}

pub fn headshot_url(athlete_id: &str) -> String {
    format!("{HEADSHOT_URL}/{athlete_id}.png")
}

pub fn college_logo_url(college_id: &str) -> String {
    format!("{COLLEGE_LOGO_URL}/{college_id}.png")
}

fn trimmed_body(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        None
    } else {
        Some(trimmed)
    }
}

pub fn parse_teams_json(raw: &str) -> Result<Vec<TeamRecord>> {
    let Some(trimmed) = trimmed_body(raw) else {
        return Ok(Vec::new());
    };
    let parsed: TeamsResponse = serde_json::from_str(trimmed).context("invalid teams json")?;
    let teams = parsed
        .sports
        .into_iter()
        .next()
        .and_then(|sport| sport.leagues.into_iter().next())
        .map(|league| league.teams)
        .unwrap_or_default();

    let mut seen = std::collections::HashSet::new();
    Ok(teams
        .into_iter()
        .filter_map(|wrapper| {
            let team = wrapper.team;
            if team.id.is_empty() || !seen.insert(team.id.clone()) {
                return None;
            }
            Some(TeamRecord {
                name: non_empty(team.display_name)
                    .or_else(|| non_empty(team.name))
                    .unwrap_or_else(|| "Unknown Team".to_string()),
                abbreviation: team.abbreviation.unwrap_or_default(),
                logo: team
                    .logos
                    .into_iter()
                    .next()
                    .map(|l| l.href)
                    .unwrap_or_default(),
                id: team.id,
            })
        })
        .collect())
}

pub fn parse_roster_json(raw: &str) -> Result<Vec<RosterRecord>> {
    let Some(trimmed) = trimmed_body(raw) else {
        return Ok(Vec::new());
    };
    let parsed: RosterResponse = serde_json::from_str(trimmed).context("invalid roster json")?;
    // Rosters are grouped into offense, defense and special teams sections.
    Ok(parsed
        .athletes
        .into_iter()
        .flat_map(|section| section.items)
        .filter(|item| !item.id.is_empty())
        .map(|item| RosterRecord {
            headshot: item
                .headshot
                .map(|h| h.href)
                .and_then(non_empty)
                .unwrap_or_else(|| headshot_url(&item.id)),
            full_name: non_empty(item.display_name)
                .or_else(|| non_empty(item.full_name))
                .unwrap_or_else(|| "Unknown".to_string()),
            position: item.position.map(|p| p.abbreviation).unwrap_or_default(),
            experience_years: item.experience.map(|e| e.years).unwrap_or(0),
            id: item.id,
        })
        .collect())
}

pub fn parse_depth_chart_json(raw: &str) -> Result<DepthChart> {
    let Some(trimmed) = trimmed_body(raw) else {
        return Ok(DepthChart::default());
    };
    let parsed: DepthChartResponse =
        serde_json::from_str(trimmed).context("invalid depth chart json")?;

    let mut chart = DepthChart::default();
    for group in parsed.depthchart {
        for (key, slot) in group.positions {
            let key = key.trim().to_ascii_lowercase();
            if chart.slots.iter().any(|(existing, _)| *existing == key) {
                continue;
            }
            let athletes = slot
                .athletes
                .into_iter()
                .filter(|a| !a.id.is_empty())
                .map(|a| DepthChartAthlete {
                    headshot: a
                        .headshot
                        .map(|h| h.href)
                        .and_then(non_empty)
                        .unwrap_or_else(|| headshot_url(&a.id)),
                    full_name: non_empty(a.display_name)
                        .or_else(|| non_empty(a.full_name))
                        .unwrap_or_else(|| "Unknown".to_string()),
                    id: a.id,
                })
                .collect();
            chart.slots.push((key, athletes));
        }
    }
    Ok(chart)
}

pub fn parse_athlete_detail_json(raw: &str) -> Result<AthleteDetail> {
    let trimmed = trimmed_body(raw).ok_or_else(|| anyhow!("empty athlete response"))?;
    let parsed: AthleteDetailResponse =
        serde_json::from_str(trimmed).context("invalid athlete json")?;
    // The common/v3 endpoint wraps the record in `athlete`; older payloads are flat.
    let athlete = match parsed.athlete {
        Some(athlete) => athlete,
        None => serde_json::from_str::<EspnAthlete>(trimmed).context("invalid athlete json")?,
    };
    if athlete.id.is_empty() {
        return Err(anyhow!("athlete response without id"));
    }

    let college = athlete.college.map(|c| College {
        id: non_empty(c.id),
        name: non_empty(c.name)
            .or_else(|| non_empty(c.short_name))
            .unwrap_or_else(|| "Unknown College".to_string()),
    });

    Ok(AthleteDetail {
        headshot: athlete
            .headshot
            .map(|h| h.href)
            .and_then(non_empty)
            .unwrap_or_else(|| headshot_url(&athlete.id)),
        full_name: non_empty(athlete.display_name)
            .or_else(|| non_empty(athlete.full_name))
            .unwrap_or_else(|| "Unknown".to_string()),
        position: athlete.position.map(|p| p.abbreviation).unwrap_or_default(),
        college,
        id: athlete.id,
    })
}

pub fn parse_athlete_bio_json(raw: &str) -> Result<AthleteBio> {
    let Some(trimmed) = trimmed_body(raw) else {
        return Ok(AthleteBio::default());
    };
    let parsed: BioResponse = serde_json::from_str(trimmed).context("invalid bio json")?;
    Ok(AthleteBio {
        team_history: parsed
            .team_history
            .into_iter()
            .map(|entry| TeamHistoryEntry {
                team_id: non_empty(entry.id),
                name: non_empty(entry.display_name).unwrap_or_default(),
                logo: entry.logo,
                seasons: entry.seasons.trim().to_string(),
            })
            .collect(),
    })
}

pub fn parse_search_json(raw: &str) -> Result<Vec<SearchResult>> {
    let Some(trimmed) = trimmed_body(raw) else {
        return Ok(Vec::new());
    };
    let parsed: SearchResponse = serde_json::from_str(trimmed).context("invalid search json")?;
    Ok(parsed
        .items
        .into_iter()
        .filter(|item| !item.id.is_empty())
        .map(|item| SearchResult {
            headshot: item
                .headshot
                .map(|h| h.href)
                .and_then(non_empty)
                .unwrap_or_else(|| headshot_url(&item.id)),
            full_name: non_empty(item.display_name).unwrap_or_else(|| "Unknown".to_string()),
            position: item.position.map(|p| p.abbreviation).unwrap_or_default(),
            team_name: item
                .team_relationships
                .into_iter()
                .next()
                .map(|rel| rel.display_name)
                .unwrap_or_default(),
            id: item.id,
        })
        .collect())
}

fn non_empty(value: impl Into<Option<String>>) -> Option<String> {
    value
        .into()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// ESPN ids show up both as strings and as numbers.
fn id_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s.trim().to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

fn opt_id_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    id_string(deserializer).map(Some)
}

fn years_or_zero<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()).unwrap_or(0),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

#[derive(Debug, Deserialize)]
struct TeamsResponse {
    #[serde(default)]
    sports: Vec<EspnSport>,
}

#[derive(Debug, Deserialize)]
struct EspnSport {
    #[serde(default)]
    leagues: Vec<EspnLeague>,
}

#[derive(Debug, Deserialize)]
struct EspnLeague {
    #[serde(default)]
    teams: Vec<EspnTeamWrapper>,
}

#[derive(Debug, Deserialize)]
struct EspnTeamWrapper {
    team: EspnTeam,
}

#[derive(Debug, Deserialize)]
struct EspnTeam {
    #[serde(default, deserialize_with = "id_string")]
    id: String,
    #[serde(rename = "displayName")]
    display_name: Option<String>,
    name: Option<String>,
    abbreviation: Option<String>,
    #[serde(default)]
    logos: Vec<EspnHref>,
}

#[derive(Debug, Deserialize)]
struct EspnHref {
    #[serde(default)]
    href: String,
}

#[derive(Debug, Deserialize)]
struct EspnPosition {
    #[serde(default)]
    abbreviation: String,
}

#[derive(Debug, Deserialize)]
struct EspnExperience {
    #[serde(default, deserialize_with = "years_or_zero")]
    years: u32,
}

#[derive(Debug, Deserialize)]
struct RosterResponse {
    #[serde(default)]
    athletes: Vec<RosterSection>,
}

#[derive(Debug, Deserialize)]
struct RosterSection {
    #[serde(default)]
    items: Vec<RosterItem>,
}

#[derive(Debug, Deserialize)]
struct RosterItem {
    #[serde(default, deserialize_with = "id_string")]
    id: String,
    #[serde(rename = "displayName")]
    display_name: Option<String>,
    #[serde(rename = "fullName")]
    full_name: Option<String>,
    position: Option<EspnPosition>,
    headshot: Option<EspnHref>,
    experience: Option<EspnExperience>,
}

#[derive(Debug, Deserialize)]
struct DepthChartResponse {
    #[serde(default)]
    depthchart: Vec<DepthChartGroup>,
}

#[derive(Debug, Deserialize)]
struct DepthChartGroup {
    #[serde(default)]
    positions: std::collections::BTreeMap<String, DepthChartSlot>,
}

#[derive(Debug, Deserialize)]
struct DepthChartSlot {
    #[serde(default)]
    athletes: Vec<DepthChartItem>,
}

#[derive(Debug, Deserialize)]
struct DepthChartItem {
    #[serde(default, deserialize_with = "id_string")]
    id: String,
    #[serde(rename = "displayName")]
    display_name: Option<String>,
    #[serde(rename = "fullName")]
    full_name: Option<String>,
    headshot: Option<EspnHref>,
}

#[derive(Debug, Deserialize)]
struct AthleteDetailResponse {
    athlete: Option<EspnAthlete>,
}

#[derive(Debug, Deserialize)]
struct EspnAthlete {
    #[serde(default, deserialize_with = "id_string")]
    id: String,
    #[serde(rename = "displayName")]
    display_name: Option<String>,
    #[serde(rename = "fullName")]
    full_name: Option<String>,
    headshot: Option<EspnHref>,
    position: Option<EspnPosition>,
    college: Option<EspnCollege>,
}

#[derive(Debug, Deserialize)]
struct EspnCollege {
    #[serde(default, deserialize_with = "opt_id_string")]
    id: Option<String>,
    name: Option<String>,
    #[serde(rename = "shortName")]
    short_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BioResponse {
    #[serde(rename = "teamHistory", default)]
    team_history: Vec<BioTeamEntry>,
}

#[derive(Debug, Deserialize)]
struct BioTeamEntry {
    #[serde(default, deserialize_with = "opt_id_string")]
    id: Option<String>,
    #[serde(rename = "displayName")]
    display_name: Option<String>,
    #[serde(default)]
    logo: String,
    #[serde(default)]
    seasons: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default, deserialize_with = "id_string")]
    id: String,
    #[serde(rename = "displayName")]
    display_name: Option<String>,
    position: Option<EspnPosition>,
    headshot: Option<EspnHref>,
    #[serde(rename = "teamRelationships", default)]
    team_relationships: Vec<SearchTeamRelationship>,
}

#[derive(Debug, Deserialize)]
struct SearchTeamRelationship {
    #[serde(rename = "displayName", default)]
    display_name: String,
}

#[cfg(test)]
mod tests {
    use super::{parse_athlete_detail_json, parse_search_json, parse_teams_json};

    #[test]
    fn numeric_ids_become_strings() {
        let raw = r#"{"sports":[{"leagues":[{"teams":[{"team":{"id":12,"displayName":"Kansas City Chiefs"}}]}]}]}"#;
        let teams = parse_teams_json(raw).expect("teams");
        assert_eq!(teams.len(), 1);
        assert_eq!(teams[0].id, "12");
        assert!(teams[0].logo.is_empty());
    }

    #[test]
    fn flat_athlete_payload_is_accepted() {
        let raw = r#"{"id":"3139477","displayName":"Patrick Mahomes"}"#;
        let detail = parse_athlete_detail_json(raw).expect("detail");
        assert_eq!(detail.id, "3139477");
        assert_eq!(
            detail.headshot,
            "https://a.espncdn.com/i/headshots/nfl/players/full/3139477.png"
        );
        assert!(detail.college.is_none());
    }

    #[test]
    fn search_skips_items_without_id() {
        let raw = r#"{"items":[{"displayName":"No Id"},{"id":"1","displayName":"Has Id"}]}"#;
        let results = parse_search_json(raw).expect("search");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].full_name, "Has Id");
        assert!(results[0].team_name.is_empty());
    }

    #[test]
    fn null_bodies_are_empty() {
        assert!(parse_teams_json("null").expect("teams").is_empty());
        assert!(parse_search_json("").expect("search").is_empty());
        assert!(parse_athlete_detail_json("null").is_err());
    }
}
