use std::fs;
use std::path::PathBuf;

use gridiron_paths::career::build_game_player;
use gridiron_paths::espn::{
    headshot_url, parse_athlete_bio_json, parse_athlete_detail_json, parse_depth_chart_json,
    parse_roster_json, parse_search_json, parse_teams_json,
};
use gridiron_paths::model::StopKind;
use gridiron_paths::pool::{experienced_players, starters_from_depth_chart};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn parses_teams_fixture() {
    let raw = read_fixture("teams.json");
    let teams = parse_teams_json(&raw).expect("fixture should parse");
    assert_eq!(teams.len(), 3, "duplicate team ids are dropped");
    assert_eq!(teams[0].id, "12");
    assert_eq!(teams[0].abbreviation, "KC");
    assert!(teams[0].logo.ends_with("kc.png"));
    assert_eq!(teams[1].id, "28");
    assert_eq!(teams[1].name, "Washington Commanders");
    assert_eq!(teams[2].name, "Bills");
}

#[test]
fn parses_roster_fixture() {
    let raw = read_fixture("roster.json");
    let roster = parse_roster_json(&raw).expect("fixture should parse");
    assert_eq!(roster.len(), 3);
    assert_eq!(roster[0].full_name, "Patrick Mahomes");
    assert_eq!(roster[0].experience_years, 8);
    assert_eq!(roster[1].id, "4686453");
    assert_eq!(roster[1].headshot, headshot_url("4686453"));
    assert_eq!(roster[2].full_name, "Harrison Butker");
    assert_eq!(roster[2].experience_years, 8);

    let experienced = experienced_players(&roster);
    let ids: Vec<&str> = experienced.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["3139477", "15683"]);
}

#[test]
fn parses_depth_chart_fixture() {
    let raw = read_fixture("depth_chart.json");
    let chart = parse_depth_chart_json(&raw).expect("fixture should parse");

    let qb = chart.slot("qb").expect("qb slot");
    assert_eq!(qb.len(), 2);
    assert_eq!(qb[0].full_name, "Starter Quarterback");
    assert_eq!(chart.slot("wr1").expect("wr1")[0].id, "3");
    assert_eq!(chart.slot("wr1").expect("wr1")[0].headshot, "https://example.test/3.png");
    assert!(chart.slot("te").expect("te").is_empty());
    assert_eq!(chart.slot("pk").expect("pk")[0].id, "15683");
    let keys: Vec<&str> = chart.slots.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, vec!["qb", "te", "wr1", "pk"], "sorted within each group, first group wins");

    let starters = starters_from_depth_chart(&chart, &["qb", "rb", "wr1", "te"]);
    let ids: Vec<&str> = starters.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "3"]);
    assert_eq!(starters[0].position, "QB");
    assert_eq!(starters[1].position, "WR");
}

#[test]
fn parses_athlete_detail_and_bio_into_a_career() {
    let detail = parse_athlete_detail_json(&read_fixture("athlete_detail.json")).expect("detail");
    assert_eq!(detail.id, "3121422");
    assert_eq!(detail.position, "WR");
    let college = detail.college.clone().expect("college");
    assert_eq!(college.id.as_deref(), Some("194"));
    assert_eq!(college.name, "Ohio State");

    let bio = parse_athlete_bio_json(&read_fixture("athlete_bio.json")).expect("bio");
    assert_eq!(bio.team_history.len(), 3);
    assert_eq!(bio.team_history[2].team_id.as_deref(), Some("28"));

    let player = build_game_player(&detail, &bio).expect("playable");
    assert_eq!(player.career_path.len(), 2);
    assert_eq!(player.career_path[0].kind, StopKind::College);
    assert_eq!(player.career_path[0].name, "Ohio State");
    assert_eq!(player.career_path[1].kind, StopKind::Affiliation);
    assert_eq!(player.career_path[1].seasons, "2019-2024");
    assert_eq!(player.career_path[1].name, "Washington Commanders");
}

#[test]
fn parses_search_fixture() {
    let raw = read_fixture("search.json");
    let results = parse_search_json(&raw).expect("fixture should parse");
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].team_name, "Kansas City Chiefs");
    assert_eq!(results[1].id, "4372016");
    assert_eq!(results[1].team_name, "");
}

#[test]
fn empty_bodies_are_empty_not_errors() {
    assert!(parse_teams_json("").expect("teams").is_empty());
    assert!(parse_roster_json("null").expect("roster").is_empty());
    assert!(parse_athlete_bio_json("  ").expect("bio").team_history.is_empty());
    assert!(parse_athlete_detail_json("").is_err());
    assert!(parse_search_json("{not json").is_err());
}
