use gridiron_paths::career::{build_career_path, merge_team_history};
use gridiron_paths::error::GameError;
use gridiron_paths::espn::parse_athlete_bio_json;
use gridiron_paths::fake_source::{athlete, history_entry};
use gridiron_paths::model::{AthleteBio, StopKind, TeamHistoryEntry};

fn bio(entries: Vec<TeamHistoryEntry>) -> AthleteBio {
    AthleteBio {
        team_history: entries,
    }
}

#[test]
fn consecutive_same_team_entries_merge_into_one_stop() {
    // Newest first, as the bio endpoint returns it.
    let stops = merge_team_history(&[
        history_entry("7", "Team X", "2022"),
        history_entry("7", "Team X", "2020-2021"),
    ]);
    assert_eq!(stops.len(), 1);
    assert_eq!(stops[0].seasons, "2020-2022");
    assert_eq!(stops[0].team_id.as_deref(), Some("7"));
}

#[test]
fn returning_to_a_team_is_a_new_stop() {
    let stops = merge_team_history(&[
        history_entry("1", "Team A", "2023-2024"),
        history_entry("2", "Team B", "2021-2022"),
        history_entry("1", "Team A", "2018-2020"),
    ]);
    let names: Vec<&str> = stops.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Team A", "Team B", "Team A"]);
    assert_eq!(stops[0].seasons, "2018-2020");
    assert_eq!(stops[2].seasons, "2023-2024");
}

#[test]
fn merged_history_has_no_adjacent_duplicates() {
    let entries = vec![
        history_entry("3", "C", "2024"),
        history_entry("3", "C", "2023"),
        history_entry("2", "B", "2022"),
        history_entry("1", "A", "2021"),
        history_entry("1", "A", "2020"),
        history_entry("1", "A", "2019"),
        history_entry("2", "B", "2018"),
    ];
    let stops = merge_team_history(&entries);
    assert_eq!(stops.len(), 4);
    for pair in stops.windows(2) {
        assert_ne!(pair[0].team_id, pair[1].team_id);
    }
    assert_eq!(stops[1].seasons, "2019-2021");
}

#[test]
fn unknown_team_ids_never_merge() {
    let mut first = history_entry("1", "Unknown", "2021");
    first.team_id = None;
    let mut second = history_entry("1", "Unknown", "2020");
    second.team_id = None;
    assert_eq!(merge_team_history(&[first, second]).len(), 2);
}

#[test]
fn nameless_newer_entry_keeps_the_merged_team_name() {
    let bio = parse_athlete_bio_json(
        r#"{"teamHistory":[
            {"id":"28","seasons":"2022"},
            {"id":"28","displayName":"Washington Football Team","seasons":"2020-2021"}
        ]}"#,
    )
    .expect("bio");
    let stops = merge_team_history(&bio.team_history);
    assert_eq!(stops.len(), 1);
    assert_eq!(stops[0].name, "Washington Football Team");
    assert_eq!(stops[0].seasons, "2020-2022");
}

#[test]
fn team_without_any_name_is_labelled_unknown() {
    let stops = merge_team_history(&[history_entry("4", "", "2019")]);
    assert_eq!(stops[0].name, "Unknown Team");
}

#[test]
fn college_comes_first_then_affiliations() {
    let detail = athlete("3121422", "Terry McLaurin", "WR", Some(("194", "Ohio State")));
    let path = build_career_path(
        &detail,
        &bio(vec![
            history_entry("28", "Washington Commanders", "2022-2024"),
            history_entry("28", "Washington Football Team", "2020-2021"),
        ]),
    )
    .expect("playable");
    assert_eq!(path.len(), 2);
    assert_eq!(path[0].kind, StopKind::College);
    assert!(path[0].seasons.is_empty());
    assert!(path[0].logo.ends_with("/194.png"));
    assert_eq!(path[1].kind, StopKind::Affiliation);
    assert_eq!(path[1].name, "Washington Commanders");
    assert_eq!(path[1].seasons, "2020-2024");
}

#[test]
fn college_only_player_is_not_playable() {
    let detail = athlete("9000001", "Jordan Walkon", "WR", Some(("2", "Auburn")));
    let err = build_career_path(&detail, &bio(Vec::new())).expect_err("rejected");
    match err {
        GameError::NotPlayable { player_id, reason } => {
            assert_eq!(player_id, "9000001");
            assert_eq!(reason, "no professional team history");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn missing_college_is_fine_with_team_history() {
    let detail = athlete("5", "No College", "K", None);
    let path = build_career_path(&detail, &bio(vec![history_entry("9", "Team", "2015-Present")]))
        .expect("playable");
    assert_eq!(path.len(), 1);
    assert_eq!(path[0].seasons, "2015-Present");
}
