use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use rand::SeedableRng;
use rand::rngs::StdRng;

use gridiron_paths::career::{build_game_player, merge_team_history};
use gridiron_paths::espn::{
    parse_athlete_bio_json, parse_athlete_detail_json, parse_depth_chart_json, parse_search_json,
};
use gridiron_paths::model::{RosterPlayer, TeamHistoryEntry};
use gridiron_paths::pool::starters_from_depth_chart;
use gridiron_paths::sampler::RoundSampler;

fn journeyman_history(stints: usize) -> Vec<TeamHistoryEntry> {
    // Newest first; every team is listed for two consecutive seasons.
    (0..stints * 2)
        .rev()
        .map(|season| {
            let team = season / 2;
            TeamHistoryEntry {
                team_id: Some(team.to_string()),
                name: format!("Team {team}"),
                logo: String::new(),
                seasons: (2000 + season).to_string(),
            }
        })
        .collect()
}

fn bench_career_merge(c: &mut Criterion) {
    let history = journeyman_history(12);
    c.bench_function("career_merge", |b| {
        b.iter(|| {
            let stops = merge_team_history(black_box(&history));
            black_box(stops.len());
        })
    });
}

fn bench_career_build_from_fixtures(c: &mut Criterion) {
    c.bench_function("career_build_from_fixtures", |b| {
        b.iter(|| {
            let detail = parse_athlete_detail_json(black_box(ATHLETE_JSON)).unwrap();
            let bio = parse_athlete_bio_json(black_box(BIO_JSON)).unwrap();
            let player = build_game_player(&detail, &bio).unwrap();
            black_box(player.career_path.len());
        })
    });
}

fn bench_depth_chart_starters(c: &mut Criterion) {
    let slots = ["qb", "rb", "wr1", "wr2", "te", "pk"];
    c.bench_function("depth_chart_starters", |b| {
        b.iter(|| {
            let chart = parse_depth_chart_json(black_box(DEPTH_CHART_JSON)).unwrap();
            let starters = starters_from_depth_chart(&chart, &slots);
            black_box(starters.len());
        })
    });
}

fn bench_search_parse(c: &mut Criterion) {
    c.bench_function("search_parse", |b| {
        b.iter(|| {
            let results = parse_search_json(black_box(SEARCH_JSON)).unwrap();
            black_box(results.len());
        })
    });
}

fn bench_sampler_pick(c: &mut Criterion) {
    let pool: Vec<RosterPlayer> = (0..700)
        .map(|idx| RosterPlayer {
            id: idx.to_string(),
            full_name: format!("Player {idx}"),
            position: "LB".to_string(),
            headshot: String::new(),
        })
        .collect();
    c.bench_function("sampler_pick", |b| {
        let mut sampler = RoundSampler::new();
        let mut rng = StdRng::seed_from_u64(42);
        b.iter(|| {
            let pick = sampler.pick_random_player(black_box(&pool), &mut rng);
            black_box(pick.map(|p| p.id));
        })
    });
}

criterion_group!(
    perf,
    bench_career_merge,
    bench_career_build_from_fixtures,
    bench_depth_chart_starters,
    bench_search_parse,
    bench_sampler_pick
);
criterion_main!(perf);

static ATHLETE_JSON: &str = include_str!("../tests/fixtures/athlete_detail.json");
static BIO_JSON: &str = include_str!("../tests/fixtures/athlete_bio.json");
static DEPTH_CHART_JSON: &str = include_str!("../tests/fixtures/depth_chart.json");
static SEARCH_JSON: &str = include_str!("../tests/fixtures/search.json");
