use bracket_engine::bracket::advancement::{MatchGraph, MatchResult};
use bracket_engine::bracket::double_elim::build_double_elimination;
use bracket_engine::bracket::round_robin::circle_schedule;
use bracket_engine::bracket::single_elim::{bracket_size, build_single_elimination};
use bracket_engine::bracket::standings::compute_standings;
use bracket_engine::bracket::swiss::{GreedyPairing, PairingStrategy, PlayedPairs};
use bracket_engine::bracket::{Match, MatchFormat, MatchPhase, MatchState, Team, TeamId};
use chrono::Utc;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::hint::black_box;

fn team_ids(n: usize) -> Vec<TeamId> {
    (1..=n as TeamId).collect()
}

/// A decided group match history where the lower id always wins
fn round_robin_history(n: usize) -> (Vec<Team>, Vec<Match>) {
    let ids = team_ids(n);
    let teams = ids
        .iter()
        .map(|&id| Team {
            id,
            tournament_id: Some(1),
            name: format!("Team {}", id),
            group_id: None,
            created_at: Utc::now(),
        })
        .collect();

    let matches = circle_schedule(&ids)
        .into_iter()
        .flatten()
        .map(|(a, b)| {
            let mut m = Match::new(1, MatchPhase::GroupStage, 1, 0, MatchFormat::best_of(2));
            m.team1 = Some(a);
            m.team2 = Some(b);
            m.team1_score = 2;
            m.winner = Some(a.min(b));
            m.state = MatchState::Completed;
            m
        })
        .collect();

    (teams, matches)
}

/// Benchmark single elimination construction including bye resolution
fn bench_single_elimination(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_elimination");

    for n_teams in [5, 64, 200, 1000].iter() {
        let ids = team_ids(*n_teams);
        let size = bracket_size(*n_teams, 0, None).unwrap();
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_teams", n_teams)),
            &ids,
            |b, ids| {
                let mut rng = StdRng::seed_from_u64(7);
                b.iter(|| {
                    build_single_elimination(
                        1,
                        black_box(ids),
                        size,
                        MatchFormat::default(),
                        &mut rng,
                    )
                });
            },
        );
    }

    group.finish();
}

/// Benchmark the fixed double elimination template
fn bench_double_elimination(c: &mut Criterion) {
    let mut seeds = [[0; 4]; 4];
    for (g, group) in seeds.iter_mut().enumerate() {
        for (r, seed) in group.iter_mut().enumerate() {
            *seed = (g * 4 + r + 1) as TeamId;
        }
    }

    c.bench_function("double_elimination_template", |b| {
        b.iter(|| {
            build_double_elimination(
                1,
                black_box(&seeds),
                MatchFormat::best_of(3),
                MatchFormat::best_of(5),
            )
        })
    });
}

fn bench_circle_schedule(c: &mut Criterion) {
    let mut group = c.benchmark_group("circle_schedule");

    for n_teams in [4, 16, 64].iter() {
        let ids = team_ids(*n_teams);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_teams", n_teams)),
            &ids,
            |b, ids| b.iter(|| circle_schedule(black_box(ids))),
        );
    }

    group.finish();
}

fn bench_standings(c: &mut Criterion) {
    let mut group = c.benchmark_group("standings");

    for n_teams in [8, 32, 128].iter() {
        let (teams, matches) = round_robin_history(*n_teams);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_teams", n_teams)),
            &(teams, matches),
            |b, (teams, matches)| {
                b.iter(|| compute_standings(black_box(teams), black_box(matches)))
            },
        );
    }

    group.finish();
}

fn bench_swiss_pairing(c: &mut Criterion) {
    let (_, history) = round_robin_history(64);
    // Half the field has met, so the scan has to skip played opponents.
    let history: Vec<Match> = history.into_iter().take(64 * 63 / 4).collect();
    let played = PlayedPairs::from_matches(&history);
    let ranked = team_ids(64);

    c.bench_function("swiss_greedy_pairing_64", |b| {
        b.iter(|| GreedyPairing.pair(black_box(&ranked), black_box(&played)))
    });
}

/// Benchmark reporting every result of a 64-team bracket on a scratch graph
fn bench_play_bracket(c: &mut Criterion) {
    let ids = team_ids(64);
    let mut rng = StdRng::seed_from_u64(11);
    let matches = build_single_elimination(1, &ids, 64, MatchFormat::default(), &mut rng);

    c.bench_function("play_64_team_bracket", |b| {
        b.iter_batched(
            || (MatchGraph::new(matches.clone()), matches.iter().map(|m| m.id).collect::<Vec<_>>()),
            |(mut graph, order)| {
                for id in order {
                    let _ = graph.complete(id, &MatchResult::new(1, 0));
                }
                graph
            },
            criterion::BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    builders,
    bench_single_elimination,
    bench_double_elimination,
    bench_circle_schedule
);
criterion_group!(
    results,
    bench_standings,
    bench_swiss_pairing,
    bench_play_bracket
);
criterion_main!(builders, results);
