//! Criterion benchmarks for matchmaking and full episodes on the fake
//! simulation.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use indexmap::IndexMap;
use warlock_core::{EpisodeId, PolicyId};
use warlock_episode::{EpisodeConfig, EpisodeController};
use warlock_league::{LeagueAgent, Matchmaker};
use warlock_link::SimulationLink;
use warlock_test_utils::{ConstantPolicy, FakeConfig, FakeSimulation, ScheduledDamage};

/// 8 Mains with their Exploiters and 32 Clones.
fn large_roster() -> IndexMap<PolicyId, LeagueAgent> {
    let mut roster = IndexMap::new();
    for m in 0..8 {
        let main = PolicyId(m * 2);
        roster.insert(main, LeagueAgent::Main);
        roster.insert(PolicyId(m * 2 + 1), LeagueAgent::Exploiter { target: main });
    }
    for c in 0..32 {
        roster.insert(
            PolicyId(16 + c),
            LeagueAgent::Clone {
                source: PolicyId((c % 8) * 2),
            },
        );
    }
    roster
}

/// Benchmark: Resolve a two-slot matchup against a 48-agent roster.
fn bench_matchup(c: &mut Criterion) {
    let mm = Matchmaker::new(1, large_roster()).unwrap();
    let mut episode = 0u64;

    c.bench_function("matchup_48_agents", |b| {
        b.iter(|| {
            episode += 1;
            let ids = mm.matchup(EpisodeId(episode), 2).unwrap();
            black_box(ids);
        });
    });
}

/// Benchmark: Build and validate a matchmaker snapshot.
fn bench_matchmaker_build(c: &mut Criterion) {
    let roster = large_roster();

    c.bench_function("matchmaker_build_48_agents", |b| {
        b.iter(|| {
            let mm = Matchmaker::new(1, black_box(roster.clone())).unwrap();
            black_box(mm);
        });
    });
}

/// Benchmark: One short episode through link, codec and controller.
fn bench_fake_episode(c: &mut Criterion) {
    let fake = FakeSimulation::new(FakeConfig {
        damage: vec![ScheduledDamage {
            frame: 60,
            player: 1,
            amount: 100.0,
        }],
        ..Default::default()
    });
    let mut link = SimulationLink::new(fake);
    let controller = EpisodeController::new(EpisodeConfig {
        max_rounds: 1,
        ..Default::default()
    })
    .unwrap();
    let mut policies = vec![ConstantPolicy::ready(), ConstantPolicy::ready()];
    let mut seed = 0u64;

    c.bench_function("fake_episode_one_round", |b| {
        b.iter(|| {
            seed += 1;
            let outcome = controller.run(&mut link, Some(seed), &mut policies).unwrap();
            black_box(outcome);
        });
    });
}

criterion_group!(
    benches,
    bench_matchup,
    bench_matchmaker_build,
    bench_fake_episode
);
criterion_main!(benches);
