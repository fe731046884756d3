use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use world_core::{build_headless_app, run_turn, PendingWorldChanges, WorldStateStore};
use world_proto::{ChangeInput, Effect};

fn seeded_store(ongoing: usize) -> WorldStateStore {
    let mut store = WorldStateStore::default();
    for index in 0..ongoing {
        store.submit_change(
            ChangeInput::new("faction_activities", format!("cell {index} recruits"))
                .with_ongoing(vec![
                    Effect::add("faction_influence", 0.001),
                    Effect::add(format!("faction_cell_{index}_strength"), 0.5),
                ])
                .with_duration(1_000),
        );
    }
    store
}

fn bench_advance_turn(c: &mut Criterion) {
    let mut group = c.benchmark_group("advance_turn");

    for ongoing in [10usize, 100, 1_000, 5_000] {
        group.bench_with_input(
            BenchmarkId::new("ongoing_effects", ongoing),
            &ongoing,
            |b, &ongoing| {
                b.iter_batched(
                    || seeded_store(ongoing),
                    |mut store| {
                        store.advance_turn();
                    },
                    BatchSize::SmallInput,
                )
            },
        );
    }

    group.finish();
}

fn bench_app_turn(c: &mut Criterion) {
    let mut group = c.benchmark_group("app_turn");

    for pending in [0usize, 50, 500] {
        group.bench_with_input(BenchmarkId::new("pending", pending), &pending, |b, &pending| {
            b.iter_batched(
                || {
                    let mut app = build_headless_app();
                    {
                        let mut queue = app.world.resource_mut::<PendingWorldChanges>();
                        for index in 0..pending {
                            queue.push(
                                ChangeInput::new("player_actions", format!("action {index}"))
                                    .with_immediate(vec![Effect::add("public_awareness", 0.0001)]),
                            );
                        }
                    }
                    app
                },
                |mut app| {
                    run_turn(&mut app);
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

criterion_group!(turn_benches, bench_advance_turn, bench_app_turn);
criterion_main!(turn_benches);
