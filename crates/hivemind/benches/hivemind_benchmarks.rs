//! Group Coordination Benchmarks
//!
//! 1. Individual group assignment (with backup)
//! 2. Assign + restore round trip
//! 3. Hivemind materialization + speed broadcast
//! 4. Collective tick over a growing actor set
//!
//! Run with: cargo bench --bench hivemind_benchmarks -p hivemind

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};

use hivemind::assets::{AssetLibrary, ResourceId};
use hivemind::behavior::{
    Actor, BehaviorNode, BehaviorStatus, BehaviorTree, CollectiveInterpreter, CollectivePolicy,
    ScriptedActions,
};
use hivemind::world::{Behavior, CharacterMovement, EntityId, EntityRecord, EntityStoreExt, GroupTag, InMemoryWorld};
use hivemind::{GroupCoordinator, HivemindConfig};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

const HERD_SIZES: [usize; 3] = [10, 100, 1000];

fn patrol_tree() -> BehaviorTree {
    BehaviorTree::new(
        ResourceId::new("Behaviors", "patrol"),
        BehaviorNode::Sequence(vec![
            BehaviorNode::Action("look".into()),
            BehaviorNode::Selector(vec![
                BehaviorNode::Condition("threat".into()),
                BehaviorNode::Action("walk".into()),
            ]),
            BehaviorNode::Action("rest".into()),
        ]),
    )
}

fn critter_tree() -> BehaviorTree {
    BehaviorTree::new(
        ResourceId::new("Behaviors", "critter"),
        BehaviorNode::Action("wander".into()),
    )
}

fn handler() -> ScriptedActions {
    let mut handler = ScriptedActions::new(7);
    handler.set_action_result("look", BehaviorStatus::Success);
    handler.set_action_result("walk", BehaviorStatus::Running);
    handler
}

/// `n` tagged entities, every other one already running the patrol tree.
fn herd(n: usize) -> GroupCoordinator<InMemoryWorld, AssetLibrary> {
    let mut world = InMemoryWorld::new();
    let mut h = handler();
    for i in 0..n {
        let id = world.spawn(
            EntityRecord::new(format!("deer-{i}"))
                .with(GroupTag::new("magenta"))
                .with(CharacterMovement::default()),
        );
        if i % 2 == 0 {
            let mut behavior = Behavior::new(id, patrol_tree().into_ref());
            behavior.interpreter.tick(&mut h);
            world.save_component(id, behavior).unwrap();
        }
    }
    let mut assets = AssetLibrary::new();
    assets.add_tree(patrol_tree());
    assets.add_tree(critter_tree());
    GroupCoordinator::new(world, assets, HivemindConfig::default()).unwrap()
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_assign_behavior(c: &mut Criterion) {
    let mut group = c.benchmark_group("assign_behavior");
    for n in HERD_SIZES {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter_batched(
                || herd(n),
                |mut coordinator| {
                    black_box(coordinator.assign_behavior("magenta", "Behaviors:critter", None))
                },
                BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

fn bench_assign_restore(c: &mut Criterion) {
    let mut group = c.benchmark_group("assign_restore");
    for n in HERD_SIZES {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter_batched(
                || herd(n),
                |mut coordinator| {
                    coordinator.assign_behavior("magenta", "Behaviors:critter", None);
                    black_box(coordinator.recover_backup("magenta"))
                },
                BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

fn bench_synchronize_speed(c: &mut Criterion) {
    let mut group = c.benchmark_group("synchronize_speed");
    for n in HERD_SIZES {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter_batched(
                || herd(n),
                |mut coordinator| {
                    let hive = coordinator.materialize_hivemind("magenta").unwrap();
                    black_box(coordinator.propagate_speed(hive, 2.5))
                },
                BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

fn bench_collective_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("collective_tick");
    let tree = patrol_tree().into_ref();
    for n in HERD_SIZES {
        let actors: Vec<Actor> = (0..n as u64).map(|i| Actor::new(EntityId::new(i))).collect();
        let mut interpreter = CollectiveInterpreter::new(actors, tree.clone(), CollectivePolicy::All);
        let mut h = handler();
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(BenchmarkId::from_parameter(n), |b| {
            b.iter(|| {
                h.clear_log();
                black_box(interpreter.tick(&mut h))
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_assign_behavior,
    bench_assign_restore,
    bench_synchronize_speed,
    bench_collective_tick,
);
criterion_main!(benches);
