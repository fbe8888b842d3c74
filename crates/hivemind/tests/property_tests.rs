//! Property-based tests using proptest
//!
//! Invariants of membership, backup/restore and interpreter resumption that
//! should hold for any herd layout.

use proptest::prelude::*;

use hivemind::assets::{AssetLibrary, ResourceId};
use hivemind::behavior::{
    Actor, BehaviorNode, BehaviorStatus, BehaviorTree, DecoratorType, Interpreter, ScriptedActions,
};
use hivemind::world::{
    Behavior, EntityId, EntityRecord, EntityStoreExt, GroupTag, InMemoryWorld,
};
use hivemind::{GroupCoordinator, HivemindConfig};

const LABELS: [&str; 4] = ["magenta", "MAGENTA", "cyan", ""];

// ============================================================================
// Strategies
// ============================================================================

/// One entity: an optional label index and how far its own behavior got
/// (`None` for no behavior at all).
fn entity_strategy() -> impl Strategy<Value = (Option<usize>, Option<u8>)> {
    (
        prop::option::of(0..LABELS.len()),
        prop::option::of(0u8..6),
    )
}

fn herd_strategy() -> impl Strategy<Value = Vec<(Option<usize>, Option<u8>)>> {
    prop::collection::vec(entity_strategy(), 0..12)
}

fn patrol_tree() -> BehaviorTree {
    BehaviorTree::new(
        ResourceId::new("Behaviors", "patrol"),
        BehaviorNode::Sequence(vec![
            BehaviorNode::Action("look".into()),
            BehaviorNode::Decorator(
                DecoratorType::Repeat(3),
                Box::new(BehaviorNode::Action("step".into())),
            ),
            BehaviorNode::Action("rest".into()),
        ]),
    )
}

fn patrol_handler(seed: u64) -> ScriptedActions {
    let mut handler = ScriptedActions::new(seed);
    handler.set_action_result("look", BehaviorStatus::Success);
    handler.set_action_result("step", BehaviorStatus::Success);
    handler.set_action_result("rest", BehaviorStatus::Running);
    handler
}

fn build(layout: &[(Option<usize>, Option<u8>)]) -> (InMemoryWorld, Vec<EntityId>) {
    let mut world = InMemoryWorld::new();
    let mut ids = Vec::new();
    for (label, progress) in layout {
        let mut record = EntityRecord::new("deer");
        if let Some(label) = label {
            record = record.with(GroupTag::new(LABELS[*label]));
        }
        let id = world.spawn(record);
        if let Some(ticks) = progress {
            let mut behavior = Behavior::new(id, patrol_tree().into_ref());
            let mut handler = patrol_handler(0);
            for _ in 0..*ticks {
                behavior.interpreter.tick(&mut handler);
            }
            world.save_component(id, behavior).unwrap();
        }
        ids.push(id);
    }
    (world, ids)
}

fn coordinator(world: InMemoryWorld) -> GroupCoordinator<InMemoryWorld, AssetLibrary> {
    let mut assets = AssetLibrary::new();
    assets.add_tree(patrol_tree());
    assets.add_tree(BehaviorTree::new(
        ResourceId::new("Behaviors", "critter"),
        BehaviorNode::Action("wander".into()),
    ));
    GroupCoordinator::new(world, assets, HivemindConfig::default()).unwrap()
}

fn is_magenta(label: Option<usize>) -> bool {
    matches!(label, Some(0) | Some(1))
}

// ============================================================================
// Membership
// ============================================================================

proptest! {
    // Property: membership is exactly the set of entities carrying the label
    #[test]
    fn test_membership_matches_tags(layout in herd_strategy()) {
        let (world, ids) = build(&layout);
        let coordinator = coordinator(world);

        let expected: Vec<EntityId> = layout
            .iter()
            .zip(&ids)
            .filter(|((label, _), _)| is_magenta(*label))
            .map(|(_, id)| *id)
            .collect();
        prop_assert_eq!(coordinator.members_of("magenta"), expected.clone());
        prop_assert_eq!(coordinator.members_of("Magenta"), expected);
        prop_assert!(coordinator.members_of("").is_empty());
    }

    // Property: a hivemind holds the members at the time it was made
    #[test]
    fn test_hivemind_matches_membership(layout in herd_strategy()) {
        let (world, _) = build(&layout);
        let mut coordinator = coordinator(world);

        let members = coordinator.members_of("magenta");
        let hive = coordinator.materialize_hivemind("magenta").unwrap();
        let hive = coordinator.hivemind(hive).unwrap();
        prop_assert_eq!(hive.members(), members.as_slice());
    }
}

// ============================================================================
// Backup / restore
// ============================================================================

proptest! {
    // Property: assign then restore brings back every prior run exactly
    #[test]
    fn test_assign_restore_roundtrip(layout in herd_strategy()) {
        let (world, ids) = build(&layout);
        let before: Vec<Option<Behavior>> = ids.iter().map(|id| world.get::<Behavior>(*id)).collect();
        let mut coordinator = coordinator(world);

        let assigned = coordinator.assign_behavior("magenta", "Behaviors:critter", None);
        prop_assert!(assigned.is_success());

        let restored = coordinator.recover_backup("magenta");
        prop_assert!(restored.is_success());

        for (((label, progress), id), prior) in layout.iter().zip(&ids).zip(&before) {
            let now = coordinator.store().get::<Behavior>(*id);
            match (is_magenta(*label), progress, prior) {
                (true, Some(_), Some(prior)) => {
                    let now = now.unwrap();
                    prop_assert_eq!(now.interpreter.snapshot(), prior.interpreter.snapshot());
                    prop_assert!(restored.affected.contains(id));
                }
                (true, None, _) => {
                    let now = now.unwrap();
                    prop_assert_eq!(now.tree.id().name(), "critter");
                    prop_assert!(restored.was_skipped(*id));
                }
                (false, _, prior) => {
                    let now = now.map(|b| b.interpreter.snapshot());
                    let prior = prior.as_ref().map(|b| b.interpreter.snapshot());
                    prop_assert_eq!(now, prior);
                }
                _ => unreachable!("behavior presence follows the layout"),
            }
        }
    }

    // Property: repeated assignment never replaces the first backup
    #[test]
    fn test_repeated_assignment_keeps_first_backup(layout in herd_strategy(), repeats in 1usize..4) {
        let (world, ids) = build(&layout);
        let before: Vec<Option<Behavior>> = ids.iter().map(|id| world.get::<Behavior>(*id)).collect();
        let mut coordinator = coordinator(world);

        for _ in 0..repeats {
            coordinator.assign_behavior("magenta", "Behaviors:critter", None);
        }

        for ((label, id), prior) in layout.iter().map(|(l, _)| *l).zip(&ids).zip(&before) {
            if !is_magenta(label) {
                continue;
            }
            let tag = coordinator.store().get::<GroupTag>(*id).unwrap();
            let expected = prior.as_ref().map(|b| b.interpreter.snapshot());
            prop_assert_eq!(tag.backup_state, expected);
        }
    }
}

// ============================================================================
// Interpreter resumption
// ============================================================================

proptest! {
    // Property: a resumed interpreter behaves exactly like the original
    #[test]
    fn test_resume_is_indistinguishable(before in 0usize..8, after in 1usize..8, seed in any::<u64>()) {
        let tree = patrol_tree().into_ref();
        let mut original = Interpreter::new(Actor::new(EntityId::new(1)), tree.clone());
        let mut handler = patrol_handler(seed);
        for _ in 0..before {
            original.tick(&mut handler);
        }

        let snapshot = original.snapshot();
        let mut resumed = Interpreter::resume(tree, &snapshot).unwrap();

        let mut a = patrol_handler(seed);
        let mut b = patrol_handler(seed);
        for _ in 0..after {
            prop_assert_eq!(original.tick(&mut a), resumed.tick(&mut b));
        }
        prop_assert_eq!(original.state(), resumed.state());
        prop_assert_eq!(a.performed(), b.performed());
        // The snapshot itself never moved.
        prop_assert_eq!(snapshot.state().tick_count(), before as u64);
    }
}
