//! Serialized access to a coordinator from several threads.
//!
//! The coordinator itself is single-threaded (`&mut self` everywhere).
//! [`SharedCoordinator`] puts it behind a `parking_lot` mutex so that every
//! operation runs to completion before the next one starts.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::assets::{AssetResolver, MaterialResolver};
use crate::coordinator::GroupCoordinator;
use crate::scenario::{Scenario, ScenarioOutcome};
use crate::world::EntityStore;

/// Cloneable, lock-guarded handle to one [`GroupCoordinator`].
pub struct SharedCoordinator<S, R> {
    inner: Arc<Mutex<GroupCoordinator<S, R>>>,
}

impl<S, R> Clone for SharedCoordinator<S, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, R> SharedCoordinator<S, R>
where
    S: EntityStore,
    R: AssetResolver + MaterialResolver,
{
    pub fn new(coordinator: GroupCoordinator<S, R>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(coordinator)),
        }
    }

    /// Run `f` with exclusive access to the coordinator.
    pub fn with<T>(&self, f: impl FnOnce(&mut GroupCoordinator<S, R>) -> T) -> T {
        let mut guard = self.inner.lock();
        f(&mut guard)
    }

    pub fn run(&self, scenario: Scenario) -> ScenarioOutcome {
        self.with(|coordinator| coordinator.run(scenario))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{AssetLibrary, ResourceId};
    use crate::behavior::{BehaviorNode, BehaviorTree};
    use crate::world::{EntityRecord, GroupTag, InMemoryWorld};
    use crate::HivemindConfig;

    #[test]
    fn test_concurrent_runs_are_serialized() {
        let mut world = InMemoryWorld::new();
        for i in 0..4 {
            world.spawn(EntityRecord::new(format!("deer-{i}")).with(GroupTag::new("magenta")));
        }
        let mut assets = AssetLibrary::new();
        assets.add_tree(BehaviorTree::new(
            ResourceId::new("Behaviors", "critter"),
            BehaviorNode::Action("wander".into()),
        ));
        let coordinator = GroupCoordinator::new(world, assets, HivemindConfig::default()).unwrap();
        let shared = SharedCoordinator::new(coordinator);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let shared = shared.clone();
                std::thread::spawn(move || shared.run(Scenario::SynchronizeSpeed))
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap().is_success());
        }

        let hiveminds = shared.with(|c| c.store().entities_with(crate::world::ComponentKind::Hivemind).len());
        assert_eq!(hiveminds, 4);
    }
}
