//! One interpreter driving a whole set of actors in lock-step.
//!
//! The tree position is shared: every actor sits on the same node after a
//! tick. What each leaf did to each actor is not shared, and is reported
//! back per actor in a [`CollectiveTick`].

use serde::{Deserialize, Serialize};

use super::actions::{ActionHandler, Actor};
use super::interpreter::{evaluate_leaf, LeafEvaluator, RunState};
use super::tree::{BehaviorNode, BehaviorStatus, BehaviorTreeRef, NodeId};
use crate::world::EntityId;

/// How per-actor leaf results fold into the shared status of that leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CollectivePolicy {
    /// Running while anyone runs; succeeds only if every actor succeeded.
    #[default]
    All,
    /// Succeeds as soon as one actor succeeded.
    Any,
}

impl CollectivePolicy {
    fn combine(self, statuses: &[BehaviorStatus]) -> BehaviorStatus {
        let any = |s: BehaviorStatus| statuses.contains(&s);
        if statuses.is_empty() {
            return BehaviorStatus::Failure;
        }
        match self {
            CollectivePolicy::All => {
                if any(BehaviorStatus::Running) {
                    BehaviorStatus::Running
                } else if statuses.iter().all(|s| *s == BehaviorStatus::Success) {
                    BehaviorStatus::Success
                } else {
                    BehaviorStatus::Failure
                }
            }
            CollectivePolicy::Any => {
                if any(BehaviorStatus::Success) {
                    BehaviorStatus::Success
                } else if any(BehaviorStatus::Running) {
                    BehaviorStatus::Running
                } else {
                    BehaviorStatus::Failure
                }
            }
        }
    }
}

/// What one leaf did to one actor during a collective tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeafOutcome {
    pub node: NodeId,
    pub entity: EntityId,
    pub status: BehaviorStatus,
}

/// Result of one collective tick.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CollectiveTick {
    /// Shared root status, `None` when the tick had no actors.
    pub status: Option<BehaviorStatus>,
    /// Per-actor leaf results in evaluation order.
    pub outcomes: Vec<LeafOutcome>,
}

impl CollectiveTick {
    /// Leaf results seen by one actor.
    pub fn for_actor(&self, entity: EntityId) -> impl Iterator<Item = &LeafOutcome> {
        self.outcomes.iter().filter(move |o| o.entity == entity)
    }
}

struct CollectiveLeaves<'a> {
    actors: &'a mut [Actor],
    handler: &'a mut dyn ActionHandler,
    policy: CollectivePolicy,
    outcomes: &'a mut Vec<LeafOutcome>,
}

impl LeafEvaluator for CollectiveLeaves<'_> {
    fn leaf(&mut self, id: NodeId, node: &BehaviorNode) -> BehaviorStatus {
        let mut statuses = Vec::with_capacity(self.actors.len());
        for actor in self.actors.iter_mut() {
            let status = evaluate_leaf(node, actor, self.handler);
            self.outcomes.push(LeafOutcome {
                node: id,
                entity: actor.entity(),
                status,
            });
            statuses.push(status);
        }
        self.policy.combine(&statuses)
    }
}

/// A single run of one tree shared by a fixed set of actors.
///
/// The actor set is captured once at construction. Group membership changing
/// afterwards does not reach a running collective; build a new one instead.
#[derive(Debug, Clone)]
pub struct CollectiveInterpreter {
    actors: Vec<Actor>,
    tree: BehaviorTreeRef,
    state: RunState,
    policy: CollectivePolicy,
}

impl CollectiveInterpreter {
    /// Bind `tree` to `actors`. Duplicate entities are dropped, first wins.
    pub fn new(actors: Vec<Actor>, tree: BehaviorTreeRef, policy: CollectivePolicy) -> Self {
        let mut unique: Vec<Actor> = Vec::with_capacity(actors.len());
        for actor in actors {
            if !unique.iter().any(|a| a.entity() == actor.entity()) {
                unique.push(actor);
            }
        }
        Self {
            actors: unique,
            tree,
            state: RunState::default(),
            policy,
        }
    }

    /// Replace the tree and restart from its root; the actor set is kept.
    pub fn set_tree(&mut self, tree: BehaviorTreeRef) {
        self.tree = tree;
        self.state = RunState::default();
    }

    /// Advance the shared tree once on behalf of every actor.
    pub fn tick(&mut self, handler: &mut dyn ActionHandler) -> CollectiveTick {
        if self.actors.is_empty() {
            return CollectiveTick::default();
        }
        let mut outcomes = Vec::new();
        let mut leaves = CollectiveLeaves {
            actors: &mut self.actors,
            handler,
            policy: self.policy,
            outcomes: &mut outcomes,
        };
        let status = self.state.step(&self.tree, &mut leaves);
        CollectiveTick {
            status: Some(status),
            outcomes,
        }
    }

    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }

    /// Entities driven by this interpreter, in actor order.
    pub fn members(&self) -> Vec<EntityId> {
        self.actors.iter().map(Actor::entity).collect()
    }

    pub fn tree(&self) -> &BehaviorTreeRef {
        &self.tree
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn policy(&self) -> CollectivePolicy {
        self.policy
    }
}
