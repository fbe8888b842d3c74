//! Per-actor execution cursor over a shared tree.
//!
//! Composites keep memory between ticks: a child that answered `Running` is
//! resumed on the next tick instead of re-evaluating its earlier siblings.
//! All of that memory lives in [`RunState`], keyed by [`NodeId`], which is
//! what makes a run exactly resumable from an [`InterpreterSnapshot`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::actions::{ActionHandler, Actor};
use super::tree::{BehaviorNode, BehaviorStatus, BehaviorTree, BehaviorTreeRef, DecoratorType, NodeId};
use crate::assets::ResourceId;
use crate::error::{HivemindError, Result};

// ---------------------------------------------------------------------------
// Run state
// ---------------------------------------------------------------------------

/// Node-local memory kept while a node is `Running`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeMemory {
    /// Sequence/selector: index of the child to resume.
    Cursor(usize),
    /// Parallel: results of children that already finished.
    Finished(Vec<Option<BehaviorStatus>>),
    /// Repeat: completed iterations.
    Iterations(usize),
    /// Timeout: tick at which the child was first entered.
    StartedAt(u64),
}

/// Mutable execution state of one run over a tree.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RunState {
    tick_count: u64,
    active: Option<NodeId>,
    last_status: Option<BehaviorStatus>,
    memory: BTreeMap<NodeId, NodeMemory>,
}

/// Evaluates leaves reached during a step.
pub(crate) trait LeafEvaluator {
    fn leaf(&mut self, id: NodeId, node: &BehaviorNode) -> BehaviorStatus;
}

impl RunState {
    /// Number of steps taken so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Deepest node left `Running` by the last step, if any.
    pub fn active(&self) -> Option<NodeId> {
        self.active
    }

    /// Root status of the last step.
    pub fn last_status(&self) -> Option<BehaviorStatus> {
        self.last_status
    }

    pub fn memory(&self) -> &BTreeMap<NodeId, NodeMemory> {
        &self.memory
    }

    /// Whether the run sits at the root with nothing in progress.
    pub fn is_at_root(&self) -> bool {
        self.memory.is_empty() && self.active.is_none()
    }

    /// Advance the run by one tick.
    pub(crate) fn step(&mut self, tree: &BehaviorTree, leaves: &mut dyn LeafEvaluator) -> BehaviorStatus {
        self.tick_count += 1;
        self.active = None;
        let status = self.eval(tree, NodeId::ROOT, tree.root(), leaves);
        self.last_status = Some(status);
        status
    }

    fn eval(
        &mut self,
        tree: &BehaviorTree,
        id: NodeId,
        node: &BehaviorNode,
        leaves: &mut dyn LeafEvaluator,
    ) -> BehaviorStatus {
        let status = match node {
            BehaviorNode::Action(_) | BehaviorNode::Condition(_) | BehaviorNode::Chance(_) => {
                leaves.leaf(id, node)
            }
            BehaviorNode::Sequence(children) => {
                self.eval_ordered(tree, id, node, children, BehaviorStatus::Success, leaves)
            }
            BehaviorNode::Selector(children) => {
                self.eval_ordered(tree, id, node, children, BehaviorStatus::Failure, leaves)
            }
            BehaviorNode::Decorator(dtype, child) => {
                let child_id = NodeId(id.0 + 1);
                self.eval_decorator(tree, id, dtype, child_id, child, leaves)
            }
            BehaviorNode::Parallel(threshold, children) => {
                self.eval_parallel(tree, id, node, *threshold, children, leaves)
            }
        };

        if status.is_done() {
            self.clear_subtree(tree, id);
            let end = id.0 + tree.subtree_size(id);
            if self.active.is_some_and(|active| active.0 >= id.0 && active.0 < end) {
                self.active = None;
            }
        } else if self.active.is_none() {
            self.active = Some(id);
        }
        status
    }

    /// Sequence and selector share one shape: keep going while children
    /// answer `continue_on`, stop on anything else.
    fn eval_ordered(
        &mut self,
        tree: &BehaviorTree,
        id: NodeId,
        node: &BehaviorNode,
        children: &[BehaviorNode],
        continue_on: BehaviorStatus,
        leaves: &mut dyn LeafEvaluator,
    ) -> BehaviorStatus {
        let start = match self.memory.get(&id) {
            Some(NodeMemory::Cursor(idx)) => *idx,
            _ => 0,
        };
        let ids = tree.child_ids(id, node);
        for (idx, (child_id, child)) in ids.into_iter().zip(children).enumerate().skip(start) {
            let status = self.eval(tree, child_id, child, leaves);
            if status == continue_on {
                continue;
            }
            if status == BehaviorStatus::Running {
                self.memory.insert(id, NodeMemory::Cursor(idx));
            }
            return status;
        }
        continue_on
    }

    fn eval_parallel(
        &mut self,
        tree: &BehaviorTree,
        id: NodeId,
        node: &BehaviorNode,
        threshold: usize,
        children: &[BehaviorNode],
        leaves: &mut dyn LeafEvaluator,
    ) -> BehaviorStatus {
        let n = children.len();
        let mut finished = match self.memory.remove(&id) {
            Some(NodeMemory::Finished(done)) if done.len() == n => done,
            _ => vec![None; n],
        };

        let ids = tree.child_ids(id, node);
        for ((slot, child_id), child) in finished.iter_mut().zip(ids).zip(children) {
            if slot.is_none() {
                let status = self.eval(tree, child_id, child, leaves);
                if status.is_done() {
                    *slot = Some(status);
                }
            }
        }

        let successes = finished
            .iter()
            .filter(|s| **s == Some(BehaviorStatus::Success))
            .count();
        let failures = finished
            .iter()
            .filter(|s| **s == Some(BehaviorStatus::Failure))
            .count();

        if successes >= threshold {
            BehaviorStatus::Success
        } else if failures > n.saturating_sub(threshold) || finished.iter().all(Option::is_some) {
            BehaviorStatus::Failure
        } else {
            self.memory.insert(id, NodeMemory::Finished(finished));
            BehaviorStatus::Running
        }
    }

    fn eval_decorator(
        &mut self,
        tree: &BehaviorTree,
        id: NodeId,
        dtype: &DecoratorType,
        child_id: NodeId,
        child: &BehaviorNode,
        leaves: &mut dyn LeafEvaluator,
    ) -> BehaviorStatus {
        match dtype {
            DecoratorType::Inverter => match self.eval(tree, child_id, child, leaves) {
                BehaviorStatus::Success => BehaviorStatus::Failure,
                BehaviorStatus::Failure => BehaviorStatus::Success,
                BehaviorStatus::Running => BehaviorStatus::Running,
            },
            DecoratorType::Repeat(n) => {
                let mut done = match self.memory.get(&id) {
                    Some(NodeMemory::Iterations(k)) => *k,
                    _ => 0,
                };
                while done < *n {
                    match self.eval(tree, child_id, child, leaves) {
                        BehaviorStatus::Success => done += 1,
                        BehaviorStatus::Failure => return BehaviorStatus::Failure,
                        BehaviorStatus::Running => {
                            self.memory.insert(id, NodeMemory::Iterations(done));
                            return BehaviorStatus::Running;
                        }
                    }
                }
                BehaviorStatus::Success
            }
            DecoratorType::UntilFail => match self.eval(tree, child_id, child, leaves) {
                BehaviorStatus::Failure => BehaviorStatus::Success,
                BehaviorStatus::Success | BehaviorStatus::Running => BehaviorStatus::Running,
            },
            DecoratorType::Timeout(max_ticks) => {
                let started = match self.memory.get(&id) {
                    Some(NodeMemory::StartedAt(t)) => *t,
                    _ => self.tick_count,
                };
                if self.tick_count - started >= *max_ticks {
                    return BehaviorStatus::Failure;
                }
                let status = self.eval(tree, child_id, child, leaves);
                if status == BehaviorStatus::Running {
                    self.memory.insert(id, NodeMemory::StartedAt(started));
                }
                status
            }
        }
    }

    fn clear_subtree(&mut self, tree: &BehaviorTree, id: NodeId) {
        let end = id.0 + tree.subtree_size(id);
        self.memory.retain(|k, _| k.0 < id.0 || k.0 >= end);
    }
}

/// Dispatch a leaf to an actor's control surface.
pub(crate) fn evaluate_leaf(
    node: &BehaviorNode,
    actor: &mut Actor,
    handler: &mut dyn ActionHandler,
) -> BehaviorStatus {
    let passed = match node {
        BehaviorNode::Action(name) => return handler.act(actor, name),
        BehaviorNode::Condition(name) => handler.check(actor, name),
        BehaviorNode::Chance(p) => handler.roll(actor, *p),
        _ => false,
    };
    if passed {
        BehaviorStatus::Success
    } else {
        BehaviorStatus::Failure
    }
}

struct SoloLeaves<'a> {
    actor: &'a mut Actor,
    handler: &'a mut dyn ActionHandler,
}

impl LeafEvaluator for SoloLeaves<'_> {
    fn leaf(&mut self, _id: NodeId, node: &BehaviorNode) -> BehaviorStatus {
        evaluate_leaf(node, self.actor, self.handler)
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Immutable deep copy of an interpreter taken at one instant.
///
/// Later ticks of the live interpreter never show through a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterpreterSnapshot {
    tree: ResourceId,
    actor: Actor,
    state: RunState,
}

impl InterpreterSnapshot {
    /// Tree the snapshot was taken over.
    pub fn tree(&self) -> &ResourceId {
        &self.tree
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }
}

// ---------------------------------------------------------------------------
// Interpreter
// ---------------------------------------------------------------------------

/// Runs one tree on behalf of one actor.
#[derive(Debug, Clone)]
pub struct Interpreter {
    actor: Actor,
    tree: BehaviorTreeRef,
    state: RunState,
}

impl Interpreter {
    /// Bind a fresh run of `tree` to `actor`, positioned at the root.
    pub fn new(actor: Actor, tree: BehaviorTreeRef) -> Self {
        Self {
            actor,
            tree,
            state: RunState::default(),
        }
    }

    /// Rebuild an interpreter exactly where `snapshot` left off.
    pub fn resume(tree: BehaviorTreeRef, snapshot: &InterpreterSnapshot) -> Result<Self> {
        if tree.id() != snapshot.tree() {
            return Err(HivemindError::SnapshotMismatch {
                expected: snapshot.tree().to_string(),
                actual: tree.id().to_string(),
            });
        }
        Ok(Self {
            actor: snapshot.actor.clone(),
            tree,
            state: snapshot.state.clone(),
        })
    }

    /// Replace the tree and restart from its root.
    pub fn set_tree(&mut self, tree: BehaviorTreeRef) {
        self.tree = tree;
        self.state = RunState::default();
    }

    /// Tick the tree once for this actor.
    pub fn tick(&mut self, handler: &mut dyn ActionHandler) -> BehaviorStatus {
        let mut leaves = SoloLeaves {
            actor: &mut self.actor,
            handler,
        };
        self.state.step(&self.tree, &mut leaves)
    }

    /// Deep-copy the current state.
    pub fn snapshot(&self) -> InterpreterSnapshot {
        InterpreterSnapshot {
            tree: self.tree.id().clone(),
            actor: self.actor.clone(),
            state: self.state.clone(),
        }
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub fn tree(&self) -> &BehaviorTreeRef {
        &self.tree
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
