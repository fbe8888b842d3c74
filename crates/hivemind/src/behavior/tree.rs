//! Immutable behavior tree assets.
//!
//! A tree is built from simple building blocks: actions, conditions, chance
//! rolls, sequences, selectors, decorators and parallel nodes. Trees are
//! shared read-only between every interpreter that runs them, so the run
//! state lives in the interpreter and nodes are addressed by [`NodeId`].

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::assets::ResourceId;
use crate::error::Result;

// ---------------------------------------------------------------------------
// Status & decorator types
// ---------------------------------------------------------------------------

/// Result of ticking a behavior tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BehaviorStatus {
    Success,
    Failure,
    Running,
}

impl BehaviorStatus {
    /// Whether the node finished (succeeded or failed).
    pub fn is_done(self) -> bool {
        self != BehaviorStatus::Running
    }
}

/// Decorator modifiers that wrap a single child node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DecoratorType {
    /// Inverts Success <-> Failure; Running stays Running.
    Inverter,
    /// Repeats the child a fixed number of times.
    Repeat(usize),
    /// Keeps ticking the child until it returns Failure, once per tick.
    UntilFail,
    /// Fails the child if it has not finished after this many ticks.
    Timeout(u64),
}

// ---------------------------------------------------------------------------
// Node enum
// ---------------------------------------------------------------------------

/// A single node in the behavior tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BehaviorNode {
    /// Leaf that executes a named action on the actor.
    Action(String),
    /// Leaf that checks a named boolean condition on the actor.
    Condition(String),
    /// Leaf that succeeds with the given probability, rolled per actor.
    Chance(f64),
    /// Runs children left-to-right; stops on first non-Success.
    Sequence(Vec<BehaviorNode>),
    /// Runs children left-to-right; stops on first Success.
    Selector(Vec<BehaviorNode>),
    /// Applies a [`DecoratorType`] to a single child.
    Decorator(DecoratorType, Box<BehaviorNode>),
    /// Runs all children; succeeds once `threshold` children succeed.
    Parallel(usize, Vec<BehaviorNode>),
}

impl BehaviorNode {
    /// Direct children in evaluation order.
    pub fn children(&self) -> &[BehaviorNode] {
        match self {
            BehaviorNode::Sequence(c) | BehaviorNode::Selector(c) | BehaviorNode::Parallel(_, c) => {
                c.as_slice()
            }
            BehaviorNode::Decorator(_, child) => std::slice::from_ref(child.as_ref()),
            BehaviorNode::Action(_) | BehaviorNode::Condition(_) | BehaviorNode::Chance(_) => &[],
        }
    }

    /// Whether this node is a leaf evaluated against an actor.
    pub fn is_leaf(&self) -> bool {
        matches!(
            self,
            BehaviorNode::Action(_) | BehaviorNode::Condition(_) | BehaviorNode::Chance(_)
        )
    }

    /// Short label used in logs and cursor descriptions.
    pub fn kind(&self) -> &'static str {
        match self {
            BehaviorNode::Action(_) => "action",
            BehaviorNode::Condition(_) => "condition",
            BehaviorNode::Chance(_) => "chance",
            BehaviorNode::Sequence(_) => "sequence",
            BehaviorNode::Selector(_) => "selector",
            BehaviorNode::Decorator(..) => "decorator",
            BehaviorNode::Parallel(..) => "parallel",
        }
    }
}

// ---------------------------------------------------------------------------
// Node addressing
// ---------------------------------------------------------------------------

/// Pre-order index of a node within its tree. The root is `NodeId(0)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

/// Shared handle to an immutable tree asset.
pub type BehaviorTreeRef = Arc<BehaviorTree>;

/// A named, immutable behavior tree.
#[derive(Debug, Clone)]
pub struct BehaviorTree {
    id: ResourceId,
    root: BehaviorNode,
    /// Subtree size per node, indexed by pre-order [`NodeId`].
    sizes: Vec<usize>,
}

/// On-disk shape of a tree asset.
#[derive(Deserialize)]
struct TreeSource {
    root: BehaviorNode,
}

impl BehaviorTree {
    /// Create a new tree with the given root node.
    pub fn new(id: ResourceId, root: BehaviorNode) -> Self {
        let mut sizes = Vec::new();
        Self::measure(&root, &mut sizes);
        Self { id, root, sizes }
    }

    /// Parse a tree asset of the form `{"root": <node>}`.
    pub fn from_json(id: ResourceId, source: &str) -> Result<Self> {
        let parsed: TreeSource = serde_json::from_str(source)?;
        Ok(Self::new(id, parsed.root))
    }

    /// Wrap into a shareable reference.
    pub fn into_ref(self) -> BehaviorTreeRef {
        Arc::new(self)
    }

    pub fn id(&self) -> &ResourceId {
        &self.id
    }

    pub fn root(&self) -> &BehaviorNode {
        &self.root
    }

    /// Total number of nodes.
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// Number of nodes in the subtree rooted at `id` (including itself).
    pub fn subtree_size(&self, id: NodeId) -> usize {
        self.sizes.get(id.0).copied().unwrap_or(0)
    }

    /// Pre-order ids of the direct children of `id`.
    pub fn child_ids(&self, id: NodeId, node: &BehaviorNode) -> Vec<NodeId> {
        let mut next = id.0 + 1;
        node.children()
            .iter()
            .map(|_| {
                let child = NodeId(next);
                next += self.subtree_size(child);
                child
            })
            .collect()
    }

    /// Look up a node by its pre-order id.
    pub fn node(&self, id: NodeId) -> Option<&BehaviorNode> {
        let mut current = &self.root;
        let mut current_id = NodeId::ROOT;
        if id.0 >= self.len() {
            return None;
        }
        while current_id != id {
            let children = self.child_ids(current_id, current);
            let idx = children
                .iter()
                .rposition(|c| c.0 <= id.0)?;
            current_id = children[idx];
            current = &current.children()[idx];
        }
        Some(current)
    }

    /// Whether `other` denotes the same asset as this tree.
    pub fn same_asset(&self, other: &BehaviorTree) -> bool {
        self.id == other.id
    }

    fn measure(node: &BehaviorNode, sizes: &mut Vec<usize>) -> usize {
        let slot = sizes.len();
        sizes.push(1);
        let mut total = 1;
        for child in node.children() {
            total += Self::measure(child, sizes);
        }
        sizes[slot] = total;
        total
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn critter() -> BehaviorTree {
        BehaviorTree::new(
            "Behaviors:critter".parse().unwrap(),
            BehaviorNode::Selector(vec![
                BehaviorNode::Sequence(vec![
                    BehaviorNode::Condition("hungry".into()),
                    BehaviorNode::Action("graze".into()),
                ]),
                BehaviorNode::Decorator(
                    DecoratorType::Inverter,
                    Box::new(BehaviorNode::Action("wander".into())),
                ),
            ]),
        )
    }

    #[test]
    fn test_preorder_sizes() {
        let tree = critter();
        assert_eq!(tree.len(), 6);
        assert_eq!(tree.subtree_size(NodeId::ROOT), 6);
        assert_eq!(tree.subtree_size(NodeId(1)), 3);
        assert_eq!(tree.subtree_size(NodeId(4)), 2);
    }

    #[test]
    fn test_child_ids() {
        let tree = critter();
        let ids = tree.child_ids(NodeId::ROOT, tree.root());
        assert_eq!(ids, vec![NodeId(1), NodeId(4)]);
    }

    #[test]
    fn test_node_lookup() {
        let tree = critter();
        assert_eq!(tree.node(NodeId(3)), Some(&BehaviorNode::Action("graze".into())));
        assert_eq!(tree.node(NodeId(5)), Some(&BehaviorNode::Action("wander".into())));
        assert!(tree.node(NodeId(6)).is_none());
    }

    #[test]
    fn test_from_json() {
        let src = r#"{"root": {"Sequence": [{"Action": "look"}, {"Chance": 0.5}]}}"#;
        let tree = BehaviorTree::from_json("Behaviors:look".parse().unwrap(), src).unwrap();
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.node(NodeId(2)), Some(&BehaviorNode::Chance(0.5)));
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(BehaviorTree::from_json("a:b".parse().unwrap(), "{").is_err());
    }

    #[test]
    fn test_same_asset_ignores_case() {
        let a = critter();
        let b = BehaviorTree::new(
            "behaviors:CRITTER".parse().unwrap(),
            BehaviorNode::Action("x".into()),
        );
        assert!(a.same_asset(&b));
    }

    #[test]
    fn test_status_is_done() {
        assert!(BehaviorStatus::Success.is_done());
        assert!(BehaviorStatus::Failure.is_done());
        assert!(!BehaviorStatus::Running.is_done());
    }
}
