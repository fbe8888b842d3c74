//! Component schemas attached to entities.

use uuid::Uuid;

use super::EntityId;
use crate::assets::Skin;
use crate::behavior::{Actor, BehaviorTreeRef, CollectiveInterpreter, Interpreter, InterpreterSnapshot};

/// Case-insensitive comparison of two group labels.
pub fn labels_match(a: &str, b: &str) -> bool {
    if a.is_ascii() && b.is_ascii() {
        return a.eq_ignore_ascii_case(b);
    }
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

/// Marks an entity as member of a group and keeps its pre-group behavior.
#[derive(Debug, Clone, Default)]
pub struct GroupTag {
    pub group_label: String,
    pub backup_tree: Option<BehaviorTreeRef>,
    pub backup_state: Option<InterpreterSnapshot>,
    /// The running behavior was put there by a group assignment.
    pub group_assigned: bool,
}

impl GroupTag {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            group_label: label.into(),
            ..Default::default()
        }
    }

    /// Whether this tag carries `label`.
    pub fn is_in(&self, label: &str) -> bool {
        !self.group_label.is_empty() && labels_match(&self.group_label, label)
    }

    /// Both halves of a backup are present.
    pub fn has_backup(&self) -> bool {
        self.backup_tree.is_some() && self.backup_state.is_some()
    }

    /// Record `behavior` as the state to come back to.
    pub fn record_backup(&mut self, behavior: &Behavior) {
        self.backup_tree = Some(behavior.tree.clone());
        self.backup_state = Some(behavior.interpreter.snapshot());
    }

    pub fn clear_backup(&mut self) {
        self.backup_tree = None;
        self.backup_state = None;
    }
}

/// An entity's individually running behavior.
#[derive(Debug, Clone)]
pub struct Behavior {
    pub tree: BehaviorTreeRef,
    pub interpreter: Interpreter,
}

impl Behavior {
    /// Fresh run of `tree` for `entity`, positioned at the root.
    pub fn new(entity: EntityId, tree: BehaviorTreeRef) -> Self {
        Self {
            interpreter: Interpreter::new(Actor::new(entity), tree.clone()),
            tree,
        }
    }
}

/// A tree run collectively on behalf of a hivemind's members.
#[derive(Debug, Clone)]
pub struct CollectiveBehavior {
    record_id: Uuid,
    revision: u32,
    pub tree: BehaviorTreeRef,
    pub interpreter: CollectiveInterpreter,
}

impl CollectiveBehavior {
    pub fn new(tree: BehaviorTreeRef, interpreter: CollectiveInterpreter) -> Self {
        Self {
            record_id: Uuid::new_v4(),
            revision: 0,
            tree,
            interpreter,
        }
    }

    /// Swap the bound tree and interpreter, keeping the record's identity.
    pub fn rebind(&mut self, tree: BehaviorTreeRef, interpreter: CollectiveInterpreter) {
        self.tree = tree;
        self.interpreter = interpreter;
        self.revision += 1;
    }

    /// Stable identity of this record across rebinds.
    pub fn record_id(&self) -> Uuid {
        self.record_id
    }

    /// Number of rebinds since creation.
    pub fn revision(&self) -> u32 {
        self.revision
    }
}

/// Materialized membership of one labelled group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hivemind {
    pub group_label: String,
    members: Vec<EntityId>,
}

impl Hivemind {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            group_label: label.into(),
            members: Vec::new(),
        }
    }

    /// Append a member; returns false if it was already present.
    pub fn insert(&mut self, entity: EntityId) -> bool {
        if self.members.contains(&entity) {
            return false;
        }
        self.members.push(entity);
        true
    }

    /// Members in insertion order.
    pub fn members(&self) -> &[EntityId] {
        &self.members
    }

    pub fn contains(&self, entity: EntityId) -> bool {
        self.members.contains(&entity)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Renderable mesh; only the skin is of interest here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkeletalMesh {
    pub material: Option<Skin>,
}

/// Movement parameters of a character.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharacterMovement {
    pub speed_multiplier: f32,
}

impl Default for CharacterMovement {
    fn default() -> Self {
        Self {
            speed_multiplier: 1.0,
        }
    }
}
