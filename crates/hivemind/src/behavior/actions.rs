//! Actors and the leaf-evaluation surface.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::tree::BehaviorStatus;
use crate::world::EntityId;

/// Addressable handle over an entity, as seen by the interpreter layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    entity: EntityId,
    /// Per-actor scratch values written by actions.
    pub blackboard: HashMap<String, String>,
}

impl Actor {
    pub fn new(entity: EntityId) -> Self {
        Self {
            entity,
            blackboard: HashMap::new(),
        }
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }
}

/// Control surface through which leaves act on an actor.
///
/// The tree position is decided by the interpreter; what a leaf actually
/// does to an actor is decided here, so two actors sharing a node can still
/// see different outcomes.
pub trait ActionHandler {
    /// Execute a named action.
    fn act(&mut self, actor: &mut Actor, action: &str) -> BehaviorStatus;

    /// Evaluate a named condition.
    fn check(&mut self, actor: &Actor, condition: &str) -> bool;

    /// Roll a per-actor chance in `[0, 1]`.
    fn roll(&mut self, actor: &Actor, probability: f64) -> bool;
}

/// Handler with pre-set results and a seeded random source.
///
/// Unknown actions fail and unknown conditions are false. Per-actor
/// overrides win over the shared script.
#[derive(Debug, Clone)]
pub struct ScriptedActions {
    action_results: HashMap<String, BehaviorStatus>,
    conditions: HashMap<String, bool>,
    overrides: HashMap<(EntityId, String), BehaviorStatus>,
    rng: StdRng,
    performed: Vec<(EntityId, String)>,
}

impl ScriptedActions {
    pub fn new(seed: u64) -> Self {
        Self {
            action_results: HashMap::new(),
            conditions: HashMap::new(),
            overrides: HashMap::new(),
            rng: StdRng::seed_from_u64(seed),
            performed: Vec::new(),
        }
    }

    /// Set the result that a named action should return.
    pub fn set_action_result(&mut self, name: &str, status: BehaviorStatus) {
        self.action_results.insert(name.to_string(), status);
    }

    /// Set the result of an action for one actor only.
    pub fn set_actor_result(&mut self, entity: EntityId, name: &str, status: BehaviorStatus) {
        self.overrides.insert((entity, name.to_string()), status);
    }

    /// Set a named boolean condition.
    pub fn set_condition(&mut self, name: &str, value: bool) {
        self.conditions.insert(name.to_string(), value);
    }

    /// Every `(entity, action)` executed so far, in order.
    pub fn performed(&self) -> &[(EntityId, String)] {
        &self.performed
    }

    pub fn clear_log(&mut self) {
        self.performed.clear();
    }
}

impl Default for ScriptedActions {
    fn default() -> Self {
        Self::new(0)
    }
}

impl ActionHandler for ScriptedActions {
    fn act(&mut self, actor: &mut Actor, action: &str) -> BehaviorStatus {
        self.performed.push((actor.entity(), action.to_string()));
        let status = self
            .overrides
            .get(&(actor.entity(), action.to_string()))
            .or_else(|| self.action_results.get(action))
            .copied()
            .unwrap_or(BehaviorStatus::Failure);
        actor
            .blackboard
            .insert("last_action".into(), action.to_string());
        status
    }

    fn check(&mut self, _actor: &Actor, condition: &str) -> bool {
        self.conditions.get(condition).copied().unwrap_or(false)
    }

    fn roll(&mut self, _actor: &Actor, probability: f64) -> bool {
        if probability.is_nan() || probability <= 0.0 {
            false
        } else if probability >= 1.0 {
            true
        } else {
            self.rng.gen_bool(probability)
        }
    }
}
