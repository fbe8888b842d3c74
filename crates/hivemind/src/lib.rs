//! # hivemind
//!
//! Coordinated behavior for groups of simulated agents.
//!
//! Groups of entities can be switched onto a shared behavior tree, have a
//! parameter broadcast to them, be driven by one collective interpreter, and
//! later return to exactly the behavior state they had before joining.
//!
//! ## Modules
//!
//! - [`behavior`]: Behavior trees, per-actor and collective interpreters
//! - [`world`]: Entity store boundary, component schemas, in-memory store
//! - [`assets`]: Tree, group and skin resolution
//! - [`group`]: Label-based membership and group definitions
//! - [`coordinator`]: Group assignment, backup/restore, hiveminds, clean-up
//! - [`scenario`]: Composed scenarios for a command layer
//!
//! ## Quick Start
//!
//! ```rust
//! use hivemind::assets::{AssetLibrary, ResourceId};
//! use hivemind::behavior::{BehaviorNode, BehaviorTree};
//! use hivemind::world::{EntityRecord, GroupTag, InMemoryWorld};
//! use hivemind::{GroupCoordinator, HivemindConfig};
//!
//! let mut world = InMemoryWorld::new();
//! world.spawn(EntityRecord::new("deer").with(GroupTag::new("magenta")));
//!
//! let mut assets = AssetLibrary::new();
//! assets.add_tree(BehaviorTree::new(
//!     ResourceId::new("Behaviors", "critter"),
//!     BehaviorNode::Action("wander".into()),
//! ));
//!
//! let mut coordinator = GroupCoordinator::new(world, assets, HivemindConfig::default()).unwrap();
//! let report = coordinator.assign_behavior("magenta", "Behaviors:critter", None);
//! assert_eq!(report.affected_count(), 1);
//! ```

pub mod assets;
pub mod behavior;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod group;
pub mod report;
pub mod scenario;
pub mod shared;
pub mod world;

// Convenience re-exports of the most commonly used types.
pub use assets::{AssetLibrary, AssetResolver, MaterialResolver, ResourceId};
pub use behavior::{
    ActionHandler, Actor, BehaviorNode, BehaviorStatus, BehaviorTree, BehaviorTreeRef,
    CollectiveInterpreter, CollectivePolicy, Interpreter, InterpreterSnapshot, ScriptedActions,
};
pub use config::{BackupPolicy, HivemindConfig};
pub use coordinator::GroupCoordinator;
pub use error::{HivemindError, Result};
pub use report::{GroupReport, Operation, SkipReason, TeardownReport};
pub use scenario::{Scenario, ScenarioOutcome};
pub use shared::SharedCoordinator;
pub use world::{EntityId, EntityStore, EntityStoreExt, InMemoryWorld};
