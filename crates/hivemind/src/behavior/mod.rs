//! Behavior trees and the interpreters that run them.
//!
//! - **Trees** are immutable, named assets shared by reference
//! - **Interpreters** hold one actor's resumable run over a tree
//! - **Collective interpreters** advance one tree for a fixed set of actors
//! - **Actions** are the per-actor control surface leaves act through

pub mod actions;
pub mod collective;
pub mod interpreter;
pub mod tree;

pub use actions::{ActionHandler, Actor, ScriptedActions};
pub use collective::{CollectiveInterpreter, CollectivePolicy, CollectiveTick, LeafOutcome};
pub use interpreter::{Interpreter, InterpreterSnapshot, NodeMemory, RunState};
pub use tree::{BehaviorNode, BehaviorStatus, BehaviorTree, BehaviorTreeRef, DecoratorType, NodeId};
