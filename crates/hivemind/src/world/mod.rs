//! Entity store boundary.
//!
//! The host engine owns entities and their components. The coordinator only
//! talks to it through [`EntityStore`] using a read-modify-save protocol:
//! components come out as values, get changed, and are saved back.
//! [`InMemoryWorld`] is a self-contained store for tests and embedders.

pub mod components;
pub mod memory;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::HivemindError;

pub use components::{
    labels_match, Behavior, CharacterMovement, CollectiveBehavior, GroupTag, Hivemind, SkeletalMesh,
};
pub use memory::{EntityRecord, InMemoryWorld};

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Opaque handle to an entity owned by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

/// Tag naming each component slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    GroupTag,
    Behavior,
    CollectiveBehavior,
    Hivemind,
    SkeletalMesh,
    CharacterMovement,
}

/// Any component value.
#[derive(Debug, Clone)]
pub enum Component {
    GroupTag(GroupTag),
    Behavior(Behavior),
    CollectiveBehavior(CollectiveBehavior),
    Hivemind(Hivemind),
    SkeletalMesh(SkeletalMesh),
    CharacterMovement(CharacterMovement),
}

impl Component {
    pub fn kind(&self) -> ComponentKind {
        match self {
            Component::GroupTag(_) => ComponentKind::GroupTag,
            Component::Behavior(_) => ComponentKind::Behavior,
            Component::CollectiveBehavior(_) => ComponentKind::CollectiveBehavior,
            Component::Hivemind(_) => ComponentKind::Hivemind,
            Component::SkeletalMesh(_) => ComponentKind::SkeletalMesh,
            Component::CharacterMovement(_) => ComponentKind::CharacterMovement,
        }
    }
}

/// Typed access to one [`Component`] variant.
pub trait ComponentData: Sized + Into<Component> {
    const KIND: ComponentKind;

    fn from_component(component: Component) -> Option<Self>;
}

macro_rules! component_data {
    ($($ty:ident),* $(,)?) => {
        $(
            impl From<$ty> for Component {
                fn from(value: $ty) -> Self {
                    Component::$ty(value)
                }
            }

            impl ComponentData for $ty {
                const KIND: ComponentKind = ComponentKind::$ty;

                fn from_component(component: Component) -> Option<Self> {
                    match component {
                        Component::$ty(value) => Some(value),
                        _ => None,
                    }
                }
            }
        )*
    };
}

component_data!(
    GroupTag,
    Behavior,
    CollectiveBehavior,
    Hivemind,
    SkeletalMesh,
    CharacterMovement,
);

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Errors raised by an entity store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("unknown entity {0}")]
    UnknownEntity(EntityId),
    #[error("write to {entity} rejected: {reason}")]
    Rejected { entity: EntityId, reason: String },
}

impl StoreError {
    pub fn entity(&self) -> EntityId {
        match self {
            StoreError::UnknownEntity(entity) => *entity,
            StoreError::Rejected { entity, .. } => *entity,
        }
    }
}

impl From<StoreError> for HivemindError {
    fn from(err: StoreError) -> Self {
        HivemindError::EngineWriteFailure {
            entity: err.entity(),
            reason: err.to_string(),
        }
    }
}

/// Entity/component storage provided by the host engine.
pub trait EntityStore {
    /// Create an empty entity.
    fn create(&mut self, name: &str) -> EntityId;

    fn exists(&self, entity: EntityId) -> bool;

    /// Every live entity carrying a component of `kind`.
    fn entities_with(&self, kind: ComponentKind) -> Vec<EntityId>;

    /// Copy of one component, if present.
    fn component(&self, entity: EntityId, kind: ComponentKind) -> Option<Component>;

    /// Insert or overwrite a component.
    fn save(&mut self, entity: EntityId, component: Component) -> Result<(), StoreError>;

    /// Detach a component, returning it.
    fn remove(&mut self, entity: EntityId, kind: ComponentKind) -> Result<Option<Component>, StoreError>;

    /// Destroy an entity with all its components. Returns false if unknown.
    fn destroy(&mut self, entity: EntityId) -> bool;
}

/// Typed helpers over any [`EntityStore`].
pub trait EntityStoreExt: EntityStore {
    fn get<C: ComponentData>(&self, entity: EntityId) -> Option<C> {
        self.component(entity, C::KIND).and_then(C::from_component)
    }

    fn has<C: ComponentData>(&self, entity: EntityId) -> bool {
        self.component(entity, C::KIND).is_some()
    }

    fn save_component<C: ComponentData>(&mut self, entity: EntityId, component: C) -> Result<(), StoreError> {
        self.save(entity, component.into())
    }

    fn remove_component<C: ComponentData>(&mut self, entity: EntityId) -> Result<Option<C>, StoreError> {
        Ok(self.remove(entity, C::KIND)?.and_then(C::from_component))
    }
}

impl<S: EntityStore + ?Sized> EntityStoreExt for S {}
