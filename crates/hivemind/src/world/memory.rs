//! In-memory entity store.

use std::collections::{BTreeMap, HashSet};

use tracing::trace;

use super::components::{Behavior, CharacterMovement, CollectiveBehavior, GroupTag, Hivemind, SkeletalMesh};
use super::{Component, ComponentKind, EntityId, EntityStore, StoreError};

/// One entity: a name plus one optional slot per component kind.
#[derive(Debug, Clone, Default)]
pub struct EntityRecord {
    pub name: String,
    pub group_tag: Option<GroupTag>,
    pub behavior: Option<Behavior>,
    pub collective: Option<CollectiveBehavior>,
    pub hivemind: Option<Hivemind>,
    pub skeletal_mesh: Option<SkeletalMesh>,
    pub movement: Option<CharacterMovement>,
}

impl EntityRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn has(&self, kind: ComponentKind) -> bool {
        match kind {
            ComponentKind::GroupTag => self.group_tag.is_some(),
            ComponentKind::Behavior => self.behavior.is_some(),
            ComponentKind::CollectiveBehavior => self.collective.is_some(),
            ComponentKind::Hivemind => self.hivemind.is_some(),
            ComponentKind::SkeletalMesh => self.skeletal_mesh.is_some(),
            ComponentKind::CharacterMovement => self.movement.is_some(),
        }
    }

    pub fn get(&self, kind: ComponentKind) -> Option<Component> {
        match kind {
            ComponentKind::GroupTag => self.group_tag.clone().map(Component::GroupTag),
            ComponentKind::Behavior => self.behavior.clone().map(Component::Behavior),
            ComponentKind::CollectiveBehavior => {
                self.collective.clone().map(Component::CollectiveBehavior)
            }
            ComponentKind::Hivemind => self.hivemind.clone().map(Component::Hivemind),
            ComponentKind::SkeletalMesh => self.skeletal_mesh.clone().map(Component::SkeletalMesh),
            ComponentKind::CharacterMovement => self.movement.map(Component::CharacterMovement),
        }
    }

    pub fn put(&mut self, component: Component) {
        match component {
            Component::GroupTag(c) => self.group_tag = Some(c),
            Component::Behavior(c) => self.behavior = Some(c),
            Component::CollectiveBehavior(c) => self.collective = Some(c),
            Component::Hivemind(c) => self.hivemind = Some(c),
            Component::SkeletalMesh(c) => self.skeletal_mesh = Some(c),
            Component::CharacterMovement(c) => self.movement = Some(c),
        }
    }

    pub fn take(&mut self, kind: ComponentKind) -> Option<Component> {
        match kind {
            ComponentKind::GroupTag => self.group_tag.take().map(Component::GroupTag),
            ComponentKind::Behavior => self.behavior.take().map(Component::Behavior),
            ComponentKind::CollectiveBehavior => self.collective.take().map(Component::CollectiveBehavior),
            ComponentKind::Hivemind => self.hivemind.take().map(Component::Hivemind),
            ComponentKind::SkeletalMesh => self.skeletal_mesh.take().map(Component::SkeletalMesh),
            ComponentKind::CharacterMovement => self.movement.take().map(Component::CharacterMovement),
        }
    }

    /// Builder-style component attach.
    pub fn with(mut self, component: impl Into<Component>) -> Self {
        self.put(component.into());
        self
    }
}

/// Deterministic in-memory [`EntityStore`].
///
/// Entities enumerate in creation order. Writes to entities marked
/// read-only fail with [`StoreError::Rejected`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryWorld {
    next_id: u64,
    entities: BTreeMap<EntityId, EntityRecord>,
    read_only: HashSet<EntityId>,
}

impl InMemoryWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully built record and return its id.
    pub fn spawn(&mut self, record: EntityRecord) -> EntityId {
        self.next_id += 1;
        let id = EntityId::new(self.next_id);
        self.entities.insert(id, record);
        id
    }

    /// Mark an entity so that saves and removals are rejected.
    pub fn set_read_only(&mut self, entity: EntityId, read_only: bool) {
        if read_only {
            self.read_only.insert(entity);
        } else {
            self.read_only.remove(&entity);
        }
    }

    pub fn record(&self, entity: EntityId) -> Option<&EntityRecord> {
        self.entities.get(&entity)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    fn writable(&mut self, entity: EntityId) -> Result<&mut EntityRecord, StoreError> {
        if self.read_only.contains(&entity) {
            return Err(StoreError::Rejected {
                entity,
                reason: "entity is read-only".into(),
            });
        }
        self.entities
            .get_mut(&entity)
            .ok_or(StoreError::UnknownEntity(entity))
    }
}

impl EntityStore for InMemoryWorld {
    fn create(&mut self, name: &str) -> EntityId {
        self.spawn(EntityRecord::new(name))
    }

    fn exists(&self, entity: EntityId) -> bool {
        self.entities.contains_key(&entity)
    }

    fn entities_with(&self, kind: ComponentKind) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|(_, record)| record.has(kind))
            .map(|(id, _)| *id)
            .collect()
    }

    fn component(&self, entity: EntityId, kind: ComponentKind) -> Option<Component> {
        self.entities.get(&entity).and_then(|record| record.get(kind))
    }

    fn save(&mut self, entity: EntityId, component: Component) -> Result<(), StoreError> {
        trace!(%entity, kind = ?component.kind(), "save component");
        self.writable(entity)?.put(component);
        Ok(())
    }

    fn remove(&mut self, entity: EntityId, kind: ComponentKind) -> Result<Option<Component>, StoreError> {
        trace!(%entity, ?kind, "remove component");
        Ok(self.writable(entity)?.take(kind))
    }

    fn destroy(&mut self, entity: EntityId) -> bool {
        self.read_only.remove(&entity);
        self.entities.remove(&entity).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::EntityStoreExt;

    #[test]
    fn test_create_and_enumerate() {
        let mut world = InMemoryWorld::new();
        let a = world.spawn(EntityRecord::new("deer").with(GroupTag::new("magenta")));
        let b = world.create("rock");
        assert_ne!(a, b);
        assert_eq!(world.entities_with(ComponentKind::GroupTag), vec![a]);
        assert!(world.exists(b));
        assert_eq!(world.len(), 2);
    }

    #[test]
    fn test_read_modify_save() {
        let mut world = InMemoryWorld::new();
        let e = world.spawn(EntityRecord::new("deer").with(CharacterMovement::default()));
        let mut movement: CharacterMovement = world.get(e).unwrap();
        movement.speed_multiplier = 2.5;
        // Not visible until saved.
        assert_eq!(world.get::<CharacterMovement>(e).unwrap().speed_multiplier, 1.0);
        world.save_component(e, movement).unwrap();
        assert_eq!(world.get::<CharacterMovement>(e).unwrap().speed_multiplier, 2.5);
    }

    #[test]
    fn test_remove_component() {
        let mut world = InMemoryWorld::new();
        let e = world.spawn(EntityRecord::new("deer").with(GroupTag::new("cyan")));
        let tag: Option<GroupTag> = world.remove_component(e).unwrap();
        assert_eq!(tag.unwrap().group_label, "cyan");
        assert!(!world.has::<GroupTag>(e));
        assert!(world.remove_component::<GroupTag>(e).unwrap().is_none());
    }

    #[test]
    fn test_read_only_rejects_writes() {
        let mut world = InMemoryWorld::new();
        let e = world.create("statue");
        world.set_read_only(e, true);
        let err = world.save_component(e, CharacterMovement::default()).unwrap_err();
        assert!(matches!(err, StoreError::Rejected { .. }));
        assert!(world.remove(e, ComponentKind::Behavior).is_err());
        world.set_read_only(e, false);
        assert!(world.save_component(e, CharacterMovement::default()).is_ok());
    }

    #[test]
    fn test_unknown_entity() {
        let mut world = InMemoryWorld::new();
        let err = world
            .save_component(EntityId::new(99), CharacterMovement::default())
            .unwrap_err();
        assert_eq!(err, StoreError::UnknownEntity(EntityId::new(99)));
    }

    #[test]
    fn test_destroy() {
        let mut world = InMemoryWorld::new();
        let e = world.create("doomed");
        assert!(world.destroy(e));
        assert!(!world.destroy(e));
        assert!(world.is_empty());
    }
}
