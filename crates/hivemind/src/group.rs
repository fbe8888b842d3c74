//! Group membership and group definitions.
//!
//! Membership is never cached: every call rescans the entities carrying a
//! [`GroupTag`](crate::world::GroupTag), so a result reflects the store at
//! the moment of the call and nothing after.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::assets::{AssetKind, AssetResolver, GroupDefinition};
use crate::behavior::Actor;
use crate::world::{ComponentKind, EntityId, EntityStore, EntityStoreExt, GroupTag, Hivemind};

/// Every entity tagged with `label` (case-insensitive), in store order.
///
/// An empty label, or one nobody carries, yields an empty list.
pub fn members_of<S: EntityStore + ?Sized>(store: &S, label: &str) -> Vec<EntityId> {
    if label.is_empty() {
        return Vec::new();
    }
    store
        .entities_with(ComponentKind::GroupTag)
        .into_iter()
        .filter(|entity| {
            store
                .get::<GroupTag>(*entity)
                .map_or(false, |tag| tag.is_in(label))
        })
        .collect()
}

/// Wrap each hivemind member into an actor handle.
pub fn actors_of(hivemind: &Hivemind) -> Vec<Actor> {
    hivemind.members().iter().copied().map(Actor::new).collect()
}

/// Group definitions known at start-up, keyed by lower-cased label.
#[derive(Debug, Clone, Default)]
pub struct GroupRegistry {
    groups: BTreeMap<String, GroupDefinition>,
}

impl GroupRegistry {
    /// Load every available group asset. Unreadable assets are logged and
    /// skipped; a later asset with the same label replaces an earlier one.
    pub fn load<R: AssetResolver + ?Sized>(resolver: &R) -> Self {
        let mut registry = Self::default();
        for id in resolver.available(AssetKind::Group) {
            match resolver.group(&id.to_string()) {
                Ok(def) => {
                    debug!(asset = %id, label = %def.group_label, "loaded group asset");
                    registry.insert(def);
                }
                Err(err) => warn!(asset = %id, error = %err, "failed to load group asset"),
            }
        }
        info!(groups = registry.len(), "group registry ready");
        registry
    }

    pub fn insert(&mut self, def: GroupDefinition) {
        self.groups.insert(def.group_label.to_lowercase(), def);
    }

    pub fn get(&self, label: &str) -> Option<&GroupDefinition> {
        self.groups.get(&label.to_lowercase())
    }

    pub fn contains(&self, label: &str) -> bool {
        self.get(label).is_some()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.groups.values().map(|def| def.group_label.as_str())
    }
}
