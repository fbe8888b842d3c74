//! Asset resolution: behavior trees, group definitions and skins.
//!
//! The host engine owns asset loading. This module only describes the
//! lookup surface the coordinator needs ([`AssetResolver`],
//! [`MaterialResolver`]) plus [`AssetLibrary`], an in-memory implementation
//! used by tests, benches and embedders without an asset pipeline.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::behavior::{BehaviorTree, BehaviorTreeRef};
use crate::error::{HivemindError, Result};

// ---------------------------------------------------------------------------
// Resource identifiers
// ---------------------------------------------------------------------------

/// Identifier of a named resource: `module:name`, or a bare `name`.
///
/// Comparison is case-insensitive. A bare id used as a query matches a
/// resource of that name in any module (see [`ResourceId::matches`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceId {
    module: Option<String>,
    name: String,
}

impl ResourceId {
    /// Build an id from a module and a name.
    pub fn new(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module: Some(module.into()),
            name: name.into(),
        }
    }

    pub fn module(&self) -> Option<&str> {
        self.module.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether `self`, used as a lookup query, designates `candidate`.
    pub fn matches(&self, candidate: &ResourceId) -> bool {
        if !self.name.eq_ignore_ascii_case(&candidate.name) {
            return false;
        }
        match (&self.module, &candidate.module) {
            (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
            _ => true,
        }
    }

    fn key(&self) -> (Option<String>, String) {
        (
            self.module.as_ref().map(|m| m.to_ascii_lowercase()),
            self.name.to_ascii_lowercase(),
        )
    }
}

impl FromStr for ResourceId {
    type Err = HivemindError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || HivemindError::InvalidResourceId(s.to_string());
        match s.split_once(':') {
            Some((module, name)) => {
                if module.is_empty() || name.is_empty() || name.contains(':') {
                    return Err(invalid());
                }
                Ok(Self::new(module, name))
            }
            None if !s.is_empty() => Ok(Self {
                module: None,
                name: s.to_string(),
            }),
            None => Err(invalid()),
        }
    }
}

impl TryFrom<String> for ResourceId {
    type Error = HivemindError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ResourceId> for String {
    fn from(id: ResourceId) -> Self {
        id.to_string()
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.module {
            Some(module) => write!(f, "{module}:{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

impl PartialEq for ResourceId {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for ResourceId {}

impl Hash for ResourceId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialOrd for ResourceId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ResourceId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key().cmp(&other.key())
    }
}

// ---------------------------------------------------------------------------
// Asset payloads
// ---------------------------------------------------------------------------

/// Kinds of assets the resolver can enumerate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetKind {
    BehaviorTree,
    Group,
    Material,
}

/// A renderable skin (material) that can be attached to a skeletal mesh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skin {
    pub id: ResourceId,
}

/// A group definition asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDefinition {
    /// Label entities carry in their group tag.
    pub group_label: String,
    /// Tree the group is expected to run, if the asset names one.
    #[serde(default)]
    pub behavior: Option<String>,
}

impl GroupDefinition {
    /// Parse a group asset from JSON.
    pub fn from_json(source: &str) -> Result<Self> {
        let def: GroupDefinition = serde_json::from_str(source)?;
        if def.group_label.trim().is_empty() {
            return Err(HivemindError::InvalidConfig(
                "group asset has an empty label".into(),
            ));
        }
        Ok(def)
    }
}

// ---------------------------------------------------------------------------
// Resolver traits
// ---------------------------------------------------------------------------

/// Named-asset lookup provided by the host engine.
pub trait AssetResolver {
    /// Resolve a behavior tree by name.
    fn behavior_tree(&self, name: &str) -> Option<BehaviorTreeRef>;

    /// Resolve and parse a group definition asset.
    fn group(&self, name: &str) -> Result<GroupDefinition>;

    /// All ids of the given kind currently available.
    fn available(&self, kind: AssetKind) -> Vec<ResourceId>;
}

/// Skin/material lookup provided by the host renderer.
pub trait MaterialResolver {
    fn resolve_skin(&self, name: &str) -> Option<Skin>;
}

// ---------------------------------------------------------------------------
// In-memory library
// ---------------------------------------------------------------------------

/// In-memory asset catalogue.
#[derive(Debug, Clone, Default)]
pub struct AssetLibrary {
    trees: BTreeMap<ResourceId, BehaviorTreeRef>,
    groups: BTreeMap<ResourceId, String>,
    skins: BTreeMap<ResourceId, Skin>,
}

impl AssetLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tree under its own id, replacing any previous entry.
    pub fn add_tree(&mut self, tree: BehaviorTree) -> BehaviorTreeRef {
        let tree = tree.into_ref();
        self.trees.insert(tree.id().clone(), tree.clone());
        tree
    }

    /// Register raw group-asset source. Parsing happens on lookup.
    pub fn add_group_source(&mut self, id: ResourceId, source: impl Into<String>) {
        self.groups.insert(id, source.into());
    }

    pub fn add_skin(&mut self, id: ResourceId) {
        self.skins.insert(id.clone(), Skin { id });
    }

    fn lookup<'a, T>(map: &'a BTreeMap<ResourceId, T>, name: &str) -> Option<&'a T> {
        let query: ResourceId = name.parse().ok()?;
        map.iter()
            .find(|(id, _)| query.matches(id))
            .map(|(_, value)| value)
    }
}

impl AssetResolver for AssetLibrary {
    fn behavior_tree(&self, name: &str) -> Option<BehaviorTreeRef> {
        Self::lookup(&self.trees, name).cloned()
    }

    fn group(&self, name: &str) -> Result<GroupDefinition> {
        let source = Self::lookup(&self.groups, name)
            .ok_or_else(|| HivemindError::ResourceNotFound(name.to_string()))?;
        GroupDefinition::from_json(source)
    }

    fn available(&self, kind: AssetKind) -> Vec<ResourceId> {
        match kind {
            AssetKind::BehaviorTree => self.trees.keys().cloned().collect(),
            AssetKind::Group => self.groups.keys().cloned().collect(),
            AssetKind::Material => self.skins.keys().cloned().collect(),
        }
    }
}

impl MaterialResolver for AssetLibrary {
    fn resolve_skin(&self, name: &str) -> Option<Skin> {
        Self::lookup(&self.skins, name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::BehaviorNode;

    #[test]
    fn test_parse_resource_id() {
        let id: ResourceId = "Behaviors:critter".parse().unwrap();
        assert_eq!(id.module(), Some("Behaviors"));
        assert_eq!(id.name(), "critter");
        assert_eq!(id.to_string(), "Behaviors:critter");

        let bare: ResourceId = "magentaDeerSkin".parse().unwrap();
        assert_eq!(bare.module(), None);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["", ":x", "x:", "a:b:c"] {
            assert!(bad.parse::<ResourceId>().is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_bare_query_matches_any_module() {
        let query: ResourceId = "critter".parse().unwrap();
        assert!(query.matches(&ResourceId::new("Behaviors", "Critter")));
        let other: ResourceId = "engine:critter".parse().unwrap();
        assert!(!other.matches(&ResourceId::new("Behaviors", "critter")));
    }

    #[test]
    fn test_library_resolves_trees() {
        let mut lib = AssetLibrary::new();
        lib.add_tree(BehaviorTree::new(
            ResourceId::new("Behaviors", "critter"),
            BehaviorNode::Action("wander".into()),
        ));
        assert!(lib.behavior_tree("Behaviors:critter").is_some());
        assert!(lib.behavior_tree("BEHAVIORS:Critter").is_some());
        assert!(lib.behavior_tree("critter").is_some());
        assert!(lib.behavior_tree("Behaviors:stray").is_none());
        assert_eq!(lib.available(AssetKind::BehaviorTree).len(), 1);
    }

    #[test]
    fn test_library_group_parse() {
        let mut lib = AssetLibrary::new();
        lib.add_group_source(
            ResourceId::new("engine", "magenta"),
            r#"{"groupLabel": "magenta", "behavior": "Behaviors:critter"}"#,
        );
        lib.add_group_source(ResourceId::new("engine", "broken"), "{ nope");
        let def = lib.group("engine:magenta").unwrap();
        assert_eq!(def.group_label, "magenta");
        assert_eq!(def.behavior.as_deref(), Some("Behaviors:critter"));
        assert!(matches!(
            lib.group("engine:broken"),
            Err(HivemindError::Serialization(_))
        ));
        assert!(matches!(
            lib.group("engine:cyan"),
            Err(HivemindError::ResourceNotFound(_))
        ));
    }

    #[test]
    fn test_group_rejects_blank_label() {
        assert!(GroupDefinition::from_json(r#"{"groupLabel": "  "}"#).is_err());
    }

    #[test]
    fn test_skin_lookup() {
        let mut lib = AssetLibrary::new();
        lib.add_skin("magentaDeerSkin".parse().unwrap());
        assert!(lib.resolve_skin("magentadeerskin").is_some());
        assert!(lib.resolve_skin("cyanDeerSkin").is_none());
    }

    #[test]
    fn test_resource_id_serde() {
        let id = ResourceId::new("Behaviors", "critter");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"Behaviors:critter\"");
        let back: ResourceId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
