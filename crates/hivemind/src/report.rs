//! Structured results of group operations.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::HivemindError;
use crate::world::{ComponentKind, EntityId};

/// The group operation a report belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    AssignBehavior,
    AssignCollective,
    RecoverBackup,
    PropagateSpeed,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::AssignBehavior => "assign-behavior",
            Operation::AssignCollective => "assign-collective",
            Operation::RecoverBackup => "recover-backup",
            Operation::PropagateSpeed => "propagate-speed",
        };
        f.write_str(name)
    }
}

/// Why an entity was left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// No backup to restore.
    MissingPriorState,
    /// The entity lacks a component the operation needs.
    MissingComponent(ComponentKind),
    /// The requested state is already in place.
    Unchanged,
}

/// Outcome of one pass over a group.
///
/// Per-entity problems never stop the pass; they land in `skipped` or
/// `failures`. `aborted` is set only when the operation had nothing it could
/// meaningfully do, e.g. the requested tree does not resolve.
#[derive(Debug)]
pub struct GroupReport {
    pub operation: Operation,
    pub label: String,
    pub affected: Vec<EntityId>,
    pub skipped: Vec<(EntityId, SkipReason)>,
    pub failures: Vec<(EntityId, HivemindError)>,
    /// Non-fatal problems, such as a skin that did not resolve.
    pub warnings: Vec<HivemindError>,
    pub aborted: Option<HivemindError>,
}

impl GroupReport {
    pub fn new(operation: Operation, label: impl Into<String>) -> Self {
        Self {
            operation,
            label: label.into(),
            affected: Vec::new(),
            skipped: Vec::new(),
            failures: Vec::new(),
            warnings: Vec::new(),
            aborted: None,
        }
    }

    pub(crate) fn abort(mut self, err: HivemindError) -> Self {
        self.aborted = Some(err);
        self
    }

    pub fn affected_count(&self) -> usize {
        self.affected.len()
    }

    /// No per-entity failure and not aborted.
    pub fn is_success(&self) -> bool {
        self.aborted.is_none() && self.failures.is_empty()
    }

    /// Nothing was changed.
    pub fn is_noop(&self) -> bool {
        self.affected.is_empty()
    }

    pub fn was_skipped(&self, entity: EntityId) -> bool {
        self.skipped.iter().any(|(e, _)| *e == entity)
    }

    pub fn failed(&self, entity: EntityId) -> bool {
        self.failures.iter().any(|(e, _)| *e == entity)
    }

    /// Benign conditions of the pass, expressed as errors for callers that
    /// want to surface them. Every entry satisfies
    /// [`HivemindError::is_benign`].
    pub fn notices(&self) -> Vec<HivemindError> {
        let untouched = self.affected.is_empty() && self.skipped.is_empty() && self.failures.is_empty();
        if self.aborted.is_none() && untouched {
            return vec![HivemindError::EmptyGroup(self.label.clone())];
        }
        self.skipped
            .iter()
            .filter(|(_, reason)| *reason == SkipReason::MissingPriorState)
            .map(|(entity, _)| HivemindError::MissingPriorState(*entity))
            .collect()
    }
}

impl fmt::Display for GroupReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(err) = &self.aborted {
            return write!(f, "{} on '{}' aborted: {err}", self.operation, self.label);
        }
        write!(
            f,
            "{} on '{}': {} affected, {} skipped, {} failed",
            self.operation,
            self.label,
            self.affected.len(),
            self.skipped.len(),
            self.failures.len()
        )
    }
}

/// Entities removed by a clean-up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeardownReport {
    pub hiveminds: Vec<EntityId>,
    pub tagged: Vec<EntityId>,
}

impl TeardownReport {
    pub fn total(&self) -> usize {
        self.hiveminds.len() + self.tagged.len()
    }
}
