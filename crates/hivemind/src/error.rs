//! Error types for group coordination.

use thiserror::Error;

use crate::world::EntityId;

/// Result type alias for hivemind operations.
pub type Result<T> = std::result::Result<T, HivemindError>;

/// Main error type for hivemind operations.
///
/// Errors never abort a whole group pass on their own: the coordinator
/// records them per entity in a [`GroupReport`](crate::GroupReport) and moves
/// on. Only a failure to resolve the shared tree requested by an operation
/// turns the operation into a no-op.
#[derive(Error, Debug)]
pub enum HivemindError {
    /// A named tree, skin or group asset does not resolve.
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// A label matched no tagged entity.
    #[error("Group '{0}' has no members")]
    EmptyGroup(String),

    /// The entity does not carry a hivemind.
    #[error("{0} is not a hivemind")]
    NotAHivemind(EntityId),

    /// Restore was requested for an entity without a recorded backup.
    #[error("No backup recorded for {0}")]
    MissingPriorState(EntityId),

    /// The entity store refused a write.
    #[error("Engine rejected write to {entity}: {reason}")]
    EngineWriteFailure {
        /// Entity the write targeted.
        entity: EntityId,
        /// Store-provided reason.
        reason: String,
    },

    /// A snapshot was replayed onto a different tree than it was taken from.
    #[error("Snapshot taken over '{expected}' cannot resume '{actual}'")]
    SnapshotMismatch {
        /// Tree the snapshot belongs to.
        expected: String,
        /// Tree the caller tried to bind.
        actual: String,
    },

    /// Malformed resource identifier.
    #[error("Invalid resource id: {0}")]
    InvalidResourceId(String),

    /// Configuration failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// JSON (de)serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl HivemindError {
    /// Whether this error only means "nothing to do" rather than a fault.
    pub fn is_benign(&self) -> bool {
        matches!(self, Self::EmptyGroup(_) | Self::MissingPriorState(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let e = HivemindError::ResourceNotFound("Behaviors:critter".into());
        assert!(e.to_string().contains("Behaviors:critter"));

        let e = HivemindError::EngineWriteFailure {
            entity: EntityId::new(7),
            reason: "read-only".into(),
        };
        assert!(e.to_string().contains("#7"));
        assert!(e.to_string().contains("read-only"));
    }

    #[test]
    fn test_benign_classification() {
        assert!(HivemindError::EmptyGroup("x".into()).is_benign());
        assert!(HivemindError::MissingPriorState(EntityId::new(1)).is_benign());
        assert!(!HivemindError::ResourceNotFound("x".into()).is_benign());
    }

    #[test]
    fn test_from_serde_error() {
        let err = serde_json::from_str::<u32>("nope").unwrap_err();
        let e: HivemindError = err.into();
        assert!(matches!(e, HivemindError::Serialization(_)));
    }
}
