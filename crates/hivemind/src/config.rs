//! Coordinator configuration: scenario defaults and policy knobs.

use serde::{Deserialize, Serialize};

use crate::behavior::CollectivePolicy;
use crate::error::{HivemindError, Result};

/// What a repeated group assignment does to an existing backup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackupPolicy {
    /// Keep the first backup; later assignments never replace it.
    #[default]
    FirstAssignmentWins,
    /// Every assignment re-captures whatever was running at that moment.
    Overwrite,
}

/// Top-level configuration for the group coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HivemindConfig {
    /// Group addressed by the bundled scenarios.
    pub group_label: String,
    /// Tree assigned by the bundled scenarios.
    pub behavior_tree: String,
    /// Skin applied by the individual-assignment scenario.
    pub group_skin: Option<String>,
    /// Speed broadcast by the synchronization scenario.
    pub speed_multiplier: f32,
    /// Group asset read by the describe scenario.
    pub group_asset: String,
    pub backup_policy: BackupPolicy,
    /// Drop the backup once it has been restored.
    pub clear_backup_on_restore: bool,
    pub collective_policy: CollectivePolicy,
}

impl Default for HivemindConfig {
    fn default() -> Self {
        Self {
            group_label: "magenta".into(),
            behavior_tree: "Behaviors:critter".into(),
            group_skin: Some("magentaDeerSkin".into()),
            speed_multiplier: 2.5,
            group_asset: "engine:magenta".into(),
            backup_policy: BackupPolicy::FirstAssignmentWins,
            clear_backup_on_restore: true,
            collective_policy: CollectivePolicy::All,
        }
    }
}

impl HivemindConfig {
    /// Parse and validate a JSON configuration. Missing keys take defaults.
    pub fn from_json(source: &str) -> Result<Self> {
        let config: HivemindConfig = serde_json::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no scenario can run with.
    pub fn validate(&self) -> Result<()> {
        if self.group_label.trim().is_empty() {
            return Err(HivemindError::InvalidConfig("group_label is empty".into()));
        }
        if self.behavior_tree.trim().is_empty() {
            return Err(HivemindError::InvalidConfig("behavior_tree is empty".into()));
        }
        if !self.speed_multiplier.is_finite() || self.speed_multiplier < 0.0 {
            return Err(HivemindError::InvalidConfig(format!(
                "speed_multiplier must be a non-negative number, got {}",
                self.speed_multiplier
            )));
        }
        Ok(())
    }
}
