//! Composed group scenarios for a thin command layer.
//!
//! Each [`Scenario`] chains coordinator operations with the defaults from
//! [`HivemindConfig`](crate::HivemindConfig) and returns a
//! [`ScenarioOutcome`]. Turning that into text is left to `Display`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::assets::{AssetResolver, GroupDefinition, MaterialResolver};
use crate::coordinator::GroupCoordinator;
use crate::error::HivemindError;
use crate::report::{GroupReport, TeardownReport};
use crate::world::{EntityId, EntityStore};

/// Bundled group scenarios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scenario {
    /// Same tree, individually run, for every group member.
    AssignGroupBehavior,
    /// One parameter change broadcast through a hivemind.
    SynchronizeSpeed,
    /// One tree run collectively by a hivemind.
    CollectiveBehavior,
    /// Members go back to their pre-group behavior.
    RestoreBackup,
    /// Read a group definition asset.
    DescribeGroup,
    /// Remove every hivemind and tagged entity.
    Teardown,
}

impl Scenario {
    pub const ALL: [Scenario; 6] = [
        Scenario::AssignGroupBehavior,
        Scenario::SynchronizeSpeed,
        Scenario::CollectiveBehavior,
        Scenario::RestoreBackup,
        Scenario::DescribeGroup,
        Scenario::Teardown,
    ];

    /// Command name.
    pub fn name(self) -> &'static str {
        match self {
            Scenario::AssignGroupBehavior => "assign",
            Scenario::SynchronizeSpeed => "sync-speed",
            Scenario::CollectiveBehavior => "collective",
            Scenario::RestoreBackup => "restore",
            Scenario::DescribeGroup => "describe",
            Scenario::Teardown => "teardown",
        }
    }

    /// One-line help text.
    pub fn description(self) -> &'static str {
        match self {
            Scenario::AssignGroupBehavior => "assign the group tree to every member of the group",
            Scenario::SynchronizeSpeed => "broadcast a speed change to every member of the group",
            Scenario::CollectiveBehavior => "run one tree collectively for the whole group",
            Scenario::RestoreBackup => "return members to the behavior they ran before joining",
            Scenario::DescribeGroup => "load the group definition asset",
            Scenario::Teardown => "destroy every hivemind and tagged entity",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Scenario {
    type Err = HivemindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scenario::ALL
            .into_iter()
            .find(|scenario| scenario.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| HivemindError::ResourceNotFound(format!("scenario '{s}'")))
    }
}

/// Structured result of a scenario run.
#[derive(Debug)]
pub enum ScenarioOutcome {
    /// A single group pass.
    Group(GroupReport),
    /// A pass addressed through a freshly materialized hivemind.
    Hivemind { hivemind: EntityId, report: GroupReport },
    Described(GroupDefinition),
    TornDown(TeardownReport),
    Failed { scenario: Scenario, error: HivemindError },
}

impl ScenarioOutcome {
    pub fn is_success(&self) -> bool {
        match self {
            ScenarioOutcome::Group(report) | ScenarioOutcome::Hivemind { report, .. } => {
                report.is_success()
            }
            ScenarioOutcome::Described(_) | ScenarioOutcome::TornDown(_) => true,
            ScenarioOutcome::Failed { .. } => false,
        }
    }

    pub fn report(&self) -> Option<&GroupReport> {
        match self {
            ScenarioOutcome::Group(report) | ScenarioOutcome::Hivemind { report, .. } => Some(report),
            _ => None,
        }
    }

    /// Number of entities the scenario changed or removed.
    pub fn affected_count(&self) -> usize {
        match self {
            ScenarioOutcome::Group(report) | ScenarioOutcome::Hivemind { report, .. } => {
                report.affected_count()
            }
            ScenarioOutcome::TornDown(report) => report.total(),
            ScenarioOutcome::Described(_) | ScenarioOutcome::Failed { .. } => 0,
        }
    }
}

impl fmt::Display for ScenarioOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScenarioOutcome::Group(report) => write!(f, "{report}"),
            ScenarioOutcome::Hivemind { hivemind, report } => write!(f, "{report} (via {hivemind})"),
            ScenarioOutcome::Described(def) => write!(f, "Loaded group label {}", def.group_label),
            ScenarioOutcome::TornDown(report) => write!(
                f,
                "Removed {} hiveminds and {} tagged entities",
                report.hiveminds.len(),
                report.tagged.len()
            ),
            ScenarioOutcome::Failed { scenario, error } => write!(f, "{scenario} failed: {error}"),
        }
    }
}

impl<S, R> GroupCoordinator<S, R>
where
    S: EntityStore,
    R: AssetResolver + MaterialResolver,
{
    /// Run one bundled scenario with the configured defaults.
    pub fn run(&mut self, scenario: Scenario) -> ScenarioOutcome {
        let config = self.config().clone();
        let label = config.group_label.as_str();
        match scenario {
            Scenario::AssignGroupBehavior => ScenarioOutcome::Group(self.assign_behavior(
                label,
                &config.behavior_tree,
                config.group_skin.as_deref(),
            )),
            Scenario::SynchronizeSpeed => match self.materialize_hivemind(label) {
                Ok(hivemind) => ScenarioOutcome::Hivemind {
                    hivemind,
                    report: self.propagate_speed(hivemind, config.speed_multiplier),
                },
                Err(error) => ScenarioOutcome::Failed { scenario, error },
            },
            Scenario::CollectiveBehavior => match self.materialize_hivemind(label) {
                Ok(hivemind) => ScenarioOutcome::Hivemind {
                    hivemind,
                    report: self.assign_collective(hivemind, &config.behavior_tree),
                },
                Err(error) => ScenarioOutcome::Failed { scenario, error },
            },
            Scenario::RestoreBackup => ScenarioOutcome::Group(self.recover_backup(label)),
            Scenario::DescribeGroup => match self.describe_group(&config.group_asset) {
                Ok(def) => ScenarioOutcome::Described(def),
                Err(error) => ScenarioOutcome::Failed { scenario, error },
            },
            Scenario::Teardown => ScenarioOutcome::TornDown(self.teardown()),
        }
    }
}
