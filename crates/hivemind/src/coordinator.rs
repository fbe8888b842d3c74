//! Group behavior coordination.
//!
//! The [`GroupCoordinator`] assigns trees to whole groups, backs up and
//! restores each member's individual run, materializes hiveminds and binds
//! collective interpreters to them.
//!
//! # Backups
//!
//! A group assignment over an entity that already runs a behavior first
//! copies that behavior (tree + deep snapshot of its interpreter) into the
//! entity's group tag. [`GroupCoordinator::recover_backup`] puts it back
//! so the entity resumes at the exact node it had reached. Skins are not
//! restored.
//!
//! # Failure model
//!
//! Every pass is per-entity isolated: a rejected write or a missing
//! component is recorded in the [`GroupReport`] and the pass moves on. Only
//! an unresolvable shared tree aborts an operation, before any side effect.

use tracing::{debug, info, warn};

use crate::assets::{AssetResolver, GroupDefinition, MaterialResolver};
use crate::behavior::{BehaviorTreeRef, CollectiveInterpreter, Interpreter};
use crate::config::{BackupPolicy, HivemindConfig};
use crate::error::{HivemindError, Result};
use crate::group::{actors_of, members_of, GroupRegistry};
use crate::report::{GroupReport, Operation, SkipReason, TeardownReport};
use crate::world::{
    Behavior, CharacterMovement, CollectiveBehavior, ComponentKind, EntityId, EntityStore,
    EntityStoreExt, GroupTag, Hivemind, SkeletalMesh,
};

/// Entity name given to materialized hiveminds.
pub const HIVEMIND_ENTITY_NAME: &str = "hivemindEntity";

/// Orchestrates group-wide behavior changes against an entity store.
pub struct GroupCoordinator<S, R> {
    store: S,
    assets: R,
    config: HivemindConfig,
    groups: GroupRegistry,
}

impl<S, R> GroupCoordinator<S, R>
where
    S: EntityStore,
    R: AssetResolver + MaterialResolver,
{
    /// Validate `config` and load the group definitions `assets` offers.
    pub fn new(store: S, assets: R, config: HivemindConfig) -> Result<Self> {
        config.validate()?;
        let groups = GroupRegistry::load(&assets);
        Ok(Self {
            store,
            assets,
            config,
            groups,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn assets(&self) -> &R {
        &self.assets
    }

    pub fn config(&self) -> &HivemindConfig {
        &self.config
    }

    pub fn groups(&self) -> &GroupRegistry {
        &self.groups
    }

    /// Give back the store and asset resolver.
    pub fn into_parts(self) -> (S, R) {
        (self.store, self.assets)
    }

    /// Current members of `label`; a fresh scan every call.
    pub fn members_of(&self, label: &str) -> Vec<EntityId> {
        members_of(&self.store, label)
    }

    /// Hivemind component of `entity`, if it is one.
    pub fn hivemind(&self, entity: EntityId) -> Option<Hivemind> {
        self.store.get(entity)
    }

    fn resolve_tree(&self, name: &str) -> Result<BehaviorTreeRef> {
        self.assets
            .behavior_tree(name)
            .ok_or_else(|| HivemindError::ResourceNotFound(name.to_string()))
    }

    // -- individual assignment ----------------------------------------------

    /// Give every member of `label` its own run of `tree_name`.
    ///
    /// Members that already run something get it backed up into their group
    /// tag first (subject to [`BackupPolicy`]). When `skin` is given it is
    /// applied to every member with a skeletal mesh; a skin that does not
    /// resolve is reported as a warning and the assignment proceeds.
    pub fn assign_behavior(&mut self, label: &str, tree_name: &str, skin: Option<&str>) -> GroupReport {
        let mut report = GroupReport::new(Operation::AssignBehavior, label);

        let tree = match self.resolve_tree(tree_name) {
            Ok(tree) => tree,
            Err(err) => {
                warn!(label, tree = tree_name, "behavior tree not found, nothing assigned");
                return report.abort(err);
            }
        };

        let skin = skin.and_then(|name| {
            let resolved = self.assets.resolve_skin(name);
            if resolved.is_none() {
                warn!(label, skin = name, "skin not found, assigning behavior without it");
                report
                    .warnings
                    .push(HivemindError::ResourceNotFound(name.to_string()));
            }
            resolved
        });

        let members = self.members_of(label);
        if members.is_empty() {
            log_notices(&report);
            return report;
        }

        for entity in members {
            let Some(mut tag) = self.store.get::<GroupTag>(entity) else {
                continue;
            };

            if let (Some(skin), Some(mut mesh)) = (&skin, self.store.get::<SkeletalMesh>(entity)) {
                mesh.material = Some(skin.clone());
                if let Err(err) = self.store.save_component(entity, mesh) {
                    warn!(%entity, error = %err, "failed to apply group skin");
                    report.failures.push((entity, err.into()));
                }
            }

            let capture = match self.config.backup_policy {
                BackupPolicy::Overwrite => true,
                BackupPolicy::FirstAssignmentWins => !tag.group_assigned,
            };
            let previous = self.store.get::<Behavior>(entity);
            if let Some(previous) = previous.as_ref().filter(|_| capture) {
                tag.record_backup(previous);
            }
            tag.group_assigned = true;

            // Behavior first: a rejected save must leave the tag as it was.
            if let Err(err) = self.store.save_component(entity, Behavior::new(entity, tree.clone())) {
                warn!(%entity, error = %err, "failed to save group behavior");
                report.failures.push((entity, err.into()));
                continue;
            }
            if let Err(err) = self.store.save_component(entity, tag) {
                warn!(%entity, error = %err, "failed to update group tag, reverting behavior");
                self.revert_behavior(entity, previous);
                report.failures.push((entity, err.into()));
                continue;
            }
            if let Some(previous) = previous.filter(|_| capture) {
                debug!(%entity, tree = %previous.tree.id(), "backed up individual behavior");
            }
            report.affected.push(entity);
        }

        info!(
            label,
            tree = %tree.id(),
            affected = report.affected.len(),
            failed = report.failures.len(),
            "assigned group behavior"
        );
        report
    }

    /// Put back the behavior an entity ran before a half-applied write.
    fn revert_behavior(&mut self, entity: EntityId, previous: Option<Behavior>) {
        let reverted = match previous {
            Some(behavior) => self.store.save_component(entity, behavior),
            None => self.store.remove_component::<Behavior>(entity).map(|_| ()),
        };
        if let Err(err) = reverted {
            warn!(%entity, error = %err, "could not revert behavior");
        }
    }

    // -- restore --------------------------------------------------------------

    /// Put every member of `label` back on the behavior it ran before its
    /// group assignment, resuming at the recorded node.
    pub fn recover_backup(&mut self, label: &str) -> GroupReport {
        let mut report = GroupReport::new(Operation::RecoverBackup, label);

        for entity in self.members_of(label) {
            let Some(mut tag) = self.store.get::<GroupTag>(entity) else {
                continue;
            };
            let (Some(tree), Some(snapshot)) = (tag.backup_tree.clone(), tag.backup_state.clone()) else {
                report.skipped.push((entity, SkipReason::MissingPriorState));
                continue;
            };

            let interpreter = match Interpreter::resume(tree.clone(), &snapshot) {
                Ok(interpreter) => interpreter,
                Err(err) => {
                    warn!(%entity, error = %err, "backup cannot be resumed");
                    report.failures.push((entity, err));
                    continue;
                }
            };

            let current = self.store.get::<Behavior>(entity);
            if let Err(err) = self.store.save_component(entity, Behavior { tree, interpreter }) {
                warn!(%entity, error = %err, "failed to save restored behavior");
                report.failures.push((entity, err.into()));
                continue;
            }

            tag.group_assigned = false;
            if self.config.clear_backup_on_restore {
                tag.clear_backup();
            }
            if let Err(err) = self.store.save_component(entity, tag) {
                warn!(%entity, error = %err, "failed to update group tag, reverting restore");
                self.revert_behavior(entity, current);
                report.failures.push((entity, err.into()));
                continue;
            }
            report.affected.push(entity);
        }

        info!(
            label,
            restored = report.affected.len(),
            skipped = report.skipped.len(),
            "recovered behavior backups"
        );
        log_notices(&report);
        report
    }

    // -- hiveminds -------------------------------------------------------------

    /// Create a new hivemind entity holding the current members of `label`.
    ///
    /// Every call creates an independent entity; clean-up is the caller's.
    pub fn materialize_hivemind(&mut self, label: &str) -> Result<EntityId> {
        let entity = self.store.create(HIVEMIND_ENTITY_NAME);
        let mut hivemind = Hivemind::new(label);
        for member in self.members_of(label) {
            hivemind.insert(member);
        }
        let members = hivemind.len();

        if let Err(err) = self.store.save_component(entity, hivemind) {
            self.store.destroy(entity);
            return Err(err.into());
        }
        info!(label, hivemind = %entity, members, "materialized hivemind");
        Ok(entity)
    }

    /// Set the movement speed multiplier of every hivemind member.
    /// Members without movement are skipped.
    pub fn propagate_speed(&mut self, hivemind: EntityId, multiplier: f32) -> GroupReport {
        let Some(hive) = self.hivemind(hivemind) else {
            return GroupReport::new(Operation::PropagateSpeed, "")
                .abort(HivemindError::NotAHivemind(hivemind));
        };
        let mut report = GroupReport::new(Operation::PropagateSpeed, hive.group_label.as_str());

        for &member in hive.members() {
            let Some(mut movement) = self.store.get::<CharacterMovement>(member) else {
                report
                    .skipped
                    .push((member, SkipReason::MissingComponent(ComponentKind::CharacterMovement)));
                continue;
            };
            movement.speed_multiplier = multiplier;
            match self.store.save_component(member, movement) {
                Ok(()) => report.affected.push(member),
                Err(err) => report.failures.push((member, err.into())),
            }
        }

        info!(
            label = %hive.group_label,
            multiplier,
            affected = report.affected.len(),
            "propagated speed"
        );
        report
    }

    /// Run `tree_name` collectively over the hivemind's members.
    ///
    /// No-op when the hivemind has no members or the tree does not resolve.
    /// An existing collective bound to the same tree is kept as is; one bound
    /// to another tree keeps its record and only gets a new tree and
    /// interpreter.
    pub fn assign_collective(&mut self, hivemind: EntityId, tree_name: &str) -> GroupReport {
        let Some(hive) = self.hivemind(hivemind) else {
            return GroupReport::new(Operation::AssignCollective, "")
                .abort(HivemindError::NotAHivemind(hivemind));
        };
        let mut report = GroupReport::new(Operation::AssignCollective, hive.group_label.as_str());

        let actors = actors_of(&hive);
        if actors.is_empty() {
            debug!(hivemind = %hivemind, "hivemind has no members, collective left unchanged");
            return report;
        }

        let tree = match self.resolve_tree(tree_name) {
            Ok(tree) => tree,
            Err(err) => {
                warn!(hivemind = %hivemind, tree = tree_name, "behavior tree not found");
                return report.abort(err);
            }
        };

        let interpreter = CollectiveInterpreter::new(actors, tree.clone(), self.config.collective_policy);
        let record = match self.store.get::<CollectiveBehavior>(hivemind) {
            Some(existing) if existing.tree.same_asset(&tree) => {
                debug!(hivemind = %hivemind, tree = %tree.id(), "collective already bound");
                report.skipped.push((hivemind, SkipReason::Unchanged));
                return report;
            }
            Some(mut existing) => {
                existing.rebind(tree.clone(), interpreter);
                existing
            }
            None => CollectiveBehavior::new(tree.clone(), interpreter),
        };

        match self.store.save_component(hivemind, record) {
            Ok(()) => report.affected.extend_from_slice(hive.members()),
            Err(err) => report.failures.push((hivemind, err.into())),
        }
        info!(
            hivemind = %hivemind,
            tree = %tree.id(),
            actors = report.affected.len(),
            "assigned collective behavior"
        );
        report
    }

    // -- assets & clean-up -----------------------------------------------------

    /// Load a group definition asset by name.
    pub fn describe_group(&self, name: &str) -> Result<GroupDefinition> {
        let def = self.assets.group(name)?;
        debug!(asset = name, label = %def.group_label, "loaded group definition");
        Ok(def)
    }

    /// Destroy every hivemind and every tagged entity. Backups are lost.
    pub fn teardown(&mut self) -> TeardownReport {
        let mut report = TeardownReport::default();
        for entity in self.store.entities_with(ComponentKind::Hivemind) {
            if self.store.destroy(entity) {
                report.hiveminds.push(entity);
            }
        }
        for entity in self.store.entities_with(ComponentKind::GroupTag) {
            if self.store.destroy(entity) {
                report.tagged.push(entity);
            }
        }
        info!(
            hiveminds = report.hiveminds.len(),
            tagged = report.tagged.len(),
            "tore down group entities"
        );
        report
    }
}

fn log_notices(report: &GroupReport) {
    for notice in report.notices() {
        debug!(operation = %report.operation, label = %report.label, %notice, "nothing to do");
    }
}
