//! Patch reconciliation runs.
//!
//! [`PatchesApplier::apply`] drives a full run:
//!
//! 1. Snapshot the packages and their recorded patches
//! 2. Generate the apply, removal and reset queues
//! 3. Per package, in snapshot order: reset queued targets, skip packages
//!    whose records already match the queue, apply the rest
//! 4. Record what applied after every package
//!
//! When a patch fails fatally the patches applied before it are recorded
//! before the error is returned, so the next run resumes from there.

mod events;
mod executor;
mod package;

use std::rc::Rc;

use indexmap::IndexSet;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::managers::{InstallError, PatcherStateManager, RepositoryManager};
use crate::output::{Logger, OutputStrategy, PatchInfoLogger};
use crate::package::{Package, PackageCollector, PackageSnapshot, StateGenerator, has_patch_changes};
use crate::patch::{DetailedQueue, PatchDefinition, PatchGroup, PatchStatus, RepositoryState, StatusConfig, all_targets};
use crate::queue::QueueGenerator;
use crate::repository::{Repository, RepositoryError};

pub use events::{EventDispatcher, PatchEvent, TracingDispatcher};
pub use executor::{CommandPatcher, PatchError, PatchExecutor};
pub use package::{FailurePolicy, PackageApplyOutcome, PackagePatchApplier, PatchFailure};

#[derive(Debug, Error)]
pub enum ApplyError {
  #[error("unknown target \"{target}\" encountered when checking patch changes for: {}", patches.join(", "))]
  PackageNotFound { target: String, patches: Vec<String> },

  #[error("failed to apply {path} to {package}")]
  PatchFailure {
    package: String,
    path: String,
    #[source]
    source: PatchError,
  },

  #[error("repository error")]
  Repository(#[from] RepositoryError),

  #[error("reset failed")]
  Install(#[from] InstallError),
}

/// The queues a run would work through, labelled for display.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Plan {
  pub apply: DetailedQueue,
  pub removals: DetailedQueue,
  pub resets: Vec<String>,
}

impl Plan {
  /// Whether a run would touch anything.
  pub fn is_noop(&self) -> bool {
    self.resets.is_empty() && self.removals.is_empty() && self.apply.patches().all(|(_, patch)| !patch.status.needs_apply())
  }
}

struct Queues {
  /// Recorded patches as of the start of the run.
  state: RepositoryState,
  apply: DetailedQueue,
  removals: DetailedQueue,
  resets: IndexSet<String>,
}

pub struct PatchesApplier {
  collector: PackageCollector,
  state_generator: StateGenerator,
  queue_generator: QueueGenerator,
  repository_manager: RepositoryManager,
  package_applier: PackagePatchApplier,
  state_manager: PatcherStateManager,
  output_strategy: OutputStrategy,
  status_config: StatusConfig,
  info_logger: PatchInfoLogger,
  logger: Rc<Logger>,
}

impl PatchesApplier {
  pub fn new(
    collector: PackageCollector,
    queue_generator: QueueGenerator,
    repository_manager: RepositoryManager,
    package_applier: PackagePatchApplier,
    output_strategy: OutputStrategy,
    logger: Rc<Logger>,
  ) -> Self {
    Self {
      collector,
      state_generator: StateGenerator,
      queue_generator,
      repository_manager,
      package_applier,
      state_manager: PatcherStateManager,
      output_strategy,
      status_config: StatusConfig,
      info_logger: PatchInfoLogger,
      logger,
    }
  }

  /// Compute the queues of a run without touching anything.
  pub fn plan(&self, repository: &dyn Repository, patches: &DetailedQueue) -> Result<Plan, ApplyError> {
    let packages = self.collector.collect(repository);
    let queues = self.queues(&packages, patches)?;
    Ok(Plan {
      apply: queues.apply,
      removals: queues.removals,
      resets: queues.resets.into_iter().collect(),
    })
  }

  /// Reconcile `patches` with the repository. Returns whether anything changed.
  pub fn apply(&self, repository: &mut dyn Repository, patches: &DetailedQueue) -> Result<bool, ApplyError> {
    let packages = self.collector.collect(repository);
    let Queues {
      state,
      apply: apply_queue,
      removals,
      resets: mut reset_queue,
    } = self.queues(&packages, patches)?;
    let footprints = apply_queue.simplify();

    info!(
      packages = packages.len(),
      patches = apply_queue.len(),
      removals = removals.len(),
      resets = reset_queue.len(),
      "reconciling patches"
    );

    let mut changed = false;
    let mut reset_targets: IndexSet<String> = IndexSet::new();

    for (name, package) in packages.iter() {
      let group = apply_queue.get(name);
      let patch_targets: IndexSet<String> = match group {
        Some(group) => all_targets(group),
        None => IndexSet::from([name.clone()]),
      };

      let due: Vec<String> = reset_queue
        .iter()
        .filter(|target| patch_targets.contains(*target))
        .cloned()
        .collect();
      for target in due {
        let removed = self.repository_manager.reset_package(repository, &target)?;
        if group.is_none() && !removed.is_empty() && !footprints.contains_target(&target) {
          self
            .logger
            .write_raw(&format!("Resetting patches for {target} ({})", removed.len()));
        }
        changed |= !removed.is_empty();
        reset_targets.insert(target);
      }
      reset_queue.retain(|target| !patch_targets.contains(target));

      let Some(group) = group else {
        continue;
      };

      let changed_targets: Vec<&String> = patch_targets
        .iter()
        .filter(|target| {
          let ledger = repository.find_package(target).and_then(Package::applied);
          has_patch_changes(ledger, footprints.get(target))
        })
        .collect();
      if changed_targets.is_empty() {
        debug!(package = %name, "patches already applied");
        continue;
      }

      let queue: PatchGroup = group
        .iter()
        .filter(|(_, patch)| patch.targets_any(changed_targets.iter().copied()))
        .filter(|(_, patch)| {
          patch.status != PatchStatus::Applied
            || (patch.targets_any(reset_targets.iter()) && was_recorded(&state, patch))
        })
        .map(|(path, patch)| (path.clone(), patch.clone()))
        .collect();
      if queue.is_empty() {
        continue;
      }

      let package_removals = removals.get(name).cloned().unwrap_or_default();
      let _mute = (!self.should_allow_output(&queue, &package_removals)).then(|| self.logger.mute());

      self
        .logger
        .write_raw(&format!("Applying patches for {name} ({})", queue.len()));
      if !package_removals.is_empty() {
        let _indent = self.logger.push("~");
        for patch in package_removals.values() {
          self.info_logger.output_patch_info(&self.logger, patch);
        }
      }

      self.process_patches_for_package(repository, package, &queue)?;

      changed = true;
      self.logger.write_new_line();
    }

    info!(changed, "patch run finished");
    Ok(changed)
  }

  fn queues(&self, packages: &PackageSnapshot, patches: &DetailedQueue) -> Result<Queues, ApplyError> {
    let state = self.state_generator.generate(packages);

    let apply_queue = self.queue_generator.generate_apply_queue(patches, &state);
    let removals = self.queue_generator.generate_removal_queue(&apply_queue, &state);
    let resets = self.queue_generator.generate_reset_queue(&apply_queue);
    let apply = apply_queue.patches();

    ensure_known_targets(packages, &apply, &resets)?;

    let labels: Vec<_> = self
      .status_config
      .labels()
      .into_iter()
      .filter(|(status, _)| *status != PatchStatus::Unknown)
      .collect();

    Ok(Queues {
      state,
      apply: apply.with_status_labels(&labels),
      removals: removals.with_status_labels(&labels),
      resets,
    })
  }

  fn process_patches_for_package(
    &self,
    repository: &mut dyn Repository,
    package: &Package,
    queue: &PatchGroup,
  ) -> Result<(), ApplyError> {
    let _indent = self.logger.push("~");
    let live = repository.find_package(&package.name).unwrap_or(package);
    self.repository_manager.prepare_package(live, queue)?;
    let outcome = self.package_applier.apply_patches(package, queue);

    let Some(failure) = outcome.failure else {
      self
        .state_manager
        .register_applied_patches(repository, &outcome.applied)?;
      debug!(
        package = %package.name,
        applied = outcome.applied.len(),
        skipped = outcome.skipped.len(),
        "package patched"
      );
      return Ok(());
    };

    let failed_at = queue.get_index_of(&failure.path).unwrap_or(queue.len());
    let applied: PatchGroup = queue
      .iter()
      .take(failed_at)
      .map(|(path, patch)| (path.clone(), patch.clone()))
      .collect();
    self.state_manager.register_applied_patches(repository, &applied)?;

    Err(ApplyError::PatchFailure {
      package: package.name.clone(),
      path: failure.path,
      source: failure.cause,
    })
  }

  fn should_allow_output(&self, patches: &PatchGroup, removals: &PatchGroup) -> bool {
    self.output_strategy.should_allow_for_patches(patches) || self.output_strategy.should_allow_for_patches(removals)
  }
}

/// Whether any target recorded `patch` before the run.
fn was_recorded(state: &RepositoryState, patch: &PatchDefinition) -> bool {
  patch.targets.iter().any(|target| state.contains(target, &patch.path))
}

/// Fail before any mutation when a queued target is not installed.
fn ensure_known_targets(
  packages: &PackageSnapshot,
  queue: &DetailedQueue,
  resets: &IndexSet<String>,
) -> Result<(), ApplyError> {
  let footprints = queue.simplify();
  let unknown = queue
    .patches()
    .flat_map(|(target, patch)| std::iter::once(target).chain(patch.targets.iter()))
    .chain(resets.iter())
    .find(|target| !packages.contains(target));

  match unknown {
    Some(target) => Err(ApplyError::PackageNotFound {
      target: target.clone(),
      patches: footprints
        .get(target)
        .map(|ledger| ledger.keys().cloned().collect())
        .unwrap_or_default(),
    }),
    None => Ok(()),
  }
}
