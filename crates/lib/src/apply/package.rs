//! Applying the queued patches of a single package.

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::events::{EventDispatcher, PatchEvent};
use super::executor::{PatchError, PatchExecutor};
use crate::managers::Installer;
use crate::output::{Logger, PatchInfoLogger};
use crate::package::Package;
use crate::patch::PatchGroup;

/// What happens when a patch fails to apply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
  /// Stop at the first failure.
  #[default]
  Fatal,
  /// Warn, skip the patch and carry on with the rest.
  Graceful,
}

/// The patch that stopped a package under [`FailurePolicy::Fatal`].
#[derive(Debug)]
pub struct PatchFailure {
  pub path: String,
  pub cause: PatchError,
}

/// Result of applying one package's queue.
///
/// `applied` and `skipped` keep queue order. `failure` is only ever set under
/// [`FailurePolicy::Fatal`], in which case nothing after the failed patch was
/// attempted.
#[derive(Debug, Default)]
pub struct PackageApplyOutcome {
  pub applied: PatchGroup,
  pub skipped: PatchGroup,
  pub failure: Option<PatchFailure>,
}

pub struct PackagePatchApplier {
  installer: Rc<dyn Installer>,
  dispatcher: Box<dyn EventDispatcher>,
  failure_policy: FailurePolicy,
  logger: Rc<Logger>,
  executor: Box<dyn PatchExecutor>,
  info_logger: PatchInfoLogger,
}

impl PackagePatchApplier {
  pub fn new(
    installer: Rc<dyn Installer>,
    dispatcher: Box<dyn EventDispatcher>,
    failure_policy: FailurePolicy,
    logger: Rc<Logger>,
    executor: Box<dyn PatchExecutor>,
  ) -> Self {
    Self {
      installer,
      dispatcher,
      failure_policy,
      logger,
      executor,
      info_logger: PatchInfoLogger,
    }
  }

  /// Apply `queue` to the install directory of `package`, in order.
  pub fn apply_patches(&self, package: &Package, queue: &PatchGroup) -> PackageApplyOutcome {
    let target_dir = self.installer.install_path(package);
    let mut outcome = PackageApplyOutcome::default();

    for (path, patch) in queue {
      self.info_logger.output_patch_info(&self.logger, patch);
      self.dispatcher.notify(PatchEvent::PreApply, package, patch);

      let cause = match self.executor.apply(patch, &target_dir) {
        Ok(()) => {
          self.dispatcher.notify(PatchEvent::PostApply, package, patch);
          outcome.applied.insert(path.clone(), patch.clone());
          continue;
        }
        Err(cause) => cause,
      };

      match self.failure_policy {
        FailurePolicy::Fatal => {
          debug!(package = %package.name, patch = %path, error = %cause, "stopping at failed patch");
          outcome.failure = Some(PatchFailure {
            path: path.clone(),
            cause,
          });
          return outcome;
        }
        FailurePolicy::Graceful => {
          warn!(package = %package.name, patch = %path, error = %cause, "skipping failed patch");
          let _indent = self.logger.push("");
          self.logger.write_warning(&format!("could not apply patch, skipping: {cause}"));
          outcome.skipped.insert(path.clone(), patch.clone());
        }
      }
    }

    outcome
  }
}
