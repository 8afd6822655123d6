use std::rc::Rc;

use tracing::debug;

use super::{Config, ConfigError};
use crate::apply::{CommandPatcher, FailurePolicy, PackagePatchApplier, PatchesApplier, TracingDispatcher};
use crate::managers::{Installer, PristineInstaller, RepositoryManager};
use crate::output::{Logger, OutputStrategy};
use crate::package::PackageCollector;
use crate::queue::{FilteredListResolver, InvertedListResolver, ListResolver, QueueGenerator, ResetPolicy};

/// Wires a [`PatchesApplier`] from configuration.
///
/// Failure, reset and relevance strategies are chosen here, once; the applier
/// never inspects the settings again.
pub struct PatchesApplierFactory {
  logger: Rc<Logger>,
}

impl PatchesApplierFactory {
  pub fn new(logger: Rc<Logger>) -> Self {
    Self { logger }
  }

  /// Relevance policy for `filters`; `invert` selects everything but the matches.
  pub fn list_resolver<S: AsRef<str>>(filters: &[S], invert: bool) -> Result<Box<dyn ListResolver>, ConfigError> {
    let filtered = FilteredListResolver::from_globs(filters)?;
    if invert {
      Ok(Box::new(InvertedListResolver::new(Box::new(filtered))))
    } else {
      Ok(Box::new(filtered))
    }
  }

  pub fn create(&self, config: &Config, resolver: Box<dyn ListResolver>) -> PatchesApplier {
    let settings = &config.settings;

    let failure_policy = if settings.exit_on_first_failure {
      FailurePolicy::Fatal
    } else {
      FailurePolicy::Graceful
    };
    let reset_policy = if settings.reset_everything {
      ResetPolicy::FullReset
    } else {
      ResetPolicy::MissingPatches
    };
    debug!(?failure_policy, ?reset_policy, binary = %settings.patcher.binary, "creating patches applier");

    let executor = CommandPatcher::new(settings.patcher.binary.clone(), settings.patcher.levels.clone());
    let installer: Rc<dyn Installer> = Rc::new(
      PristineInstaller::new(config.base_dir(), &settings.vendor_dir, &settings.pristine_dir)
        .with_reverter(Rc::new(executor.clone())),
    );

    let package_applier = PackagePatchApplier::new(
      installer.clone(),
      Box::new(TracingDispatcher),
      failure_policy,
      self.logger.clone(),
      Box::new(executor),
    );

    PatchesApplier::new(
      PackageCollector,
      QueueGenerator::new(resolver, reset_policy),
      RepositoryManager::new(installer),
      package_applier,
      OutputStrategy::new(settings.output_triggers.clone()),
      self.logger.clone(),
    )
  }
}
