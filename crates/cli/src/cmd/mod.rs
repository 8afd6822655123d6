mod apply;
mod plan;
mod status;
mod undo;

use std::path::Path;
use std::rc::Rc;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::info;

use repatch_lib::config::{Config, PatchesApplierFactory};
use repatch_lib::output::Logger;
use repatch_lib::repository::{InstalledManifest, JsonRepository, RepositoryError};

use crate::output::{format_elapsed, print_info, print_success};

pub use apply::cmd_apply;
pub use plan::cmd_plan;
pub use status::cmd_status;
pub use undo::cmd_undo;

/// Configuration plus the repository it points at.
pub(crate) struct Project {
  pub config: Config,
  pub repository: JsonRepository,
}

pub(crate) fn load_project(config_path: &Path) -> Result<Project> {
  let config_path = dunce::canonicalize(config_path)
    .with_context(|| format!("Config file not found: {}", config_path.display()))?;
  let config =
    Config::load(&config_path).with_context(|| format!("Failed to load config: {}", config_path.display()))?;

  let repository_path = config.repository_path();
  let mut repository = match JsonRepository::load(&repository_path) {
    Ok(repository) => repository,
    Err(RepositoryError::NotFound(path)) => JsonRepository::new(path, InstalledManifest::default()),
    Err(e) => {
      return Err(e).with_context(|| format!("Failed to load repository: {}", repository_path.display()));
    }
  };
  if let Some(root) = &config.root {
    repository.ensure_root(root);
  }

  Ok(Project { config, repository })
}

/// Run the applier over the declared patches selected by `filters`.
pub(crate) fn run_patches(mut project: Project, filters: &[String], invert: bool) -> Result<()> {
  let declared = project
    .config
    .declared_patches()
    .context("Failed to resolve declared patches")?;
  let resolver = PatchesApplierFactory::list_resolver(filters, invert).context("Invalid filter")?;

  let logger = Rc::new(Logger::stderr());
  let applier = PatchesApplierFactory::new(logger).create(&project.config, resolver);

  let started = Instant::now();
  let changed = applier
    .apply(&mut project.repository, &declared)
    .context("Patch run failed")?;
  info!(changed, elapsed = ?started.elapsed(), "run complete");

  if changed {
    print_success(&format!("Patches reconciled in {}", format_elapsed(started.elapsed())));
  } else {
    print_info("Nothing to patch");
  }
  Ok(())
}
