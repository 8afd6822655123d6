//! Implementation of the `repatch apply` command.

use std::path::Path;

use anyhow::Result;

use super::{load_project, run_patches};

/// Apply the declared patches.
///
/// `graceful` and `force_reset` override the corresponding settings of the
/// config file for this run only.
pub fn cmd_apply(config_path: &Path, filters: &[String], graceful: bool, force_reset: bool) -> Result<()> {
  let mut project = load_project(config_path)?;

  if graceful {
    project.config.settings.exit_on_first_failure = false;
  }
  if force_reset {
    project.config.settings.reset_everything = true;
  }

  run_patches(project, filters, false)
}
