//! Implementation of the `repatch undo` command.

use std::path::Path;

use anyhow::Result;

use super::{load_project, run_patches};

/// Remove the patches matching `filters`, keeping everything else in place.
pub fn cmd_undo(config_path: &Path, filters: &[String]) -> Result<()> {
  let project = load_project(config_path)?;
  run_patches(project, filters, true)
}
