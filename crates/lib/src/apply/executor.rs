//! Running a patch artifact against a directory.
//!
//! [`CommandPatcher`] drives a `patch(1)` compatible binary. Each strip level
//! is probed with `--dry-run` first, and the first level that applies cleanly
//! is used for the real run, so a rejected patch never leaves `.rej` hunks or
//! a half-patched tree behind. Reverting runs the same probe with `-R`.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use tracing::{debug, info};

use crate::consts::DEFAULT_PATCH_LEVELS;
use crate::patch::PatchDefinition;

#[derive(Debug, Error)]
pub enum PatchError {
  #[error("patch file not found: {0}")]
  FileNotFound(PathBuf),

  #[error("failed to run {binary}")]
  Spawn {
    binary: String,
    #[source]
    source: io::Error,
  },

  #[error("{path} does not apply with any of {}", levels.join(", "))]
  Rejected { path: String, levels: Vec<String> },

  #[error("{0}")]
  Failed(String),
}

/// Applies one patch to one directory.
pub trait PatchExecutor {
  fn apply(&self, patch: &PatchDefinition, target_dir: &Path) -> Result<(), PatchError>;

  /// Take a previously applied patch back out of `target_dir`.
  fn revert(&self, patch: &PatchDefinition, target_dir: &Path) -> Result<(), PatchError>;
}

#[derive(Debug, Clone)]
pub struct CommandPatcher {
  binary: String,
  levels: Vec<String>,
}

impl Default for CommandPatcher {
  fn default() -> Self {
    Self::new("patch", DEFAULT_PATCH_LEVELS.iter().map(|level| level.to_string()).collect())
  }
}

impl CommandPatcher {
  pub fn new(binary: impl Into<String>, levels: Vec<String>) -> Self {
    Self {
      binary: binary.into(),
      levels,
    }
  }

  /// Run the binary once; `Ok(false)` means it ran but rejected the patch.
  fn run(&self, level: &str, file: &Path, target_dir: &Path, reverse: bool, dry_run: bool) -> Result<bool, PatchError> {
    let mut command = Command::new(&self.binary);
    command.arg(level);
    if reverse {
      command.arg("-R");
    }
    command.arg("--no-backup-if-mismatch");
    if dry_run {
      command.arg("--dry-run");
    }
    command.arg("-i").arg(file).current_dir(target_dir);

    debug!(binary = %self.binary, level, reverse, dry_run, dir = %target_dir.display(), "spawning patcher");

    let output = command.output().map_err(|source| PatchError::Spawn {
      binary: self.binary.clone(),
      source,
    })?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      let stdout = String::from_utf8_lossy(&output.stdout);
      if !stderr.is_empty() {
        debug!(stderr = %stderr, "patcher stderr");
      }
      if !stdout.is_empty() {
        debug!(stdout = %stdout, "patcher stdout");
      }
    }

    Ok(output.status.success())
  }

  fn run_levels(&self, patch: &PatchDefinition, target_dir: &Path, reverse: bool) -> Result<(), PatchError> {
    if !patch.file.is_file() {
      return Err(PatchError::FileNotFound(patch.file.clone()));
    }

    let levels = match &patch.level {
      Some(level) => vec![level.clone()],
      None => self.levels.clone(),
    };

    for level in &levels {
      if !self.run(level, &patch.file, target_dir, reverse, true)? {
        continue;
      }
      if !self.run(level, &patch.file, target_dir, reverse, false)? {
        return Err(PatchError::Failed(format!(
          "{} passed the dry run with {level} but failed to {}",
          patch.path,
          if reverse { "revert" } else { "apply" }
        )));
      }
      info!(patch = %patch.path, level = %level, reverse, dir = %target_dir.display(), "patch applied");
      return Ok(());
    }

    Err(PatchError::Rejected {
      path: patch.path.clone(),
      levels,
    })
  }
}

impl PatchExecutor for CommandPatcher {
  fn apply(&self, patch: &PatchDefinition, target_dir: &Path) -> Result<(), PatchError> {
    self.run_levels(patch, target_dir, false)
  }

  fn revert(&self, patch: &PatchDefinition, target_dir: &Path) -> Result<(), PatchError> {
    self.run_levels(patch, target_dir, true)
  }
}
