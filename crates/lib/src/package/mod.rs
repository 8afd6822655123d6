//! Installed packages and the per-run snapshot of them.

mod collector;
mod state;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::patch::AppliedPatches;

pub use collector::{PackageCollector, PackageSnapshot};
pub use state::{StateGenerator, has_patch_changes};

/// An installed package as known to the repository.
///
/// `applied_patches` is the durable ledger of what is currently patched into
/// the package's install directory. It is stored with the package metadata so
/// it follows the package through the repository file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
  pub name: String,
  pub version: String,
  /// Install directory override, relative to the project root.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub install_path: Option<PathBuf>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub applied_patches: Option<AppliedPatches>,
}

impl Package {
  pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      version: version.into(),
      install_path: None,
      applied_patches: None,
    }
  }

  pub fn with_install_path(mut self, path: impl Into<PathBuf>) -> Self {
    self.install_path = Some(path.into());
    self
  }

  /// The ledger, treating an absent one as empty.
  pub fn applied(&self) -> Option<&AppliedPatches> {
    self.applied_patches.as_ref().filter(|ledger| !ledger.is_empty())
  }
}
