//! JSON-file backed repository.
//!
//! # Storage Layout
//!
//! ```json
//! {
//!   "root": { "name": "acme/project", "version": "dev", "install_path": "." },
//!   "packages": [
//!     {
//!       "name": "acme/widget",
//!       "version": "1.4.0",
//!       "applied_patches": {
//!         "patches/widget-fix.patch": { "source": "root", "hash": "9f2c…", "targets": ["acme/widget"] }
//!       }
//!     }
//!   ]
//! }
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{Repository, RepositoryError};
use crate::package::Package;

/// On-disk shape of the repository file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstalledManifest {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub root: Option<Package>,
  #[serde(default)]
  pub packages: Vec<Package>,
}

/// Repository persisted as a single JSON file.
///
/// Every [`Repository::write`] rewrites the whole file atomically (temp file,
/// then rename), so a crash never leaves a half-written ledger behind.
#[derive(Debug, Clone)]
pub struct JsonRepository {
  path: PathBuf,
  manifest: InstalledManifest,
}

impl JsonRepository {
  pub fn new(path: PathBuf, manifest: InstalledManifest) -> Self {
    Self { path, manifest }
  }

  /// Load the repository file at `path`.
  pub fn load(path: &Path) -> Result<Self, RepositoryError> {
    let content = match fs::read_to_string(path) {
      Ok(content) => content,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(RepositoryError::NotFound(path.to_path_buf())),
      Err(e) => return Err(RepositoryError::Read(e)),
    };

    let manifest: InstalledManifest = serde_json::from_str(&content).map_err(RepositoryError::Parse)?;
    debug!(
      path = %path.display(),
      packages = manifest.packages.len(),
      has_root = manifest.root.is_some(),
      "loaded repository"
    );

    Ok(Self::new(path.to_path_buf(), manifest))
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Track `name` as the root package, installed at the project root, unless
  /// the file already names one.
  pub fn ensure_root(&mut self, name: &str) {
    if self.manifest.root.is_none() {
      debug!(root = %name, "adding root package");
      self.manifest.root = Some(Package::new(name, "dev").with_install_path("."));
    }
  }
}

impl Repository for JsonRepository {
  fn packages(&self) -> Vec<&Package> {
    self.manifest.packages.iter().collect()
  }

  fn root_package(&self) -> Option<&Package> {
    self.manifest.root.as_ref()
  }

  fn find_package(&self, name: &str) -> Option<&Package> {
    self
      .manifest
      .packages
      .iter()
      .chain(self.manifest.root.as_ref())
      .find(|package| package.name == name)
  }

  fn find_package_mut(&mut self, name: &str) -> Option<&mut Package> {
    self
      .manifest
      .packages
      .iter_mut()
      .chain(self.manifest.root.as_mut())
      .find(|package| package.name == name)
  }

  fn write(&mut self) -> Result<(), RepositoryError> {
    if let Some(parent) = self.path.parent()
      && !parent.as_os_str().is_empty()
    {
      fs::create_dir_all(parent).map_err(RepositoryError::Write)?;
    }

    let content = serde_json::to_string_pretty(&self.manifest).map_err(RepositoryError::Serialize)?;

    let mut temp_name = self.path.file_name().unwrap_or_default().to_os_string();
    temp_name.push(".tmp");
    let temp_path = self.path.with_file_name(temp_name);

    fs::write(&temp_path, &content).map_err(RepositoryError::Write)?;
    fs::rename(&temp_path, &self.path).map_err(RepositoryError::Write)?;

    info!(path = %self.path.display(), "repository written");
    Ok(())
  }
}
