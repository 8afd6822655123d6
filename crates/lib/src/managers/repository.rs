//! Package resets.
//!
//! A reset restores a package's install directory to its pristine contents
//! and clears its ledger, so every patch has to be applied again.
//!
//! Packages installed in place (the project itself) cannot be swapped for a
//! copy. Their patches are reverted one by one instead, newest first, from
//! copies of the artifacts archived when they were applied.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::apply::{ApplyError, PatchError, PatchExecutor};
use crate::package::Package;
use crate::patch::{AppliedPatches, PatchDefinition, PatchGroup};
use crate::repository::Repository;

#[derive(Debug, Error)]
pub enum InstallError {
  #[error("no pristine copy of {package} at {path}")]
  MissingPristine { package: String, path: PathBuf },

  #[error("no archived copy of {path} to revert from {package}")]
  MissingArchive { package: String, path: String },

  #[error("refusing to reinstall {package} over {path}")]
  UnsafeTarget { package: String, path: PathBuf },

  #[error("failed to revert {path} from {package}")]
  Revert {
    package: String,
    path: String,
    #[source]
    source: PatchError,
  },

  #[error("failed to remove {path}")]
  Remove {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to copy {path}")]
  Copy {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to walk {path}")]
  Walk {
    path: PathBuf,
    #[source]
    source: walkdir::Error,
  },
}

/// Knows where packages live on disk and how to put them back.
pub trait Installer {
  fn install_path(&self, package: &Package) -> PathBuf;

  /// Called before `patches` land on `package`, so it can be restored later.
  fn prepare(&self, package: &Package, patches: &PatchGroup) -> Result<(), InstallError>;

  /// Restore the package's install directory to its unpatched state.
  fn reinstall(&self, package: &Package) -> Result<(), InstallError>;
}

/// Installer that restores packages from a directory of pristine copies.
///
/// `<pristine_dir>/<name>` holds the unpatched tree of every package, taken
/// by [`Installer::prepare`] while the package's ledger is still empty. For
/// in-place packages it holds the applied artifacts instead, named by hash.
/// Both directories are relative to `project_root`.
#[derive(Clone)]
pub struct PristineInstaller {
  project_root: PathBuf,
  vendor_dir: PathBuf,
  pristine_dir: PathBuf,
  reverter: Option<Rc<dyn PatchExecutor>>,
}

impl PristineInstaller {
  pub fn new(project_root: impl Into<PathBuf>, vendor_dir: impl Into<PathBuf>, pristine_dir: impl Into<PathBuf>) -> Self {
    Self {
      project_root: project_root.into(),
      vendor_dir: vendor_dir.into(),
      pristine_dir: pristine_dir.into(),
      reverter: None,
    }
  }

  /// Executor used to revert patches from in-place packages.
  pub fn with_reverter(mut self, reverter: Rc<dyn PatchExecutor>) -> Self {
    self.reverter = Some(reverter);
    self
  }

  pub fn pristine_path(&self, package: &Package) -> PathBuf {
    self.project_root.join(&self.pristine_dir).join(&package.name)
  }

  /// Whether the package's install directory contains the project itself.
  fn in_place(&self, package: &Package) -> bool {
    self.project_root.starts_with(self.install_path(package))
  }

  fn archived_artifact(&self, package: &Package, hash: &str) -> PathBuf {
    self.pristine_path(package).join(format!("{hash}.patch"))
  }

  fn snapshot(&self, package: &Package) -> Result<(), InstallError> {
    let source = self.install_path(package);
    if !source.is_dir() {
      debug!(package = %package.name, path = %source.display(), "nothing to snapshot");
      return Ok(());
    }

    let destination = self.pristine_path(package);
    if destination.starts_with(&source) {
      return Err(InstallError::UnsafeTarget {
        package: package.name.clone(),
        path: destination,
      });
    }

    let mut staging_name = destination.file_name().unwrap_or_default().to_os_string();
    staging_name.push(".tmp");
    let staging = destination.with_file_name(staging_name);

    remove_tree(&staging)?;
    copy_tree(&source, &staging)?;
    remove_tree(&destination)?;
    fs::rename(&staging, &destination).map_err(|source| InstallError::Copy {
      path: staging.clone(),
      source,
    })?;

    debug!(package = %package.name, to = %destination.display(), "pristine copy taken");
    Ok(())
  }

  fn archive_artifacts(&self, package: &Package, patches: &PatchGroup) -> Result<(), InstallError> {
    let archive = self.pristine_path(package);
    fs::create_dir_all(&archive).map_err(|source| InstallError::Copy {
      path: archive.clone(),
      source,
    })?;

    for patch in patches.values() {
      let Some(hash) = &patch.hash else {
        continue;
      };
      let target = self.archived_artifact(package, hash);
      if target.is_file() {
        continue;
      }
      fs::copy(&patch.file, &target).map_err(|source| InstallError::Copy {
        path: patch.file.clone(),
        source,
      })?;
    }
    Ok(())
  }

  fn revert_in_place(&self, package: &Package, destination: &Path) -> Result<(), InstallError> {
    let Some(reverter) = &self.reverter else {
      return Err(InstallError::UnsafeTarget {
        package: package.name.clone(),
        path: destination.to_path_buf(),
      });
    };
    let Some(ledger) = package.applied() else {
      return Ok(());
    };

    for (path, record) in ledger.iter().rev() {
      let artifact = record
        .hash
        .as_deref()
        .map(|hash| self.archived_artifact(package, hash))
        .filter(|artifact| artifact.is_file());
      let Some(artifact) = artifact else {
        return Err(InstallError::MissingArchive {
          package: package.name.clone(),
          path: path.clone(),
        });
      };

      let mut patch = PatchDefinition::from_record(path, record);
      patch.file = artifact;
      reverter
        .revert(&patch, destination)
        .map_err(|source| InstallError::Revert {
          package: package.name.clone(),
          path: path.clone(),
          source,
        })?;
    }

    debug!(package = %package.name, reverted = ledger.len(), "reverted in place");
    Ok(())
  }
}

impl Installer for PristineInstaller {
  fn install_path(&self, package: &Package) -> PathBuf {
    match &package.install_path {
      Some(path) => self.project_root.join(path),
      None => self.project_root.join(&self.vendor_dir).join(&package.name),
    }
  }

  fn prepare(&self, package: &Package, patches: &PatchGroup) -> Result<(), InstallError> {
    if self.in_place(package) {
      return self.archive_artifacts(package, patches);
    }
    // A recorded patch means the tree on disk is no longer pristine.
    if package.applied().is_some_and(|ledger| !ledger.is_empty()) {
      return Ok(());
    }
    self.snapshot(package)
  }

  fn reinstall(&self, package: &Package) -> Result<(), InstallError> {
    let destination = self.install_path(package);
    if self.in_place(package) {
      return self.revert_in_place(package, &destination);
    }

    let source = self.pristine_path(package);
    if !source.is_dir() {
      return Err(InstallError::MissingPristine {
        package: package.name.clone(),
        path: source,
      });
    }
    if source.starts_with(&destination) {
      return Err(InstallError::UnsafeTarget {
        package: package.name.clone(),
        path: destination,
      });
    }

    remove_tree(&destination)?;
    copy_tree(&source, &destination)?;
    debug!(package = %package.name, from = %source.display(), to = %destination.display(), "reinstalled package");
    Ok(())
  }
}

fn remove_tree(path: &Path) -> Result<(), InstallError> {
  match fs::remove_dir_all(path) {
    Ok(()) => Ok(()),
    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
    Err(source) => Err(InstallError::Remove {
      path: path.to_path_buf(),
      source,
    }),
  }
}

fn copy_tree(source: &Path, destination: &Path) -> Result<(), InstallError> {
  for entry in WalkDir::new(source) {
    let entry = entry.map_err(|source_err| InstallError::Walk {
      path: source.to_path_buf(),
      source: source_err,
    })?;
    let Ok(relative) = entry.path().strip_prefix(source) else {
      continue;
    };
    let target = destination.join(relative);
    let copy_error = |e| InstallError::Copy {
      path: entry.path().to_path_buf(),
      source: e,
    };

    let file_type = entry.file_type();
    if file_type.is_dir() {
      fs::create_dir_all(&target).map_err(copy_error)?;
    } else if file_type.is_symlink() {
      let link = fs::read_link(entry.path()).map_err(copy_error)?;
      #[cfg(unix)]
      std::os::unix::fs::symlink(&link, &target).map_err(copy_error)?;
      #[cfg(windows)]
      fs::copy(entry.path(), &target).map(|_| ()).map_err(copy_error)?;
    } else {
      fs::copy(entry.path(), &target).map_err(copy_error)?;
    }
  }
  Ok(())
}

/// Resets packages and clears their ledgers.
#[derive(Clone)]
pub struct RepositoryManager {
  installer: Rc<dyn Installer>,
}

impl RepositoryManager {
  pub fn new(installer: Rc<dyn Installer>) -> Self {
    Self { installer }
  }

  /// Let the installer record what it needs to reset `package` later.
  pub fn prepare_package(&self, package: &Package, patches: &PatchGroup) -> Result<(), ApplyError> {
    self.installer.prepare(package, patches)?;
    Ok(())
  }

  /// Clear the ledger of `name`, flush it, then reinstall the package.
  ///
  /// Returns the ledger as it was before the reset. The cleared ledger is
  /// persisted before the installer touches the disk; when the installer
  /// fails the ledger is put back and flushed again.
  pub fn reset_package(&self, repository: &mut dyn Repository, name: &str) -> Result<AppliedPatches, ApplyError> {
    let Some(package) = repository.find_package(name).cloned() else {
      return Err(ApplyError::PackageNotFound {
        target: name.to_string(),
        patches: Vec::new(),
      });
    };

    let removed = repository
      .find_package_mut(name)
      .and_then(|package| package.applied_patches.take())
      .unwrap_or_default();
    if let Err(e) = repository.write() {
      restore_ledger(repository, name, &package);
      return Err(e.into());
    }

    if let Err(e) = self.installer.reinstall(&package) {
      warn!(package = %name, error = %e, "reset failed, keeping ledger");
      restore_ledger(repository, name, &package);
      repository.write()?;
      return Err(e.into());
    }

    info!(package = %name, removed = removed.len(), "package reset");
    Ok(removed)
  }
}

fn restore_ledger(repository: &mut dyn Repository, name: &str, original: &Package) {
  if let Some(package) = repository.find_package_mut(name) {
    package.applied_patches = original.applied_patches.clone();
  }
}
