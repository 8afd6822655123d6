//! In-memory doubles of the engine's collaborators.
//!
//! The doubles share a [`Journal`] so a test can assert the relative order of
//! resets, patch runs and events across collaborators.

use std::cell::RefCell;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::apply::{EventDispatcher, PatchError, PatchEvent, PatchExecutor};
use crate::managers::{InstallError, Installer};
use crate::package::Package;
use crate::patch::{AppliedPatches, PatchDefinition, PatchGroup};
use crate::repository::{Repository, RepositoryError};

/// A declared patch with a fingerprint derived from its path.
pub fn patch(path: &str, targets: &[&str]) -> PatchDefinition {
  let mut patch = PatchDefinition::new(path, path, targets.iter().map(|t| t.to_string()).collect());
  patch.hash = Some(format!("hash-{path}"));
  patch
}

/// Ledger recording `patches` unchanged.
pub fn ledger(patches: &[&PatchDefinition]) -> AppliedPatches {
  patches.iter().map(|patch| (patch.path.clone(), patch.record())).collect()
}

/// Shared, ordered log of collaborator calls.
#[derive(Debug, Clone, Default)]
pub struct Journal(Rc<RefCell<Vec<String>>>);

impl Journal {
  pub fn record(&self, entry: impl Into<String>) {
    self.0.borrow_mut().push(entry.into());
  }

  pub fn entries(&self) -> Vec<String> {
    self.0.borrow().clone()
  }
}

/// Writable buffer whose contents stay readable after it is moved into a logger.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
  pub fn contents(&self) -> String {
    String::from_utf8_lossy(&self.0.borrow()).to_string()
  }
}

impl Write for SharedBuffer {
  fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
    self.0.borrow_mut().extend_from_slice(buf);
    Ok(buf.len())
  }

  fn flush(&mut self) -> io::Result<()> {
    Ok(())
  }
}

/// Repository kept in memory. Every `write` bumps a counter and keeps a copy
/// of the packages, so tests can tell what reached durable storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
  packages: Vec<Package>,
  root: Option<Package>,
  writes: usize,
  persisted: Vec<Package>,
  fail_writes: bool,
}

impl MemoryRepository {
  pub fn new(packages: Vec<Package>) -> Self {
    Self {
      packages,
      ..Self::default()
    }
  }

  pub fn with_root(mut self, root: Package) -> Self {
    self.root = Some(root);
    self
  }

  /// Make every `write` fail as if the disk were full.
  pub fn failing_writes(mut self) -> Self {
    self.fail_writes = true;
    self
  }

  pub fn writes(&self) -> usize {
    self.writes
  }

  /// Ledger of `name` as of the last write.
  pub fn persisted_ledger(&self, name: &str) -> Option<AppliedPatches> {
    self
      .persisted
      .iter()
      .find(|package| package.name == name)
      .and_then(|package| package.applied().cloned())
  }

  /// Paths of the current in-memory ledger of `name`, in order.
  pub fn ledger_paths(&self, name: &str) -> Vec<String> {
    self
      .find_package(name)
      .and_then(Package::applied)
      .map(|ledger| ledger.keys().cloned().collect())
      .unwrap_or_default()
  }
}

impl Repository for MemoryRepository {
  fn packages(&self) -> Vec<&Package> {
    self.packages.iter().collect()
  }

  fn root_package(&self) -> Option<&Package> {
    self.root.as_ref()
  }

  fn find_package(&self, name: &str) -> Option<&Package> {
    self.packages.iter().chain(self.root.as_ref()).find(|package| package.name == name)
  }

  fn find_package_mut(&mut self, name: &str) -> Option<&mut Package> {
    self
      .packages
      .iter_mut()
      .chain(self.root.as_mut())
      .find(|package| package.name == name)
  }

  fn write(&mut self) -> Result<(), RepositoryError> {
    if self.fail_writes {
      return Err(RepositoryError::Write(io::Error::other("disk full")));
    }
    self.writes += 1;
    self.persisted = self.packages.iter().chain(self.root.as_ref()).cloned().collect();
    Ok(())
  }
}

/// Executor that journals `apply <dir> <path>` and fails on selected paths.
#[derive(Debug, Clone, Default)]
pub struct ScriptedExecutor {
  journal: Journal,
  failing: Vec<String>,
}

impl ScriptedExecutor {
  pub fn new(journal: Journal) -> Self {
    Self {
      journal,
      failing: Vec::new(),
    }
  }

  pub fn failing_on(mut self, path: &str) -> Self {
    self.failing.push(path.to_string());
    self
  }
}

impl PatchExecutor for ScriptedExecutor {
  fn apply(&self, patch: &PatchDefinition, target_dir: &Path) -> Result<(), PatchError> {
    self.journal.record(format!("apply {} {}", target_dir.display(), patch.path));
    if self.failing.contains(&patch.path) {
      return Err(PatchError::Failed(format!("{} does not apply", patch.path)));
    }
    Ok(())
  }

  fn revert(&self, patch: &PatchDefinition, target_dir: &Path) -> Result<(), PatchError> {
    self.journal.record(format!("revert {} {}", target_dir.display(), patch.path));
    if self.failing.contains(&patch.path) {
      return Err(PatchError::Failed(format!("{} does not revert", patch.path)));
    }
    Ok(())
  }
}

/// Installer that journals `prepare <name>` and `reset <name>` and installs under `/vendor/<name>`.
#[derive(Debug, Clone, Default)]
pub struct RecordingInstaller {
  journal: Journal,
  failing: Vec<String>,
}

impl RecordingInstaller {
  pub fn new(journal: Journal) -> Self {
    Self {
      journal,
      failing: Vec::new(),
    }
  }

  pub fn failing_on(mut self, name: &str) -> Self {
    self.failing.push(name.to_string());
    self
  }
}

impl Installer for RecordingInstaller {
  fn install_path(&self, package: &Package) -> PathBuf {
    PathBuf::from("/vendor").join(&package.name)
  }

  fn prepare(&self, package: &Package, _patches: &PatchGroup) -> Result<(), InstallError> {
    self.journal.record(format!("prepare {}", package.name));
    Ok(())
  }

  fn reinstall(&self, package: &Package) -> Result<(), InstallError> {
    self.journal.record(format!("reset {}", package.name));
    if self.failing.contains(&package.name) {
      return Err(InstallError::MissingPristine {
        package: package.name.clone(),
        path: PathBuf::from("/pristine").join(&package.name),
      });
    }
    Ok(())
  }
}

/// Dispatcher that journals `<event> <path>`.
#[derive(Debug, Clone, Default)]
pub struct RecordingDispatcher {
  journal: Journal,
}

impl RecordingDispatcher {
  pub fn new(journal: Journal) -> Self {
    Self { journal }
  }
}

impl EventDispatcher for RecordingDispatcher {
  fn notify(&self, event: PatchEvent, _package: &Package, patch: &PatchDefinition) {
    self.journal.record(format!("{event} {}", patch.path));
  }
}
