//! The package repository the engine reads packages from and persists ledgers into.

mod json;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::package::Package;

pub use json::{InstalledManifest, JsonRepository};

/// Mutable store of installed packages.
///
/// The applied-patches ledger lives on the packages themselves; callers
/// mutate it through [`Repository::find_package_mut`] and make the change
/// durable with [`Repository::write`].
pub trait Repository {
  /// Installed packages in repository order.
  fn packages(&self) -> Vec<&Package>;

  /// The project package, if the repository tracks one.
  fn root_package(&self) -> Option<&Package>;

  /// Look up an installed package or the root package by name.
  fn find_package(&self, name: &str) -> Option<&Package>;

  fn find_package_mut(&mut self, name: &str) -> Option<&mut Package>;

  /// Flush the current package metadata to durable storage.
  fn write(&mut self) -> Result<(), RepositoryError>;
}

/// Errors raised while reading or writing a repository.
#[derive(Debug, Error)]
pub enum RepositoryError {
  #[error("repository file not found: {0}")]
  NotFound(PathBuf),

  #[error("failed to read repository")]
  Read(#[source] io::Error),

  #[error("failed to write repository")]
  Write(#[source] io::Error),

  #[error("failed to parse repository")]
  Parse(#[source] serde_json::Error),

  #[error("failed to serialize repository")]
  Serialize(#[source] serde_json::Error),
}
