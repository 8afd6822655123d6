use indexmap::IndexMap;

use super::Package;
use crate::repository::Repository;

/// Name-keyed view of every package taking part in a run, in collection order.
#[derive(Debug, Clone, Default)]
pub struct PackageSnapshot(IndexMap<String, Package>);

impl PackageSnapshot {
  pub fn get(&self, name: &str) -> Option<&Package> {
    self.0.get(name)
  }

  pub fn contains(&self, name: &str) -> bool {
    self.0.contains_key(name)
  }

  pub fn iter(&self) -> indexmap::map::Iter<'_, String, Package> {
    self.0.iter()
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

impl FromIterator<Package> for PackageSnapshot {
  fn from_iter<I: IntoIterator<Item = Package>>(iter: I) -> Self {
    PackageSnapshot(iter.into_iter().map(|package| (package.name.clone(), package)).collect())
  }
}

/// Flattens a repository plus its root package into a [`PackageSnapshot`].
///
/// Installed packages come first in repository order, followed by the root
/// package.
#[derive(Debug, Clone, Copy, Default)]
pub struct PackageCollector;

impl PackageCollector {
  pub fn collect(&self, repository: &dyn Repository) -> PackageSnapshot {
    repository
      .packages()
      .into_iter()
      .chain(repository.root_package())
      .cloned()
      .collect()
  }
}
