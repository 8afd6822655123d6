//! Patch lists in their two shapes.
//!
//! A [`DetailedQueue`] groups full [`PatchDefinition`]s under the package they
//! are applied to. A [`SimplifiedQueue`] is the flattened form: every patch is
//! listed as a [`PatchRecord`] under *each* of its targets, which is exactly
//! the shape of the persisted ledger. Conversions between the two never
//! reorder entries.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use super::types::{PatchDefinition, PatchRecord, PatchStatus};

/// Patches of one target, keyed by patch path, in application order.
pub type PatchGroup = IndexMap<String, PatchDefinition>;

/// Ledger of one package: patch path to record, in application order.
pub type AppliedPatches = IndexMap<String, PatchRecord>;

/// Applied patches per package, as read from the repository.
pub type RepositoryState = SimplifiedQueue;

/// Every target referenced by the patches of a group, in first-seen order.
pub fn all_targets(group: &PatchGroup) -> IndexSet<String> {
  group.values().flat_map(|patch| patch.targets.iter().cloned()).collect()
}

/// Target name to the full definitions of the patches applied to it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DetailedQueue(IndexMap<String, PatchGroup>);

impl DetailedQueue {
  pub fn new() -> Self {
    Self::default()
  }

  /// Group patches under their install target, keeping declaration order.
  ///
  /// Patches without any target cannot be placed and are dropped.
  pub fn from_patches(patches: impl IntoIterator<Item = PatchDefinition>) -> Self {
    let mut queue = Self::new();
    for patch in patches {
      if let Some(target) = patch.install_target().map(str::to_string) {
        queue.insert(&target, patch);
      }
    }
    queue
  }

  /// Insert a patch under `target`, replacing an entry with the same path in place.
  pub fn insert(&mut self, target: &str, patch: PatchDefinition) {
    self
      .0
      .entry(target.to_string())
      .or_default()
      .insert(patch.path.clone(), patch);
  }

  pub fn get(&self, target: &str) -> Option<&PatchGroup> {
    self.0.get(target)
  }

  pub fn contains(&self, target: &str, path: &str) -> bool {
    self.0.get(target).is_some_and(|group| group.contains_key(path))
  }

  pub fn iter(&self) -> indexmap::map::Iter<'_, String, PatchGroup> {
    self.0.iter()
  }

  pub fn targets(&self) -> impl Iterator<Item = &String> {
    self.0.keys()
  }

  /// Every `(group target, patch)` pair in order.
  pub fn patches(&self) -> impl Iterator<Item = (&String, &PatchDefinition)> {
    self
      .0
      .iter()
      .flat_map(|(target, group)| group.values().map(move |patch| (target, patch)))
  }

  /// Number of patch entries across all groups.
  pub fn len(&self) -> usize {
    self.0.values().map(IndexMap::len).sum()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Flatten into target → path → record, listing each patch under every target.
  pub fn simplify(&self) -> SimplifiedQueue {
    let mut simplified = SimplifiedQueue::new();
    for (_, patch) in self.patches() {
      let record = patch.record();
      for target in &patch.targets {
        simplified.insert(target, &patch.path, record.clone());
      }
    }
    simplified
  }

  /// Entries for which `keep` holds; groups left empty are dropped.
  pub fn filter(&self, keep: impl Fn(&str, &PatchDefinition) -> bool) -> DetailedQueue {
    let groups = self
      .0
      .iter()
      .filter_map(|(target, group)| {
        let kept: PatchGroup = group
          .iter()
          .filter(|(_, patch)| keep(target, patch))
          .map(|(path, patch)| (path.clone(), patch.clone()))
          .collect();
        (!kept.is_empty()).then(|| (target.clone(), kept))
      })
      .collect();
    DetailedQueue(groups)
  }

  /// Entries whose path is not present under the same target in `other`.
  pub fn without(&self, other: &DetailedQueue) -> DetailedQueue {
    self.filter(|target, patch| !other.contains(target, &patch.path))
  }

  /// Entries that `subset` also lists for the same target.
  ///
  /// Membership is checked against the flattened subset, so a ledger entry
  /// kept under a secondary target still matches a declared patch grouped
  /// under its install target.
  pub fn intersect_by_path(&self, subset: &DetailedQueue) -> DetailedQueue {
    let footprint = subset.simplify();
    self.filter(|target, patch| footprint.contains(target, &patch.path))
  }

  /// Attach labels to entries whose status has one.
  pub fn with_status_labels(mut self, labels: &[(PatchStatus, &str)]) -> Self {
    for group in self.0.values_mut() {
      for patch in group.values_mut() {
        if let Some((_, label)) = labels.iter().find(|(status, _)| *status == patch.status) {
          patch.status_label = Some((*label).to_string());
        }
      }
    }
    self
  }

  /// Set the status of every entry.
  pub fn with_status(mut self, status: PatchStatus) -> Self {
    for group in self.0.values_mut() {
      for patch in group.values_mut() {
        patch.status = status;
      }
    }
    self
  }
}

impl FromIterator<(String, PatchGroup)> for DetailedQueue {
  fn from_iter<I: IntoIterator<Item = (String, PatchGroup)>>(iter: I) -> Self {
    DetailedQueue(iter.into_iter().collect())
  }
}

impl IntoIterator for DetailedQueue {
  type Item = (String, PatchGroup);
  type IntoIter = indexmap::map::IntoIter<String, PatchGroup>;

  fn into_iter(self) -> Self::IntoIter {
    self.0.into_iter()
  }
}

/// Target name to the records of the patches it carries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SimplifiedQueue(IndexMap<String, AppliedPatches>);

impl SimplifiedQueue {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert(&mut self, target: &str, path: &str, record: PatchRecord) {
    self
      .0
      .entry(target.to_string())
      .or_default()
      .insert(path.to_string(), record);
  }

  /// Store a whole ledger for `target`. Empty ledgers are not kept.
  pub fn insert_ledger(&mut self, target: &str, ledger: AppliedPatches) {
    if !ledger.is_empty() {
      self.0.insert(target.to_string(), ledger);
    }
  }

  pub fn get(&self, target: &str) -> Option<&AppliedPatches> {
    self.0.get(target)
  }

  pub fn contains_target(&self, target: &str) -> bool {
    self.0.contains_key(target)
  }

  pub fn contains(&self, target: &str, path: &str) -> bool {
    self.0.get(target).is_some_and(|ledger| ledger.contains_key(path))
  }

  pub fn iter(&self) -> indexmap::map::Iter<'_, String, AppliedPatches> {
    self.0.iter()
  }

  pub fn targets(&self) -> impl Iterator<Item = &String> {
    self.0.keys()
  }

  pub fn is_empty(&self) -> bool {
    self.0.values().all(IndexMap::is_empty)
  }

  /// Expand into full definitions grouped under the target holding each record.
  pub fn detail(&self) -> DetailedQueue {
    self
      .0
      .iter()
      .map(|(target, ledger)| {
        let group: PatchGroup = ledger
          .iter()
          .map(|(path, record)| {
            let mut patch = PatchDefinition::from_record(path, record);
            if patch.targets.is_empty() {
              patch.targets.push(target.clone());
            }
            (path.clone(), patch)
          })
          .collect();
        (target.clone(), group)
      })
      .collect()
  }

  /// Add the entries of `other` that are missing here.
  ///
  /// Existing entries are kept verbatim and in place; additions are appended
  /// to their target in `other`'s order.
  pub fn merge_missing(&self, other: &SimplifiedQueue) -> SimplifiedQueue {
    let mut merged = self.clone();
    for (target, ledger) in &other.0 {
      for (path, record) in ledger {
        if !merged.contains(target, path) {
          merged.insert(target, path, record.clone());
        }
      }
    }
    merged
  }
}

impl FromIterator<(String, AppliedPatches)> for SimplifiedQueue {
  fn from_iter<I: IntoIterator<Item = (String, AppliedPatches)>>(iter: I) -> Self {
    SimplifiedQueue(iter.into_iter().collect())
  }
}
