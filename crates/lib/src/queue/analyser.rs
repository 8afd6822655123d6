use serde::{Deserialize, Serialize};

use crate::patch::{DetailedQueue, RepositoryState, SimplifiedQueue};

/// Decides when a target's recorded patches are incompatible with its queue,
/// so that it has to be reinstalled before patching.
///
/// Only targets that already carry recorded patches are ever reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetPolicy {
  /// Reset only when missing patches cannot simply be applied on top: a
  /// recorded patch has to go, its content changed, or a new patch is queued
  /// ahead of one that is already applied.
  #[default]
  MissingPatches,
  /// Reset whenever anything about the target's patches changes.
  FullReset,
}

impl ResetPolicy {
  pub fn requires_reset(
    &self,
    target: &str,
    state: &RepositoryState,
    footprint: &SimplifiedQueue,
    removals: &DetailedQueue,
  ) -> bool {
    let Some(recorded) = state.get(target).filter(|ledger| !ledger.is_empty()) else {
      return false;
    };

    if removals.get(target).is_some_and(|group| !group.is_empty()) {
      return true;
    }

    let Some(wanted) = footprint.get(target) else {
      return false;
    };

    let mut seen_missing = false;
    for (path, record) in wanted {
      match recorded.get(path) {
        Some(existing) if !existing.same_content(record) => return true,
        Some(_) if seen_missing => return true,
        Some(_) => {}
        None if *self == ResetPolicy::FullReset => return true,
        None => seen_missing = true,
      }
    }
    false
  }
}
