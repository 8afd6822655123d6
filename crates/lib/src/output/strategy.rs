use serde::{Deserialize, Serialize};

use crate::patch::{PatchGroup, PatchStatus};

/// Decides whether processing a set of patches is worth reporting.
///
/// A package whose queued patches and removals carry none of the trigger
/// statuses is processed with output muted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputStrategy {
  triggers: Vec<PatchStatus>,
}

impl Default for OutputStrategy {
  fn default() -> Self {
    Self::new(vec![PatchStatus::Missing, PatchStatus::Changed, PatchStatus::Removed])
  }
}

impl OutputStrategy {
  pub fn new(triggers: Vec<PatchStatus>) -> Self {
    Self { triggers }
  }

  pub fn should_allow_for_patches(&self, patches: &PatchGroup) -> bool {
    patches.values().any(|patch| self.triggers.contains(&patch.status))
  }
}
