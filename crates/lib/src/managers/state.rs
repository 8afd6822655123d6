use tracing::{debug, warn};

use crate::patch::PatchGroup;
use crate::repository::{Repository, RepositoryError};

/// Records applied patches in the ledgers of their targets.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatcherStateManager;

impl PatcherStateManager {
  /// Record every patch under each of its targets, then flush the repository.
  ///
  /// Entries already recorded under the same path are overwritten in place;
  /// unrelated entries are kept. An empty group performs no write.
  pub fn register_applied_patches(
    &self,
    repository: &mut dyn Repository,
    patches: &PatchGroup,
  ) -> Result<(), RepositoryError> {
    if patches.is_empty() {
      return Ok(());
    }

    for patch in patches.values() {
      let record = patch.record();
      for target in &patch.targets {
        let Some(package) = repository.find_package_mut(target) else {
          warn!(target = %target, patch = %patch.path, "cannot record patch on unknown package");
          continue;
        };
        package
          .applied_patches
          .get_or_insert_with(Default::default)
          .insert(patch.path.clone(), record.clone());
      }
    }

    debug!(count = patches.len(), "registered applied patches");
    repository.write()
  }
}
