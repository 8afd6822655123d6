use super::PackageSnapshot;
use crate::patch::{AppliedPatches, RepositoryState};

/// Extracts the applied-patches ledger of every package in a snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct StateGenerator;

impl StateGenerator {
  pub fn generate(&self, packages: &PackageSnapshot) -> RepositoryState {
    let mut state = RepositoryState::new();
    for (name, package) in packages.iter() {
      if let Some(ledger) = package.applied() {
        state.insert_ledger(name, ledger.clone());
      }
    }
    state
  }
}

/// Whether a package's ledger differs from what the queue wants recorded on it.
///
/// Order is irrelevant here; only the set of paths and the content of each
/// record matter.
pub fn has_patch_changes(ledger: Option<&AppliedPatches>, footprint: Option<&AppliedPatches>) -> bool {
  let empty = AppliedPatches::new();
  let ledger = ledger.unwrap_or(&empty);
  let footprint = footprint.unwrap_or(&empty);

  if ledger.len() != footprint.len() {
    return true;
  }

  footprint.iter().any(|(path, wanted)| match ledger.get(path) {
    Some(recorded) => !recorded.same_content(wanted),
    None => true,
  })
}
