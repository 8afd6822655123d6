//! Patch definitions, ledger records and the list shapes built from them.

mod list;
mod types;

pub use list::{AppliedPatches, DetailedQueue, PatchGroup, RepositoryState, SimplifiedQueue, all_targets};
pub use types::{PatchDefinition, PatchRecord, PatchStatus, StatusConfig};
