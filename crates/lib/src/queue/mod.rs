//! Reconciliation of declared patches against the recorded state.
//!
//! [`QueueGenerator`] turns the declared patches and the repository state into
//! three queues:
//!
//! - the **apply queue**: every relevant patch per target, classified as
//!   [`PatchStatus::Missing`], [`PatchStatus::Changed`] or
//!   [`PatchStatus::Applied`], plus a reset flag per target;
//! - the **removal queue**: recorded patches that are no longer relevant;
//! - the **reset queue**: targets that must be reinstalled before patching.
//!
//! Generation is pure; nothing here touches the repository.

mod analyser;
mod resolver;

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use tracing::debug;

use crate::patch::{DetailedQueue, PatchDefinition, PatchGroup, PatchStatus, RepositoryState};

pub use analyser::ResetPolicy;
pub use resolver::{FilteredListResolver, InvertedListResolver, ListResolver};

/// Queued work for one target.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TargetQueue {
  pub patches: PatchGroup,
  /// The recorded state of the target is incompatible with the queue.
  pub reset: bool,
}

/// Per-target apply queue in declaration order.
///
/// A target may carry no patches at all when it only has to be reset.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ApplyQueue(IndexMap<String, TargetQueue>);

impl ApplyQueue {
  pub fn get(&self, target: &str) -> Option<&TargetQueue> {
    self.0.get(target)
  }

  pub fn iter(&self) -> indexmap::map::Iter<'_, String, TargetQueue> {
    self.0.iter()
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  /// The queued patches, without empty placeholder groups.
  pub fn patches(&self) -> DetailedQueue {
    self
      .0
      .iter()
      .filter(|(_, queue)| !queue.patches.is_empty())
      .map(|(target, queue)| (target.clone(), queue.patches.clone()))
      .collect()
  }
}

/// Builds the apply, removal and reset queues of a run.
pub struct QueueGenerator {
  resolver: Box<dyn ListResolver>,
  reset_policy: ResetPolicy,
}

impl QueueGenerator {
  pub fn new(resolver: Box<dyn ListResolver>, reset_policy: ResetPolicy) -> Self {
    Self { resolver, reset_policy }
  }

  pub fn generate_apply_queue(&self, declared: &DetailedQueue, state: &RepositoryState) -> ApplyQueue {
    let relevant = self.resolver.resolve_patches_queue(declared);
    let state = self.resolver.resolve_initial_state(&relevant, state);
    let removals = self.removals(&relevant, &state);
    let footprint = relevant.simplify();

    let scope: IndexSet<&String> = relevant
      .targets()
      .chain(footprint.targets())
      .chain(removals.targets())
      .collect();
    let mut resets: IndexSet<String> = scope
      .into_iter()
      .filter(|target| {
        self
          .reset_policy
          .requires_reset(target, &state, &footprint, &removals)
      })
      .cloned()
      .collect();

    // A group whose recorded patch lists a reset target has to be re-applied
    // on pristine sources as well.
    loop {
      let before = resets.len();
      for (target, group) in relevant.iter() {
        if resets.contains(target) {
          continue;
        }
        let dependent = group
          .values()
          .any(|patch| status_of(patch, &state) != PatchStatus::Missing && patch.targets_any(resets.iter()));
        if dependent {
          resets.insert(target.clone());
        }
      }
      if resets.len() == before {
        break;
      }
    }

    let mut queue = IndexMap::new();
    for (target, group) in relevant {
      let patches: PatchGroup = group
        .into_iter()
        .map(|(path, mut patch)| {
          patch.status = status_of(&patch, &state);
          (path, patch)
        })
        .collect();
      let reset = resets.contains(&target);
      queue.insert(target, TargetQueue { patches, reset });
    }
    for target in resets {
      queue.entry(target).or_insert_with(|| TargetQueue {
        patches: PatchGroup::new(),
        reset: true,
      });
    }

    let queue = ApplyQueue(queue);
    debug!(
      targets = queue.len(),
      patches = queue.patches().len(),
      removals = removals.len(),
      "generated apply queue"
    );
    queue
  }

  /// Recorded patches the apply queue no longer considers relevant.
  pub fn generate_removal_queue(&self, apply_queue: &ApplyQueue, state: &RepositoryState) -> DetailedQueue {
    self.removals(&apply_queue.patches(), state)
  }

  /// Targets flagged for reset, in queue order.
  pub fn generate_reset_queue(&self, apply_queue: &ApplyQueue) -> IndexSet<String> {
    apply_queue
      .iter()
      .filter(|(_, queue)| queue.reset)
      .map(|(target, _)| target.clone())
      .collect()
  }

  fn removals(&self, queue: &DetailedQueue, state: &RepositoryState) -> DetailedQueue {
    let recorded = state.detail();
    let relevant = self.resolver.resolve_relevant_patches(&recorded, queue);
    recorded.without(&relevant).with_status(PatchStatus::Removed)
  }
}

/// Classify a patch against the recorded state of all of its targets.
fn status_of(patch: &PatchDefinition, state: &RepositoryState) -> PatchStatus {
  let wanted = patch.record();
  let mut applied = true;
  let mut changed = false;

  for target in &patch.targets {
    match state.get(target).and_then(|ledger| ledger.get(&patch.path)) {
      Some(recorded) if recorded.same_content(&wanted) => {}
      Some(_) => {
        applied = false;
        changed = true;
      }
      None => applied = false,
    }
  }

  if applied {
    PatchStatus::Applied
  } else if changed {
    PatchStatus::Changed
  } else {
    PatchStatus::Missing
  }
}
