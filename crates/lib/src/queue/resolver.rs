//! Relevance policies deciding which declared patches take part in a run.

use glob::{Pattern, PatternError};

use crate::patch::{DetailedQueue, PatchDefinition, RepositoryState};

/// Decides which patches a run works on.
pub trait ListResolver {
  /// Patches to queue out of everything declared.
  fn resolve_patches_queue(&self, patches: &DetailedQueue) -> DetailedQueue;

  /// The entries of `patches` that are still wanted given the queued `subset`.
  ///
  /// Recorded patches that are not relevant are removed from disk.
  fn resolve_relevant_patches(&self, patches: &DetailedQueue, subset: &DetailedQueue) -> DetailedQueue;

  /// The ledger state the queue is compared against.
  fn resolve_initial_state(&self, patches: &DetailedQueue, state: &RepositoryState) -> RepositoryState;
}

/// Resolver that works on every declared patch, optionally narrowed by globs.
///
/// A filter matches a patch when it matches its path, the target it is grouped
/// under, or any of its targets. Recorded patches outside the filters are left
/// alone.
#[derive(Debug, Clone, Default)]
pub struct FilteredListResolver {
  filters: Vec<Pattern>,
}

impl FilteredListResolver {
  pub fn new(filters: Vec<Pattern>) -> Self {
    Self { filters }
  }

  pub fn from_globs<S: AsRef<str>>(globs: &[S]) -> Result<Self, PatternError> {
    let filters = globs
      .iter()
      .map(|glob| Pattern::new(glob.as_ref()))
      .collect::<Result<Vec<_>, _>>()?;
    Ok(Self::new(filters))
  }

  fn in_scope(&self, target: &str, patch: &PatchDefinition) -> bool {
    if self.filters.is_empty() {
      return true;
    }
    self.filters.iter().any(|filter| {
      filter.matches(&patch.path)
        || filter.matches(target)
        || patch.targets.iter().any(|name| filter.matches(name))
    })
  }
}

impl ListResolver for FilteredListResolver {
  fn resolve_patches_queue(&self, patches: &DetailedQueue) -> DetailedQueue {
    patches.filter(|target, patch| self.in_scope(target, patch))
  }

  fn resolve_relevant_patches(&self, patches: &DetailedQueue, subset: &DetailedQueue) -> DetailedQueue {
    let footprint = subset.simplify();
    patches.filter(|target, patch| !self.in_scope(target, patch) || footprint.contains(target, &patch.path))
  }

  fn resolve_initial_state(&self, _patches: &DetailedQueue, state: &RepositoryState) -> RepositoryState {
    state.clone()
  }
}

/// Resolver that queues everything its base resolver would *not* queue.
///
/// Used to undo patches: what the base selects is excluded, so its recorded
/// entries become irrelevant and are removed. Patches that stay queued but were
/// never applied are treated as applied; after a reset only patches recorded
/// before the run are put back, so undoing never installs anything new.
pub struct InvertedListResolver {
  base: Box<dyn ListResolver>,
}

impl InvertedListResolver {
  pub fn new(base: Box<dyn ListResolver>) -> Self {
    Self { base }
  }
}

impl ListResolver for InvertedListResolver {
  fn resolve_patches_queue(&self, patches: &DetailedQueue) -> DetailedQueue {
    let exclusions = self.base.resolve_patches_queue(patches);
    patches.without(&exclusions)
  }

  fn resolve_relevant_patches(&self, patches: &DetailedQueue, subset: &DetailedQueue) -> DetailedQueue {
    patches.intersect_by_path(subset)
  }

  fn resolve_initial_state(&self, patches: &DetailedQueue, state: &RepositoryState) -> RepositoryState {
    state.merge_missing(&patches.simplify())
  }
}
