//! Hook points around a single patch application.

use std::fmt;

use tracing::debug;

use crate::package::Package;
use crate::patch::PatchDefinition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatchEvent {
  PreApply,
  PostApply,
}

impl PatchEvent {
  pub fn name(self) -> &'static str {
    match self {
      PatchEvent::PreApply => "pre-patch-apply",
      PatchEvent::PostApply => "post-patch-apply",
    }
  }
}

impl fmt::Display for PatchEvent {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

/// Receives [`PatchEvent`]s as patches are applied.
///
/// `PostApply` is only sent for patches that applied successfully.
pub trait EventDispatcher {
  fn notify(&self, event: PatchEvent, package: &Package, patch: &PatchDefinition);
}

/// Dispatcher that turns every event into a `tracing` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDispatcher;

impl EventDispatcher for TracingDispatcher {
  fn notify(&self, event: PatchEvent, package: &Package, patch: &PatchDefinition) {
    debug!(event = %event, package = %package.name, patch = %patch.path, "patch event");
  }
}
