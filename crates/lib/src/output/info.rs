use super::Logger;
use crate::patch::PatchDefinition;

/// Writes the one- or two-line description of a patch.
///
/// ```text
/// root: patches/widget-fix.patch [NEW]
///   Fix widget rendering
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct PatchInfoLogger;

impl PatchInfoLogger {
  pub fn output_patch_info(&self, logger: &Logger, patch: &PatchDefinition) {
    let label = patch
      .status_label
      .as_deref()
      .map(|label| format!(" [{label}]"))
      .unwrap_or_default();
    logger.write_raw(&format!("{}: {}{}", patch.source, patch.path, label));

    if !patch.label.is_empty() {
      let _indent = logger.push("");
      logger.write_raw(&patch.label);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::testutil::SharedBuffer;

  #[test]
  fn writes_path_status_and_description() {
    let buffer = SharedBuffer::default();
    let logger = Logger::new(buffer.clone());
    let mut patch = PatchDefinition::new("patches/fix.patch", "fix.patch", vec!["acme/widget".to_string()]);
    patch.label = "Fix widget".to_string();
    patch.status_label = Some("NEW".to_string());

    PatchInfoLogger.output_patch_info(&logger, &patch);

    assert_eq!(buffer.contents(), "root: patches/fix.patch [NEW]\n  Fix widget\n");
  }

  #[test]
  fn omits_missing_parts() {
    let buffer = SharedBuffer::default();
    let logger = Logger::new(buffer.clone());
    let patch = PatchDefinition::new("a.patch", "a.patch", vec!["acme/widget".to_string()]);

    PatchInfoLogger.output_patch_info(&logger, &patch);

    assert_eq!(buffer.contents(), "root: a.patch\n");
  }
}
