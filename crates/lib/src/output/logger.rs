//! Indentation and mute aware output channel.
//!
//! Both indentation and muting are stack-like. They are only ever changed
//! through guards returned by [`Logger::push`] and [`Logger::mute`]; dropping
//! a guard restores the depth that was current when it was taken, so an early
//! return or `?` can never leave the channel indented or muted.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::io::{self, Write};

pub struct Logger {
  sink: RefCell<Box<dyn Write>>,
  markers: RefCell<Vec<String>>,
  mute_depth: Cell<usize>,
}

impl fmt::Debug for Logger {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Logger")
      .field("markers", &self.markers.borrow())
      .field("mute_depth", &self.mute_depth.get())
      .finish_non_exhaustive()
  }
}

impl Logger {
  pub fn new(sink: impl Write + 'static) -> Self {
    Self {
      sink: RefCell::new(Box::new(sink)),
      markers: RefCell::new(Vec::new()),
      mute_depth: Cell::new(0),
    }
  }

  pub fn stderr() -> Self {
    Self::new(io::stderr())
  }

  /// A logger that discards everything.
  pub fn silent() -> Self {
    Self::new(io::sink())
  }

  pub fn is_muted(&self) -> bool {
    self.mute_depth.get() > 0
  }

  pub fn mute_depth(&self) -> usize {
    self.mute_depth.get()
  }

  pub fn indentation(&self) -> usize {
    self.markers.borrow().len()
  }

  /// Suppress output until the returned guard is dropped.
  pub fn mute(&self) -> MuteGuard<'_> {
    let depth = self.mute_depth.get();
    self.mute_depth.set(depth + 1);
    MuteGuard { logger: self, depth }
  }

  /// Indent subsequent lines one level, prefixing them with `marker`.
  pub fn push(&self, marker: &str) -> IndentGuard<'_> {
    let mut markers = self.markers.borrow_mut();
    let depth = markers.len();
    markers.push(marker.to_string());
    IndentGuard { logger: self, depth }
  }

  /// Write one line at the current indentation.
  pub fn write_raw(&self, message: &str) {
    let line = format!("{}{}", self.prefix(), message);
    self.emit(&line);
  }

  pub fn write_warning(&self, message: &str) {
    let line = format!("{}warning: {}", self.prefix(), message);
    self.emit(&line);
  }

  pub fn write_new_line(&self) {
    self.emit("");
  }

  fn prefix(&self) -> String {
    let markers = self.markers.borrow();
    let Some(last) = markers.last() else {
      return String::new();
    };

    let mut prefix = "  ".repeat(markers.len());
    if !last.is_empty() {
      prefix.push_str(last);
      prefix.push(' ');
    }
    prefix
  }

  fn emit(&self, line: &str) {
    if self.is_muted() {
      return;
    }
    // Output is best effort; a closed pipe must not abort a patch run.
    let _ = writeln!(self.sink.borrow_mut(), "{line}");
  }
}

/// Restores the mute depth that was current when [`Logger::mute`] was called.
#[must_use = "output is unmuted as soon as the guard is dropped"]
pub struct MuteGuard<'a> {
  logger: &'a Logger,
  depth: usize,
}

impl Drop for MuteGuard<'_> {
  fn drop(&mut self) {
    self.logger.mute_depth.set(self.depth);
  }
}

/// Restores the indentation that was current when [`Logger::push`] was called.
#[must_use = "indentation is reset as soon as the guard is dropped"]
pub struct IndentGuard<'a> {
  logger: &'a Logger,
  depth: usize,
}

impl Drop for IndentGuard<'_> {
  fn drop(&mut self) {
    self.logger.markers.borrow_mut().truncate(self.depth);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::testutil::SharedBuffer;

  fn buffered() -> (SharedBuffer, Logger) {
    let buffer = SharedBuffer::default();
    let logger = Logger::new(buffer.clone());
    (buffer, logger)
  }

  #[test]
  fn indentation_prefixes_marker() {
    let (buffer, logger) = buffered();

    logger.write_raw("Applying patches for acme/widget (1)");
    {
      let _indent = logger.push("~");
      logger.write_raw("root: fix.patch");
      let _nested = logger.push("");
      logger.write_raw("Fix widget");
    }
    logger.write_raw("done");

    assert_eq!(
      buffer.contents(),
      "Applying patches for acme/widget (1)\n  ~ root: fix.patch\n    Fix widget\ndone\n"
    );
  }

  #[test]
  fn muted_output_is_dropped() {
    let (buffer, logger) = buffered();
    {
      let _mute = logger.mute();
      logger.write_raw("hidden");
    }
    logger.write_raw("shown");

    assert_eq!(buffer.contents(), "shown\n");
  }

  #[test]
  fn nested_mutes_unwind_to_prior_depth() {
    let (_buffer, logger) = buffered();

    let outer = logger.mute();
    let inner = logger.mute();
    assert_eq!(logger.mute_depth(), 2);

    drop(inner);
    assert_eq!(logger.mute_depth(), 1);
    assert!(logger.is_muted());

    drop(outer);
    assert!(!logger.is_muted());
  }

  #[test]
  fn guards_unwind_on_early_return() {
    fn step() -> Result<(), String> {
      Err("boom".to_string())
    }

    fn failing(logger: &Logger) -> Result<(), String> {
      let _mute = logger.mute();
      let _indent = logger.push("~");
      step()?;
      logger.write_raw("unreachable");
      Ok(())
    }

    let (buffer, logger) = buffered();
    assert!(failing(&logger).is_err());
    assert_eq!(logger.mute_depth(), 0);
    assert_eq!(logger.indentation(), 0);

    logger.write_raw("after");
    assert_eq!(buffer.contents(), "after\n");
  }

  #[test]
  fn warning_is_prefixed() {
    let (buffer, logger) = buffered();
    logger.write_warning("could not apply b.patch");
    assert_eq!(buffer.contents(), "warning: could not apply b.patch\n");
  }
}
