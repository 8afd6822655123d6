//! Diagnostic output of a patch run.

mod info;
mod logger;
mod strategy;

pub use info::PatchInfoLogger;
pub use logger::{IndentGuard, Logger, MuteGuard};
pub use strategy::OutputStrategy;
