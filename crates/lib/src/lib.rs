//! repatch-lib: patch reconciliation for installed packages
//!
//! This crate decides which declared patches a tree of installed packages
//! still needs, which recorded patches have to go, and which packages must be
//! reinstalled first, then executes that plan:
//! - `patch`: patch definitions, ledger records and the queues built from them
//! - `queue`: apply/removal/reset queue generation and relevance policies
//! - `apply`: the per-package apply loop and its failure bookkeeping
//! - `repository`: the package store holding every package's ledger
//! - `config`: the `repatch.json` file and the applier factory

pub mod apply;
pub mod config;
pub mod consts;
pub mod managers;
pub mod output;
pub mod package;
pub mod patch;
pub mod queue;
pub mod repository;
pub mod util;
