//! Implementation of the `repatch status` command.
//!
//! Lists the patches recorded in each package's ledger.

use std::path::Path;

use anyhow::Result;
use indexmap::IndexMap;

use repatch_lib::package::PackageCollector;
use repatch_lib::patch::AppliedPatches;

use super::load_project;
use crate::output::{print_info, print_json, print_stat, print_success, symbols, truncate_hash};

pub fn cmd_status(config_path: &Path, json: bool, verbose: bool) -> Result<()> {
  let project = load_project(config_path)?;
  let packages = PackageCollector.collect(&project.repository);

  let ledgers: IndexMap<&str, &AppliedPatches> = packages
    .iter()
    .filter_map(|(name, package)| package.applied().map(|ledger| (name.as_str(), ledger)))
    .collect();

  if json {
    return print_json(&ledgers);
  }

  if ledgers.is_empty() {
    print_info("No patches applied. Run 'repatch apply' to apply them.");
    return Ok(());
  }

  let total: usize = ledgers.values().map(|ledger| ledger.len()).sum();
  print_success(&format!("{} patch(es) applied to {} package(s)", total, ledgers.len()));
  println!();

  for (name, ledger) in &ledgers {
    print_stat(name, &ledger.len().to_string());
    if verbose {
      for (path, record) in ledger.iter() {
        match &record.hash {
          Some(hash) => println!("    {} {} {}", symbols::INFO, path, truncate_hash(hash)),
          None => println!("    {} {}", symbols::INFO, path),
        }
      }
    }
  }

  Ok(())
}
