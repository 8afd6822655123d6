//! Implementation of the `repatch plan` command.
//!
//! Computes the queues an apply would work through and prints them without
//! touching the repository or any package.

use std::path::Path;
use std::rc::Rc;

use anyhow::{Context, Result};
use owo_colors::{OwoColorize, Stream};

use repatch_lib::apply::Plan;
use repatch_lib::config::PatchesApplierFactory;
use repatch_lib::output::Logger;

use super::load_project;
use crate::output::{print_info, print_json, print_stat, print_warning, symbols};

pub fn cmd_plan(config_path: &Path, filters: &[String], json: bool) -> Result<()> {
  let project = load_project(config_path)?;
  let declared = project
    .config
    .declared_patches()
    .context("Failed to resolve declared patches")?;
  let resolver = PatchesApplierFactory::list_resolver(filters, false).context("Invalid filter")?;

  let applier = PatchesApplierFactory::new(Rc::new(Logger::silent())).create(&project.config, resolver);
  let plan = applier
    .plan(&project.repository, &declared)
    .context("Failed to compute plan")?;

  if json {
    return print_json(&plan);
  }

  if declared.is_empty() {
    print_warning(&format!("No patches declared in {}", config_path.display()));
  }
  if plan.is_noop() {
    print_info("Nothing to do");
    return Ok(());
  }

  print_plan(&plan);
  Ok(())
}

fn print_plan(plan: &Plan) {
  for target in &plan.resets {
    println!(
      "  {} {} {}",
      symbols::RESET.if_supports_color(Stream::Stdout, |s| s.yellow()),
      target,
      "(reset)".if_supports_color(Stream::Stdout, |s| s.dimmed())
    );
  }
  for (target, patch) in plan.removals.patches() {
    println!(
      "  {} {}: {}",
      symbols::REMOVE.if_supports_color(Stream::Stdout, |s| s.red()),
      target,
      patch.path
    );
  }

  let pending: Vec<_> = plan
    .apply
    .patches()
    .filter(|(target, patch)| patch.status.needs_apply() || plan.resets.contains(*target))
    .collect();
  for (target, patch) in &pending {
    let label = patch.status_label.as_deref().unwrap_or_default();
    println!(
      "  {} {}: {} {}",
      symbols::ADD.if_supports_color(Stream::Stdout, |s| s.green()),
      target,
      patch.path,
      format!("[{label}]").if_supports_color(Stream::Stdout, |s| s.dimmed())
    );
  }

  println!();
  print_stat("Resets", &plan.resets.len().to_string());
  print_stat("Removals", &plan.removals.len().to_string());
  print_stat("Patches to apply", &pending.len().to_string());
}
