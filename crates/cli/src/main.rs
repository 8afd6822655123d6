//! repatch: apply declared patches to installed packages and keep a ledger of them.

mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use repatch_lib::consts::CONFIG_FILENAME;
use tracing_subscriber::EnvFilter;

use crate::cmd::{cmd_apply, cmd_plan, cmd_status, cmd_undo};
use crate::output::print_error;

#[derive(Parser)]
#[command(name = "repatch")]
#[command(author, version, about = "Reconcile declared patches with installed packages", long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Path to the configuration file
  #[arg(short, long, global = true, default_value = CONFIG_FILENAME)]
  config: PathBuf,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Apply missing patches, removing and resetting where needed
  Apply {
    /// Only work on patches whose path or target matches the glob
    #[arg(long = "filter", value_name = "GLOB")]
    filters: Vec<String>,

    /// Skip patches that fail instead of stopping
    #[arg(long)]
    graceful: bool,

    /// Reinstall patched packages whenever any of their patches change
    #[arg(long)]
    force_reset: bool,
  },

  /// Remove the patches matching the filters
  Undo {
    /// Patches to remove, by path or target glob
    #[arg(long = "filter", value_name = "GLOB", required = true)]
    filters: Vec<String>,
  },

  /// Show what an apply would do without changing anything
  Plan {
    #[arg(long = "filter", value_name = "GLOB")]
    filters: Vec<String>,

    /// Output as JSON
    #[arg(long)]
    json: bool,
  },

  /// Show the patches recorded for each package
  Status {
    /// Output as JSON
    #[arg(long)]
    json: bool,
  },
}

fn main() -> ExitCode {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let result = match cli.command {
    Commands::Apply {
      filters,
      graceful,
      force_reset,
    } => cmd_apply(&cli.config, &filters, graceful, force_reset),
    Commands::Undo { filters } => cmd_undo(&cli.config, &filters),
    Commands::Plan { filters, json } => cmd_plan(&cli.config, &filters, json),
    Commands::Status { json } => cmd_status(&cli.config, json, cli.verbose),
  };

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      print_error(&format!("{e:#}"));
      ExitCode::FAILURE
    }
  }
}
