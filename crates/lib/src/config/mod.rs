//! The `repatch.json` configuration file.
//!
//! # Format
//!
//! ```json
//! {
//!   "root": "acme/project",
//!   "settings": { "exit_on_first_failure": true, "patcher": { "binary": "patch" } },
//!   "patches": {
//!     "acme/widget": [
//!       { "path": "patches/widget-fix.patch", "label": "Fix widget", "targets": ["acme/core"] }
//!     ]
//!   }
//! }
//! ```
//!
//! Paths in the file are relative to the directory containing it.

mod factory;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::consts::{DEFAULT_PATCH_LEVELS, PRISTINE_DIR, REPOSITORY_FILENAME, ROOT_SOURCE, VENDOR_DIR};
use crate::patch::{DetailedQueue, PatchDefinition, PatchStatus};
use crate::util::hash::{HashError, hash_file};

pub use factory::PatchesApplierFactory;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("config file not found: {0}")]
  NotFound(PathBuf),

  #[error("failed to read config {path}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse config {path}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("patch file for {target} not found: {path}")]
  MissingArtifact { target: String, path: PathBuf },

  #[error("failed to fingerprint patch")]
  Hash(#[from] HashError),

  #[error("invalid filter")]
  Filter(#[from] glob::PatternError),
}

/// How the `patch` binary is invoked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatcherSettings {
  #[serde(default = "default_binary")]
  pub binary: String,
  /// Strip levels probed in order when a patch does not force one.
  #[serde(default = "default_levels")]
  pub levels: Vec<String>,
}

impl Default for PatcherSettings {
  fn default() -> Self {
    Self {
      binary: default_binary(),
      levels: default_levels(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
  /// Stop at the first patch that fails instead of skipping it.
  #[serde(default = "default_true")]
  pub exit_on_first_failure: bool,

  /// Reinstall a patched package whenever any of its patches change.
  #[serde(default)]
  pub reset_everything: bool,

  #[serde(default = "default_vendor_dir")]
  pub vendor_dir: PathBuf,

  #[serde(default = "default_pristine_dir")]
  pub pristine_dir: PathBuf,

  /// The installed-packages file holding every ledger.
  #[serde(default = "default_repository")]
  pub repository: PathBuf,

  #[serde(default)]
  pub patcher: PatcherSettings,

  /// Statuses that make a package's processing visible.
  #[serde(default = "default_output_triggers")]
  pub output_triggers: Vec<PatchStatus>,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      exit_on_first_failure: default_true(),
      reset_everything: false,
      vendor_dir: default_vendor_dir(),
      pristine_dir: default_pristine_dir(),
      repository: default_repository(),
      patcher: PatcherSettings::default(),
      output_triggers: default_output_triggers(),
    }
  }
}

fn default_true() -> bool {
  true
}

fn default_binary() -> String {
  "patch".to_string()
}

fn default_levels() -> Vec<String> {
  DEFAULT_PATCH_LEVELS.iter().map(|level| level.to_string()).collect()
}

fn default_vendor_dir() -> PathBuf {
  PathBuf::from(VENDOR_DIR)
}

fn default_pristine_dir() -> PathBuf {
  PathBuf::from(PRISTINE_DIR)
}

fn default_repository() -> PathBuf {
  PathBuf::from(REPOSITORY_FILENAME)
}

fn default_output_triggers() -> Vec<PatchStatus> {
  vec![PatchStatus::Missing, PatchStatus::Changed, PatchStatus::Removed]
}

/// One declared patch, as written in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchEntry {
  pub path: String,
  #[serde(default)]
  pub label: String,
  /// Extra targets, recorded after the package the patch is declared under.
  #[serde(default)]
  pub targets: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub url: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub constraint: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub level: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub source: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
  /// Name of the project package, tracked as the repository root.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub root: Option<String>,
  #[serde(default)]
  pub settings: Settings,
  #[serde(default)]
  pub patches: IndexMap<String, Vec<PatchEntry>>,
  #[serde(skip)]
  base_dir: PathBuf,
}

impl Config {
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let content = match fs::read_to_string(path) {
      Ok(content) => content,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(ConfigError::NotFound(path.to_path_buf())),
      Err(source) => {
        return Err(ConfigError::Read {
          path: path.to_path_buf(),
          source,
        });
      }
    };

    let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
    Self::parse(&content, base_dir).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })
  }

  /// Parse config text whose relative paths resolve against `base_dir`.
  pub fn parse(content: &str, base_dir: PathBuf) -> Result<Self, serde_json::Error> {
    let mut config: Config = serde_json::from_str(content)?;
    config.base_dir = base_dir;
    debug!(base_dir = %config.base_dir.display(), groups = config.patches.len(), "parsed config");
    Ok(config)
  }

  pub fn base_dir(&self) -> &Path {
    &self.base_dir
  }

  pub fn repository_path(&self) -> PathBuf {
    self.base_dir.join(&self.settings.repository)
  }

  /// Resolve every declared patch, fingerprinting its artifact.
  pub fn declared_patches(&self) -> Result<DetailedQueue, ConfigError> {
    let mut queue = DetailedQueue::new();

    for (target, entries) in &self.patches {
      for entry in entries {
        let file = self.base_dir.join(&entry.path);
        if !file.is_file() {
          return Err(ConfigError::MissingArtifact {
            target: target.clone(),
            path: file,
          });
        }

        let mut targets = vec![target.clone()];
        for extra in &entry.targets {
          if !targets.contains(extra) {
            targets.push(extra.clone());
          }
        }

        let mut patch = PatchDefinition::new(entry.path.clone(), file, targets);
        patch.hash = Some(hash_file(&patch.file)?.0);
        patch.source = entry.source.clone().unwrap_or_else(|| ROOT_SOURCE.to_string());
        patch.label = entry.label.clone();
        patch.url = entry.url.clone();
        patch.constraint = entry.constraint.clone();
        patch.level = entry.level.clone();

        queue.insert(target, patch);
      }
    }

    Ok(queue)
  }
}
