use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where a patch stands relative to the applied-patches ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchStatus {
  /// Not recorded on its targets yet.
  Missing,
  /// Recorded, but the recorded fingerprint differs from the declared one.
  Changed,
  /// Recorded unchanged on every target.
  Applied,
  /// Recorded, but no longer declared.
  Removed,
  /// Not classified yet.
  #[default]
  Unknown,
}

impl PatchStatus {
  /// Whether the patch still has to land on disk.
  pub fn needs_apply(self) -> bool {
    matches!(self, PatchStatus::Missing | PatchStatus::Changed)
  }
}

impl fmt::Display for PatchStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      PatchStatus::Missing => "missing",
      PatchStatus::Changed => "changed",
      PatchStatus::Applied => "applied",
      PatchStatus::Removed => "removed",
      PatchStatus::Unknown => "unknown",
    };
    f.write_str(name)
  }
}

/// Human readable labels attached to queue entries before they are reported.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusConfig;

impl StatusConfig {
  pub fn labels(&self) -> Vec<(PatchStatus, &'static str)> {
    vec![
      (PatchStatus::Missing, "NEW"),
      (PatchStatus::Changed, "CHANGED"),
      (PatchStatus::Applied, "APPLIED"),
      (PatchStatus::Removed, "REMOVED"),
      (PatchStatus::Unknown, "UNKNOWN"),
    ]
  }
}

/// A declared patch.
///
/// `path` is the identity of the patch: it is unique per target and is the
/// key under which the patch is recorded in a package's ledger. The first
/// entry of `targets` is the package whose install directory receives the
/// patch; every target gets the patch recorded in its ledger, so a change to
/// any of them causes the patch to be re-applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchDefinition {
  pub path: String,
  /// Resolved location of the patch artifact.
  pub file: PathBuf,
  /// Package or configuration that declared the patch.
  pub source: String,
  #[serde(default)]
  pub label: String,
  pub targets: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub url: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub constraint: Option<String>,
  /// SHA-256 of the artifact contents.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub hash: Option<String>,
  /// Forced strip level (e.g. `-p1`); when absent the executor probes.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub level: Option<String>,
  #[serde(default)]
  pub status: PatchStatus,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub status_label: Option<String>,
}

impl PatchDefinition {
  pub fn new(path: impl Into<String>, file: impl Into<PathBuf>, targets: Vec<String>) -> Self {
    Self {
      path: path.into(),
      file: file.into(),
      source: crate::consts::ROOT_SOURCE.to_string(),
      label: String::new(),
      targets,
      url: None,
      constraint: None,
      hash: None,
      level: None,
      status: PatchStatus::Unknown,
      status_label: None,
    }
  }

  /// Package whose install directory receives the patch.
  pub fn install_target(&self) -> Option<&str> {
    self.targets.first().map(String::as_str)
  }

  /// Whether any of the patch targets is in `names`.
  pub fn targets_any<'a>(&self, mut names: impl Iterator<Item = &'a String>) -> bool {
    names.any(|name| self.targets.contains(name))
  }

  /// The ledger record for this patch.
  pub fn record(&self) -> PatchRecord {
    PatchRecord {
      source: self.source.clone(),
      label: self.label.clone(),
      url: self.url.clone(),
      constraint: self.constraint.clone(),
      hash: self.hash.clone(),
      targets: self.targets.clone(),
    }
  }

  /// Rebuild a definition from a ledger record.
  ///
  /// The artifact location is not part of the ledger, so `file` is the path
  /// itself; such definitions are only used for reporting and comparison.
  pub fn from_record(path: &str, record: &PatchRecord) -> Self {
    Self {
      path: path.to_string(),
      file: PathBuf::from(path),
      source: record.source.clone(),
      label: record.label.clone(),
      targets: record.targets.clone(),
      url: record.url.clone(),
      constraint: record.constraint.clone(),
      hash: record.hash.clone(),
      level: None,
      status: PatchStatus::Unknown,
      status_label: None,
    }
  }
}

/// Persisted record of an applied patch, stored in the package ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchRecord {
  pub source: String,
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub label: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub url: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub constraint: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub hash: Option<String>,
  #[serde(default)]
  pub targets: Vec<String>,
}

impl PatchRecord {
  /// Whether both records describe the same patch content.
  ///
  /// Labels and sources are descriptive and do not force a re-apply.
  pub fn same_content(&self, other: &PatchRecord) -> bool {
    self.hash == other.hash && self.url == other.url && self.constraint == other.constraint
  }
}
