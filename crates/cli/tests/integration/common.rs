//! Shared test helpers for CLI integration tests.

use std::path::PathBuf;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::{Value, json};
use tempfile::TempDir;

pub const WIDGET: &str = "acme/widget";
pub const CORE: &str = "acme/core";
pub const PROJECT: &str = "acme/project";

pub const FIX_PATCH: &str = "--- a/README\n+++ b/README\n@@ -1 +1 @@\n-old\n+new\n";

/// Isolated project directory.
///
/// Holds `repatch.json`, the patch artifacts, `installed.json` and a vendor
/// directory per installed package. Patches are run with a stand-in binary
/// (`true` or `false`) so tests do not depend on GNU patch.
pub struct TestEnv {
  pub temp: TempDir,
  pub config_path: PathBuf,
  patcher: String,
  root: Option<String>,
  packages: Vec<String>,
  patches: Value,
}

impl TestEnv {
  /// A project whose patcher always succeeds.
  pub fn new() -> Self {
    Self::with_patcher("true")
  }

  pub fn with_patcher(binary: &str) -> Self {
    let temp = TempDir::new().unwrap();
    let config_path = temp.path().join("repatch.json");
    Self {
      temp,
      config_path,
      patcher: binary.to_string(),
      root: None,
      packages: Vec::new(),
      patches: json!({}),
    }
  }

  /// Track `name` as the project package, patched in place.
  pub fn root(mut self, name: &str) -> Self {
    self.root = Some(name.to_string());
    self
  }

  /// Install `name` under `vendor/`.
  pub fn package(mut self, name: &str) -> Self {
    std::fs::create_dir_all(self.temp.path().join("vendor").join(name)).unwrap();
    self.packages.push(name.to_string());
    self
  }

  /// Declare `path` against `target`, writing the artifact.
  pub fn patch(mut self, target: &str, path: &str) -> Self {
    self.write_file(path, FIX_PATCH);
    let group = self.patches.as_object_mut().unwrap().entry(target).or_insert_with(|| json!([]));
    group.as_array_mut().unwrap().push(json!({ "path": path }));
    self
  }

  /// Write config and repository files.
  pub fn build(self) -> Self {
    self.declare(self.patches.clone());

    let packages: Vec<Value> = self
      .packages
      .iter()
      .map(|name| json!({ "name": name, "version": "1.0.0" }))
      .collect();
    let repository = json!({ "packages": packages });
    self.write_file("installed.json", &serde_json::to_string_pretty(&repository).unwrap());
    self
  }

  /// Rewrite the config so it declares exactly `patches`.
  pub fn declare(&self, patches: Value) {
    let mut config = json!({
      "settings": { "patcher": { "binary": self.patcher } },
      "patches": patches,
    });
    if let Some(root) = &self.root {
      config["root"] = json!(root);
    }
    self.write_file("repatch.json", &serde_json::to_string_pretty(&config).unwrap());
  }

  /// Write a file relative to the temp directory.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  /// Parsed `installed.json`.
  pub fn repository(&self) -> Value {
    let content = std::fs::read_to_string(self.temp.path().join("installed.json")).unwrap();
    serde_json::from_str(&content).unwrap()
  }

  /// Ledger paths recorded for `name`, in order.
  pub fn ledger(&self, name: &str) -> Vec<String> {
    let repository = self.repository();
    let package = repository["packages"]
      .as_array()
      .unwrap()
      .iter()
      .chain(std::iter::once(&repository["root"]))
      .find(|package| package["name"] == name)
      .cloned()
      .unwrap_or(Value::Null);

    match package["applied_patches"].as_object() {
      Some(ledger) => ledger.keys().cloned().collect(),
      None => Vec::new(),
    }
  }

  /// A `repatch` command pointed at this project's config.
  pub fn repatch_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("repatch");
    cmd.arg("--config").arg(&self.config_path);
    cmd.current_dir(self.temp.path());
    cmd
  }
}
