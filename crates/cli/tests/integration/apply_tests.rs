//! Apply command integration tests.

use predicates::prelude::*;

use serde_json::json;

use super::common::{CORE, PROJECT, TestEnv, WIDGET};

#[test]
fn apply_records_patches_in_ledger() {
  let env = TestEnv::new()
    .package(WIDGET)
    .patch(WIDGET, "patches/a.patch")
    .patch(WIDGET, "patches/b.patch")
    .build();

  env
    .repatch_cmd()
    .arg("apply")
    .assert()
    .success()
    .stdout(predicate::str::contains("Patches reconciled"))
    .stderr(predicate::str::contains("Applying patches for acme/widget (2)"));

  assert_eq!(env.ledger(WIDGET), vec!["patches/a.patch", "patches/b.patch"]);
}

#[test]
fn apply_is_idempotent() {
  let env = TestEnv::new()
    .package(WIDGET)
    .patch(WIDGET, "patches/a.patch")
    .build();

  env.repatch_cmd().arg("apply").assert().success();

  env
    .repatch_cmd()
    .arg("apply")
    .assert()
    .success()
    .stdout(predicate::str::contains("Nothing to patch"));
  assert_eq!(env.ledger(WIDGET), vec!["patches/a.patch"]);
}

#[test]
fn apply_failure_exits_non_zero() {
  let env = TestEnv::with_patcher("false")
    .package(WIDGET)
    .patch(WIDGET, "patches/a.patch")
    .build();

  env
    .repatch_cmd()
    .arg("apply")
    .assert()
    .failure()
    .stderr(predicate::str::contains("Patch run failed"));

  assert!(env.ledger(WIDGET).is_empty());
}

#[test]
fn graceful_apply_skips_failures() {
  let env = TestEnv::with_patcher("false")
    .package(WIDGET)
    .patch(WIDGET, "patches/a.patch")
    .build();

  env
    .repatch_cmd()
    .arg("apply")
    .arg("--graceful")
    .assert()
    .success()
    .stderr(predicate::str::contains("could not apply patch, skipping"));

  assert!(env.ledger(WIDGET).is_empty());
}

#[test]
fn apply_to_unknown_package_fails() {
  let env = TestEnv::new().patch(WIDGET, "patches/a.patch").build();

  env
    .repatch_cmd()
    .arg("apply")
    .assert()
    .failure()
    .stderr(predicate::str::contains("acme/widget"));
}

#[test]
fn filter_limits_the_run() {
  let env = TestEnv::new()
    .package(WIDGET)
    .package(CORE)
    .patch(WIDGET, "patches/widget.patch")
    .patch(CORE, "patches/core.patch")
    .build();

  env
    .repatch_cmd()
    .arg("apply")
    .arg("--filter")
    .arg("acme/core")
    .assert()
    .success();

  assert!(env.ledger(WIDGET).is_empty());
  assert_eq!(env.ledger(CORE), vec!["patches/core.patch"]);
}

#[test]
fn missing_artifact_fails_before_patching() {
  let env = TestEnv::new().package(WIDGET).patch(WIDGET, "patches/a.patch").build();
  std::fs::remove_file(env.temp.path().join("patches/a.patch")).unwrap();

  env.repatch_cmd().arg("apply").assert().failure();
  assert!(env.ledger(WIDGET).is_empty());
}

#[test]
fn edited_patch_is_reapplied_from_pristine_copy() {
  let env = TestEnv::new()
    .package(WIDGET)
    .patch(WIDGET, "patches/a.patch")
    .build();
  env.write_file("vendor/acme/widget/README", "old\n");
  env.repatch_cmd().arg("apply").assert().success();
  let first = env.repository()["packages"][0]["applied_patches"]["patches/a.patch"]["hash"].clone();

  env.write_file("vendor/acme/widget/README", "new\n");
  env.write_file("patches/a.patch", "--- a/README\n+++ b/README\n@@ -1 +1 @@\n-old\n+newer\n");

  env.repatch_cmd().arg("apply").assert().success();

  let second = env.repository()["packages"][0]["applied_patches"]["patches/a.patch"]["hash"].clone();
  assert_ne!(first, second);
  let readme = std::fs::read_to_string(env.temp.path().join("vendor/acme/widget/README")).unwrap();
  assert_eq!(readme, "old\n");
}

#[test]
fn dropped_root_patch_is_reverted_in_place() {
  let env = TestEnv::new()
    .root(PROJECT)
    .patch(PROJECT, "patches/root.patch")
    .build();
  env.repatch_cmd().arg("apply").assert().success();
  assert_eq!(env.ledger(PROJECT), vec!["patches/root.patch"]);

  env.declare(json!({}));

  env
    .repatch_cmd()
    .arg("apply")
    .assert()
    .success()
    .stderr(predicate::str::contains("Resetting patches for acme/project (1)"));
  assert!(env.ledger(PROJECT).is_empty());
  assert!(env.temp.path().join("patches/root.patch").exists());
}
