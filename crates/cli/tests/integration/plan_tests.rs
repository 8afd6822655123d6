//! Plan command integration tests.

use predicates::prelude::*;
use serde_json::Value;

use super::common::{TestEnv, WIDGET};

#[test]
fn plan_lists_pending_patches() {
  let env = TestEnv::new()
    .package(WIDGET)
    .patch(WIDGET, "patches/a.patch")
    .build();

  env
    .repatch_cmd()
    .arg("plan")
    .assert()
    .success()
    .stdout(predicate::str::contains("acme/widget: patches/a.patch [NEW]"))
    .stdout(predicate::str::contains("Patches to apply: 1"));

  // Planning never writes the ledger.
  assert!(env.ledger(WIDGET).is_empty());
}

#[test]
fn plan_after_apply_is_noop() {
  let env = TestEnv::new()
    .package(WIDGET)
    .patch(WIDGET, "patches/a.patch")
    .build();
  env.repatch_cmd().arg("apply").assert().success();

  env
    .repatch_cmd()
    .arg("plan")
    .assert()
    .success()
    .stdout(predicate::str::contains("Nothing to do"));
}

#[test]
fn plan_shows_reset_for_changed_patch() {
  let env = TestEnv::new()
    .package(WIDGET)
    .patch(WIDGET, "patches/a.patch")
    .build();
  env.repatch_cmd().arg("apply").assert().success();

  env.write_file("patches/a.patch", "--- a/README\n+++ b/README\n@@ -1 +1 @@\n-old\n+newer\n");

  env
    .repatch_cmd()
    .arg("plan")
    .assert()
    .success()
    .stdout(predicate::str::contains("(reset)"))
    .stdout(predicate::str::contains("[CHANGED]"));
}

#[test]
fn plan_json_is_parseable() {
  let env = TestEnv::new()
    .package(WIDGET)
    .patch(WIDGET, "patches/a.patch")
    .build();

  let output = env.repatch_cmd().arg("plan").arg("--json").output().unwrap();
  assert!(output.status.success());

  let plan: Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(plan["apply"][WIDGET]["patches/a.patch"]["status"], "missing");
  assert_eq!(plan["resets"].as_array().unwrap().len(), 0);
}
