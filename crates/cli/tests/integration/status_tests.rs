//! Status command integration tests.

use predicates::prelude::*;
use serde_json::Value;

use super::common::{TestEnv, WIDGET};

#[test]
fn status_before_apply() {
  let env = TestEnv::new()
    .package(WIDGET)
    .patch(WIDGET, "patches/a.patch")
    .build();

  env
    .repatch_cmd()
    .arg("status")
    .assert()
    .success()
    .stdout(predicate::str::contains("No patches applied"));
}

#[test]
fn status_lists_ledgers() {
  let env = TestEnv::new()
    .package(WIDGET)
    .patch(WIDGET, "patches/a.patch")
    .build();
  env.repatch_cmd().arg("apply").assert().success();

  env
    .repatch_cmd()
    .arg("status")
    .arg("--verbose")
    .assert()
    .success()
    .stdout(predicate::str::contains("1 patch(es) applied to 1 package(s)"))
    .stdout(predicate::str::contains("patches/a.patch"));
}

#[test]
fn status_json_contains_records() {
  let env = TestEnv::new()
    .package(WIDGET)
    .patch(WIDGET, "patches/a.patch")
    .build();
  env.repatch_cmd().arg("apply").assert().success();

  let output = env.repatch_cmd().arg("status").arg("--json").output().unwrap();
  assert!(output.status.success());

  let status: Value = serde_json::from_slice(&output.stdout).unwrap();
  let record = &status[WIDGET]["patches/a.patch"];
  assert_eq!(record["source"], "root");
  assert_eq!(record["targets"][0], WIDGET);
}
