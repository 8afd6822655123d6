//! Undo command integration tests.

use serde_json::json;

use super::common::{CORE, TestEnv, WIDGET};

#[test]
fn undo_removes_matching_patches_only() {
  let env = TestEnv::new()
    .package(WIDGET)
    .package(CORE)
    .patch(WIDGET, "patches/widget.patch")
    .patch(CORE, "patches/core.patch")
    .build();
  env.repatch_cmd().arg("apply").assert().success();

  env
    .repatch_cmd()
    .arg("undo")
    .arg("--filter")
    .arg("acme/core")
    .assert()
    .success();

  assert_eq!(env.ledger(WIDGET), vec!["patches/widget.patch"]);
  assert!(env.ledger(CORE).is_empty());
}

#[test]
fn undo_does_not_apply_new_patches() {
  let env = TestEnv::new()
    .package(WIDGET)
    .patch(WIDGET, "patches/keep.patch")
    .patch(WIDGET, "patches/undo.patch")
    .build();
  env.repatch_cmd().arg("apply").assert().success();

  env.write_file("patches/fresh.patch", super::common::FIX_PATCH);
  env.declare(json!({
    WIDGET: [
      { "path": "patches/keep.patch" },
      { "path": "patches/undo.patch" },
      { "path": "patches/fresh.patch" }
    ]
  }));

  env
    .repatch_cmd()
    .arg("undo")
    .arg("--filter")
    .arg("patches/undo.patch")
    .assert()
    .success();

  assert_eq!(env.ledger(WIDGET), vec!["patches/keep.patch"]);
}

#[test]
fn undo_without_pristine_copy_fails() {
  let env = TestEnv::new()
    .package(WIDGET)
    .patch(WIDGET, "patches/widget.patch")
    .build();
  env.repatch_cmd().arg("apply").assert().success();
  std::fs::remove_dir_all(env.temp.path().join(".repatch/pristine/acme/widget")).unwrap();

  env
    .repatch_cmd()
    .arg("undo")
    .arg("--filter")
    .arg("acme/widget")
    .assert()
    .failure();

  assert_eq!(env.ledger(WIDGET), vec!["patches/widget.patch"]);
}
