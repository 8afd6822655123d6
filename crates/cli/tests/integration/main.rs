mod common;

mod apply_tests;
mod plan_tests;
mod status_tests;
mod undo_tests;
