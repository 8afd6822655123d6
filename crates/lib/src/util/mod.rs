//! Shared utilities.
//!
//! Content hashing and, for tests, in-memory doubles of the engine's collaborators.

pub mod hash;

#[cfg(test)]
pub mod testutil;
