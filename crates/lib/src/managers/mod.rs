//! Ledger bookkeeping and package resets.

mod repository;
mod state;

pub use repository::{InstallError, Installer, PristineInstaller, RepositoryManager};
pub use state::PatcherStateManager;
