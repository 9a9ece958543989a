//! Top-level harness errors.

use crate::config::ConfigError;
use crate::seeder::SeedError;
use prioload_store::StoreError;
use thiserror::Error;

/// Errors that abort a harness run.
///
/// Per-read failures never reach this type; they are counted in the
/// scenario report.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store setup failed: {0}")]
    Store(#[from] StoreError),

    #[error("Seeding failed: {0}")]
    Seed(#[from] SeedError),
}
