//! Store gateways.
//!
//! The harness talks to its backend only through [`StoreGateway`]. Two
//! implementations are provided:
//!
//! - [`CosmosGateway`]: REST client for a Cosmos-style document store with a
//!   provisioned throughput budget.
//! - [`SimulatedStore`]: in-process store with a token-bucket capacity budget
//!   and priority-aware admission. Used for offline runs and tests.
//!
//! Capacity rejection is reported through [`Outcome`], never as an error.
//! Only setup and connection problems surface as [`StoreError`].

mod budget;
pub mod cosmos;
mod error;
mod namespace;
mod simulated;

pub use budget::{BudgetConfig, CapacityBudget};
pub use cosmos::{ConnectionConfig, CosmosGateway};
pub use error::StoreError;
pub use namespace::NamespaceSpec;
pub use simulated::{SimulatedConfig, SimulatedStats, SimulatedStore};

use async_trait::async_trait;
use prioload_types::{Outcome, PriorityClass, Record, RecordId};

/// Accessor over the backing document store.
///
/// Implementations are shared across many concurrent requests, so every
/// method takes `&self`.
#[async_trait]
pub trait StoreGateway: Send + Sync {
    /// The namespace this gateway is bound to.
    fn namespace(&self) -> &NamespaceSpec;

    /// Create the database and container if they do not exist.
    ///
    /// Idempotent. Fails with [`StoreError::Provisioning`] if the backend
    /// refuses to create either resource.
    async fn ensure_namespace(&self) -> Result<(), StoreError>;

    /// Count records in the container, draining every result page.
    async fn count_records(&self) -> Result<u64, StoreError>;

    /// Write or overwrite a record keyed by its id.
    async fn upsert(&self, record: &Record) -> Outcome;

    /// Read one record by id, optionally tagged with a priority hint.
    async fn point_read(&self, id: RecordId, hint: Option<PriorityClass>) -> Outcome;
}
