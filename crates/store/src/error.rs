//! Error types for store gateways.

use thiserror::Error;

/// Errors that abort setup or a whole run.
///
/// Per-request failures are classified into `Outcome` instead.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Creating the database or container was refused.
    #[error("Provisioning {resource} failed with status {status}: {message}")]
    Provisioning {
        resource: String,
        status: u16,
        message: String,
    },

    /// Bad endpoint, bad credentials or unreachable backend.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A query was rejected or returned an unexpected status.
    #[error("Query failed: {0}")]
    Query(String),

    /// Response body could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),
}
