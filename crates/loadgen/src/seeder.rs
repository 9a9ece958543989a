//! Dataset seeding.
//!
//! Ensures the container holds at least the target number of records.
//! Writes are fanned out with a fixed concurrency limit so that seeding does
//! not throttle itself against the provisioned budget. Cancelling the
//! seeder's token stops new writes; in-flight writes finish.

use crate::config::DatasetConfig;
use crate::generator::RecordGenerator;
use futures::stream::{self, StreamExt};
use prioload_store::{StoreError, StoreGateway};
use prioload_types::{Outcome, Record};
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Errors that stop seeding.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    /// The existing record count could not be determined.
    #[error("Failed to count existing records: {0}")]
    Count(#[from] StoreError),
}

/// Result of a seeding pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    /// Records present before seeding.
    pub existing: u64,
    /// Records generated and submitted.
    pub generated: u64,
    /// Upserts that succeeded.
    pub written: u64,
    /// Upserts still rejected for capacity after all attempts.
    pub rejected: u64,
    /// Upserts that failed for another reason.
    pub failed: u64,
    /// Whether seeding stopped early because it was cancelled.
    pub cancelled: bool,
}

impl SeedReport {
    /// Whether the container already held enough records.
    pub fn was_noop(&self) -> bool {
        self.generated == 0 && !self.cancelled
    }

    fn processed(&self) -> u64 {
        self.written + self.rejected + self.failed
    }
}

/// Seeds the dataset through a gateway.
pub struct Seeder {
    gateway: Arc<dyn StoreGateway>,
    config: DatasetConfig,
    cancel: CancellationToken,
}

enum WriteResult {
    Written,
    Rejected,
    Failed,
}

impl Seeder {
    pub fn new(gateway: Arc<dyn StoreGateway>, config: DatasetConfig) -> Self {
        Self {
            gateway,
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Use an external cancellation token.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Ensure at least `target` records exist.
    ///
    /// When the container is short, `target` records are generated starting
    /// at the configured id offset and upserted. Individual write failures
    /// are tallied in the report but do not fail seeding. Only one seeder
    /// should run against a container at a time.
    pub async fn ensure_seeded(
        &self,
        target: u64,
        generator: &RecordGenerator,
    ) -> Result<SeedReport, SeedError> {
        let existing = self.gateway.count_records().await?;
        info!(existing, target, "Number of documents in collection");

        if existing >= target {
            return Ok(SeedReport {
                existing,
                ..Default::default()
            });
        }

        if self.cancel.is_cancelled() {
            info!("Seeding cancelled before any writes");
            return Ok(SeedReport {
                existing,
                cancelled: true,
                ..Default::default()
            });
        }

        let records = generator.generate(target, self.config.id_offset);
        let mut report = SeedReport {
            existing,
            generated: records.len() as u64,
            ..Default::default()
        };

        let concurrency = self.config.write_concurrency.max(1);
        let writes = stream::iter(records)
            .take_until(self.cancel.cancelled())
            .map(|record| self.write_with_retry(record))
            .buffer_unordered(concurrency);
        let mut writes = std::pin::pin!(writes);

        while let Some(result) = writes.next().await {
            match result {
                WriteResult::Written => report.written += 1,
                WriteResult::Rejected => report.rejected += 1,
                WriteResult::Failed => report.failed += 1,
            }
        }

        if self.cancel.is_cancelled() {
            report.cancelled = true;
            info!(
                submitted = report.processed(),
                generated = report.generated,
                "Seeding cancelled"
            );
        }

        info!(
            written = report.written,
            rejected = report.rejected,
            failed = report.failed,
            "Documents written"
        );
        if report.rejected + report.failed > 0 || report.cancelled {
            warn!(
                missing = report.generated - report.written,
                "Seeding incomplete; some records were not written"
            );
        }

        Ok(report)
    }

    async fn write_with_retry(&self, record: Record) -> WriteResult {
        let attempts = self.config.max_write_attempts.max(1);
        for attempt in 1..=attempts {
            match self.gateway.upsert(&record).await {
                Outcome::Succeeded => return WriteResult::Written,
                Outcome::RejectedForCapacity if attempt < attempts => {
                    debug!(id = %record.id, attempt, "Upsert throttled, retrying");
                    tokio::select! {
                        _ = tokio::time::sleep(self.config.retry_pause) => {}
                        _ = self.cancel.cancelled() => return WriteResult::Rejected,
                    }
                }
                Outcome::RejectedForCapacity => return WriteResult::Rejected,
                Outcome::Failed { reason } => {
                    debug!(id = %record.id, reason = %reason, "Upsert failed");
                    return WriteResult::Failed;
                }
            }
        }
        WriteResult::Rejected
    }
}
