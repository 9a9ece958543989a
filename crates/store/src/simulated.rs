//! In-process store with a capacity budget.
//!
//! Behaves like the remote store from the harness's point of view: records
//! are keyed by id, requests beyond the budget are rejected for capacity,
//! and priority hints decide who gets rejected first. Latency and
//! non-capacity failures can be injected to exercise the other outcome
//! paths.

use crate::budget::{BudgetConfig, CapacityBudget};
use crate::{NamespaceSpec, StoreError, StoreGateway};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use prioload_types::{Outcome, PriorityClass, Record, RecordId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info};

/// Configuration for a [`SimulatedStore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatedConfig {
    /// Capacity budget shared by all requests.
    pub budget: BudgetConfig,

    /// Units charged per point read.
    pub read_cost: u32,

    /// Units charged per upsert. Zero leaves seeding traffic uncharged.
    pub write_cost: u32,

    /// Units charged per count-query page.
    pub query_cost: u32,

    /// Records returned per count-query page.
    pub page_size: usize,

    /// Latency added to every admitted read.
    #[serde(with = "prioload_types::duration")]
    pub read_latency: Duration,

    /// Fail every Nth admitted read with a non-capacity error.
    pub fail_every: Option<u64>,
}

impl Default for SimulatedConfig {
    fn default() -> Self {
        Self {
            budget: BudgetConfig::default(),
            read_cost: 1,
            write_cost: 0,
            query_cost: 0,
            page_size: 500,
            read_latency: Duration::ZERO,
            fail_every: None,
        }
    }
}

impl SimulatedConfig {
    /// Create a config with the given budget and default costs.
    pub fn new(budget: BudgetConfig) -> Self {
        Self {
            budget,
            ..Default::default()
        }
    }

    /// Set the per-read latency.
    pub fn with_read_latency(mut self, latency: Duration) -> Self {
        self.read_latency = latency;
        self
    }

    /// Fail every Nth admitted read.
    pub fn with_fail_every(mut self, n: u64) -> Self {
        self.fail_every = Some(n.max(1));
        self
    }

    /// Set the unit cost of an upsert.
    pub fn with_write_cost(mut self, cost: u32) -> Self {
        self.write_cost = cost;
        self
    }

    /// Set the count-query page size.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }
}

/// Counters describing what the simulated store has served.
#[derive(Debug, Default)]
pub struct SimulatedStats {
    pub reads_served: AtomicU64,
    pub reads_rejected: AtomicU64,
    pub reads_failed: AtomicU64,
    pub writes: AtomicU64,
    pub writes_rejected: AtomicU64,
    pub count_pages: AtomicU64,
}

impl SimulatedStats {
    pub fn reads_served(&self) -> u64 {
        self.reads_served.load(Ordering::Relaxed)
    }

    pub fn reads_rejected(&self) -> u64 {
        self.reads_rejected.load(Ordering::Relaxed)
    }

    pub fn reads_failed(&self) -> u64 {
        self.reads_failed.load(Ordering::Relaxed)
    }

    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    pub fn count_pages(&self) -> u64 {
        self.count_pages.load(Ordering::Relaxed)
    }
}

/// In-memory store implementing [`StoreGateway`].
pub struct SimulatedStore {
    namespace: NamespaceSpec,
    config: SimulatedConfig,
    provisioned: AtomicBool,
    records: RwLock<HashMap<RecordId, Record>>,
    budget: Mutex<CapacityBudget>,
    admitted_reads: AtomicU64,
    stats: SimulatedStats,
}

impl SimulatedStore {
    /// Create an empty, unprovisioned store.
    pub fn new(namespace: NamespaceSpec, config: SimulatedConfig) -> Self {
        let budget = CapacityBudget::new(&config.budget);
        Self {
            namespace,
            config,
            provisioned: AtomicBool::new(false),
            records: RwLock::new(HashMap::new()),
            budget: Mutex::new(budget),
            admitted_reads: AtomicU64::new(0),
            stats: SimulatedStats::default(),
        }
    }

    /// Store whose budget matches the namespace's provisioned throughput.
    pub fn provisioned_like(namespace: NamespaceSpec) -> Self {
        let budget = BudgetConfig::provisioned(namespace.throughput);
        Self::new(namespace, SimulatedConfig::new(budget))
    }

    /// Replace the capacity budget, e.g. after seeding.
    pub fn reset_budget(&self) {
        *self.budget.lock() = CapacityBudget::new(&self.config.budget);
    }

    pub fn stats(&self) -> &SimulatedStats {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn admit(&self, cost: u32, hint: Option<PriorityClass>) -> bool {
        self.budget.lock().try_admit(cost, hint)
    }

    fn container_missing(&self) -> bool {
        !self.provisioned.load(Ordering::Acquire)
    }
}

#[async_trait]
impl StoreGateway for SimulatedStore {
    fn namespace(&self) -> &NamespaceSpec {
        &self.namespace
    }

    async fn ensure_namespace(&self) -> Result<(), StoreError> {
        if self.namespace.throughput == 0 {
            return Err(StoreError::Provisioning {
                resource: self.namespace.container_link(),
                status: 400,
                message: "throughput must be positive".to_string(),
            });
        }

        if self.provisioned.swap(true, Ordering::AcqRel) {
            debug!(container = %self.namespace.container_link(), "Container already exists");
        } else {
            info!(
                container = %self.namespace.container_link(),
                throughput = self.namespace.throughput,
                "Created simulated container"
            );
        }
        Ok(())
    }

    async fn count_records(&self) -> Result<u64, StoreError> {
        if self.container_missing() {
            return Err(StoreError::Query(format!(
                "container {} not found",
                self.namespace.container_link()
            )));
        }

        let total = self.records.read().len();
        let page_size = self.config.page_size.max(1);

        // Serve the count as partial pages, the way a partitioned query would.
        let mut remaining = total;
        let mut count = 0u64;
        loop {
            if !self.admit(self.config.query_cost, None) {
                return Err(StoreError::Query("count query throttled".to_string()));
            }
            self.stats.count_pages.fetch_add(1, Ordering::Relaxed);

            let page = remaining.min(page_size);
            count += page as u64;
            remaining -= page;
            if remaining == 0 {
                break;
            }
        }

        Ok(count)
    }

    async fn upsert(&self, record: &Record) -> Outcome {
        if self.container_missing() {
            return Outcome::failed("container not found");
        }
        if !self.admit(self.config.write_cost, None) {
            self.stats.writes_rejected.fetch_add(1, Ordering::Relaxed);
            return Outcome::RejectedForCapacity;
        }

        self.records.write().insert(record.id, record.clone());
        self.stats.writes.fetch_add(1, Ordering::Relaxed);
        Outcome::Succeeded
    }

    async fn point_read(&self, id: RecordId, hint: Option<PriorityClass>) -> Outcome {
        if self.container_missing() {
            return Outcome::failed("container not found");
        }

        // Admission happens before the first await so that requests are
        // admitted in the order they are first polled.
        if !self.admit(self.config.read_cost, hint) {
            self.stats.reads_rejected.fetch_add(1, Ordering::Relaxed);
            return Outcome::RejectedForCapacity;
        }
        let nth = self.admitted_reads.fetch_add(1, Ordering::Relaxed) + 1;

        if !self.config.read_latency.is_zero() {
            tokio::time::sleep(self.config.read_latency).await;
        }

        if let Some(every) = self.config.fail_every {
            if nth % every == 0 {
                self.stats.reads_failed.fetch_add(1, Ordering::Relaxed);
                return Outcome::failed("injected failure");
            }
        }

        if self.records.read().contains_key(&id) {
            self.stats.reads_served.fetch_add(1, Ordering::Relaxed);
            Outcome::Succeeded
        } else {
            self.stats.reads_failed.fetch_add(1, Ordering::Relaxed);
            Outcome::failed(format!("{} not found", id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(seq: u64) -> Record {
        Record {
            id: RecordId(seq),
            category: "Tools".to_string(),
            name: "Small Wooden Hammer".to_string(),
            quantity: 1,
            price_cents: 100,
            clearance_flag: false,
        }
    }

    async fn provisioned_store(config: SimulatedConfig) -> SimulatedStore {
        let store = SimulatedStore::new(NamespaceSpec::default(), config);
        store.ensure_namespace().await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_requires_namespace() {
        let store = SimulatedStore::provisioned_like(NamespaceSpec::default());
        assert!(store.count_records().await.is_err());
        assert!(matches!(
            store.point_read(RecordId(0), None).await,
            Outcome::Failed { .. }
        ));
    }

    #[tokio::test]
    async fn test_ensure_namespace_is_idempotent() {
        let store = provisioned_store(SimulatedConfig::default()).await;
        store.ensure_namespace().await.unwrap();
        assert_eq!(store.count_records().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_zero_throughput_fails_provisioning() {
        let store = SimulatedStore::new(
            NamespaceSpec::default().with_throughput(0),
            SimulatedConfig::default(),
        );
        assert!(matches!(
            store.ensure_namespace().await,
            Err(StoreError::Provisioning { .. })
        ));
    }

    #[tokio::test]
    async fn test_count_drains_all_pages() {
        let store = provisioned_store(SimulatedConfig::default().with_page_size(3)).await;
        for seq in 0..10 {
            assert!(store.upsert(&record(seq)).await.is_success());
        }

        assert_eq!(store.count_records().await.unwrap(), 10);
        // 3 + 3 + 3 + 1
        assert_eq!(store.stats().count_pages(), 4);
    }

    #[tokio::test]
    async fn test_upsert_overwrites() {
        let store = provisioned_store(SimulatedConfig::default()).await;
        store.upsert(&record(1)).await;
        store.upsert(&record(1)).await;
        assert_eq!(store.count_records().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_read_rejected_when_budget_exhausted() {
        let store = provisioned_store(SimulatedConfig::new(BudgetConfig::fixed(2))).await;
        store.upsert(&record(0)).await;

        assert_eq!(store.point_read(RecordId(0), None).await, Outcome::Succeeded);
        assert_eq!(store.point_read(RecordId(0), None).await, Outcome::Succeeded);
        assert_eq!(
            store.point_read(RecordId(0), None).await,
            Outcome::RejectedForCapacity
        );
        assert_eq!(store.stats().reads_rejected(), 1);

        store.reset_budget();
        assert_eq!(store.point_read(RecordId(0), None).await, Outcome::Succeeded);
    }

    #[tokio::test]
    async fn test_missing_record_is_failure() {
        let store = provisioned_store(SimulatedConfig::default()).await;
        let outcome = store.point_read(RecordId(99), Some(PriorityClass::High)).await;
        assert_eq!(outcome, Outcome::failed("id_99 not found"));
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let store = provisioned_store(SimulatedConfig::default().with_fail_every(2)).await;
        store.upsert(&record(0)).await;

        assert!(store.point_read(RecordId(0), None).await.is_success());
        assert!(matches!(
            store.point_read(RecordId(0), None).await,
            Outcome::Failed { .. }
        ));
        assert!(store.point_read(RecordId(0), None).await.is_success());
        assert_eq!(store.stats().reads_failed(), 1);
    }

    #[tokio::test]
    async fn test_default_costs_leave_reads_the_whole_budget() {
        let store = provisioned_store(
            SimulatedConfig::new(BudgetConfig::fixed(2)).with_page_size(1),
        )
        .await;
        for seq in 0..5 {
            assert!(store.upsert(&record(seq)).await.is_success());
        }
        assert_eq!(store.count_records().await.unwrap(), 5);

        // Writes and count pages were free; both read units remain.
        assert!(store.point_read(RecordId(0), None).await.is_success());
        assert!(store.point_read(RecordId(1), None).await.is_success());
        assert_eq!(
            store.point_read(RecordId(2), None).await,
            Outcome::RejectedForCapacity
        );
    }

    #[tokio::test]
    async fn test_charged_writes_can_be_rejected() {
        let config = SimulatedConfig::new(BudgetConfig::fixed(5)).with_write_cost(5);
        let store = provisioned_store(config).await;

        assert!(store.upsert(&record(0)).await.is_success());
        assert_eq!(store.upsert(&record(1)).await, Outcome::RejectedForCapacity);
        assert_eq!(store.len(), 1);
    }
}
