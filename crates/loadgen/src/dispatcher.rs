//! Priority-tagged read dispatch.
//!
//! A wave is built as a deterministic list of reads, issued all at once
//! against the shared gateway, and awaited as a whole. There is no
//! client-side throttling: the point is to exceed the store's capacity and
//! observe who gets rejected.

use crate::counters::ScenarioCounters;
use crate::latency::LatencyTracker;
use futures::future::join_all;
use prioload_store::StoreGateway;
use prioload_types::{Outcome, PriorityClass, RecordId};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

/// One planned read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadRequest {
    /// Position of the read within its wave.
    pub index: u64,
    pub id: RecordId,
    pub class: PriorityClass,
}

/// Issues waves of point reads and tallies their outcomes.
#[derive(Clone)]
pub struct PriorityDispatcher {
    gateway: Arc<dyn StoreGateway>,
    dataset_size: u64,
    id_offset: u64,
    request_timeout: Duration,
}

impl PriorityDispatcher {
    /// Create a dispatcher reading from a dataset of `dataset_size` records
    /// starting at `id_<id_offset>`.
    pub fn new(
        gateway: Arc<dyn StoreGateway>,
        dataset_size: u64,
        id_offset: u64,
        request_timeout: Duration,
    ) -> Self {
        Self {
            gateway,
            dataset_size,
            id_offset,
            request_timeout,
        }
    }

    /// Plan a wave of `low_count` Low and `high_count` High reads.
    ///
    /// Classes alternate (Low at even positions, High at odd) while both
    /// have reads left; the remainder of the larger class follows. The
    /// target of read `j` is `id_<offset + j mod dataset_size>`, so the same
    /// ids are read in every wave and every scenario.
    pub fn plan_wave(&self, low_count: u64, high_count: u64) -> Vec<ReadRequest> {
        let total = low_count + high_count;
        let mut low_left = low_count;
        let mut high_left = high_count;

        (0..total)
            .map(|index| {
                let class = match (low_left, high_left) {
                    (0, _) => PriorityClass::High,
                    (_, 0) => PriorityClass::Low,
                    _ if index % 2 == 1 => PriorityClass::High,
                    _ => PriorityClass::Low,
                };
                match class {
                    PriorityClass::High => high_left -= 1,
                    PriorityClass::Low => low_left -= 1,
                }

                let RecordId(seq) = RecordId::cycling(index, self.dataset_size);
                ReadRequest {
                    index,
                    id: RecordId(self.id_offset + seq),
                    class,
                }
            })
            .collect()
    }

    /// Issue one wave and wait for every read to resolve.
    ///
    /// Each outcome is tallied in `counters`. When `priority_enabled` is
    /// false no hint is sent and both classes compete equally.
    pub async fn dispatch_reads(
        &self,
        low_count: u64,
        high_count: u64,
        priority_enabled: bool,
        counters: &ScenarioCounters,
        latency: &LatencyTracker,
    ) {
        let wave = self.plan_wave(low_count, high_count);
        debug!(
            reads = wave.len(),
            low_count, high_count, priority_enabled, "Dispatching wave"
        );

        let reads = wave
            .into_iter()
            .map(|request| self.read_one(request, priority_enabled, counters, latency));
        join_all(reads).await;
    }

    async fn read_one(
        &self,
        request: ReadRequest,
        priority_enabled: bool,
        counters: &ScenarioCounters,
        latency: &LatencyTracker,
    ) {
        let hint = priority_enabled.then_some(request.class);
        let started = Instant::now();

        let outcome =
            match tokio::time::timeout(self.request_timeout, self.gateway.point_read(request.id, hint))
                .await
            {
                Ok(outcome) => outcome,
                Err(_) => Outcome::failed(format!(
                    "no response within {}",
                    humantime::format_duration(self.request_timeout)
                )),
            };

        match &outcome {
            Outcome::Succeeded => latency.record(request.class, started.elapsed()),
            Outcome::RejectedForCapacity => {
                trace!(id = %request.id, priority = %request.class, "Read rejected for capacity");
            }
            Outcome::Failed { reason } => {
                warn!(id = %request.id, priority = %request.class, reason = %reason, "Read failed");
            }
        }

        counters.record(request.class, &outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prioload_store::{BudgetConfig, NamespaceSpec, SimulatedConfig, SimulatedStore};
    use prioload_types::Record;
    use tracing_test::traced_test;

    async fn seeded_store(records: u64, config: SimulatedConfig) -> Arc<SimulatedStore> {
        let store = Arc::new(SimulatedStore::new(NamespaceSpec::default(), config));
        store.ensure_namespace().await.unwrap();
        for seq in 0..records {
            let record = Record {
                id: RecordId(seq),
                category: "Books".to_string(),
                name: "Practical Cotton Hat".to_string(),
                quantity: 1,
                price_cents: 100,
                clearance_flag: false,
            };
            assert!(store.upsert(&record).await.is_success());
        }
        store
    }

    fn dispatcher(store: Arc<SimulatedStore>, dataset_size: u64) -> PriorityDispatcher {
        PriorityDispatcher::new(store, dataset_size, 0, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_plan_interleaves_and_cycles_ids() {
        let store = seeded_store(0, SimulatedConfig::default()).await;
        let plan = dispatcher(store, 3).plan_wave(3, 2);

        let classes: Vec<PriorityClass> = plan.iter().map(|r| r.class).collect();
        assert_eq!(
            classes,
            vec![
                PriorityClass::Low,
                PriorityClass::High,
                PriorityClass::Low,
                PriorityClass::High,
                PriorityClass::Low,
            ]
        );
        let ids: Vec<u64> = plan.iter().map(|r| r.id.0).collect();
        assert_eq!(ids, vec![0, 1, 2, 0, 1]);
    }

    #[tokio::test]
    async fn test_plan_appends_remainder() {
        let store = seeded_store(0, SimulatedConfig::default()).await;
        let plan = dispatcher(store, 100).plan_wave(1, 4);

        let high = plan.iter().filter(|r| r.class.is_high()).count();
        assert_eq!(plan.len(), 5);
        assert_eq!(high, 4);
        assert_eq!(plan[0].class, PriorityClass::Low);
        assert!(plan[1..].iter().all(|r| r.class.is_high()));
    }

    #[tokio::test]
    async fn test_plan_applies_offset() {
        let store = seeded_store(0, SimulatedConfig::default()).await;
        let plan = PriorityDispatcher::new(store, 2, 100, Duration::from_secs(1)).plan_wave(2, 1);
        let ids: Vec<String> = plan.iter().map(|r| r.id.to_string()).collect();
        assert_eq!(ids, vec!["id_100", "id_101", "id_100"]);
    }

    #[tokio::test]
    async fn test_all_succeed_without_contention() {
        let store = seeded_store(10, SimulatedConfig::new(BudgetConfig::fixed(1000))).await;
        let counters = ScenarioCounters::new();
        let latency = LatencyTracker::new();

        dispatcher(store, 10)
            .dispatch_reads(5, 5, false, &counters, &latency)
            .await;

        let snap = counters.snapshot();
        assert_eq!(snap.low.succeeded, 5);
        assert_eq!(snap.high.succeeded, 5);
        assert_eq!(snap.low.rejected, 0);
        assert_eq!(snap.high.rejected, 0);
        assert_eq!(latency.summary(PriorityClass::High).samples, 5);
    }

    #[tokio::test]
    async fn test_priority_favours_high_under_contention() {
        let config = SimulatedConfig::new(BudgetConfig::fixed(100).with_high_reserve(0.5));
        let store = seeded_store(50, config).await;
        let counters = ScenarioCounters::new();

        dispatcher(store, 50)
            .dispatch_reads(300, 300, true, &counters, &LatencyTracker::new())
            .await;

        let snap = counters.snapshot();
        assert_eq!(snap.high.total(), 300);
        assert_eq!(snap.low.total(), 300);
        assert_eq!(snap.high.succeeded + snap.low.succeeded, 100);
        assert!(
            snap.high.rejection_ratio() < snap.low.rejection_ratio(),
            "high {:?} should be rejected less than low {:?}",
            snap.high,
            snap.low
        );
    }

    #[tokio::test]
    async fn test_no_priority_treats_classes_equally() {
        let config = SimulatedConfig::new(BudgetConfig::fixed(100).with_high_reserve(0.5));
        let store = seeded_store(50, config).await;
        let counters = ScenarioCounters::new();

        dispatcher(store, 50)
            .dispatch_reads(300, 300, false, &counters, &LatencyTracker::new())
            .await;

        let snap = counters.snapshot();
        let diff = (snap.high.rejection_ratio() - snap.low.rejection_ratio()).abs();
        assert!(diff < 0.05, "ratios diverged: {:?} vs {:?}", snap.high, snap.low);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_failures_are_counted_and_logged() {
        let config = SimulatedConfig::new(BudgetConfig::fixed(1000)).with_fail_every(4);
        let store = seeded_store(8, config).await;
        let counters = ScenarioCounters::new();

        dispatcher(store, 8)
            .dispatch_reads(4, 4, true, &counters, &LatencyTracker::new())
            .await;

        let snap = counters.snapshot();
        assert_eq!(snap.high.failed + snap.low.failed, 2);
        assert_eq!(snap.high.total() + snap.low.total(), 8);
        assert!(logs_contain("Read failed"));
        assert!(logs_contain("injected failure"));
    }

    #[tokio::test]
    async fn test_hung_reads_resolve_to_failure() {
        let config = SimulatedConfig::new(BudgetConfig::fixed(1000))
            .with_read_latency(Duration::from_secs(30));
        let store = seeded_store(4, config).await;
        let counters = ScenarioCounters::new();
        let dispatcher = PriorityDispatcher::new(store, 4, 0, Duration::from_millis(50));

        let started = Instant::now();
        dispatcher
            .dispatch_reads(2, 2, false, &counters, &LatencyTracker::new())
            .await;

        assert!(started.elapsed() < Duration::from_secs(5));
        let snap = counters.snapshot();
        assert_eq!(snap.high.failed, 2);
        assert_eq!(snap.low.failed, 2);
    }
}
