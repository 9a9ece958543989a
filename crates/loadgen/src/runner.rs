//! Scenario execution.

use crate::config::ScenarioConfig;
use crate::counters::ScenarioCounters;
use crate::dispatcher::PriorityDispatcher;
use crate::latency::LatencyTracker;
use crate::report::ScenarioReport;
use prioload_types::PriorityClass;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, Instrument};

/// Runs scenarios against a dispatcher.
///
/// Each scenario gets its own counters, so results never leak from one
/// scenario into the next.
pub struct ScenarioRunner {
    dispatcher: PriorityDispatcher,
    cancel: CancellationToken,
}

impl ScenarioRunner {
    pub fn new(dispatcher: PriorityDispatcher) -> Self {
        Self {
            dispatcher,
            cancel: CancellationToken::new(),
        }
    }

    /// Use an externally owned cancellation token.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run one scenario with fresh counters.
    pub async fn run_scenario(&self, scenario: &ScenarioConfig) -> ScenarioReport {
        let counters = ScenarioCounters::new();
        self.run_scenario_with(scenario, &counters).await
    }

    /// Run one scenario using caller-owned counters.
    ///
    /// The counters are reset before the first wave, so reusing them across
    /// scenarios yields independent results.
    pub async fn run_scenario_with(
        &self,
        scenario: &ScenarioConfig,
        counters: &ScenarioCounters,
    ) -> ScenarioReport {
        let span = info_span!(
            "scenario",
            label = %scenario.label,
            priority = scenario.priority_enabled
        );
        self.run_waves(scenario, counters).instrument(span).await
    }

    async fn run_waves(&self, scenario: &ScenarioConfig, counters: &ScenarioCounters) -> ScenarioReport {
        counters.reset();
        let latency = LatencyTracker::new();
        let mut report = ScenarioReport::new(scenario);
        let waves = scenario.mode.wave_count();
        let interval = scenario.mode.interval();
        let started = Instant::now();

        info!(
            waves,
            low = scenario.low_count,
            high = scenario.high_count,
            "Running workload"
        );

        for wave in 0..waves {
            if self.cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            self.dispatcher
                .dispatch_reads(
                    scenario.low_count,
                    scenario.high_count,
                    scenario.priority_enabled,
                    counters,
                    &latency,
                )
                .await;
            report.waves_completed += 1;

            if wave + 1 < waves && !interval.is_zero() && !self.pause(interval).await {
                report.cancelled = true;
                break;
            }
        }

        let completed = u64::from(report.waves_completed);
        report.issued_high = scenario.high_count * completed;
        report.issued_low = scenario.low_count * completed;
        report.counts = counters.snapshot();
        report.latency_high = latency.summary(PriorityClass::High);
        report.latency_low = latency.summary(PriorityClass::Low);
        report.elapsed = started.elapsed();

        info!(
            high_ok = report.counts.high.succeeded,
            high_throttled = report.counts.high.rejected,
            low_ok = report.counts.low.succeeded,
            low_throttled = report.counts.low.rejected,
            failed = report.counts.high.failed + report.counts.low.failed,
            elapsed = ?report.elapsed,
            "Scenario complete"
        );

        report
    }

    /// Run scenarios back to back with `cooldown` between them.
    ///
    /// Stops early if cancelled; the interrupted scenario is still reported.
    pub async fn run_all(
        &self,
        scenarios: &[ScenarioConfig],
        cooldown: Duration,
    ) -> Vec<ScenarioReport> {
        let mut reports = Vec::with_capacity(scenarios.len());
        for (i, scenario) in scenarios.iter().enumerate() {
            if self.cancel.is_cancelled() {
                break;
            }
            if i > 0 && !cooldown.is_zero() {
                info!(cooldown = ?cooldown, "Waiting before next scenario");
                if !self.pause(cooldown).await {
                    break;
                }
            }
            reports.push(self.run_scenario(scenario).await);
        }
        reports
    }

    /// Sleep unless cancelled first. Returns false if cancelled.
    pub(crate) async fn pause(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(duration) => true,
            _ = self.cancel.cancelled() => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScenarioMode;
    use prioload_store::{BudgetConfig, NamespaceSpec, SimulatedConfig, SimulatedStore, StoreGateway};
    use prioload_types::{Record, RecordId};
    use std::sync::Arc;

    async fn runner_with(config: SimulatedConfig, records: u64) -> (ScenarioRunner, Arc<SimulatedStore>) {
        let store = Arc::new(SimulatedStore::new(NamespaceSpec::default(), config));
        store.ensure_namespace().await.unwrap();
        for seq in 0..records {
            store
                .upsert(&Record {
                    id: RecordId(seq),
                    category: "Toys".to_string(),
                    name: "Sleek Rubber Ball".to_string(),
                    quantity: 2,
                    price_cents: 250,
                    clearance_flag: true,
                })
                .await;
        }
        let dispatcher = PriorityDispatcher::new(store.clone(), records, 0, Duration::from_secs(5));
        (ScenarioRunner::new(dispatcher), store)
    }

    fn ticks(count: u32) -> ScenarioMode {
        ScenarioMode::Ticks {
            count,
            interval: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_single_wave_end_to_end() {
        let (runner, _) = runner_with(SimulatedConfig::new(BudgetConfig::fixed(1000)), 10).await;
        let scenario =
            ScenarioConfig::new("without priority", 5, 5, false).with_mode(ScenarioMode::Wave);

        let report = runner.run_scenario(&scenario).await;

        assert_eq!(report.waves_completed, 1);
        assert_eq!(report.counts.low.succeeded, 5);
        assert_eq!(report.counts.high.succeeded, 5);
        assert_eq!(report.counts.low.rejected, 0);
        assert_eq!(report.counts.high.rejected, 0);
        assert!(report.is_balanced());
        assert!(!report.cancelled);
    }

    #[tokio::test]
    async fn test_ticks_accumulate_across_waves() {
        let (runner, _) = runner_with(SimulatedConfig::new(BudgetConfig::fixed(10_000)), 10).await;
        let scenario = ScenarioConfig::new("ticks", 3, 4, true).with_mode(ticks(5));

        let report = runner.run_scenario(&scenario).await;

        assert_eq!(report.waves_completed, 5);
        assert_eq!(report.issued_low, 15);
        assert_eq!(report.issued_high, 20);
        assert_eq!(report.counts.low.succeeded, 15);
        assert_eq!(report.counts.high.succeeded, 20);
    }

    #[tokio::test]
    async fn test_reused_counters_are_reset() {
        let (runner, store) = runner_with(SimulatedConfig::new(BudgetConfig::fixed(100)), 10).await;
        let scenario = ScenarioConfig::new("repeat", 10, 10, false).with_mode(ScenarioMode::Wave);
        let counters = ScenarioCounters::new();

        let first = runner.run_scenario_with(&scenario, &counters).await;
        store.reset_budget();
        let second = runner.run_scenario_with(&scenario, &counters).await;

        assert_eq!(first.counts, second.counts);
        assert_eq!(second.counts.high.total(), 10);
    }

    #[tokio::test]
    async fn test_scenarios_do_not_share_counts() {
        let (runner, _) = runner_with(SimulatedConfig::new(BudgetConfig::fixed(10_000)), 10).await;
        let scenarios = ScenarioConfig::comparison_pair(2, 3, ScenarioMode::Wave);

        let reports = runner.run_all(&scenarios, Duration::ZERO).await;

        assert_eq!(reports.len(), 2);
        for report in &reports {
            assert_eq!(report.counts.low.total(), 2);
            assert_eq!(report.counts.high.total(), 3);
            assert!(report.is_balanced());
        }
        assert!(reports[0].priority_enabled);
        assert!(!reports[1].priority_enabled);
    }

    #[tokio::test]
    async fn test_cancellation_stops_between_waves() {
        let (runner, _) = runner_with(SimulatedConfig::new(BudgetConfig::fixed(10_000)), 10).await;
        let cancel = CancellationToken::new();
        let runner = runner.with_cancellation(cancel.clone());
        let scenario = ScenarioConfig::new("cancelled", 1, 1, true).with_mode(ScenarioMode::Ticks {
            count: 100,
            interval: Duration::from_secs(60),
        });

        let handle = tokio::spawn(async move { runner.run_scenario(&scenario).await });
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();

        let report = handle.await.unwrap();
        assert!(report.cancelled);
        assert_eq!(report.waves_completed, 1);
        assert_eq!(report.issued_high, 1);
        assert!(report.is_balanced());
    }
}
