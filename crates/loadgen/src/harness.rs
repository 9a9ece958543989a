//! End-to-end run: provision, seed, then compare scenarios.

use crate::config::HarnessConfig;
use crate::dispatcher::PriorityDispatcher;
use crate::error::HarnessError;
use crate::generator::RecordGenerator;
use crate::report::ComparisonReport;
use crate::runner::ScenarioRunner;
use crate::seeder::{SeedReport, Seeder};
use prioload_store::StoreGateway;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Drives a complete comparison run against one gateway.
pub struct Harness {
    config: HarnessConfig,
    gateway: Arc<dyn StoreGateway>,
    cancel: CancellationToken,
}

impl Harness {
    /// Create a harness. Fails if the configuration is unusable.
    pub fn new(config: HarnessConfig, gateway: Arc<dyn StoreGateway>) -> Result<Self, HarnessError> {
        config.validate()?;
        Ok(Self {
            config,
            gateway,
            cancel: CancellationToken::new(),
        })
    }

    /// Token that stops the run when cancelled: seeding stops issuing writes,
    /// and scenarios stop between waves.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Provision the namespace and seed the dataset.
    pub async fn prepare(&self) -> Result<SeedReport, HarnessError> {
        let namespace = self.gateway.namespace();
        info!(
            container = %namespace.container_link(),
            throughput = namespace.throughput,
            "Ensuring namespace"
        );
        self.gateway.ensure_namespace().await?;

        let dataset = &self.config.dataset;
        let seeder = Seeder::new(Arc::clone(&self.gateway), dataset.clone())
            .with_cancellation(self.cancel.clone());
        let generator = RecordGenerator::new(dataset.generator_seed);
        let report = seeder.ensure_seeded(dataset.target_count, &generator).await?;
        Ok(report)
    }

    /// Provision, seed, warm up, then run every configured scenario.
    pub async fn run(&self) -> Result<ComparisonReport, HarnessError> {
        let seed = self.prepare().await?;
        if self.cancel.is_cancelled() {
            info!("Run cancelled during preparation");
            return Ok(ComparisonReport {
                seed,
                scenarios: Vec::new(),
            });
        }

        let dispatcher = PriorityDispatcher::new(
            Arc::clone(&self.gateway),
            self.config.dataset.target_count,
            self.config.dataset.id_offset,
            self.config.timing.request_timeout,
        );
        let runner = ScenarioRunner::new(dispatcher).with_cancellation(self.cancel.clone());

        let warmup = self.config.timing.warmup;
        if !warmup.is_zero() {
            info!(warmup = ?warmup, "Warming up before first scenario");
            if !runner.pause(warmup).await {
                return Ok(ComparisonReport {
                    seed,
                    scenarios: Vec::new(),
                });
            }
        }

        let scenarios = runner
            .run_all(&self.config.scenarios, self.config.timing.cooldown)
            .await;

        Ok(ComparisonReport { seed, scenarios })
    }
}
