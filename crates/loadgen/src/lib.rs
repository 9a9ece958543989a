//! Priority-aware read load generator.
//!
//! Measures how request prioritization changes success and throttling rates
//! against a store with a fixed throughput budget.
//!
//! # Architecture
//!
//! ```text
//! Harness
//!   ├── StoreGateway::ensure_namespace   provision database + container
//!   ├── Seeder::ensure_seeded            top up the dataset (bounded fan-out)
//!   └── ScenarioRunner::run_all          one scenario after another
//!         └── PriorityDispatcher         waves of High/Low point reads
//!               └── ScenarioCounters     atomic per-class outcome tallies
//! ```
//!
//! # Example
//!
//! ```ignore
//! use prioload_loadgen::{Harness, HarnessConfig};
//! use prioload_store::SimulatedStore;
//! use std::sync::Arc;
//!
//! let config = HarnessConfig::new().with_target_count(100);
//! let store = Arc::new(SimulatedStore::provisioned_like(config.namespace.clone()));
//! let harness = Harness::new(config, store)?;
//! let report = harness.run().await?;
//! report.print();
//! ```

pub mod config;
pub mod counters;
pub mod dispatcher;
pub mod error;
pub mod generator;
pub mod harness;
pub mod latency;
pub mod report;
pub mod runner;
pub mod seeder;

pub use config::{
    ConfigError, DatasetConfig, HarnessConfig, ScenarioConfig, ScenarioMode, TimingConfig,
};
pub use counters::{ClassCounts, CounterSnapshot, ScenarioCounters};
pub use dispatcher::{PriorityDispatcher, ReadRequest};
pub use error::HarnessError;
pub use generator::RecordGenerator;
pub use harness::Harness;
pub use latency::{LatencySummary, LatencyTracker};
pub use report::{ComparisonReport, ScenarioReport};
pub use runner::ScenarioRunner;
pub use seeder::{SeedError, SeedReport, Seeder};
