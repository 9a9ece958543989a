//! prioload CLI
//!
//! Seeds a container and compares read throttling with and without
//! priority hints.

use clap::{Args, Parser, Subcommand};
use prioload_loadgen::{
    ComparisonReport, Harness, HarnessConfig, HarnessError, ScenarioConfig, ScenarioMode,
};
use prioload_store::{BudgetConfig, ConnectionConfig, CosmosGateway, SimulatedStore, StoreGateway};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "prioload")]
#[command(about = "Measure the effect of request priority on throttling")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the comparison against a live store
    Run {
        #[command(flatten)]
        remote: RemoteArgs,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Run the comparison against an in-process store
    Simulate {
        /// Capacity budget in units (defaults to the namespace throughput)
        #[arg(long)]
        capacity: Option<u32>,

        /// Fraction of the budget reserved for high-priority reads
        #[arg(long)]
        high_reserve: Option<f64>,

        /// Latency added to each read (e.g. "5ms")
        #[arg(long)]
        latency: Option<humantime::Duration>,

        /// Fail every Nth read with a non-capacity error
        #[arg(long)]
        fail_every: Option<u64>,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Provision and seed a live store without running scenarios
    Seed {
        #[command(flatten)]
        remote: RemoteArgs,

        #[command(flatten)]
        common: CommonArgs,
    },
}

#[derive(Args)]
struct RemoteArgs {
    /// Account endpoint (falls back to COSMOS_ENDPOINT)
    #[arg(long)]
    endpoint: Option<String>,

    /// Account key (falls back to COSMOS_KEY)
    #[arg(long)]
    key: Option<String>,

    /// Provisioned throughput for a newly created container
    #[arg(long)]
    throughput: Option<u32>,
}

#[derive(Args)]
struct CommonArgs {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Minimum number of records to seed
    #[arg(long)]
    records: Option<u64>,

    /// Low-priority reads per wave
    #[arg(long)]
    low: Option<u64>,

    /// High-priority reads per wave
    #[arg(long)]
    high: Option<u64>,

    /// Number of ticks (one wave per tick)
    #[arg(long, conflicts_with = "wave")]
    ticks: Option<u32>,

    /// Pause between ticks (e.g. "100ms")
    #[arg(long)]
    interval: Option<humantime::Duration>,

    /// Issue a single wave per scenario
    #[arg(long)]
    wave: bool,

    /// Deadline per read (e.g. "5s")
    #[arg(long)]
    timeout: Option<humantime::Duration>,

    /// Pause after seeding before the first scenario
    #[arg(long)]
    warmup: Option<humantime::Duration>,

    /// Pause between scenarios
    #[arg(long)]
    cooldown: Option<humantime::Duration>,

    /// Also print the report as JSON
    #[arg(long)]
    json: bool,
}

impl CommonArgs {
    fn load_config(&self) -> Result<HarnessConfig, HarnessError> {
        let mut config = match &self.config {
            Some(path) => HarnessConfig::from_file(path)?,
            None => HarnessConfig::new(),
        };

        if let Some(records) = self.records {
            config.dataset.target_count = records;
        }
        if let Some(timeout) = self.timeout {
            config.timing.request_timeout = *timeout;
        }
        if let Some(warmup) = self.warmup {
            config.timing.warmup = *warmup;
        }
        if let Some(cooldown) = self.cooldown {
            config.timing.cooldown = *cooldown;
        }

        let overrides_scenarios = self.low.is_some()
            || self.high.is_some()
            || self.ticks.is_some()
            || self.interval.is_some()
            || self.wave;
        if overrides_scenarios {
            let base = config
                .scenarios
                .first()
                .cloned()
                .unwrap_or_else(|| ScenarioConfig::new("with priority", 300, 300, true));
            let mode = if self.wave {
                ScenarioMode::Wave
            } else {
                ScenarioMode::Ticks {
                    count: self.ticks.unwrap_or_else(|| base.mode.wave_count()),
                    interval: self
                        .interval
                        .map(|d| *d)
                        .unwrap_or_else(|| base.mode.interval()),
                }
            };
            config.scenarios = ScenarioConfig::comparison_pair(
                self.low.unwrap_or(base.low_count),
                self.high.unwrap_or(base.high_count),
                mode,
            );
        }

        Ok(config)
    }
}

fn connect(remote: &RemoteArgs, config: &mut HarnessConfig) -> Result<Arc<dyn StoreGateway>, HarnessError> {
    if let Some(endpoint) = &remote.endpoint {
        config.connection.endpoint = endpoint.clone();
    }
    if let Some(key) = &remote.key {
        config.connection.key = key.clone();
    }
    if let Some(throughput) = remote.throughput {
        config.namespace.throughput = throughput;
    }
    let connection: ConnectionConfig = config.connection.clone().with_env_fallback();
    let gateway = CosmosGateway::connect(&connection, config.namespace.clone())?;
    Ok(Arc::new(gateway))
}

fn print_report(report: &ComparisonReport, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    report.print();
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    }
    Ok(())
}

/// First Ctrl-C cancels the run gracefully; a second one aborts the process.
fn install_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        eprintln!("Interrupted, finishing in-flight requests (Ctrl-C again to abort)...");
        cancel.cancel();

        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Aborted");
            std::process::exit(130);
        }
    });
}

async fn run_harness(
    config: HarnessConfig,
    gateway: Arc<dyn StoreGateway>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let harness = Harness::new(config, gateway)?;

    install_interrupt_handler(harness.cancellation_token());

    println!("starting program!");
    let report = harness.run().await?;
    print_report(&report, json)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { remote, common } => {
            let mut config = common.load_config()?;
            let gateway = connect(&remote, &mut config)?;
            run_harness(config, gateway, common.json).await?;
        }

        Commands::Simulate {
            capacity,
            high_reserve,
            latency,
            fail_every,
            common,
        } => {
            let mut config = common.load_config()?;
            let mut simulated = config.simulated.clone();
            if simulated.budget == BudgetConfig::default() {
                simulated.budget = BudgetConfig::provisioned(config.namespace.throughput);
            }
            if let Some(capacity) = capacity {
                simulated.budget.capacity = capacity;
                simulated.budget.refill_per_sec = capacity;
            }
            if let Some(reserve) = high_reserve {
                simulated.budget = simulated.budget.with_high_reserve(reserve);
            }
            if let Some(latency) = latency {
                simulated = simulated.with_read_latency(*latency);
            }
            if let Some(n) = fail_every {
                simulated = simulated.with_fail_every(n);
            }
            config.simulated = simulated.clone();

            let store = Arc::new(SimulatedStore::new(config.namespace.clone(), simulated));
            run_harness(config, store, common.json).await?;
        }

        Commands::Seed { remote, common } => {
            let mut config = common.load_config()?;
            let gateway = connect(&remote, &mut config)?;
            let json = common.json;
            let harness = Harness::new(config, gateway)?;
            install_interrupt_handler(harness.cancellation_token());
            let seed = harness.prepare().await?;
            println!(
                "{} documents written successfully ({} already present)",
                seed.written, seed.existing
            );
            if seed.cancelled {
                println!("Seeding was interrupted; rerun to finish");
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&seed)?);
            }
        }
    }

    Ok(())
}
