//! Configuration types for the harness.

use prioload_store::{ConnectionConfig, NamespaceSpec, SimulatedConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Errors loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Configuration for a full harness run.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Backend connection parameters.
    pub connection: ConnectionConfig,

    /// Database, container and throughput.
    pub namespace: NamespaceSpec,

    /// Dataset size and seeding behaviour.
    pub dataset: DatasetConfig,

    /// Timing shared by all scenarios.
    pub timing: TimingConfig,

    /// Scenarios to run, in order.
    pub scenarios: Vec<ScenarioConfig>,

    /// Behaviour of the in-process store for offline runs.
    pub simulated: SimulatedConfig,
}

impl HarnessConfig {
    /// Default configuration with the standard with/without priority pair.
    pub fn new() -> Self {
        Self {
            scenarios: ScenarioConfig::comparison_pair(300, 300, ScenarioMode::default()),
            ..Default::default()
        }
    }

    /// Load from a TOML file. Missing fields take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Parse from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(text)?;
        if config.scenarios.is_empty() {
            config.scenarios = ScenarioConfig::comparison_pair(300, 300, ScenarioMode::default());
        }
        Ok(config)
    }

    /// Check the configuration for values that cannot produce a run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dataset.target_count == 0 {
            return Err(ConfigError::Invalid(
                "dataset.target_count must be positive".to_string(),
            ));
        }
        if self.dataset.write_concurrency == 0 {
            return Err(ConfigError::Invalid(
                "dataset.write_concurrency must be positive".to_string(),
            ));
        }
        if self.timing.request_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "timing.request_timeout must be positive".to_string(),
            ));
        }
        for scenario in &self.scenarios {
            if scenario.mode.wave_count() == 0 {
                return Err(ConfigError::Invalid(format!(
                    "scenario '{}' has no waves",
                    scenario.label
                )));
            }
        }
        Ok(())
    }

    /// Set the target dataset size.
    pub fn with_target_count(mut self, count: u64) -> Self {
        self.dataset.target_count = count;
        self
    }

    /// Set the scenarios.
    pub fn with_scenarios(mut self, scenarios: Vec<ScenarioConfig>) -> Self {
        self.scenarios = scenarios;
        self
    }

    /// Set the timing configuration.
    pub fn with_timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }
}

/// Dataset size and seeding configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Minimum number of records the container must hold.
    pub target_count: u64,

    /// First sequence number of generated ids.
    pub id_offset: u64,

    /// Seed for the record generator.
    pub generator_seed: u64,

    /// Maximum upserts in flight while seeding.
    pub write_concurrency: usize,

    /// Attempts per record when an upsert is rejected for capacity.
    pub max_write_attempts: u32,

    /// Pause before retrying a capacity-rejected upsert.
    #[serde(with = "prioload_types::duration")]
    pub retry_pause: Duration,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            target_count: 2000,
            id_offset: 0,
            generator_seed: 12345,
            write_concurrency: 16,
            max_write_attempts: 3,
            retry_pause: Duration::from_millis(200),
        }
    }
}

/// Timing shared by all scenarios.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Deadline for each dispatched read.
    #[serde(with = "prioload_types::duration")]
    pub request_timeout: Duration,

    /// Pause after seeding, before the first scenario.
    #[serde(with = "prioload_types::duration")]
    pub warmup: Duration,

    /// Pause between scenarios.
    #[serde(with = "prioload_types::duration")]
    pub cooldown: Duration,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(5),
            warmup: Duration::from_secs(10),
            cooldown: Duration::ZERO,
        }
    }
}

impl TimingConfig {
    /// No warm-up or cool-down; used by tests and offline runs.
    pub fn immediate(request_timeout: Duration) -> Self {
        Self {
            request_timeout,
            warmup: Duration::ZERO,
            cooldown: Duration::ZERO,
        }
    }
}

/// How waves are issued within a scenario.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScenarioMode {
    /// One wave per tick with a fixed pause between ticks.
    Ticks {
        count: u32,
        #[serde(with = "prioload_types::duration")]
        interval: Duration,
    },

    /// A single large wave.
    Wave,
}

impl Default for ScenarioMode {
    fn default() -> Self {
        ScenarioMode::Ticks {
            count: 10,
            interval: Duration::from_millis(100),
        }
    }
}

impl ScenarioMode {
    /// `duration_secs` ticks, 100 ms apart.
    ///
    /// The argument counts ticks, not seconds: ten ticks span about one
    /// second of pauses plus the time each wave takes.
    pub fn for_duration_secs(duration_secs: u32) -> Self {
        ScenarioMode::Ticks {
            count: duration_secs,
            interval: Duration::from_millis(100),
        }
    }

    /// Number of waves this mode issues.
    pub fn wave_count(&self) -> u32 {
        match self {
            ScenarioMode::Ticks { count, .. } => *count,
            ScenarioMode::Wave => 1,
        }
    }

    /// Pause between consecutive waves.
    pub fn interval(&self) -> Duration {
        match self {
            ScenarioMode::Ticks { interval, .. } => *interval,
            ScenarioMode::Wave => Duration::ZERO,
        }
    }
}

/// One simulation scenario.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Label used in report lines, e.g. "with priority".
    pub label: String,

    /// Low-priority reads per wave.
    pub low_count: u64,

    /// High-priority reads per wave.
    pub high_count: u64,

    /// Whether reads carry a priority hint.
    pub priority_enabled: bool,

    /// Wave schedule.
    #[serde(default)]
    pub mode: ScenarioMode,
}

impl ScenarioConfig {
    pub fn new(label: impl Into<String>, low_count: u64, high_count: u64, priority_enabled: bool) -> Self {
        Self {
            label: label.into(),
            low_count,
            high_count,
            priority_enabled,
            mode: ScenarioMode::default(),
        }
    }

    /// Set the wave schedule.
    pub fn with_mode(mut self, mode: ScenarioMode) -> Self {
        self.mode = mode;
        self
    }

    /// The standard comparison: with priority first, then without.
    pub fn comparison_pair(low_count: u64, high_count: u64, mode: ScenarioMode) -> Vec<Self> {
        vec![
            Self::new("with priority", low_count, high_count, true).with_mode(mode.clone()),
            Self::new("without priority", low_count, high_count, false).with_mode(mode),
        ]
    }

    /// Reads per wave across both classes.
    pub fn reads_per_wave(&self) -> u64 {
        self.low_count + self.high_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HarnessConfig::new();
        assert_eq!(config.namespace.database, "TestDatabase");
        assert_eq!(config.namespace.container, "TestPBE");
        assert_eq!(config.dataset.target_count, 2000);
        assert_eq!(config.scenarios.len(), 2);
        assert!(config.scenarios[0].priority_enabled);
        assert!(!config.scenarios[1].priority_enabled);
        assert_eq!(config.scenarios[0].reads_per_wave(), 600);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_toml() {
        let text = r#"
            [namespace]
            throughput = 1000

            [dataset]
            target_count = 50
            retry_pause = "50ms"

            [timing]
            request_timeout = "2s"
            warmup = "0s"

            [[scenarios]]
            label = "burst"
            low_count = 10
            high_count = 20
            priority_enabled = true
            mode = { kind = "wave" }

            [[scenarios]]
            label = "steady"
            low_count = 5
            high_count = 5
            priority_enabled = false
            mode = { kind = "ticks", count = 3, interval = "250ms" }
        "#;

        let config = HarnessConfig::from_toml(text).unwrap();
        assert_eq!(config.namespace.throughput, 1000);
        assert_eq!(config.namespace.container, "TestPBE");
        assert_eq!(config.dataset.target_count, 50);
        assert_eq!(config.dataset.retry_pause, Duration::from_millis(50));
        assert_eq!(config.timing.request_timeout, Duration::from_secs(2));
        assert_eq!(config.timing.warmup, Duration::ZERO);
        assert_eq!(config.scenarios[0].mode, ScenarioMode::Wave);
        assert_eq!(config.scenarios[1].mode.wave_count(), 3);
        assert_eq!(config.scenarios[1].mode.interval(), Duration::from_millis(250));
    }

    #[test]
    fn test_empty_file_gets_default_scenarios() {
        let config = HarnessConfig::from_toml("").unwrap();
        assert_eq!(config.scenarios.len(), 2);
    }

    #[test]
    fn test_validate_rejects_zero_waves() {
        let config = HarnessConfig::new().with_scenarios(vec![ScenarioConfig::new("x", 1, 1, true)
            .with_mode(ScenarioMode::for_duration_secs(0))]);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_duration_secs_counts_ticks() {
        let mode = ScenarioMode::for_duration_secs(10);
        assert_eq!(mode.wave_count(), 10);
        assert_eq!(mode.interval(), Duration::from_millis(100));
        assert_eq!(mode, ScenarioMode::default());
    }

    #[test]
    fn test_validate_rejects_empty_dataset() {
        let config = HarnessConfig::new().with_target_count(0);
        assert!(config.validate().is_err());
    }
}
