//! Scenario reports.

use crate::config::ScenarioConfig;
use crate::counters::{ClassCounts, CounterSnapshot};
use crate::latency::LatencySummary;
use crate::seeder::SeedReport;
use prioload_types::PriorityClass;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Results of one scenario.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub label: String,
    pub priority_enabled: bool,
    pub waves_planned: u32,
    pub waves_completed: u32,
    /// High-priority reads issued across all completed waves.
    pub issued_high: u64,
    /// Low-priority reads issued across all completed waves.
    pub issued_low: u64,
    pub counts: CounterSnapshot,
    pub latency_high: LatencySummary,
    pub latency_low: LatencySummary,
    pub elapsed: Duration,
    /// Set when the run was interrupted before all waves completed.
    pub cancelled: bool,
}

impl ScenarioReport {
    /// Start a report for `scenario`; counts are filled in by the runner.
    pub fn new(scenario: &ScenarioConfig) -> Self {
        Self {
            label: scenario.label.clone(),
            priority_enabled: scenario.priority_enabled,
            waves_planned: scenario.mode.wave_count(),
            waves_completed: 0,
            issued_high: 0,
            issued_low: 0,
            counts: CounterSnapshot::default(),
            latency_high: LatencySummary::default(),
            latency_low: LatencySummary::default(),
            elapsed: Duration::ZERO,
            cancelled: false,
        }
    }

    pub fn issued(&self, class: PriorityClass) -> u64 {
        match class {
            PriorityClass::High => self.issued_high,
            PriorityClass::Low => self.issued_low,
        }
    }

    /// Capacity-rejected reads as a fraction of reads issued for `class`.
    pub fn rejection_ratio(&self, class: PriorityClass) -> f64 {
        match self.issued(class) {
            0 => 0.0,
            issued => self.counts.class(class).rejected as f64 / issued as f64,
        }
    }

    /// Every issued read resolved to exactly one counted outcome.
    pub fn is_balanced(&self) -> bool {
        PriorityClass::ALL
            .iter()
            .all(|&class| self.counts.class(class).total() == self.issued(class))
    }

    /// Print the report to stdout.
    pub fn print(&self) {
        println!("{}", self);
    }

    fn write_class(
        f: &mut fmt::Formatter<'_>,
        name: &str,
        label: &str,
        counts: &ClassCounts,
        latency: &LatencySummary,
    ) -> fmt::Result {
        writeln!(
            f,
            "Total {} successful requests {}: {}, total {} throttled {}: {}",
            name, label, counts.succeeded, name, label, counts.rejected
        )?;
        if counts.failed > 0 {
            writeln!(f, "Total {} failed requests {}: {}", name, label, counts.failed)?;
        }
        if latency.samples > 0 {
            writeln!(
                f,
                "  {} latency p50 {:?}, p99 {:?}, max {:?}",
                name, latency.p50, latency.p99, latency.max
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for ScenarioReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.priority_enabled {
            writeln!(f, "Result with priority enabled")?;
        } else {
            writeln!(f, "Results without priority enabled")?;
        }
        Self::write_class(f, "high", &self.label, &self.counts.high, &self.latency_high)?;
        Self::write_class(f, "low", &self.label, &self.counts.low, &self.latency_low)?;
        if self.cancelled {
            writeln!(
                f,
                "(cancelled after {}/{} waves)",
                self.waves_completed, self.waves_planned
            )?;
        }
        Ok(())
    }
}

/// Seeding result plus every scenario report.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ComparisonReport {
    pub seed: SeedReport,
    pub scenarios: Vec<ScenarioReport>,
}

impl ComparisonReport {
    /// First scenario with the given priority setting.
    pub fn find(&self, priority_enabled: bool) -> Option<&ScenarioReport> {
        self.scenarios
            .iter()
            .find(|s| s.priority_enabled == priority_enabled)
    }

    /// Reduction in the High rejection ratio from enabling priority.
    ///
    /// Positive when priority helps High requests. `None` unless both an
    /// enabled and a disabled scenario ran.
    pub fn high_rejection_improvement(&self) -> Option<f64> {
        let with = self.find(true)?;
        let without = self.find(false)?;
        Some(
            without.rejection_ratio(PriorityClass::High) - with.rejection_ratio(PriorityClass::High),
        )
    }

    /// Print every scenario and a one-line comparison.
    pub fn print(&self) {
        for scenario in &self.scenarios {
            scenario.print();
        }
        if let (Some(with), Some(without)) = (self.find(true), self.find(false)) {
            println!(
                "High throttle rate: {:.1}% with priority vs {:.1}% without",
                with.rejection_ratio(PriorityClass::High) * 100.0,
                without.rejection_ratio(PriorityClass::High) * 100.0
            );
            println!(
                "Low throttle rate: {:.1}% with priority vs {:.1}% without",
                with.rejection_ratio(PriorityClass::Low) * 100.0,
                without.rejection_ratio(PriorityClass::Low) * 100.0
            );
        }
    }
}
