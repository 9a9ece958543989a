//! Per-scenario outcome counters.
//!
//! Updated concurrently from every completing read, so all increments are
//! atomic. A fresh (or reset) set of counters is used for each scenario.

use prioload_types::{Outcome, PriorityClass};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for one priority class.
#[derive(Debug, Default)]
struct ClassCounters {
    succeeded: AtomicU64,
    rejected: AtomicU64,
    failed: AtomicU64,
}

impl ClassCounters {
    fn record(&self, outcome: &Outcome) {
        let counter = match outcome {
            Outcome::Succeeded => &self.succeeded,
            Outcome::RejectedForCapacity => &self.rejected,
            Outcome::Failed { .. } => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn reset(&self) {
        self.succeeded.store(0, Ordering::Relaxed);
        self.rejected.store(0, Ordering::Relaxed);
        self.failed.store(0, Ordering::Relaxed);
    }

    fn snapshot(&self) -> ClassCounts {
        ClassCounts {
            succeeded: self.succeeded.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Successful, capacity-rejected and failed reads per priority class.
#[derive(Debug, Default)]
pub struct ScenarioCounters {
    high: ClassCounters,
    low: ClassCounters,
}

impl ScenarioCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tally one completed read.
    pub fn record(&self, class: PriorityClass, outcome: &Outcome) {
        self.class(class).record(outcome);
    }

    /// Zero every counter.
    pub fn reset(&self) {
        self.high.reset();
        self.low.reset();
    }

    /// Point-in-time copy of all counters.
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            high: self.high.snapshot(),
            low: self.low.snapshot(),
        }
    }

    fn class(&self, class: PriorityClass) -> &ClassCounters {
        match class {
            PriorityClass::High => &self.high,
            PriorityClass::Low => &self.low,
        }
    }
}

/// Counts for one priority class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClassCounts {
    pub succeeded: u64,
    pub rejected: u64,
    pub failed: u64,
}

impl ClassCounts {
    /// Reads that resolved to any outcome.
    pub fn total(&self) -> u64 {
        self.succeeded + self.rejected + self.failed
    }

    /// Fraction of resolved reads that were rejected for capacity.
    pub fn rejection_ratio(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.rejected as f64 / total as f64,
        }
    }
}

/// Snapshot of [`ScenarioCounters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CounterSnapshot {
    pub high: ClassCounts,
    pub low: ClassCounts,
}

impl CounterSnapshot {
    pub fn class(&self, class: PriorityClass) -> &ClassCounts {
        match class {
            PriorityClass::High => &self.high,
            PriorityClass::Low => &self.low,
        }
    }
}
