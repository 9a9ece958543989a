//! Provisioned-throughput budget for the simulated store.
//!
//! Uses a token bucket: each request consumes its unit cost, and units are
//! refilled at the provisioned rate. Low-priority requests may not dip into
//! the share of the bucket reserved for high-priority traffic.

use prioload_types::PriorityClass;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Configuration for the capacity budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    /// Maximum units available at once (bucket capacity).
    pub capacity: u32,
    /// Units added per second. Zero gives a fixed, non-refilling budget.
    pub refill_per_sec: u32,
    /// Fraction of the capacity that Low-hinted requests may not consume.
    pub high_reserve: f64,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            // Matches the default provisioned throughput of the namespace
            capacity: 400,
            refill_per_sec: 400,
            high_reserve: 0.5,
        }
    }
}

impl BudgetConfig {
    /// A budget of exactly `units` that never refills.
    pub fn fixed(units: u32) -> Self {
        Self {
            capacity: units,
            refill_per_sec: 0,
            ..Default::default()
        }
    }

    /// Budget matching a provisioned throughput.
    pub fn provisioned(throughput: u32) -> Self {
        Self {
            capacity: throughput,
            refill_per_sec: throughput,
            ..Default::default()
        }
    }

    /// Set the high-priority reserve fraction (clamped to 0.0..=1.0).
    pub fn with_high_reserve(mut self, reserve: f64) -> Self {
        self.high_reserve = reserve.clamp(0.0, 1.0);
        self
    }
}

/// Token bucket with a priority reserve.
#[derive(Debug)]
pub struct CapacityBudget {
    /// Current number of units available.
    tokens: f64,
    /// Maximum units (bucket capacity).
    capacity: f64,
    /// Units added per second.
    refill_rate: f64,
    /// Units Low requests must leave untouched.
    reserve: f64,
    /// Last time we updated the bucket.
    last_update: Instant,
}

impl CapacityBudget {
    pub fn new(config: &BudgetConfig) -> Self {
        let capacity = config.capacity as f64;
        Self {
            tokens: capacity,
            capacity,
            refill_rate: config.refill_per_sec as f64,
            reserve: capacity * config.high_reserve.clamp(0.0, 1.0),
            last_update: Instant::now(),
        }
    }

    /// Try to consume `cost` units. Returns true if admitted, false if the
    /// request should be rejected for capacity.
    ///
    /// Without a hint every request competes for the whole bucket.
    pub fn try_admit(&mut self, cost: u32, hint: Option<PriorityClass>) -> bool {
        if cost == 0 {
            return true;
        }
        self.refill();

        let floor = match hint {
            Some(PriorityClass::Low) => self.reserve,
            Some(PriorityClass::High) | None => 0.0,
        };

        let cost = cost as f64;
        if self.tokens - cost >= floor {
            self.tokens -= cost;
            true
        } else {
            false
        }
    }

    /// Refill tokens based on elapsed time.
    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.capacity);
        self.last_update = now;
    }
}
