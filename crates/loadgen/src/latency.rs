//! Latency histograms for successful reads.

use hdrhistogram::Histogram;
use parking_lot::Mutex;
use prioload_types::PriorityClass;
use serde::Serialize;
use std::time::Duration;

/// Per-class latency histograms, in microseconds.
pub struct LatencyTracker {
    high: Mutex<Histogram<u64>>,
    low: Mutex<Histogram<u64>>,
}

impl Default for LatencyTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl LatencyTracker {
    pub fn new() -> Self {
        Self {
            high: Mutex::new(new_histogram()),
            low: Mutex::new(new_histogram()),
        }
    }

    /// Record the latency of a successful read.
    pub fn record(&self, class: PriorityClass, latency: Duration) {
        let micros = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX);
        self.histogram(class).lock().saturating_record(micros.max(1));
    }

    /// Summarize one class.
    pub fn summary(&self, class: PriorityClass) -> LatencySummary {
        let hist = self.histogram(class).lock();
        if hist.is_empty() {
            return LatencySummary::default();
        }
        LatencySummary {
            samples: hist.len(),
            p50: Duration::from_micros(hist.value_at_quantile(0.50)),
            p99: Duration::from_micros(hist.value_at_quantile(0.99)),
            max: Duration::from_micros(hist.max()),
        }
    }

    fn histogram(&self, class: PriorityClass) -> &Mutex<Histogram<u64>> {
        match class {
            PriorityClass::High => &self.high,
            PriorityClass::Low => &self.low,
        }
    }
}

/// Lowest trackable latency, 1 µs.
const LOWEST_MICROS: u64 = 1;

/// Highest trackable latency, 60 s. Slower reads saturate here.
const HIGHEST_MICROS: u64 = 60_000_000;

fn new_histogram() -> Histogram<u64> {
    // Fixed bounds: `saturating_record` clamps at the histogram's top value
    // and never resizes, so the top must cover every realistic read.
    // The bounds satisfy `high >= 2 * low` and `sigfig <= 5`, so this cannot fail.
    Histogram::new_with_bounds(LOWEST_MICROS, HIGHEST_MICROS, 3)
        .expect("constant histogram bounds are valid")
}

/// Latency percentiles for one class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LatencySummary {
    pub samples: u64,
    pub p50: Duration,
    pub p99: Duration,
    pub max: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_summary() {
        let tracker = LatencyTracker::new();
        assert_eq!(tracker.summary(PriorityClass::High), LatencySummary::default());
    }

    #[test]
    fn test_percentiles_per_class() {
        let tracker = LatencyTracker::new();
        for ms in 1..=100 {
            tracker.record(PriorityClass::Low, Duration::from_millis(ms));
        }
        tracker.record(PriorityClass::High, Duration::from_millis(3));

        let low = tracker.summary(PriorityClass::Low);
        assert_eq!(low.samples, 100);
        assert!(low.p50 >= Duration::from_millis(49) && low.p50 <= Duration::from_millis(51));
        assert!(low.max >= Duration::from_millis(100));

        let high = tracker.summary(PriorityClass::High);
        assert_eq!(high.samples, 1);
        assert!(high.max >= Duration::from_millis(3));
    }

    #[test]
    fn test_slow_reads_are_not_clamped() {
        let tracker = LatencyTracker::new();
        tracker.record(PriorityClass::High, Duration::from_secs(5));
        tracker.record(PriorityClass::High, Duration::from_secs(120));

        let high = tracker.summary(PriorityClass::High);
        assert_eq!(high.samples, 2);
        assert!(high.p50 >= Duration::from_millis(4_990));
        assert!(high.p50 <= Duration::from_millis(5_010));
        // Past the top bound the sample saturates rather than being dropped.
        assert!(high.max >= Duration::from_millis(59_900));
        assert!(high.max <= Duration::from_millis(60_100));
    }
}
