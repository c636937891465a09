//! Monotonic runtime totals, reset only by a reboot.

use std::sync::atomic::{AtomicU64, Ordering};

/// Running totals shared across the pipeline tasks.
///
/// Each counter has a single writer and any number of readers, so relaxed
/// atomic increments are sufficient.
#[derive(Debug, Default)]
pub struct Counters {
    samples_processed: AtomicU64,
    transmissions_sent: AtomicU64,
}

impl Counters {
    /// Records one captured window handed to the processing stage.
    pub fn record_sample(&self) {
        self.samples_processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one fingerprint accepted by the server.
    pub fn record_transmission(&self) {
        self.transmissions_sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Reads both totals as one consistent-enough view for display and logs.
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            samples_processed: self.samples_processed.load(Ordering::Relaxed),
            transmissions_sent: self.transmissions_sent.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CounterSnapshot {
    /// Windows handed to processing since boot.
    pub samples_processed: u64,
    /// Fingerprints accepted by the server since boot.
    pub transmissions_sent: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_increment_monotonically() {
        let counters = Counters::default();
        counters.record_sample();
        counters.record_sample();
        counters.record_transmission();
        let snapshot = counters.snapshot();
        assert_eq!(snapshot.samples_processed, 2);
        assert_eq!(snapshot.transmissions_sent, 1);
    }
}
