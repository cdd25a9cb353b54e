//! Field metrics and structured logging.
//!
//! Provides the aggregate numbers the driver reports and the tracing
//! subscriber setup shared by the binaries.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Aggregates over the live trail buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FieldStats {
    /// Sum of every cell's amount.
    pub total_mass: f64,
    pub peak: f32,
    /// Cells with a strictly positive amount.
    pub occupied_cells: usize,
    /// Distinct non-zero authors among occupied cells.
    pub distinct_authors: usize,
}

/// Metrics collector for the trail driver.
pub struct Metrics {
    tick_count: AtomicU64,
    log_interval: u64,
    last_stats: Mutex<FieldStats>,
    pub counters: Mutex<HashMap<String, AtomicU64>>,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new(600)
    }
}

impl Metrics {
    /// Creates a collector that logs one summary line every `log_interval` ticks.
    #[must_use]
    pub fn new(log_interval: u64) -> Self {
        Self {
            tick_count: AtomicU64::new(0),
            log_interval: log_interval.max(1),
            last_stats: Mutex::new(FieldStats::default()),
            counters: Mutex::new(HashMap::new()),
        }
    }

    /// Records a completed tick and the field state after it.
    pub fn record_tick(&self, stats: FieldStats) {
        let tick = self.tick_count.fetch_add(1, Ordering::Relaxed) + 1;
        *self.last_stats.lock().unwrap_or_else(|e| e.into_inner()) = stats;

        if tick % self.log_interval == 0 {
            tracing::info!(
                tick = tick,
                mass = stats.total_mass,
                peak = stats.peak,
                occupied = stats.occupied_cells,
                authors = stats.distinct_authors,
                "Trail field"
            );
        } else {
            tracing::trace!(tick = tick, mass = stats.total_mass, "Trail field");
        }
    }

    /// Increments a named counter.
    pub fn increment_counter(&self, name: &str) {
        let mut counters = self.counters.lock().unwrap_or_else(|e| e.into_inner());
        counters
            .entry(name.to_string())
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn counter(&self, name: &str) -> u64 {
        let counters = self.counters.lock().unwrap_or_else(|e| e.into_inner());
        counters
            .get(name)
            .map_or(0, |c| c.load(Ordering::Relaxed))
    }

    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.tick_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn last_stats(&self) -> FieldStats {
        *self.last_stats.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Initialize tracing subscriber for logging.
///
/// Honours `RUST_LOG`; defaults to `info`.
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_env_filter(filter)
            .finish(),
    )
    .ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = Metrics::new(10);
        assert_eq!(metrics.tick_count(), 0);
        assert_eq!(metrics.last_stats(), FieldStats::default());
    }

    #[test]
    fn test_record_tick() {
        let metrics = Metrics::new(2);
        let stats = FieldStats {
            total_mass: 1.5,
            peak: 0.5,
            occupied_cells: 3,
            distinct_authors: 1,
        };
        metrics.record_tick(stats);
        metrics.record_tick(stats);
        assert_eq!(metrics.tick_count(), 2);
        assert_eq!(metrics.last_stats(), stats);
    }

    #[test]
    fn test_counters() {
        let metrics = Metrics::default();
        metrics.increment_counter("restore_rejected");
        metrics.increment_counter("restore_rejected");
        assert_eq!(metrics.counter("restore_rejected"), 2);
        assert_eq!(metrics.counter("missing"), 0);
    }
}
