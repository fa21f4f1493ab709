//! Ingestion metrics

use std::sync::atomic::{AtomicU64, Ordering};

/// Ingestion metrics
#[derive(Debug, Default)]
pub struct IngestionMetrics {
    /// Readings delivered by any channel
    pub readings_received: AtomicU64,

    /// Readings that only updated the current record
    pub readings_throttled: AtomicU64,

    /// Ticks that ran the pipeline
    pub ticks_processed: AtomicU64,

    /// Ticks that ended in warm-up (no result)
    pub warmup_ticks: AtomicU64,

    /// Ticks that produced a classification
    pub classifications: AtomicU64,

    /// Ticks rejected by the engine
    pub tick_errors: AtomicU64,

    /// Anomaly events dispatched
    pub anomalies: AtomicU64,

    /// GPS lookups that fell back to no fix
    pub gps_failures: AtomicU64,
}

impl IngestionMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_reading(&self) {
        self.readings_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_throttled(&self) {
        self.readings_throttled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_tick(&self) {
        self.ticks_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_warmup(&self) {
        self.warmup_ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_classification(&self, anomalies: usize) {
        self.classifications.fetch_add(1, Ordering::Relaxed);
        self.anomalies.fetch_add(anomalies as u64, Ordering::Relaxed);
    }

    pub fn record_tick_error(&self) {
        self.tick_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_gps_failure(&self) {
        self.gps_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            readings_received: self.readings_received.load(Ordering::Relaxed),
            readings_throttled: self.readings_throttled.load(Ordering::Relaxed),
            ticks_processed: self.ticks_processed.load(Ordering::Relaxed),
            warmup_ticks: self.warmup_ticks.load(Ordering::Relaxed),
            classifications: self.classifications.load(Ordering::Relaxed),
            tick_errors: self.tick_errors.load(Ordering::Relaxed),
            anomalies: self.anomalies.load(Ordering::Relaxed),
            gps_failures: self.gps_failures.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub readings_received: u64,
    pub readings_throttled: u64,
    pub ticks_processed: u64,
    pub warmup_ticks: u64,
    pub classifications: u64,
    pub tick_errors: u64,
    pub anomalies: u64,
    pub gps_failures: u64,
}
