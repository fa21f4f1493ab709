//! Run statistics printed after a monitoring session.

use std::time::Duration;

use contracts::ActivityLabel;
use dispatcher::{DispatchSnapshot, MetricsSnapshot as SinkSnapshot};
use ingestion::MetricsSnapshot as IngestionSnapshot;
use observability::ActivitySummary;

/// Statistics from one monitoring run
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    /// Wall-clock length of the run
    pub duration: Duration,

    /// Stopped by Ctrl+C / SIGTERM
    pub interrupted: bool,

    pub ingestion: IngestionSnapshot,
    pub dispatch: DispatchSnapshot,

    /// Per-sink queue counters, in configuration order
    pub sinks: Vec<(String, SinkSnapshot)>,

    /// Aggregated classification results
    pub summary: ActivitySummary,

    /// Engine state at the moment the session stopped
    pub final_activity: Option<ActivityLabel>,
    pub final_confidence: f64,
}

impl RunStats {
    /// Classifications per second of wall-clock time
    pub fn classification_rate(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.ingestion.classifications as f64 / secs
        } else {
            0.0
        }
    }

    /// Share of readings rejected by the throttle gate, in percent
    pub fn throttle_rate(&self) -> f64 {
        if self.ingestion.readings_received > 0 {
            self.ingestion.readings_throttled as f64 / self.ingestion.readings_received as f64
                * 100.0
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                  Monitoring Statistics                       ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        let ingestion = &self.ingestion;
        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Interrupted: {}", self.interrupted);
        println!(
            "   ├─ Readings: {} ({:.1}% throttled)",
            ingestion.readings_received,
            self.throttle_rate()
        );
        println!(
            "   ├─ Ticks: {} ({} warm-up, {} errors)",
            ingestion.ticks_processed, ingestion.warmup_ticks, ingestion.tick_errors
        );
        println!(
            "   ├─ Classifications: {} ({:.2}/s)",
            ingestion.classifications,
            self.classification_rate()
        );
        println!("   ├─ GPS failures: {}", ingestion.gps_failures);
        match self.final_activity {
            Some(activity) => println!(
                "   └─ Final activity: {} ({:.0}%)",
                activity,
                self.final_confidence * 100.0
            ),
            None => println!("   └─ Final activity: none"),
        }

        let summary = &self.summary;
        println!("\n🏃 Activities");
        let shares: Vec<_> = summary.activity_share.iter().collect();
        for (i, (label, pct)) in shares.iter().enumerate() {
            let prefix = if i == shares.len() - 1 { "└─" } else { "├─" };
            println!("   {} {}: {:.1}%", prefix, label, pct);
        }
        if shares.is_empty() {
            println!("   └─ (no classifications)");
        }

        println!("\n📈 Features");
        println!("   ├─ Confidence: {}", summary.confidence);
        println!("   ├─ Step frequency: {}", summary.step_frequency);
        println!("   ├─ Total movement: {}", summary.total_movement);
        println!("   ├─ Dominant frequency: {}", summary.dominant_freq);
        println!("   └─ Transitions: {}", summary.transitions);

        if !summary.anomaly_counts.is_empty() {
            println!("\n⚠️  Anomalies ({} sudden stops)", summary.sudden_stops);
            for (kind, count) in &summary.anomaly_counts {
                println!("   ├─ {}: {}", kind, count);
            }
        }

        println!("\n📤 Dispatch");
        println!(
            "   ├─ Events: {} ({} deliveries, {} failures, {} panics)",
            self.dispatch.events,
            self.dispatch.deliveries,
            self.dispatch.failures,
            self.dispatch.panics
        );
        for (i, (name, sink)) in self.sinks.iter().enumerate() {
            let prefix = if i == self.sinks.len() - 1 { "└─" } else { "├─" };
            println!(
                "   {} {}: {} written, {} dropped, {} failed",
                prefix, name, sink.write_count, sink.dropped_count, sink.failure_count
            );
        }

        println!();
    }
}
