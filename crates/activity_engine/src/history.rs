//! HistoryStore - bounded rolling buffers for one engine instance.

use std::collections::BTreeMap;

use contracts::{ActivityRecord, ActivityStats, EngineConfig, ProcessedSample};

use crate::window::{AgedWindow, SizedWindow};

/// Result of one step-detection pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepEvent {
    pub peak_count: usize,
    /// Steps per minute
    pub frequency: f64,
    pub threshold: f64,
}

/// Pitch/roll pair in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tilt {
    pub pitch: f64,
    pub roll: f64,
}

/// Occupancy of each buffer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryStats {
    pub samples: usize,
    pub magnitude_points: usize,
    pub step_events: usize,
    pub orientation_points: usize,
    pub frequency_points: usize,
    pub activity_records: usize,
    pub logged_samples: usize,
    /// Number of activity and sample log compactions so far
    pub compactions: u64,
}

/// Independently capped collections
#[derive(Debug)]
pub struct HistoryStore {
    samples: SizedWindow<ProcessedSample>,
    magnitudes: AgedWindow<f64>,
    step_events: AgedWindow<StepEvent>,
    orientations: AgedWindow<Tilt>,
    frequency: SizedWindow<f64>,
    activity_log: Vec<ActivityRecord>,
    activity_log_cap: usize,
    activity_log_compact_to: usize,
    sample_log: Vec<ProcessedSample>,
    sample_log_cap: usize,
    sample_log_compact_to: usize,
    compactions: u64,
}

impl HistoryStore {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            samples: SizedWindow::new(config.window_size),
            magnitudes: AgedWindow::new(config.step.window_ms),
            step_events: AgedWindow::new(config.history.step_event_window_ms),
            orientations: AgedWindow::new(config.orientation.window_ms),
            frequency: SizedWindow::new(config.frequency.buffer_size),
            activity_log: Vec::new(),
            activity_log_cap: config.history.activity_log_cap,
            activity_log_compact_to: config.history.activity_log_compact_to,
            sample_log: Vec::new(),
            sample_log_cap: config.history.sample_log_cap,
            sample_log_compact_to: config.history.sample_log_compact_to,
            compactions: 0,
        }
    }

    // ===== Raw samples =====

    /// Append to the raw window and the longer sample log
    pub fn push_sample(&mut self, sample: ProcessedSample) {
        self.samples.push(sample);
        self.sample_log.push(sample);
        if compact(&mut self.sample_log, self.sample_log_cap, self.sample_log_compact_to) {
            self.compactions += 1;
        }
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn samples(&self) -> impl Iterator<Item = &ProcessedSample> {
        self.samples.iter()
    }

    /// The newest `n` samples, oldest first
    pub fn recent_window(&self, n: usize) -> impl Iterator<Item = &ProcessedSample> {
        self.samples.recent(n)
    }

    pub fn latest_sample(&self) -> Option<&ProcessedSample> {
        self.samples.latest()
    }

    /// Logged samples stamped within the last `seconds` before `now_ms`
    ///
    /// Served from the sample log, so the reach is bounded by its cap rather
    /// than by the raw window.
    pub fn recent_samples(&self, seconds: f64, now_ms: u64) -> Vec<ProcessedSample> {
        let window_ms = seconds.max(0.0) * 1000.0;
        self.sample_log
            .iter()
            .filter(|s| now_ms.saturating_sub(s.sample.timestamp_ms) as f64 <= window_ms)
            .copied()
            .collect()
    }

    // ===== Feature windows =====

    pub fn magnitudes(&self) -> &AgedWindow<f64> {
        &self.magnitudes
    }

    pub fn magnitudes_mut(&mut self) -> &mut AgedWindow<f64> {
        &mut self.magnitudes
    }

    pub fn push_step_event(&mut self, timestamp_ms: u64, event: StepEvent) {
        self.step_events.push(timestamp_ms, event);
    }

    pub fn step_events(&self) -> &AgedWindow<StepEvent> {
        &self.step_events
    }

    pub fn orientations(&self) -> &AgedWindow<Tilt> {
        &self.orientations
    }

    pub fn orientations_mut(&mut self) -> &mut AgedWindow<Tilt> {
        &mut self.orientations
    }

    pub fn push_frequency_sample(&mut self, magnitude: f64) {
        self.frequency.push(magnitude);
    }

    pub fn frequency_samples(&self) -> Vec<f64> {
        self.frequency.iter().copied().collect()
    }

    // ===== Activity log =====

    /// Append a record; on overflow the log is compacted to its newest entries
    pub fn push_activity(&mut self, record: ActivityRecord) {
        self.activity_log.push(record);
        if compact(
            &mut self.activity_log,
            self.activity_log_cap,
            self.activity_log_compact_to,
        ) {
            self.compactions += 1;
        }
    }

    pub fn activity_log(&self) -> &[ActivityRecord] {
        &self.activity_log
    }

    /// Counts and mean confidence over records no older than `window_minutes`
    ///
    /// `current_*` fields are left for the caller to fill in.
    pub fn activity_stats(&self, window_minutes: f64, now_ms: u64) -> ActivityStats {
        let window_ms = window_minutes.max(0.0) * 60_000.0;
        let mut activities = BTreeMap::new();
        let mut total_confidence = 0.0;
        let mut total = 0usize;

        for record in self
            .activity_log
            .iter()
            .filter(|r| now_ms.saturating_sub(r.timestamp_ms) as f64 <= window_ms)
        {
            *activities.entry(record.activity).or_insert(0) += 1;
            total_confidence += record.confidence;
            total += 1;
        }

        ActivityStats {
            total_samples: total,
            avg_confidence: if total == 0 {
                0.0
            } else {
                total_confidence / total as f64
            },
            activities,
            window_minutes,
            current_activity: None,
            current_confidence: 0.0,
        }
    }

    /// Milliseconds between the latest record and the newest record with a different label
    pub fn time_since_last_activity_change(&self) -> u64 {
        let Some((current, earlier)) = self.activity_log.split_last() else {
            return 0;
        };
        earlier
            .iter()
            .rev()
            .find(|r| r.activity != current.activity)
            .map(|r| current.timestamp_ms.saturating_sub(r.timestamp_ms))
            .unwrap_or(0)
    }

    // ===== Lifecycle =====

    pub fn stats(&self) -> HistoryStats {
        HistoryStats {
            samples: self.samples.len(),
            magnitude_points: self.magnitudes.len(),
            step_events: self.step_events.len(),
            orientation_points: self.orientations.len(),
            frequency_points: self.frequency.len(),
            activity_records: self.activity_log.len(),
            logged_samples: self.sample_log.len(),
            compactions: self.compactions,
        }
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.magnitudes.clear();
        self.step_events.clear();
        self.orientations.clear();
        self.frequency.clear();
        self.activity_log.clear();
        self.sample_log.clear();
        self.compactions = 0;
    }
}

/// Keep the newest `keep` entries once `log` grows past `cap`
fn compact<T>(log: &mut Vec<T>, cap: usize, keep: usize) -> bool {
    if log.len() <= cap {
        return false;
    }
    let drop = log.len().saturating_sub(keep);
    log.drain(..drop);
    tracing::debug!(kept = log.len(), dropped = drop, "History log compacted");
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ActivityLabel, FeatureVector, SensorSample, Vec3};

    fn sample(ts: u64) -> ProcessedSample {
        SensorSample::new(Vec3::new(0.0, 0.0, 9.81), Vec3::ZERO, Vec3::ZERO, ts).into()
    }

    fn record(activity: ActivityLabel, confidence: f64, ts: u64) -> ActivityRecord {
        ActivityRecord {
            activity,
            confidence,
            timestamp_ms: ts,
            metrics: FeatureVector::default(),
        }
    }

    #[test]
    fn test_raw_window_capped() {
        let mut store = HistoryStore::new(&EngineConfig::default());
        for i in 0..300 {
            store.push_sample(sample(i * 20));
        }
        assert_eq!(store.sample_count(), 128);
        assert_eq!(
            store.samples().next().map(|s| s.sample.timestamp_ms),
            Some(172 * 20)
        );
    }

    #[test]
    fn test_activity_log_compacts_to_500() {
        let mut store = HistoryStore::new(&EngineConfig::default());
        for i in 0..1000 {
            store.push_activity(record(ActivityLabel::Idle, 0.5, i));
        }
        assert_eq!(store.activity_log().len(), 1000);

        store.push_activity(record(ActivityLabel::Walking, 0.5, 1000));
        assert_eq!(store.activity_log().len(), 500);
        assert_eq!(store.activity_log()[0].timestamp_ms, 501);
        assert_eq!(store.stats().compactions, 1);
    }

    #[test]
    fn test_activity_stats_empty_window() {
        let mut store = HistoryStore::new(&EngineConfig::default());
        store.push_activity(record(ActivityLabel::Idle, 0.9, 0));

        let stats = store.activity_stats(5.0, 10 * 60_000);
        assert_eq!(stats.total_samples, 0);
        assert!(stats.activities.is_empty());
        assert_eq!(stats.avg_confidence, 0.0);
    }

    #[test]
    fn test_activity_stats_counts() {
        let mut store = HistoryStore::new(&EngineConfig::default());
        store.push_activity(record(ActivityLabel::Idle, 0.4, 1_000));
        store.push_activity(record(ActivityLabel::Walking, 0.8, 2_000));
        store.push_activity(record(ActivityLabel::Walking, 0.6, 3_000));

        let stats = store.activity_stats(5.0, 3_000);
        assert_eq!(stats.total_samples, 3);
        assert_eq!(stats.activities.get(&ActivityLabel::Walking), Some(&2));
        assert!((stats.avg_confidence - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_time_since_last_change() {
        let mut store = HistoryStore::new(&EngineConfig::default());
        assert_eq!(store.time_since_last_activity_change(), 0);

        store.push_activity(record(ActivityLabel::Idle, 0.5, 1_000));
        store.push_activity(record(ActivityLabel::Walking, 0.5, 1_500));
        store.push_activity(record(ActivityLabel::Walking, 0.5, 4_000));
        assert_eq!(store.time_since_last_activity_change(), 3_000);
    }

    #[test]
    fn test_recent_samples_reach_past_raw_window() {
        let mut store = HistoryStore::new(&EngineConfig::default());
        // 12 s at 50 Hz
        for i in 0..600 {
            store.push_sample(sample(i * 20));
        }
        assert_eq!(store.sample_count(), 128);

        let recent = store.recent_samples(10.0, 11_980);
        assert_eq!(recent.len(), 501);
        assert_eq!(recent[0].sample.timestamp_ms, 1_980);
    }

    #[test]
    fn test_sample_log_compacts_to_500() {
        let mut store = HistoryStore::new(&EngineConfig::default());
        for i in 0..1001 {
            store.push_sample(sample(i));
        }
        assert_eq!(store.stats().logged_samples, 500);
        assert_eq!(store.recent_samples(1e6, 1000)[0].sample.timestamp_ms, 501);
        assert_eq!(store.stats().compactions, 1);
    }

    #[test]
    fn test_recent_samples() {
        let mut store = HistoryStore::new(&EngineConfig::default());
        for i in 0..100 {
            store.push_sample(sample(i * 100));
        }
        assert_eq!(store.recent_samples(1.0, 9_900).len(), 11);
    }

    #[test]
    fn test_clear() {
        let mut store = HistoryStore::new(&EngineConfig::default());
        store.push_sample(sample(0));
        store.push_frequency_sample(9.81);
        store.push_activity(record(ActivityLabel::Idle, 0.5, 0));
        store.clear();
        assert_eq!(store.stats(), HistoryStats::default());
    }
}
