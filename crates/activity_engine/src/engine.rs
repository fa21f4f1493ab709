//! Main activity engine implementation.

use contracts::{
    ActivityLabel, ActivityRecord, ActivityStats, ClassificationResult, EngineConfig, GpsFix,
    ProcessedSample, SensorSample, TimeContext,
};
use serde::Serialize;
use tracing::instrument;

use crate::anomaly::{AnomalyDetector, Verdict};
use crate::classifier::{probabilities, ActivityClassifier};
use crate::error::EngineError;
use crate::features::FeatureExtractor;
use crate::history::HistoryStore;
use crate::state::EngineState;

pub const MODEL_VERSION: &str = "2.0.0";

/// Engine summary for diagnostics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelInfo {
    pub version: &'static str,
    pub initialized: bool,
    pub current_activity: Option<ActivityLabel>,
    pub confidence: f64,
    pub sensor_data_points: usize,
    pub activity_history_length: usize,
    pub window_size: usize,
    pub gps_enabled: bool,
    pub supported_activities: Vec<ActivityLabel>,
    pub emergency_activities: Vec<ActivityLabel>,
}

/// Rule-based activity recognition engine
///
/// Owns the history windows and engine state. One instance per monitored
/// device; not shared between threads without external locking.
#[derive(Debug)]
pub struct ActivityEngine {
    config: EngineConfig,
    history: HistoryStore,
    extractor: FeatureExtractor,
    classifier: ActivityClassifier,
    detector: AnomalyDetector,
    state: EngineState,
}

impl ActivityEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            history: HistoryStore::new(&config),
            extractor: FeatureExtractor::new(config.clone()),
            classifier: ActivityClassifier::new(),
            detector: AnomalyDetector::new(config.anomaly.clone()),
            state: EngineState::default(),
            config,
        }
    }

    /// Mark the engine ready to process samples
    pub fn initialize(&mut self) {
        self.state.initialized = true;
        tracing::info!(
            version = MODEL_VERSION,
            window_size = self.config.window_size,
            sampling_rate_hz = self.config.sampling_rate_hz,
            "Activity engine initialized"
        );
    }

    pub fn is_initialized(&self) -> bool {
        self.state.initialized
    }

    /// Run one pipeline pass for `sample`
    ///
    /// Returns `Ok(None)` during warm-up (fewer than `min_samples_to_classify`
    /// samples). Errors leave every buffer and the state untouched.
    #[instrument(
        level = "trace",
        name = "activity_engine_process",
        skip(self, sample, gps),
        fields(timestamp_ms = sample.timestamp_ms)
    )]
    pub fn process(
        &mut self,
        sample: SensorSample,
        gps: Option<&GpsFix>,
        time: TimeContext,
    ) -> Result<Option<ClassificationResult>, EngineError> {
        if !self.state.initialized {
            return Err(EngineError::NotInitialized);
        }
        if !sample.is_finite() {
            return Err(EngineError::NonFiniteSample {
                timestamp_ms: sample.timestamp_ms,
            });
        }
        let gps = gps.filter(|fix| {
            let usable = fix.speed_mps.is_finite();
            if !usable {
                tracing::warn!(timestamp_ms = fix.timestamp_ms, "Ignoring GPS fix with non-finite speed");
            }
            usable
        });

        let timestamp_ms = sample.timestamp_ms;
        self.history.push_sample(ProcessedSample::from(sample));
        if self.history.sample_count() < self.config.min_samples_to_classify {
            metrics::counter!("har_warmup_ticks_total").increment(1);
            return Ok(None);
        }

        let features = self.extractor.extract(&mut self.history, gps, time);
        let classification = self.classifier.classify(&features);
        let previous_activity = self.state.current_activity;
        let Verdict {
            activity,
            confidence,
            overridden,
            anomalies,
        } = self.detector.evaluate(
            &mut self.state,
            &features,
            (classification.activity, classification.confidence),
            timestamp_ms,
        );

        self.state.current_activity = Some(activity);
        self.state.confidence = confidence;

        if overridden {
            tracing::warn!(
                timestamp_ms,
                matched = %classification.activity,
                total_movement = features.intensity.total_movement,
                "Sudden stop override"
            );
        }
        if previous_activity.is_some_and(|p| p != activity) {
            tracing::debug!(
                from = ?previous_activity,
                to = %activity,
                confidence,
                "Activity changed"
            );
        }

        let result = ClassificationResult {
            activity,
            confidence,
            previous_activity,
            probabilities: probabilities(activity, confidence),
            metrics: features,
            anomalies,
            timestamp_ms,
        };

        self.history.push_activity(ActivityRecord {
            activity,
            confidence,
            timestamp_ms,
            metrics: result.metrics.clone(),
        });
        self.record_metrics(&result);

        Ok(Some(result))
    }

    /// Clear every buffer and return to the uninitialized default state
    pub fn reset(&mut self) {
        self.history.clear();
        self.extractor.reset();
        self.state = EngineState::default();
        tracing::info!("Activity engine reset");
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn classifier(&self) -> &ActivityClassifier {
        &self.classifier
    }

    /// Activity log aggregate over the last `window_minutes` before `now_ms`
    pub fn activity_stats(&self, window_minutes: f64, now_ms: u64) -> ActivityStats {
        ActivityStats {
            current_activity: self.state.current_activity,
            current_confidence: self.state.confidence,
            ..self.history.activity_stats(window_minutes, now_ms)
        }
    }

    pub fn time_since_last_activity_change(&self) -> u64 {
        self.history.time_since_last_activity_change()
    }

    pub fn recent_samples(&self, seconds: f64, now_ms: u64) -> Vec<ProcessedSample> {
        self.history.recent_samples(seconds, now_ms)
    }

    pub fn model_info(&self) -> ModelInfo {
        ModelInfo {
            version: MODEL_VERSION,
            initialized: self.state.initialized,
            current_activity: self.state.current_activity,
            confidence: self.state.confidence,
            sensor_data_points: self.history.sample_count(),
            activity_history_length: self.history.activity_log().len(),
            window_size: self.config.window_size,
            gps_enabled: self.config.gps.enabled,
            supported_activities: ActivityLabel::ALL.to_vec(),
            emergency_activities: ActivityLabel::ALL
                .iter()
                .copied()
                .filter(ActivityLabel::is_emergency)
                .collect(),
        }
    }

    fn record_metrics(&self, result: &ClassificationResult) {
        metrics::counter!("har_activity_total", "activity" => result.activity.as_str())
            .increment(1);
        metrics::histogram!("har_confidence").record(result.confidence);
        metrics::histogram!("har_step_frequency").record(result.metrics.step_frequency);
        metrics::histogram!("har_total_movement")
            .record(result.metrics.intensity.total_movement);

        for anomaly in &result.anomalies {
            metrics::counter!(
                "har_anomalies_total",
                "kind" => anomaly.kind.as_str(),
                "severity" => anomaly.severity.as_str()
            )
            .increment(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{AnomalyKind, Vec3};
    use std::f64::consts::PI;

    fn still(ts: u64) -> SensorSample {
        SensorSample::new(Vec3::new(0.0, 0.0, 1.0), Vec3::ZERO, Vec3::ZERO, ts)
    }

    fn ready_engine() -> ActivityEngine {
        let mut engine = ActivityEngine::new(EngineConfig::default());
        engine.initialize();
        engine
    }

    fn noon() -> TimeContext {
        TimeContext::from_hour(12)
    }

    #[test]
    fn test_uninitialized_engine_rejects() {
        let mut engine = ActivityEngine::new(EngineConfig::default());
        let err = engine.process(still(0), None, noon()).unwrap_err();
        assert_eq!(err, EngineError::NotInitialized);
        assert_eq!(engine.history().sample_count(), 0);
    }

    #[test]
    fn test_non_finite_sample_leaves_buffers() {
        let mut engine = ready_engine();
        engine.process(still(0), None, noon()).unwrap();
        let bad = SensorSample::new(Vec3::new(f64::NAN, 0.0, 1.0), Vec3::ZERO, Vec3::ZERO, 20);
        assert!(matches!(
            engine.process(bad, None, noon()),
            Err(EngineError::NonFiniteSample { timestamp_ms: 20 })
        ));
        assert_eq!(engine.history().sample_count(), 1);
    }

    #[test]
    fn test_warm_up_yields_none() {
        let mut engine = ready_engine();
        for i in 0..7 {
            assert!(engine.process(still(i * 20), None, noon()).unwrap().is_none());
        }
        let result = engine.process(still(140), None, noon()).unwrap();
        assert!(result.is_some());
    }

    #[test]
    fn test_recent_samples_cover_ten_seconds() {
        let mut engine = ready_engine();
        for i in 0..600 {
            engine.process(still(i * 20), None, noon()).unwrap();
        }
        let recent = engine.recent_samples(10.0, 11_980);
        assert_eq!(recent.len(), 501);
        assert_eq!(recent.first().map(|s| s.sample.timestamp_ms), Some(1_980));
        assert_eq!(recent.last().map(|s| s.sample.timestamp_ms), Some(11_980));
    }

    #[test]
    fn test_still_device_is_idle() {
        let mut engine = ready_engine();
        let mut last = None;
        for i in 0..40 {
            last = engine.process(still(i * 20), None, noon()).unwrap();
        }
        let result = last.unwrap();
        assert_eq!(result.activity, ActivityLabel::Idle);
        assert!((result.confidence - 0.70).abs() < 1e-12);
        assert!(result.anomalies.is_empty());
        assert_eq!(result.previous_activity, Some(ActivityLabel::Idle));
        assert_eq!(engine.state().current_activity, Some(ActivityLabel::Idle));
    }

    #[test]
    fn test_invariants_hold_for_noisy_input() {
        let mut engine = ready_engine();
        for i in 0..400u64 {
            let t = i as f64 * 0.02;
            let sample = SensorSample::new(
                Vec3::new((t * 7.3).sin() * 4.0, (t * 3.1).cos() * 2.0, 9.81 + (t * 11.0).sin() * 6.0),
                Vec3::new((t * 5.0).sin(), 0.0, (t * 2.0).cos() * 3.0),
                Vec3::new(30.0, 0.0, -20.0),
                i * 20,
            );
            if let Some(result) = engine.process(sample, None, noon()).unwrap() {
                assert!((0.0..=1.0).contains(&result.confidence));
                assert!(result.metrics.step_frequency >= 0.0);
                assert!((result.probabilities.values().sum::<f64>() - 1.0).abs() < 1e-9);
            }
        }
        assert!(engine.history().sample_count() <= 128);
    }

    #[test]
    fn test_deterministic_replay() {
        let samples: Vec<SensorSample> = (0..200u64)
            .map(|i| {
                let t = i as f64 * 0.02;
                SensorSample::new(
                    Vec3::new(0.0, 0.0, 9.81 + 3.0 * (2.0 * PI * 2.0 * t).sin()),
                    Vec3::new(0.2 * t.sin(), 0.0, 0.0),
                    Vec3::ZERO,
                    i * 20,
                )
            })
            .collect();

        let run = || {
            let mut engine = ready_engine();
            samples
                .iter()
                .map(|s| engine.process(*s, None, noon()).unwrap())
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_sudden_stop_override() {
        let mut engine = ready_engine();
        let mut ts = 0;
        // 1.5 s burst of violent movement
        for i in 0..75u64 {
            let accel = Vec3::new(0.0, 0.0, 2.5 + 0.5 * (i as f64).sin());
            let sample = SensorSample::new(accel, Vec3::new(10.0, 0.0, 0.0), Vec3::ZERO, ts);
            engine.process(sample, None, noon()).unwrap();
            ts += 20;
        }
        let burst_end = ts;

        let mut stop = None;
        while ts < burst_end + 2000 {
            let result = engine.process(still(ts), None, noon()).unwrap();
            if let Some(r) = result.filter(|r| r.activity == ActivityLabel::SuddenStop) {
                stop = Some(r);
                break;
            }
            ts += 20;
        }

        let stop = stop.expect("sudden stop within lookback");
        assert_eq!(stop.confidence, 0.95);
        assert_eq!(
            stop.anomaly().map(|a| (a.kind, a.severity)),
            Some((AnomalyKind::SuddenStop, contracts::Severity::High))
        );
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut engine = ready_engine();
        for i in 0..20 {
            engine.process(still(i * 20), None, noon()).unwrap();
        }
        engine.reset();
        assert_eq!(engine.state(), &EngineState::default());
        assert_eq!(engine.history().stats(), Default::default());
        assert!(matches!(
            engine.process(still(1_000), None, noon()),
            Err(EngineError::NotInitialized)
        ));
    }

    #[test]
    fn test_activity_stats_and_model_info() {
        let mut engine = ready_engine();
        for i in 0..20 {
            engine.process(still(i * 20), None, noon()).unwrap();
        }
        let stats = engine.activity_stats(5.0, 400);
        assert_eq!(stats.total_samples, 13);
        assert_eq!(stats.current_activity, Some(ActivityLabel::Idle));
        assert_eq!(stats.activities.get(&ActivityLabel::Idle), Some(&13));

        let info = engine.model_info();
        assert_eq!(info.version, "2.0.0");
        assert_eq!(info.sensor_data_points, 20);
        assert_eq!(info.emergency_activities, vec![ActivityLabel::SuddenStop]);
    }
}
