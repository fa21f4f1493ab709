//! FeatureExtractor - per-tick statistics from the history windows.

use contracts::{
    EngineConfig, FeatureVector, FrequencyAnalysis, GpsContext, GpsFix, IntensityScores,
    MagnitudeStats, TimeContext,
};
use tracing::instrument;

use crate::history::HistoryStore;
use crate::orientation::analyze_orientation;
use crate::spectrum::dominant_frequency;
use crate::stats::variance;
use crate::steps::detect_steps;

/// Derives a `FeatureVector` from the history store
///
/// Holds the only cross-tick feature state: the last orientation stability.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    config: EngineConfig,
    stability: f64,
}

impl FeatureExtractor {
    pub fn new(config: EngineConfig) -> Self {
        let stability = config.orientation.initial_stability;
        Self { config, stability }
    }

    pub fn stability(&self) -> f64 {
        self.stability
    }

    pub fn reset(&mut self) {
        self.stability = self.config.orientation.initial_stability;
    }

    /// Extract features for the newest sample
    ///
    /// Appends to the magnitude, step-event, orientation and frequency windows.
    #[instrument(
        level = "trace",
        name = "feature_extract",
        skip(self, history, gps),
        fields(samples = history.sample_count())
    )]
    pub fn extract(
        &mut self,
        history: &mut HistoryStore,
        gps: Option<&GpsFix>,
        time: TimeContext,
    ) -> FeatureVector {
        let Some(latest) = history.latest_sample().copied() else {
            return FeatureVector {
                time,
                ..Default::default()
            };
        };
        let timestamp_ms = latest.sample.timestamp_ms;

        let (accel_mags, gyro_mags): (Vec<f64>, Vec<f64>) = history
            .recent_window(self.config.recent_window)
            .map(|s| (s.accel_magnitude, s.gyro_magnitude))
            .unzip();
        let accel = MagnitudeStats::from_values(&accel_mags);
        let gyro = MagnitudeStats::from_values(&gyro_mags);
        let current_magnitude = latest.accel_magnitude;

        let step_frequency = match detect_steps(
            history.magnitudes_mut(),
            current_magnitude,
            timestamp_ms,
            &self.config.step,
        ) {
            Some(event) => {
                history.push_step_event(timestamp_ms, event);
                event.frequency
            }
            None => 0.0,
        };

        let orientation = analyze_orientation(
            history.orientations_mut(),
            latest.sample.accel,
            timestamp_ms,
            self.stability,
            &self.config.orientation,
        );
        self.stability = orientation.stability;

        history.push_frequency_sample(current_magnitude);
        let frequency = dominant_frequency(&history.frequency_samples(), &self.config.frequency);
        let rhythmicity = rhythmicity(&accel_mags, self.config.rhythm_min_samples);

        let intensity = intensity_scores(
            &accel,
            &gyro,
            step_frequency,
            rhythmicity,
            orientation.stability,
            &frequency,
        );

        let gps = if self.config.gps.enabled {
            gps.map(|fix| gps_context(fix, self.config.gps.moving_speed_mps))
        } else {
            None
        };

        FeatureVector {
            accel,
            gyro,
            step_frequency,
            orientation,
            frequency,
            rhythmicity,
            intensity,
            gps,
            time,
        }
    }
}

/// `0.8 / (1 + var(|Δmagnitude|))`, or 0 below `min_samples`
pub fn rhythmicity(magnitudes: &[f64], min_samples: usize) -> f64 {
    if magnitudes.len() < min_samples || magnitudes.len() < 2 {
        return 0.0;
    }
    let diffs: Vec<f64> = magnitudes.windows(2).map(|w| (w[1] - w[0]).abs()).collect();
    0.8 / (1.0 + variance(&diffs))
}

/// Composite movement scores
pub fn intensity_scores(
    accel: &MagnitudeStats,
    gyro: &MagnitudeStats,
    step_frequency: f64,
    rhythmicity: f64,
    stability: f64,
    frequency: &FrequencyAnalysis,
) -> IntensityScores {
    let movement_intensity = accel.range * 0.8 + accel.std_dev * 1.5 + accel.variance * 0.7;
    let gyro_activity = gyro.avg * 2.5 + gyro.variance * 0.6 + gyro.std_dev;
    let total_movement = movement_intensity + gyro_activity * 0.5;
    let rhythm_bonus = if frequency.dominant_freq > 2.0 { 2.0 } else { 0.0 };

    IntensityScores {
        movement_intensity,
        gyro_activity,
        total_movement,
        walking_indicator: step_frequency * 2.0 + rhythmicity + stability,
        running_indicator: step_frequency * 1.5
            + rhythm_bonus
            + accel.avg * 0.8
            + accel.range * 1.5,
        stillness_indicator: 1.0 / (1.0 + total_movement),
    }
}

pub fn gps_context(fix: &GpsFix, moving_speed_mps: f64) -> GpsContext {
    let speed = fix.speed_mps.max(0.0);
    GpsContext {
        speed_mps: speed,
        is_moving: speed > moving_speed_mps,
        movement_score: (speed * 2.0).min(6.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{SensorSample, Vec3};

    fn still_history(config: &EngineConfig, n: u64) -> HistoryStore {
        let mut history = HistoryStore::new(config);
        for i in 0..n {
            history.push_sample(
                SensorSample::new(Vec3::new(0.0, 0.0, 1.0), Vec3::ZERO, Vec3::ZERO, i * 20).into(),
            );
        }
        history
    }

    #[test]
    fn test_still_device_features() {
        let config = EngineConfig::default();
        let mut history = still_history(&config, 20);
        let mut extractor = FeatureExtractor::new(config);

        let features = extractor.extract(&mut history, None, TimeContext::from_hour(12));
        assert_eq!(features.accel.variance, 0.0);
        assert_eq!(features.step_frequency, 0.0);
        assert_eq!(features.intensity.total_movement, 0.0);
        assert_eq!(features.intensity.stillness_indicator, 1.0);
        assert!(features.orientation.is_upright);
        assert!(features.gps.is_none());
        // rhythm of a constant signal is the maximum score
        assert!((features.rhythmicity - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_extract_appends_feature_windows() {
        let config = EngineConfig::default();
        let mut history = still_history(&config, 10);
        let mut extractor = FeatureExtractor::new(config);
        extractor.extract(&mut history, None, TimeContext::default());

        let stats = history.stats();
        assert_eq!(stats.magnitude_points, 1);
        assert_eq!(stats.orientation_points, 1);
        assert_eq!(stats.frequency_points, 1);
    }

    #[test]
    fn test_rhythmicity_needs_min_samples() {
        assert_eq!(rhythmicity(&[1.0; 11], 12), 0.0);
        assert!((rhythmicity(&[1.0; 12], 12) - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_intensity_formula() {
        let accel = MagnitudeStats::from_values(&[1.0, 3.0]);
        let gyro = MagnitudeStats::from_values(&[2.0, 2.0]);
        let scores = intensity_scores(
            &accel,
            &gyro,
            0.0,
            0.0,
            0.5,
            &FrequencyAnalysis::default(),
        );
        // range 2, std 1, var 1
        assert!((scores.movement_intensity - (1.6 + 1.5 + 0.7)).abs() < 1e-12);
        assert!((scores.gyro_activity - 5.0).abs() < 1e-12);
        assert!((scores.total_movement - (3.8 + 2.5)).abs() < 1e-12);
    }

    #[test]
    fn test_gps_context() {
        let fix = GpsFix::with_speed(4.0, 0);
        let ctx = gps_context(&fix, 0.8);
        assert!(ctx.is_moving);
        assert_eq!(ctx.movement_score, 6.0);

        let slow = gps_context(&GpsFix::with_speed(0.8, 0), 0.8);
        assert!(!slow.is_moving);
    }

    #[test]
    fn test_gps_ignored_when_disabled() {
        let mut config = EngineConfig::default();
        config.gps.enabled = false;
        let mut history = still_history(&config, 10);
        let mut extractor = FeatureExtractor::new(config);
        let fix = GpsFix::with_speed(3.0, 0);
        let features = extractor.extract(&mut history, Some(&fix), TimeContext::default());
        assert!(features.gps.is_none());
    }
}
