//! FeatureVector - FeatureExtractor output
//!
//! Per-tick statistics consumed by the classifier and anomaly detector.

use serde::{Deserialize, Serialize};

/// Magnitude statistics over the recent window
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MagnitudeStats {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
    pub range: f64,
    /// Mean squared deviation
    pub variance: f64,
    pub std_dev: f64,
}

impl MagnitudeStats {
    /// Compute stats over a magnitude series. Empty input yields all zeros.
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let n = values.len() as f64;
        let avg = values.iter().sum::<f64>() / n;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / n;

        Self {
            avg,
            min,
            max,
            range: max - min,
            variance,
            std_dev: variance.sqrt(),
        }
    }
}

/// Device tilt and its stability
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Orientation {
    /// Degrees
    pub pitch: f64,
    /// Degrees
    pub roll: f64,
    /// 0-1, higher is steadier
    pub stability: f64,
    pub is_upright: bool,
}

impl Default for Orientation {
    fn default() -> Self {
        Self {
            pitch: 0.0,
            roll: 0.0,
            stability: 0.5,
            is_upright: true,
        }
    }
}

/// Dominant frequency of the magnitude signal
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FrequencyAnalysis {
    /// Hz
    pub dominant_freq: f64,
    pub power: f64,
}

/// Composite movement scores
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IntensityScores {
    pub movement_intensity: f64,
    pub gyro_activity: f64,
    pub total_movement: f64,
    pub walking_indicator: f64,
    pub running_indicator: f64,
    pub stillness_indicator: f64,
}

/// GPS-derived movement context
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GpsContext {
    pub speed_mps: f64,
    pub is_moving: bool,
    /// `min(2 * speed, 6)`
    pub movement_score: f64,
}

/// Time-of-day context attached to each feature vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeContext {
    /// Hour of day (0-23), as supplied by the host
    pub hour: u8,
    /// Before 06:00 or after 22:00
    pub is_night: bool,
    /// 23:00 - 04:59
    pub is_late_night: bool,
}

impl TimeContext {
    pub fn from_hour(hour: u8) -> Self {
        let hour = hour % 24;
        Self {
            hour,
            is_night: hour < 6 || hour > 22,
            is_late_night: hour >= 23 || hour <= 4,
        }
    }

    /// Hour of day (UTC) of a unix timestamp in milliseconds
    pub fn from_epoch_ms(timestamp_ms: u64) -> Self {
        Self::from_hour(((timestamp_ms / 3_600_000) % 24) as u8)
    }
}

/// Full per-tick feature vector
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub accel: MagnitudeStats,
    pub gyro: MagnitudeStats,
    /// Steps per minute
    pub step_frequency: f64,
    pub orientation: Orientation,
    pub frequency: FrequencyAnalysis,
    pub rhythmicity: f64,
    pub intensity: IntensityScores,
    pub gps: Option<GpsContext>,
    pub time: TimeContext,
}

impl FeatureVector {
    /// Whether the GPS fix reports movement; `None` when no fix is available
    pub fn gps_moving(&self) -> Option<bool> {
        self.gps.map(|g| g.is_moving)
    }
}
