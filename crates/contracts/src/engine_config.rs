//! Engine configuration contracts that can be shared across crates.
//!
//! Every default is a hand-tuned constant; changing one changes classification output.

use serde::{Deserialize, Serialize};

/// Activity engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Pipeline passes per second accepted by the throttle gate
    pub sampling_rate_hz: f64,

    /// Raw sample window capacity
    pub window_size: usize,

    /// Samples required before any classification is produced
    pub min_samples_to_classify: usize,

    /// Samples used for magnitude statistics
    pub recent_window: usize,

    /// Minimum samples for the rhythmicity score
    pub rhythm_min_samples: usize,

    pub step: StepConfig,
    pub orientation: OrientationConfig,
    pub frequency: FrequencyConfig,
    pub anomaly: AnomalyConfig,
    pub history: HistoryConfig,
    pub gps: GpsConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sampling_rate_hz: 50.0,
            window_size: 128,
            min_samples_to_classify: 8,
            recent_window: 20,
            rhythm_min_samples: 12,
            step: StepConfig::default(),
            orientation: OrientationConfig::default(),
            frequency: FrequencyConfig::default(),
            anomaly: AnomalyConfig::default(),
            history: HistoryConfig::default(),
            gps: GpsConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Minimum interval between accepted pipeline passes (ms)
    pub fn throttle_interval_ms(&self) -> f64 {
        1000.0 / self.sampling_rate_hz
    }
}

/// Peak-based step detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepConfig {
    /// Age cap of the magnitude-peak window
    pub window_ms: u64,
    /// Minimum spacing between accepted peaks
    pub min_interval_ms: u64,
    /// Points required before counting peaks
    pub min_points: usize,
    /// Threshold = mean + factor * stddev
    pub threshold_std_factor: f64,
}

impl Default for StepConfig {
    fn default() -> Self {
        Self {
            window_ms: 3000,
            min_interval_ms: 200,
            min_points: 10,
            threshold_std_factor: 0.5,
        }
    }
}

/// Tilt analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrientationConfig {
    pub window_ms: u64,
    /// Points required before stability is recomputed
    pub min_points: usize,
    /// |pitch| and |roll| must stay below this (degrees) to count as upright
    pub upright_limit_deg: f64,
    pub initial_stability: f64,
}

impl Default for OrientationConfig {
    fn default() -> Self {
        Self {
            window_ms: 5000,
            min_points: 10,
            upright_limit_deg: 45.0,
            initial_stability: 0.5,
        }
    }
}

/// Brute-force frequency sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrequencyConfig {
    /// Magnitude samples retained for the sweep
    pub buffer_size: usize,
    pub min_samples: usize,
    pub sweep_start_hz: f64,
    pub sweep_end_hz: f64,
    pub sweep_step_hz: f64,
    /// Rate assumed by the correlation, independent of the real sampling rate
    pub assumed_sample_rate_hz: f64,
}

impl Default for FrequencyConfig {
    fn default() -> Self {
        Self {
            buffer_size: 64,
            min_samples: 32,
            sweep_start_hz: 0.5,
            sweep_end_hz: 5.0,
            sweep_step_hz: 0.1,
            assumed_sample_rate_hz: 20.0,
        }
    }
}

/// Sudden-stop override and anomaly flags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    pub high_activity_movement_threshold: f64,
    /// Compared against steps/min
    pub high_activity_step_freq_threshold: f64,
    pub sudden_stop_movement_drop: f64,
    pub sudden_stop_prior_level: f64,
    pub sudden_stop_lookback_ms: u64,
    pub sudden_stop_confidence: f64,
    pub gps_prior_speed_mps: f64,
    pub gps_stopped_speed_mps: f64,
    pub confidence_floor: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            high_activity_movement_threshold: 2.5,
            high_activity_step_freq_threshold: 2.0,
            sudden_stop_movement_drop: 0.5,
            sudden_stop_prior_level: 3.0,
            sudden_stop_lookback_ms: 2000,
            sudden_stop_confidence: 0.95,
            gps_prior_speed_mps: 2.0,
            gps_stopped_speed_mps: 0.5,
            confidence_floor: 0.5,
        }
    }
}

/// History buffer caps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub step_event_window_ms: u64,
    /// Activity log size that triggers compaction
    pub activity_log_cap: usize,
    /// Records kept after compaction
    pub activity_log_compact_to: usize,
    /// Processed-sample log size that triggers compaction
    pub sample_log_cap: usize,
    pub sample_log_compact_to: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            step_event_window_ms: 10_000,
            activity_log_cap: 1000,
            activity_log_compact_to: 500,
            sample_log_cap: 1000,
            sample_log_compact_to: 500,
        }
    }
}

/// GPS usage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GpsConfig {
    pub enabled: bool,
    /// Cached fixes older than this are refreshed
    pub max_age_ms: u64,
    /// Speed above which the device counts as moving
    pub moving_speed_mps: f64,
}

impl Default for GpsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_age_ms: 5000,
            moving_speed_mps: 0.8,
        }
    }
}
