//! EngineState - mutable per-instance classification state.

use contracts::ActivityLabel;
use serde::Serialize;

/// Mutated only by the processing path; reset on stop
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EngineState {
    /// Label of the latest tick
    pub current_activity: Option<ActivityLabel>,
    pub confidence: f64,
    /// Timestamp of the latest high-activity tick (ms)
    pub last_high_activity_time: Option<u64>,
    /// `total_movement` of the latest high-activity tick
    pub last_high_activity_level: f64,
    /// GPS speed seen on the previous tick, if a fix was available
    pub last_gps_speed: Option<f64>,
    pub initialized: bool,
}
