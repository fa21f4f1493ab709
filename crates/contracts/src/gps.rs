//! GPS fix contract and provider trait.

use serde::{Deserialize, Serialize};

use crate::ContractError;

/// A position fix with ground speed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsFix {
    /// Ground speed (m/s)
    pub speed_mps: f64,
    /// Horizontal accuracy (m), if reported
    #[serde(default)]
    pub accuracy_m: Option<f64>,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp_ms: u64,
}

impl GpsFix {
    pub fn with_speed(speed_mps: f64, timestamp_ms: u64) -> Self {
        Self {
            speed_mps,
            accuracy_m: None,
            latitude: 0.0,
            longitude: 0.0,
            timestamp_ms,
        }
    }

    /// Age relative to `now_ms`, saturating at zero for fixes from the future
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.timestamp_ms)
    }
}

/// Source of GPS fixes
///
/// Failures are non-fatal for classification: callers fall back to a stale
/// fix or to no fix at all.
pub trait GpsProvider: Send {
    /// Request a fresh fix at `now_ms`
    ///
    /// # Errors
    /// `GpsPermissionDenied` or `GpsUnavailable`
    fn current_fix(&mut self, now_ms: u64) -> Result<GpsFix, ContractError>;
}
