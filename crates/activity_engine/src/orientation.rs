//! Device tilt and orientation stability.

use contracts::{Orientation, OrientationConfig, Vec3};
use nalgebra::Vector3;

use crate::history::Tilt;
use crate::stats::variance;
use crate::window::AgedWindow;

/// Pitch and roll (degrees) of the normalized gravity vector
///
/// A zero accel vector has no direction and maps to a level tilt.
pub fn tilt_from_accel(accel: Vec3) -> Tilt {
    let v = Vector3::new(accel.x, accel.y, accel.z);
    let Some(n) = v.try_normalize(f64::EPSILON) else {
        return Tilt {
            pitch: 0.0,
            roll: 0.0,
        };
    };
    Tilt {
        pitch: (-n.x).atan2((n.y * n.y + n.z * n.z).sqrt()).to_degrees(),
        roll: n.y.atan2(n.z).to_degrees(),
    }
}

/// Record the tilt of `accel` and derive the orientation
///
/// Stability is `1 / (1 + var(pitch) + var(roll))` once the window holds
/// `min_points` entries, otherwise `previous_stability` is carried over.
pub fn analyze_orientation(
    window: &mut AgedWindow<Tilt>,
    accel: Vec3,
    timestamp_ms: u64,
    previous_stability: f64,
    config: &OrientationConfig,
) -> Orientation {
    let tilt = tilt_from_accel(accel);
    window.push(timestamp_ms, tilt);

    let stability = if window.len() >= config.min_points {
        let pitches: Vec<f64> = window.values().map(|t| t.pitch).collect();
        let rolls: Vec<f64> = window.values().map(|t| t.roll).collect();
        1.0 / (1.0 + variance(&pitches) + variance(&rolls))
    } else {
        previous_stability
    };

    Orientation {
        pitch: tilt.pitch,
        roll: tilt.roll,
        stability,
        is_upright: tilt.pitch.abs() < config.upright_limit_deg
            && tilt.roll.abs() < config.upright_limit_deg,
    }
}
