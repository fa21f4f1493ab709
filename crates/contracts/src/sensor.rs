//! Sensor readings and merged samples - SampleIngestor input/output

use serde::{Deserialize, Serialize};
use std::fmt;

/// 3D vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean norm `sqrt(x² + y² + z²)`
    #[inline]
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Physical sensor channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorChannel {
    Accelerometer,
    Gyroscope,
    Magnetometer,
}

impl SensorChannel {
    pub const ALL: [SensorChannel; 3] = [
        SensorChannel::Accelerometer,
        SensorChannel::Gyroscope,
        SensorChannel::Magnetometer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SensorChannel::Accelerometer => "accelerometer",
            SensorChannel::Gyroscope => "gyroscope",
            SensorChannel::Magnetometer => "magnetometer",
        }
    }
}

impl fmt::Display for SensorChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single reading delivered by one channel callback
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Channel that produced the reading
    pub channel: SensorChannel,

    /// Raw `{x, y, z}` triplet
    pub value: Vec3,

    /// Host timestamp (ms)
    pub timestamp_ms: u64,
}

/// Merged tri-sensor sample, produced once per accepted tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorSample {
    pub accel: Vec3,
    pub gyro: Vec3,
    pub mag: Vec3,
    pub timestamp_ms: u64,
}

impl SensorSample {
    pub fn new(accel: Vec3, gyro: Vec3, mag: Vec3, timestamp_ms: u64) -> Self {
        Self {
            accel,
            gyro,
            mag,
            timestamp_ms,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.accel.is_finite() && self.gyro.is_finite() && self.mag.is_finite()
    }
}

/// Sample plus per-sensor magnitudes, as carried by `sensor` events
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProcessedSample {
    pub sample: SensorSample,
    pub accel_magnitude: f64,
    pub gyro_magnitude: f64,
    pub mag_magnitude: f64,
}

impl From<SensorSample> for ProcessedSample {
    fn from(sample: SensorSample) -> Self {
        Self {
            accel_magnitude: sample.accel.magnitude(),
            gyro_magnitude: sample.gyro.magnitude(),
            mag_magnitude: sample.mag.magnitude(),
            sample,
        }
    }
}
