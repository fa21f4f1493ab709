//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace: sensor samples,
//! feature vectors, activity labels and signatures, classification results, anomaly
//! events, engine configuration and the collaborator traits (sensor sources, GPS, sinks).
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Every timestamp is milliseconds (u64) on the host clock that stamped the reading
//! - The engine never reads the wall clock itself; hosts pass `now_ms` explicitly

mod activity;
mod blueprint;
mod engine_config;
mod error;
mod event;
mod features;
mod gps;
mod sensor;
mod sensor_source;
mod sink;

pub use activity::*;
pub use blueprint::*;
pub use engine_config::*;
pub use error::*;
pub use event::*;
pub use features::*;
pub use gps::{GpsFix, GpsProvider};
pub use sensor::*;
pub use sensor_source::{SensorReadingCallback, SensorSource};
pub use sink::*;
