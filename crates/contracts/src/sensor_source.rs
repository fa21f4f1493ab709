//! SensorSource trait - Sensor data source abstraction
//!
//! Each source emits readings for a single motion channel through a callback.

use std::sync::Arc;

use crate::{SensorChannel, SensorReading};

/// Reading callback type
///
/// Uses `Arc` so one ingestion callback can be shared by all channels.
pub type SensorReadingCallback = Arc<dyn Fn(SensorReading) + Send + Sync>;

/// Sensor data source trait
///
/// ```ignore
/// let source: Box<dyn SensorSource> = make_source();
/// source.listen(Arc::new(|reading| {
///     println!("{} @ {}", reading.channel, reading.timestamp_ms);
/// }));
/// source.stop();
/// ```
pub trait SensorSource: Send + Sync {
    /// Channel produced by this source
    fn channel(&self) -> SensorChannel;

    /// Register the reading callback and start emitting
    ///
    /// Repeated calls while listening are ignored.
    fn listen(&self, callback: SensorReadingCallback);

    /// Stop emitting
    fn stop(&self);

    fn is_listening(&self) -> bool;
}
