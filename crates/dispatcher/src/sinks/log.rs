//! LogSink - logs event summaries via tracing

use contracts::{ContractError, EngineEvent, EventSink};
use tracing::{info, instrument, trace, warn};

/// Sink that logs event summaries for debugging
pub struct LogSink {
    name: String,
    events: u64,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            events: 0,
        }
    }

    fn log_event_summary(&self, event: &EngineEvent) {
        match event {
            EngineEvent::Sensor { data } => trace!(
                sink = %self.name,
                timestamp_ms = data.sample.timestamp_ms,
                accel = data.accel_magnitude,
                gyro = data.gyro_magnitude,
                mag = data.mag_magnitude,
                "Sensor tick"
            ),
            EngineEvent::Activity { prediction, .. } => info!(
                sink = %self.name,
                timestamp_ms = prediction.timestamp_ms,
                activity = %prediction.activity,
                confidence = prediction.confidence,
                step_frequency = prediction.metrics.step_frequency,
                dominant_freq = prediction.metrics.frequency.dominant_freq,
                total_movement = prediction.metrics.intensity.total_movement,
                upright = prediction.metrics.orientation.is_upright,
                "Activity classified"
            ),
            EngineEvent::Anomaly { data, anomaly } => warn!(
                sink = %self.name,
                timestamp_ms = data.sample.timestamp_ms,
                kind = anomaly.kind.as_str(),
                severity = anomaly.severity.as_str(),
                message = %anomaly.message,
                "Anomaly detected"
            ),
        }
    }
}

impl EventSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_write",
        level = "trace",
        skip(self, event),
        fields(sink = %self.name, event = event.kind())
    )]
    async fn write(&mut self, event: &EngineEvent) -> Result<(), ContractError> {
        self.log_event_summary(event);
        self.events += 1;
        Ok(())
    }

    #[instrument(name = "log_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        // Nothing to flush for log sink
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, events = self.events, "LogSink closed");
        Ok(())
    }
}
