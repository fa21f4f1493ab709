//! SampleIngestor - 通道合并 + 节流 + 驱动引擎 + 事件分发

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use activity_engine::{should_process, ActivityEngine};
use contracts::{
    ClassificationResult, EngineConfig, EngineEvent, ProcessedSample, SensorChannel,
    SensorReading, SensorSample, TimeContext, Vec3,
};
use dispatcher::EventDispatcher;
use tracing::{debug, error, instrument, trace, warn};

use crate::gps::GpsCache;
use crate::metrics::IngestionMetrics;

/// Latest reading per channel
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CurrentReadings {
    pub accel: Vec3,
    pub gyro: Vec3,
    pub mag: Vec3,
}

impl CurrentReadings {
    pub fn update(&mut self, reading: &SensorReading) {
        match reading.channel {
            SensorChannel::Accelerometer => self.accel = reading.value,
            SensorChannel::Gyroscope => self.gyro = reading.value,
            SensorChannel::Magnetometer => self.mag = reading.value,
        }
    }

    pub fn to_sample(self, timestamp_ms: u64) -> SensorSample {
        SensorSample::new(self.accel, self.gyro, self.mag, timestamp_ms)
    }
}

/// Merges channel readings into throttled ticks and runs the engine on each
///
/// Every callback updates the current record; at most one tick per
/// `1000 / sampling_rate_hz` ms (on reading timestamps) runs the pipeline.
pub struct SampleIngestor {
    engine: ActivityEngine,
    dispatcher: EventDispatcher,
    gps: Option<GpsCache>,
    current: CurrentReadings,
    last_processed_ms: Option<u64>,
    interval_ms: f64,
    metrics: Arc<IngestionMetrics>,
}

impl SampleIngestor {
    pub fn new(config: EngineConfig, dispatcher: EventDispatcher) -> Self {
        Self {
            interval_ms: config.throttle_interval_ms(),
            engine: ActivityEngine::new(config),
            dispatcher,
            gps: None,
            current: CurrentReadings::default(),
            last_processed_ms: None,
            metrics: Arc::new(IngestionMetrics::new()),
        }
    }

    /// Attach a GPS cache (ignored when GPS is disabled in the engine config)
    pub fn with_gps(mut self, gps: GpsCache) -> Self {
        self.gps = Some(gps);
        self
    }

    pub fn initialize(&mut self) {
        self.engine.initialize();
    }

    pub fn engine(&self) -> &ActivityEngine {
        &self.engine
    }

    pub fn dispatcher(&self) -> &EventDispatcher {
        &self.dispatcher
    }

    pub fn metrics(&self) -> Arc<IngestionMetrics> {
        self.metrics.clone()
    }

    pub fn current(&self) -> CurrentReadings {
        self.current
    }

    /// Handle one channel reading
    ///
    /// Returns the classification when this reading opened a tick that
    /// produced one.
    pub fn on_reading(&mut self, reading: SensorReading) -> Option<ClassificationResult> {
        self.metrics.record_reading();
        self.current.update(&reading);

        if !should_process(reading.timestamp_ms, self.last_processed_ms, self.interval_ms) {
            self.metrics.record_throttled();
            return None;
        }
        self.last_processed_ms = Some(reading.timestamp_ms);

        let sample = self.current.to_sample(reading.timestamp_ms);
        self.process_tick(sample)
    }

    /// Run one pipeline pass and dispatch its events
    ///
    /// Engine errors and panics are logged and counted; the tick yields no result.
    #[instrument(
        level = "trace",
        name = "ingestion_tick",
        skip(self, sample),
        fields(timestamp_ms = sample.timestamp_ms)
    )]
    pub fn process_tick(&mut self, sample: SensorSample) -> Option<ClassificationResult> {
        self.metrics.record_tick();
        let timestamp_ms = sample.timestamp_ms;
        let time = TimeContext::from_epoch_ms(timestamp_ms);

        let pass = catch_unwind(AssertUnwindSafe(|| {
            let gps = self.gps_fix(timestamp_ms);
            self.engine.process(sample, gps.as_ref(), time)
        }));
        let outcome = match pass {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                self.metrics.record_tick_error();
                metrics::counter!("har_ticks_total", "status" => "error").increment(1);
                warn!(timestamp_ms, error = %e, "Tick failed");
                return None;
            }
            Err(_) => {
                self.metrics.record_tick_error();
                metrics::counter!("har_ticks_total", "status" => "panic").increment(1);
                error!(timestamp_ms, "Tick panicked");
                return None;
            }
        };

        let data = ProcessedSample::from(sample);
        self.dispatcher.dispatch(&EngineEvent::Sensor { data });

        let Some(result) = outcome else {
            self.metrics.record_warmup();
            metrics::counter!("har_ticks_total", "status" => "warmup").increment(1);
            trace!(timestamp_ms, "Warming up");
            return None;
        };

        self.metrics.record_classification(result.anomalies.len());
        metrics::counter!("har_ticks_total", "status" => "classified").increment(1);

        self.dispatcher.dispatch(&EngineEvent::Activity {
            data,
            prediction: result.clone(),
        });
        for anomaly in &result.anomalies {
            self.dispatcher.dispatch(&EngineEvent::Anomaly {
                data,
                anomaly: anomaly.clone(),
            });
        }

        Some(result)
    }

    fn gps_fix(&mut self, now_ms: u64) -> Option<contracts::GpsFix> {
        if !self.engine.config().gps.enabled {
            return None;
        }
        let cache = self.gps.as_mut()?;
        match cache.fix(now_ms) {
            Ok(fix) => fix,
            Err(e) => {
                self.metrics.record_gps_failure();
                debug!(error = %e, "GPS unavailable, scoring without it");
                None
            }
        }
    }

    /// Clear buffers, state, throttle and cached GPS
    ///
    /// The engine returns to the uninitialized state.
    pub fn reset(&mut self) {
        self.engine.reset();
        self.current = CurrentReadings::default();
        self.last_processed_ms = None;
        if let Some(gps) = self.gps.as_mut() {
            gps.clear();
        }
    }
}
