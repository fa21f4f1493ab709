//! MonitoringSession - 绑定三个通道源与 SampleIngestor 的启停生命周期

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use contracts::{
    ActivityStats, ContractError, SensorReadingCallback, SensorSource, SourceConfig, SourceKind,
};
use parking_lot::Mutex;
use tracing::{info, instrument, warn};

use crate::error::{IngestionError, Result};
use crate::ingestor::SampleIngestor;
use crate::metrics::MetricsSnapshot;
use crate::mock::MockSensorSource;
use crate::replay::{Recording, ReplaySource};

/// Running monitor over a set of channel sources
///
/// The ingestor sits behind one mutex shared by every channel callback.
/// `stop` takes that lock before unsubscribing, so a callback racing with
/// it either finishes its tick first or sees the session inactive.
pub struct MonitoringSession {
    ingestor: Arc<Mutex<SampleIngestor>>,
    sources: Vec<Box<dyn SensorSource>>,
    active: Arc<AtomicBool>,
}

impl MonitoringSession {
    pub fn new(ingestor: SampleIngestor, sources: Vec<Box<dyn SensorSource>>) -> Self {
        Self {
            ingestor: Arc::new(Mutex::new(ingestor)),
            sources,
            active: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Initialize the engine and subscribe every source
    #[instrument(name = "session_start", skip(self), fields(sources = self.sources.len()))]
    pub fn start(&self) -> Result<()> {
        if self.active.swap(true, Ordering::SeqCst) {
            warn!("Monitoring already running");
            return Err(IngestionError::AlreadyRunning);
        }

        self.ingestor.lock().initialize();

        let ingestor = self.ingestor.clone();
        let active = self.active.clone();
        let callback: SensorReadingCallback = Arc::new(move |reading| {
            let mut ingestor = ingestor.lock();
            if active.load(Ordering::SeqCst) {
                ingestor.on_reading(reading);
            }
        });

        for source in &self.sources {
            source.listen(callback.clone());
        }
        info!("Monitoring started");
        Ok(())
    }

    /// Unsubscribe every source, clear all buffers and reset engine state
    #[instrument(name = "session_stop", skip(self))]
    pub fn stop(&self) -> Result<()> {
        let mut ingestor = self.ingestor.lock();
        if !self.active.swap(false, Ordering::SeqCst) {
            warn!("Monitoring already stopped");
            return Err(IngestionError::NotRunning);
        }

        for source in &self.sources {
            source.stop();
        }
        ingestor.reset();
        info!("Monitoring stopped");
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Whether any source is still delivering
    pub fn sources_listening(&self) -> bool {
        self.sources.iter().any(|s| s.is_listening())
    }

    pub fn ingestor(&self) -> Arc<Mutex<SampleIngestor>> {
        self.ingestor.clone()
    }

    pub fn activity_stats(&self, window_minutes: f64, now_ms: u64) -> ActivityStats {
        self.ingestor
            .lock()
            .engine()
            .activity_stats(window_minutes, now_ms)
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.ingestor.lock().metrics().snapshot()
    }
}

impl Drop for MonitoringSession {
    fn drop(&mut self) {
        if self.is_active() {
            let _ = self.stop();
        }
    }
}

/// Build the three channel sources described by the configuration
///
/// `start_ms` anchors the simulated timeline; replay sources keep the
/// recording's own timestamps.
pub fn sources_from_config(
    config: &SourceConfig,
    start_ms: u64,
) -> Result<Vec<Box<dyn SensorSource>>> {
    match config.kind {
        SourceKind::Simulated => Ok(MockSensorSource::trio(config.motion, config.rate_hz, start_ms)),
        SourceKind::Replay => {
            let path = config.path.as_ref().ok_or_else(|| {
                ContractError::config_validation("source.path", "replay source requires a path")
            })?;
            let recording = Recording::load(path)?;
            Ok(ReplaySource::trio(&recording, 1.0))
        }
    }
}
