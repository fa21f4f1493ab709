//! Monitor orchestrator - wires sources, engine, dispatcher and sinks.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::{EngineEvent, MonitorBlueprint};
use dispatcher::{EventDispatcher, SinkSet};
use ingestion::{
    epoch_ms, provider_from_config, sources_from_config, GpsCache, MonitoringSession,
    SampleIngestor,
};
use observability::ActivityMetricsAggregator;
use parking_lot::Mutex;
use tracing::{info, warn};

use super::RunStats;

/// Monitor configuration
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Validated blueprint, CLI overrides applied
    pub blueprint: MonitorBlueprint,

    /// Session length (None = until shutdown or source exhaustion)
    pub duration: Option<Duration>,

    /// Interval between status log lines
    pub status_interval: Duration,
}

/// One monitoring run
pub struct Monitor {
    config: MonitorConfig,
}

impl Monitor {
    pub fn new(config: MonitorConfig) -> Self {
        Self { config }
    }

    /// Run until the duration elapses, the sources run dry, or `shutdown` resolves
    pub async fn run<F>(self, shutdown: F) -> Result<RunStats>
    where
        F: Future<Output = ()>,
    {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;
        let engine_config = blueprint.to_engine_config();

        // Dispatcher + sinks
        let dispatcher = EventDispatcher::new();
        if blueprint.sinks.is_empty() {
            warn!("No sinks configured - events are only counted");
        }
        let sinks = SinkSet::attach(&dispatcher, &blueprint.sinks)
            .context("Failed to attach sinks")?;

        let aggregator = Arc::new(Mutex::new(ActivityMetricsAggregator::new()));
        let stats_subscription = {
            let aggregator = aggregator.clone();
            dispatcher.subscribe_fn("run-stats", move |event| {
                observability::record_event(event);
                if let EngineEvent::Activity { prediction, .. } = event {
                    aggregator.lock().update(prediction);
                }
            })
        };

        // Engine + GPS
        let mut ingestor = SampleIngestor::new(engine_config.clone(), dispatcher.clone());
        if engine_config.gps.enabled {
            if let Some(provider) = provider_from_config(&blueprint.gps) {
                ingestor = ingestor.with_gps(GpsCache::new(provider, engine_config.gps.max_age_ms));
                info!(speed_mps = blueprint.gps.speed_mps, "GPS provider attached");
            }
        }

        // Sources
        let sources = sources_from_config(&blueprint.source, epoch_ms())
            .context("Failed to build sensor sources")?;
        info!(
            kind = ?blueprint.source.kind,
            motion = ?blueprint.source.motion,
            rate_hz = blueprint.source.rate_hz,
            sampling_rate_hz = engine_config.sampling_rate_hz,
            "Sensor sources configured"
        );

        let session = MonitoringSession::new(ingestor, sources);
        session.start().context("Failed to start monitoring session")?;

        let interrupted = self.wait(&session, shutdown).await;

        // Snapshot engine state before stop() resets it
        let model_info = session.ingestor().lock().engine().model_info();
        if let Err(e) = session.stop() {
            warn!(error = %e, "Error stopping monitoring session");
        }
        let ingestion = session.metrics();
        drop(stats_subscription);

        let sink_metrics = sinks.metrics();
        for (name, snapshot) in &sink_metrics {
            observability::record_sink_stats(
                name,
                snapshot.write_count,
                snapshot.dropped_count,
                snapshot.failure_count,
            );
        }
        if tokio::time::timeout(Duration::from_secs(5), sinks.shutdown())
            .await
            .is_err()
        {
            warn!("Timed out waiting for sinks to drain");
        }

        let duration = start_time.elapsed();
        observability::record_session_duration_secs(duration.as_secs_f64());

        let summary = aggregator.lock().summary();
        let stats = RunStats {
            duration,
            interrupted,
            ingestion,
            dispatch: dispatcher.metrics(),
            sinks: sink_metrics,
            summary,
            final_activity: model_info.current_activity,
            final_confidence: model_info.confidence,
        };

        info!(
            duration_secs = stats.duration.as_secs_f64(),
            classifications = stats.ingestion.classifications,
            anomalies = stats.ingestion.anomalies,
            "Monitoring shutdown complete"
        );

        Ok(stats)
    }

    /// Block until a stop condition; returns whether the shutdown signal fired
    async fn wait<F>(&self, session: &MonitoringSession, shutdown: F) -> bool
    where
        F: Future<Output = ()>,
    {
        let deadline = async {
            match self.config.duration {
                Some(duration) => tokio::time::sleep(duration).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(deadline);
        tokio::pin!(shutdown);

        let mut status = tokio::time::interval(self.config.status_interval);
        // First tick completes immediately
        status.tick().await;

        loop {
            tokio::select! {
                _ = &mut deadline => {
                    info!("Monitoring duration elapsed");
                    return false;
                }
                _ = &mut shutdown => {
                    warn!("Received shutdown signal, stopping monitor...");
                    return true;
                }
                _ = status.tick() => {
                    let metrics = session.metrics();
                    info!(
                        readings = metrics.readings_received,
                        ticks = metrics.ticks_processed,
                        classifications = metrics.classifications,
                        anomalies = metrics.anomalies,
                        "Monitoring status"
                    );
                    if !session.sources_listening() {
                        info!("All sources finished");
                        return false;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config_loader::ConfigLoader;
    use contracts::{SinkConfig, SinkType, SourceKind};
    use ingestion::Recording;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_replay_run_ends_when_sources_finish() {
        let dir = tempdir().unwrap();
        let recording_path = dir.path().join("idle.jsonl");
        let events_path = dir.path().join("events.jsonl");
        Recording::synthesize(contracts::SimulatedMotion::Idle, 50.0, 600, 1_000)
            .save(&recording_path)
            .unwrap();

        let mut blueprint = ConfigLoader::default_blueprint();
        blueprint.source.kind = SourceKind::Replay;
        blueprint.source.path = Some(recording_path);
        blueprint.sinks.push(SinkConfig {
            name: "file".into(),
            sink_type: SinkType::File,
            queue_capacity: 1000,
            params: HashMap::from([(
                "path".to_string(),
                events_path.display().to_string(),
            )]),
        });

        let monitor = Monitor::new(MonitorConfig {
            blueprint,
            duration: Some(Duration::from_secs(10)),
            status_interval: Duration::from_millis(100),
        });
        let stats = monitor.run(std::future::pending()).await.unwrap();

        assert!(!stats.interrupted);
        assert!(stats.duration < Duration::from_secs(10));
        assert_eq!(stats.ingestion.readings_received, 90);
        assert!(stats.ingestion.classifications > 0);
        assert_eq!(
            stats.summary.total_classifications,
            stats.ingestion.classifications
        );
        assert!(std::fs::read_to_string(&events_path).unwrap().lines().count() > 0);
    }

    #[tokio::test]
    async fn test_shutdown_signal_interrupts() {
        let monitor = Monitor::new(MonitorConfig {
            blueprint: ConfigLoader::default_blueprint(),
            duration: None,
            status_interval: Duration::from_secs(60),
        });
        let stats = monitor
            .run(tokio::time::sleep(Duration::from_millis(200)))
            .await
            .unwrap();
        assert!(stats.interrupted);
    }
}
