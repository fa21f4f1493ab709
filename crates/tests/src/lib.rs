//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试（事件 JSON 形状、默认配置）
//! - 回放 e2e：录制 -> SampleIngestor -> EventDispatcher -> sinks
//! - 实时会话 e2e：配置 -> Mock 源 -> MonitoringSession

#[cfg(test)]
mod contract_tests {
    use config_loader::ConfigLoader;
    use contracts::{EngineEvent, ProcessedSample, SensorSample, Vec3};

    #[test]
    fn test_sensor_event_wire_format() {
        let sample = SensorSample::new(Vec3::new(0.0, 0.0, 9.81), Vec3::ZERO, Vec3::ZERO, 1_000);
        let event = EngineEvent::Sensor {
            data: ProcessedSample::from(sample),
        };

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "sensor");
        assert_eq!(value["data"]["sample"]["timestamp_ms"], 1_000);
        assert!((value["data"]["accel_magnitude"].as_f64().unwrap() - 9.81).abs() < 1e-9);
    }

    #[test]
    fn test_default_blueprint_is_valid() {
        let blueprint = ConfigLoader::default_blueprint();
        config_loader::validate(&blueprint).unwrap();

        // Serialized defaults load back unchanged
        let toml = ConfigLoader::to_toml(&blueprint).unwrap();
        let reloaded =
            ConfigLoader::load_from_str(&toml, config_loader::ConfigFormat::Toml).unwrap();
        assert_eq!(reloaded.engine, blueprint.engine);
        assert_eq!(reloaded.sinks.len(), blueprint.sinks.len());
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{
        ActivityLabel, EngineConfig, EngineEvent, SimulatedMotion, SinkConfig, SinkType,
    };
    use dispatcher::{
        AlertSink, AlertSinkConfig, EventDispatcher, EventFilter, SinkSet, SubscriberHandle,
    };
    use ingestion::{
        provider_from_config, sources_from_config, GpsCache, GpsStep, MonitoringSession,
        Recording, SampleIngestor, ScriptedGpsProvider,
    };
    use observability::ActivityMetricsAggregator;
    use parking_lot::Mutex;
    use tempfile::tempdir;
    use tokio::sync::mpsc;

    fn file_sink(name: &str, path: &std::path::Path) -> SinkConfig {
        SinkConfig {
            name: name.to_string(),
            sink_type: SinkType::File,
            queue_capacity: 10_000,
            params: HashMap::from([("path".to_string(), path.display().to_string())]),
        }
    }

    /// End-to-end: sudden-stop recording -> ingestor (with GPS) -> dispatcher -> sinks
    ///
    /// 验证完整的数据流：
    /// 1. 录制回放产生三通道读数
    /// 2. GPS 速度骤降触发 SUDDEN_STOP 覆盖
    /// 3. 文件 sink 写出全部事件，告警 sink 只转发一次（冷却）
    #[tokio::test]
    async fn test_e2e_sudden_stop_replay() {
        let dir = tempdir().unwrap();
        let events_path = dir.path().join("events.jsonl");

        let dispatcher = EventDispatcher::new();
        let mut sinks =
            SinkSet::attach(&dispatcher, &[file_sink("events", &events_path)]).unwrap();

        let (alert_tx, mut alert_rx) = mpsc::channel(16);
        let alert_sink =
            AlertSink::new("alerts", AlertSinkConfig::default()).with_channel(alert_tx);
        sinks.push(
            &dispatcher,
            SubscriberHandle::spawn(alert_sink, 16, EventFilter::Alerts),
        );

        let aggregator = Arc::new(Mutex::new(ActivityMetricsAggregator::new()));
        let _stats = {
            let aggregator = aggregator.clone();
            dispatcher.subscribe_fn("stats", move |event| {
                if let EngineEvent::Activity { prediction, .. } = event {
                    aggregator.lock().update(prediction);
                }
            })
        };

        // Running until 4s, then still; GPS agrees
        let gps = ScriptedGpsProvider::new(vec![
            (0, GpsStep::Speed(3.0)),
            (4_000, GpsStep::Speed(0.0)),
        ]);
        let mut ingestor = SampleIngestor::new(EngineConfig::default(), dispatcher.clone())
            .with_gps(GpsCache::new(Box::new(gps), 100));
        ingestor.initialize();

        let recording = Recording::synthesize(SimulatedMotion::SuddenStop, 50.0, 6_000, 0);
        let classifications = recording.replay_into(&mut ingestor);

        // 300 ticks, the first 7 are warm-up
        assert_eq!(classifications, 293);
        assert_eq!(ingestor.metrics().snapshot().classifications, 293);

        let dispatched = dispatcher.metrics().events;
        sinks.shutdown().await;

        // Alert path: exactly one SUDDEN_STOP request inside the cooldown
        let mut requests = Vec::new();
        while let Ok(request) = alert_rx.try_recv() {
            requests.push(request);
        }
        let stops: Vec<_> = requests
            .iter()
            .filter(|r| r.anomaly_type == "SUDDEN_STOP")
            .collect();
        assert_eq!(stops.len(), 1);
        assert_eq!(stops[0].activity, ActivityLabel::SuddenStop);

        // File path: every dispatched event is one JSON line
        let content = std::fs::read_to_string(&events_path).unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len() as u64, dispatched);
        let stop_events: Vec<_> = lines
            .iter()
            .filter(|v| v["type"] == "anomaly" && v["anomaly"]["kind"] == "SUDDEN_STOP")
            .collect();
        assert!(!stop_events.is_empty());
        assert!(stop_events
            .iter()
            .all(|v| v["data"]["sample"]["timestamp_ms"].as_u64().unwrap() >= 4_000));

        let summary = aggregator.lock().summary();
        assert_eq!(summary.total_classifications, 293);
        assert!(summary.sudden_stops >= 1);
    }

    /// End-to-end: TOML config -> simulated sources -> live session -> file sink
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_e2e_live_session_from_config() {
        let dir = tempdir().unwrap();
        let events_path = dir.path().join("live.jsonl");
        let toml = format!(
            r#"
[engine]
sampling_rate_hz = 50.0

[source]
kind = "simulated"
motion = "walking"
rate_hz = 100.0

[gps]
kind = "fixed"
speed_mps = 1.4

[[sinks]]
name = "events"
sink_type = "file"
queue_capacity = 10000
params = {{ path = "{}", events = "classifications" }}
"#,
            events_path.display()
        );
        let blueprint = ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap();
        let engine_config = blueprint.to_engine_config();
        assert!(engine_config.gps.enabled);

        let dispatcher = EventDispatcher::new();
        let sinks = SinkSet::attach(&dispatcher, &blueprint.sinks).unwrap();

        let provider = provider_from_config(&blueprint.gps).unwrap();
        let ingestor = SampleIngestor::new(engine_config.clone(), dispatcher.clone())
            .with_gps(GpsCache::new(provider, engine_config.gps.max_age_ms));
        let sources = sources_from_config(&blueprint.source, 0).unwrap();

        let session = MonitoringSession::new(ingestor, sources);
        session.start().unwrap();
        assert!(session.start().is_err());

        tokio::time::sleep(Duration::from_millis(600)).await;
        session.stop().unwrap();
        assert!(!session.is_active());
        assert!(!session.sources_listening());

        let metrics = session.metrics();
        assert!(metrics.readings_received > 0);
        assert!(metrics.classifications > 0);
        assert_eq!(metrics.gps_failures, 0);

        sinks.shutdown().await;

        let content = std::fs::read_to_string(&events_path).unwrap();
        let activities: Vec<serde_json::Value> = content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(activities.len() as u64, metrics.classifications + metrics.anomalies);
        assert!(activities
            .iter()
            .filter(|v| v["type"] == "activity")
            .all(|v| v["prediction"]["metrics"]["gps"]["speed_mps"] == 1.4));
    }
}
