//! AlertSink - turns alert-worthy events into emergency alert requests
//!
//! Only events with `requires_alert()` produce a request. Requests of the same
//! kind are rate-limited by a cooldown measured on event timestamps.

use contracts::{ActivityLabel, ContractError, EngineEvent, EventSink, Severity};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

/// Default cooldown between two alerts of the same kind (ms)
const DEFAULT_COOLDOWN_MS: u64 = 30_000;

/// Emergency alert handed to the external alerting collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRequest {
    pub id: String,
    /// `SUDDEN_STOP`, `LOW_CONFIDENCE`, ... or the activity name for activity events
    pub anomaly_type: String,
    pub activity: ActivityLabel,
    pub confidence: f64,
    pub severity: Option<Severity>,
    pub message: String,
    pub timestamp_ms: u64,
}

impl AlertRequest {
    /// Build a request from an event; `None` when the event is not alert-worthy
    pub fn from_event(event: &EngineEvent) -> Option<Self> {
        if !event.requires_alert() {
            return None;
        }
        let timestamp_ms = event.timestamp_ms();

        let request = match event {
            EngineEvent::Sensor { .. } => return None,
            EngineEvent::Activity { prediction, .. } => Self {
                id: format!("alert_{timestamp_ms}"),
                anomaly_type: prediction.activity.as_str().to_string(),
                activity: prediction.activity,
                confidence: prediction.confidence,
                severity: prediction.anomaly().map(|a| a.severity),
                message: format!(
                    "{} detected with confidence {:.2}",
                    prediction.activity, prediction.confidence
                ),
                timestamp_ms,
            },
            EngineEvent::Anomaly { anomaly, .. } => Self {
                id: format!("alert_{timestamp_ms}"),
                anomaly_type: anomaly.kind.as_str().to_string(),
                activity: anomaly.context.current,
                confidence: anomaly.context.confidence,
                severity: Some(anomaly.severity),
                message: anomaly.message.clone(),
                timestamp_ms,
            },
        };
        Some(request)
    }
}

/// Configuration for AlertSink
#[derive(Debug, Clone)]
pub struct AlertSinkConfig {
    pub cooldown_ms: u64,
}

impl Default for AlertSinkConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: DEFAULT_COOLDOWN_MS,
        }
    }
}

impl AlertSinkConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, ContractError> {
        let cooldown_ms = match params.get("cooldown_ms") {
            Some(raw) => raw.parse().map_err(|_| {
                ContractError::config_validation(
                    "cooldown_ms",
                    format!("expected milliseconds, got '{raw}'"),
                )
            })?,
            None => DEFAULT_COOLDOWN_MS,
        };
        Ok(Self { cooldown_ms })
    }
}

/// Sink that raises alert requests
pub struct AlertSink {
    name: String,
    config: AlertSinkConfig,
    tx: Option<mpsc::Sender<AlertRequest>>,
    last_sent: HashMap<String, u64>,
    raised: u64,
    suppressed: u64,
}

impl AlertSink {
    pub fn new(name: impl Into<String>, config: AlertSinkConfig) -> Self {
        Self {
            name: name.into(),
            config,
            tx: None,
            last_sent: HashMap::new(),
            raised: 0,
            suppressed: 0,
        }
    }

    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> Result<Self, ContractError> {
        Ok(Self::new(name, AlertSinkConfig::from_params(params)?))
    }

    /// Forward requests to a channel instead of only logging them
    pub fn with_channel(mut self, tx: mpsc::Sender<AlertRequest>) -> Self {
        self.tx = Some(tx);
        self
    }

    pub fn raised(&self) -> u64 {
        self.raised
    }

    pub fn suppressed(&self) -> u64 {
        self.suppressed
    }

    fn in_cooldown(&self, request: &AlertRequest) -> bool {
        self.last_sent
            .get(&request.anomaly_type)
            .is_some_and(|&last| request.timestamp_ms.saturating_sub(last) < self.config.cooldown_ms)
    }

    async fn raise(&mut self, request: AlertRequest) -> Result<(), ContractError> {
        self.last_sent
            .insert(request.anomaly_type.clone(), request.timestamp_ms);
        self.raised += 1;

        match &self.tx {
            Some(tx) => tx
                .send(request)
                .await
                .map_err(|_| ContractError::sink_write(&self.name, "alert channel closed")),
            None => {
                warn!(
                    sink = %self.name,
                    id = %request.id,
                    anomaly_type = %request.anomaly_type,
                    activity = %request.activity,
                    confidence = request.confidence,
                    "Emergency alert raised"
                );
                Ok(())
            }
        }
    }
}

impl EventSink for AlertSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "alert_sink_write",
        level = "trace",
        skip(self, event),
        fields(sink = %self.name, event = event.kind())
    )]
    async fn write(&mut self, event: &EngineEvent) -> Result<(), ContractError> {
        let Some(request) = AlertRequest::from_event(event) else {
            return Ok(());
        };

        if self.in_cooldown(&request) {
            self.suppressed += 1;
            debug!(
                sink = %self.name,
                anomaly_type = %request.anomaly_type,
                "Alert suppressed during cooldown"
            );
            return Ok(());
        }

        self.raise(request).await
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "alert_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(
            sink = %self.name,
            raised = self.raised,
            suppressed = self.suppressed,
            "AlertSink closed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{AnomalyContext, AnomalyEvent, AnomalyKind, ProcessedSample, SensorSample, Vec3};

    fn anomaly_event(kind: AnomalyKind, severity: Severity, ts: u64) -> EngineEvent {
        let sample = SensorSample::new(Vec3::new(0.0, 0.0, 9.81), Vec3::ZERO, Vec3::ZERO, ts);
        EngineEvent::Anomaly {
            data: ProcessedSample::from(sample),
            anomaly: AnomalyEvent {
                kind,
                severity,
                message: "sudden stop".to_string(),
                context: AnomalyContext {
                    previous: Some(ActivityLabel::Running),
                    current: ActivityLabel::SuddenStop,
                    confidence: 0.95,
                },
            },
        }
    }

    #[tokio::test]
    async fn test_high_anomaly_raises_request() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut sink = AlertSink::new("alerts", AlertSinkConfig::default()).with_channel(tx);

        sink.write(&anomaly_event(AnomalyKind::SuddenStop, Severity::High, 1_000))
            .await
            .unwrap();

        let request = rx.try_recv().unwrap();
        assert_eq!(request.id, "alert_1000");
        assert_eq!(request.anomaly_type, "SUDDEN_STOP");
        assert_eq!(request.activity, ActivityLabel::SuddenStop);
        assert_eq!(request.severity, Some(Severity::High));
    }

    #[tokio::test]
    async fn test_low_severity_ignored() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut sink = AlertSink::new("alerts", AlertSinkConfig::default()).with_channel(tx);

        sink.write(&anomaly_event(AnomalyKind::LowConfidence, Severity::Low, 0))
            .await
            .unwrap();

        assert!(rx.try_recv().is_err());
        assert_eq!(sink.raised(), 0);
    }

    #[tokio::test]
    async fn test_cooldown_suppresses_repeats() {
        let (tx, mut rx) = mpsc::channel(4);
        let config = AlertSinkConfig { cooldown_ms: 5_000 };
        let mut sink = AlertSink::new("alerts", config).with_channel(tx);

        for ts in [0, 1_000, 6_000] {
            sink.write(&anomaly_event(AnomalyKind::SuddenStop, Severity::High, ts))
                .await
                .unwrap();
        }

        assert_eq!(sink.raised(), 2);
        assert_eq!(sink.suppressed(), 1);
        assert_eq!(rx.try_recv().unwrap().timestamp_ms, 0);
        assert_eq!(rx.try_recv().unwrap().timestamp_ms, 6_000);
    }

    #[test]
    fn test_config_from_params() {
        let mut params = HashMap::new();
        assert_eq!(AlertSinkConfig::from_params(&params).unwrap().cooldown_ms, 30_000);

        params.insert("cooldown_ms".to_string(), "250".to_string());
        assert_eq!(AlertSinkConfig::from_params(&params).unwrap().cooldown_ms, 250);

        params.insert("cooldown_ms".to_string(), "soon".to_string());
        assert!(AlertSinkConfig::from_params(&params).is_err());
    }
}
