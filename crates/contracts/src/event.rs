//! EngineEvent - EventDispatcher payload
//!
//! Discriminated union consumed by UI/alerting collaborators.

use serde::{Deserialize, Serialize};

use crate::{ActivityLabel, AnomalyEvent, ClassificationResult, ProcessedSample, Severity};

/// Event emitted for an accepted tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    /// Merged sample with magnitudes
    Sensor { data: ProcessedSample },

    /// Classification produced for the tick
    Activity {
        data: ProcessedSample,
        prediction: ClassificationResult,
    },

    /// Anomaly raised for the tick
    Anomaly {
        data: ProcessedSample,
        anomaly: AnomalyEvent,
    },
}

impl EngineEvent {
    /// Event type name (`sensor` / `activity` / `anomaly`)
    pub fn kind(&self) -> &'static str {
        match self {
            EngineEvent::Sensor { .. } => "sensor",
            EngineEvent::Activity { .. } => "activity",
            EngineEvent::Anomaly { .. } => "anomaly",
        }
    }

    pub fn data(&self) -> &ProcessedSample {
        match self {
            EngineEvent::Sensor { data }
            | EngineEvent::Activity { data, .. }
            | EngineEvent::Anomaly { data, .. } => data,
        }
    }

    pub fn timestamp_ms(&self) -> u64 {
        self.data().sample.timestamp_ms
    }

    /// Alert trigger contract: HIGH anomaly, or activity becoming SUDDEN_STOP
    pub fn requires_alert(&self) -> bool {
        match self {
            EngineEvent::Sensor { .. } => false,
            EngineEvent::Activity { prediction, .. } => {
                prediction.activity == ActivityLabel::SuddenStop
            }
            EngineEvent::Anomaly { anomaly, .. } => anomaly.severity == Severity::High,
        }
    }
}
