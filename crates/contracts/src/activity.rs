//! Activity labels, signatures, classification results and anomaly events.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::FeatureVector;

/// Activity label
///
/// Declaration order is the signature iteration order and decides score ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityLabel {
    Idle,
    Standing,
    Walking,
    Running,
    SuddenStop,
}

impl ActivityLabel {
    /// Fixed iteration order
    pub const ALL: [ActivityLabel; 5] = [
        ActivityLabel::Idle,
        ActivityLabel::Standing,
        ActivityLabel::Walking,
        ActivityLabel::Running,
        ActivityLabel::SuddenStop,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityLabel::Idle => "IDLE",
            ActivityLabel::Standing => "STANDING",
            ActivityLabel::Walking => "WALKING",
            ActivityLabel::Running => "RUNNING",
            ActivityLabel::SuddenStop => "SUDDEN_STOP",
        }
    }

    /// Activities that should trigger the emergency workflow
    pub fn is_emergency(&self) -> bool {
        matches!(self, ActivityLabel::SuddenStop)
    }

    /// Expected GPS mobility for this activity, if it has one
    pub fn expected_mobility(&self) -> Option<bool> {
        match self {
            ActivityLabel::Walking | ActivityLabel::Running => Some(true),
            ActivityLabel::Idle | ActivityLabel::Standing => Some(false),
            ActivityLabel::SuddenStop => None,
        }
    }
}

impl fmt::Display for ActivityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Orientation requirement of a signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrientationRequirement {
    Upright,
    Any,
}

/// Static heuristic range profile for one activity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActivitySignature {
    pub activity: ActivityLabel,
    /// Inclusive `[min, max]`
    pub step_freq_range: (f64, f64),
    /// Inclusive `[min, max]` of accel magnitude variance
    pub variance_range: (f64, f64),
    pub orientation: OrientationRequirement,
}

impl ActivitySignature {
    /// The five hand-tuned signatures, in iteration order
    pub const DEFAULTS: [ActivitySignature; 5] = [
        ActivitySignature {
            activity: ActivityLabel::Idle,
            step_freq_range: (0.0, 0.5),
            variance_range: (0.0, 0.1),
            orientation: OrientationRequirement::Any,
        },
        ActivitySignature {
            activity: ActivityLabel::Standing,
            step_freq_range: (0.0, 1.0),
            variance_range: (0.05, 0.3),
            orientation: OrientationRequirement::Upright,
        },
        ActivitySignature {
            activity: ActivityLabel::Walking,
            step_freq_range: (1.5, 2.8),
            variance_range: (0.3, 1.5),
            orientation: OrientationRequirement::Upright,
        },
        ActivitySignature {
            activity: ActivityLabel::Running,
            step_freq_range: (2.5, 5.0),
            variance_range: (1.2, 4.0),
            orientation: OrientationRequirement::Upright,
        },
        ActivitySignature {
            activity: ActivityLabel::SuddenStop,
            step_freq_range: (0.0, 0.3),
            variance_range: (0.8, 3.0),
            orientation: OrientationRequirement::Any,
        },
    ];

    #[inline]
    pub fn step_freq_matches(&self, step_frequency: f64) -> bool {
        step_frequency >= self.step_freq_range.0 && step_frequency <= self.step_freq_range.1
    }

    #[inline]
    pub fn variance_matches(&self, variance: f64) -> bool {
        variance >= self.variance_range.0 && variance <= self.variance_range.1
    }
}

/// Anomaly severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
        }
    }
}

/// Anomaly kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnomalyKind {
    LowConfidence,
    RapidChange,
    SuddenStop,
}

impl AnomalyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalyKind::LowConfidence => "LOW_CONFIDENCE",
            AnomalyKind::RapidChange => "RAPID_CHANGE",
            AnomalyKind::SuddenStop => "SUDDEN_STOP",
        }
    }
}

/// Labels and confidence surrounding an anomaly
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnomalyContext {
    pub previous: Option<ActivityLabel>,
    pub current: ActivityLabel,
    pub confidence: f64,
}

/// Anomaly signal raised for a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyEvent {
    pub kind: AnomalyKind,
    pub severity: Severity,
    pub message: String,
    pub context: AnomalyContext,
}

/// Result of one classification pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub activity: ActivityLabel,
    /// 0-1
    pub confidence: f64,
    /// Label of the previous tick (None on the first classification)
    pub previous_activity: Option<ActivityLabel>,
    pub probabilities: BTreeMap<ActivityLabel, f64>,
    pub metrics: FeatureVector,
    /// Anomalies raised this tick, in detection order
    pub anomalies: Vec<AnomalyEvent>,
    /// Timestamp of the sample that produced this result (ms)
    pub timestamp_ms: u64,
}

impl ClassificationResult {
    /// Most severe anomaly of the tick (first one wins on equal severity)
    pub fn anomaly(&self) -> Option<&AnomalyEvent> {
        self.anomalies
            .iter()
            .fold(None, |best: Option<&AnomalyEvent>, a| match best {
                Some(b) if b.severity >= a.severity => Some(b),
                _ => Some(a),
            })
    }

    /// Whether the external alerting collaborator should be engaged
    pub fn requires_alert(&self) -> bool {
        self.activity.is_emergency()
            || self.anomalies.iter().any(|a| a.severity == Severity::High)
    }
}

/// Entry of the activity log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub activity: ActivityLabel,
    pub confidence: f64,
    pub timestamp_ms: u64,
    pub metrics: FeatureVector,
}

/// Aggregate over the activity log
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityStats {
    pub total_samples: usize,
    pub avg_confidence: f64,
    pub activities: BTreeMap<ActivityLabel, usize>,
    pub window_minutes: f64,
    pub current_activity: Option<ActivityLabel>,
    pub current_confidence: f64,
}
