//! AnomalyDetector - sudden-stop override and transition flags.

use contracts::{
    ActivityLabel, AnomalyConfig, AnomalyContext, AnomalyEvent, AnomalyKind, FeatureVector,
    Severity,
};

use crate::state::EngineState;

/// Labels that form a rapid transition when they follow each other
const RAPID_CHANGE_LABELS: [ActivityLabel; 2] = [ActivityLabel::Running, ActivityLabel::SuddenStop];

/// Final label of a tick after anomaly handling
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub activity: ActivityLabel,
    pub confidence: f64,
    pub overridden: bool,
    pub anomalies: Vec<AnomalyEvent>,
}

#[derive(Debug, Clone)]
pub struct AnomalyDetector {
    config: AnomalyConfig,
}

impl AnomalyDetector {
    pub fn new(config: AnomalyConfig) -> Self {
        Self { config }
    }

    /// Apply the sudden-stop override, update high-activity tracking and raise flags
    ///
    /// The override is evaluated against the episode recorded by earlier ticks,
    /// before this tick's movement can refresh it.
    pub fn evaluate(
        &self,
        state: &mut EngineState,
        features: &FeatureVector,
        classified: (ActivityLabel, f64),
        now_ms: u64,
    ) -> Verdict {
        let previous = state.current_activity;
        let (mut activity, mut confidence) = classified;
        let mut anomalies = Vec::new();
        let total_movement = features.intensity.total_movement;
        let gps_speed = features.gps.map(|g| g.speed_mps);

        let overridden = if let Some(message) = self.sudden_stop(state, total_movement, gps_speed, now_ms)
        {
            activity = ActivityLabel::SuddenStop;
            confidence = self.config.sudden_stop_confidence;
            anomalies.push(AnomalyEvent {
                kind: AnomalyKind::SuddenStop,
                severity: Severity::High,
                message,
                context: AnomalyContext {
                    previous,
                    current: activity,
                    confidence,
                },
            });
            true
        } else {
            false
        };

        if total_movement > self.config.high_activity_movement_threshold
            || features.step_frequency > self.config.high_activity_step_freq_threshold
        {
            state.last_high_activity_time = Some(now_ms);
            state.last_high_activity_level = total_movement;
        }
        state.last_gps_speed = gps_speed;

        anomalies.extend(self.flags(previous, activity, confidence));

        Verdict {
            activity,
            confidence,
            overridden,
            anomalies,
        }
    }

    /// Reason string when the sudden-stop override fires
    fn sudden_stop(
        &self,
        state: &EngineState,
        total_movement: f64,
        gps_speed: Option<f64>,
        now_ms: u64,
    ) -> Option<String> {
        let recent_high = state
            .last_high_activity_time
            .is_some_and(|t| now_ms.saturating_sub(t) < self.config.sudden_stop_lookback_ms);
        if recent_high
            && state.last_high_activity_level > self.config.sudden_stop_prior_level
            && total_movement < self.config.sudden_stop_movement_drop
        {
            return Some(format!(
                "Sudden stop: movement dropped {:.2} -> {:.2}",
                state.last_high_activity_level, total_movement
            ));
        }

        match (state.last_gps_speed, gps_speed) {
            (Some(prior), Some(current))
                if prior > self.config.gps_prior_speed_mps
                    && current < self.config.gps_stopped_speed_mps =>
            {
                Some(format!(
                    "Sudden stop: GPS speed dropped {prior:.1} -> {current:.1} m/s"
                ))
            }
            _ => None,
        }
    }

    /// Non-exclusive flags from the previous and current label
    pub fn flags(
        &self,
        previous: Option<ActivityLabel>,
        current: ActivityLabel,
        confidence: f64,
    ) -> Vec<AnomalyEvent> {
        let context = AnomalyContext {
            previous,
            current,
            confidence,
        };
        let mut flags = Vec::new();

        if confidence < self.config.confidence_floor {
            flags.push(AnomalyEvent {
                kind: AnomalyKind::LowConfidence,
                severity: Severity::Low,
                message: format!("Low confidence prediction: {current}"),
                context,
            });
        }

        if let Some(prev) = previous {
            if prev != current
                && RAPID_CHANGE_LABELS.contains(&prev)
                && RAPID_CHANGE_LABELS.contains(&current)
            {
                flags.push(AnomalyEvent {
                    kind: AnomalyKind::RapidChange,
                    severity: Severity::High,
                    message: format!("Rapid transition: {prev} -> {current}"),
                    context,
                });
            }
        }

        flags
    }
}
