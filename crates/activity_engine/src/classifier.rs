//! ActivityClassifier - heuristic multi-signature scoring.

use std::collections::BTreeMap;

use contracts::{ActivityLabel, ActivitySignature, FeatureVector, OrientationRequirement};

const STEP_FREQ_POINTS: u32 = 30;
const VARIANCE_POINTS: u32 = 25;
const UPRIGHT_POINTS: u32 = 20;
const ANY_ORIENTATION_POINTS: u32 = 15;
const RHYTHM_POINTS: u32 = 15;
const GPS_AGREEMENT_POINTS: u32 = 10;

const WALKING_FREQ_BAND: (f64, f64) = (1.5, 3.0);
const RUNNING_FREQ_BAND: (f64, f64) = (2.5, 5.0);

/// Score of one signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureScore {
    pub activity: ActivityLabel,
    pub score: u32,
}

/// Best signature of one pass
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub activity: ActivityLabel,
    /// `min(score / 100, 1)`
    pub confidence: f64,
    /// Every signature's score, in iteration order
    pub scores: Vec<SignatureScore>,
}

#[derive(Debug, Clone)]
pub struct ActivityClassifier {
    signatures: Vec<ActivitySignature>,
}

impl Default for ActivityClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivityClassifier {
    pub fn new() -> Self {
        Self {
            signatures: ActivitySignature::DEFAULTS.to_vec(),
        }
    }

    pub fn signatures(&self) -> &[ActivitySignature] {
        &self.signatures
    }

    pub fn score(&self, signature: &ActivitySignature, features: &FeatureVector) -> u32 {
        let mut score = 0;

        if signature.step_freq_matches(features.step_frequency) {
            score += STEP_FREQ_POINTS;
        }
        if signature.variance_matches(features.accel.variance) {
            score += VARIANCE_POINTS;
        }

        match signature.orientation {
            OrientationRequirement::Upright if features.orientation.is_upright => {
                score += UPRIGHT_POINTS
            }
            OrientationRequirement::Any => score += ANY_ORIENTATION_POINTS,
            OrientationRequirement::Upright => {}
        }

        let dominant = features.frequency.dominant_freq;
        let in_band = |(lo, hi): (f64, f64)| dominant >= lo && dominant <= hi;
        match signature.activity {
            ActivityLabel::Walking if in_band(WALKING_FREQ_BAND) => score += RHYTHM_POINTS,
            ActivityLabel::Running if in_band(RUNNING_FREQ_BAND) => score += RHYTHM_POINTS,
            _ => {}
        }

        // no fix: neutral
        if let (Some(moving), Some(expected)) = (
            features.gps_moving(),
            signature.activity.expected_mobility(),
        ) {
            if moving == expected {
                score += GPS_AGREEMENT_POINTS;
            }
        }

        score
    }

    /// Highest score wins; equal scores keep the earlier signature
    pub fn classify(&self, features: &FeatureVector) -> Classification {
        let scores: Vec<SignatureScore> = self
            .signatures
            .iter()
            .map(|sig| SignatureScore {
                activity: sig.activity,
                score: self.score(sig, features),
            })
            .collect();

        let best = scores.iter().fold(None, |best: Option<SignatureScore>, s| match best {
            Some(b) if b.score >= s.score => Some(b),
            _ => Some(*s),
        });
        let (activity, score) = best
            .map(|b| (b.activity, b.score))
            .unwrap_or((ActivityLabel::Idle, 0));

        Classification {
            activity,
            confidence: (score as f64 / 100.0).min(1.0),
            scores,
        }
    }
}

/// Chosen label gets `confidence`, the rest share the remainder evenly
pub fn probabilities(activity: ActivityLabel, confidence: f64) -> BTreeMap<ActivityLabel, f64> {
    let others = (ActivityLabel::ALL.len() - 1) as f64;
    ActivityLabel::ALL
        .iter()
        .map(|&label| {
            let p = if label == activity {
                confidence
            } else {
                (1.0 - confidence) / others
            };
            (label, p)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{FrequencyAnalysis, GpsContext, MagnitudeStats, Orientation};

    fn features(step_frequency: f64, variance: f64, upright: bool, dominant: f64) -> FeatureVector {
        FeatureVector {
            accel: MagnitudeStats {
                variance,
                ..Default::default()
            },
            step_frequency,
            orientation: Orientation {
                is_upright: upright,
                ..Default::default()
            },
            frequency: FrequencyAnalysis {
                dominant_freq: dominant,
                power: 1.0,
            },
            ..Default::default()
        }
    }

    fn with_gps(mut f: FeatureVector, is_moving: bool) -> FeatureVector {
        f.gps = Some(GpsContext {
            speed_mps: if is_moving { 1.5 } else { 0.0 },
            is_moving,
            movement_score: 0.0,
        });
        f
    }

    #[test]
    fn test_still_is_idle() {
        let classifier = ActivityClassifier::new();
        let result = classifier.classify(&features(0.0, 0.0, true, 0.0));
        // IDLE: 30 + 25 + 15
        assert_eq!(result.activity, ActivityLabel::Idle);
        assert!((result.confidence - 0.70).abs() < 1e-12);
    }

    #[test]
    fn test_upright_prefers_standing() {
        let classifier = ActivityClassifier::new();
        // IDLE 70, STANDING 75
        let result = classifier.classify(&features(0.0, 0.07, true, 0.0));
        assert_eq!(result.activity, ActivityLabel::Standing);

        // IDLE 70, STANDING 55
        let result = classifier.classify(&features(0.0, 0.07, false, 0.0));
        assert_eq!(result.activity, ActivityLabel::Idle);
    }

    #[test]
    fn test_sudden_stop_signature_can_win() {
        let classifier = ActivityClassifier::new();
        let result = classifier.classify(&features(0.2, 0.9, false, 0.0));
        assert_eq!(result.scores[0].score, 45);
        assert_eq!(result.scores[4].score, 70);
        assert_eq!(result.activity, ActivityLabel::SuddenStop);
    }

    #[test]
    fn test_equal_scores_resolve_in_order() {
        let classifier = ActivityClassifier::new();
        // IDLE 45, SUDDEN_STOP 45
        let result = classifier.classify(&features(0.2, 0.5, false, 0.0));
        assert_eq!(result.scores[0].score, result.scores[4].score);
        assert_eq!(result.activity, ActivityLabel::Idle);
    }

    #[test]
    fn test_running_band_bonus() {
        let classifier = ActivityClassifier::new();
        let f = features(3.0, 2.0, true, 3.0);
        let result = classifier.classify(&f);
        // RUNNING: 30 + 25 + 20 + 15
        assert_eq!(result.activity, ActivityLabel::Running);
        assert!((result.confidence - 0.90).abs() < 1e-12);
    }

    #[test]
    fn test_gps_agreement() {
        let classifier = ActivityClassifier::new();
        let walking = ActivitySignature::DEFAULTS[2];
        let idle = ActivitySignature::DEFAULTS[0];
        let base = features(2.0, 1.0, true, 2.0);

        assert_eq!(classifier.score(&walking, &base), 90);
        assert_eq!(classifier.score(&walking, &with_gps(base.clone(), true)), 100);
        assert_eq!(classifier.score(&walking, &with_gps(base.clone(), false)), 90);
        assert_eq!(classifier.score(&idle, &with_gps(base.clone(), false)), 25);
        assert_eq!(classifier.score(&idle, &base), 15);
    }

    #[test]
    fn test_confidence_capped() {
        let classifier = ActivityClassifier::new();
        let f = with_gps(features(2.0, 1.0, true, 2.0), true);
        assert!(classifier.classify(&f).confidence <= 1.0);
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let probs = probabilities(ActivityLabel::Walking, 0.6);
        assert_eq!(probs.len(), 5);
        assert!((probs[&ActivityLabel::Walking] - 0.6).abs() < 1e-12);
        assert!((probs[&ActivityLabel::Idle] - 0.1).abs() < 1e-12);
        assert!((probs.values().sum::<f64>() - 1.0).abs() < 1e-12);
    }
}
