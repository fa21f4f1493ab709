//! Peak-based step detection over the time-boxed magnitude window.

use contracts::StepConfig;

use crate::history::StepEvent;
use crate::stats::{mean, variance};
use crate::window::AgedWindow;

/// Append `magnitude` and count steps in the window
///
/// Returns `None` while the window holds fewer than `min_points` entries.
/// A peak is strictly greater than both neighbours and the dynamic threshold
/// `mean + factor * stddev`, and lies at least `min_interval_ms` after the
/// previously accepted peak.
pub fn detect_steps(
    window: &mut AgedWindow<f64>,
    magnitude: f64,
    timestamp_ms: u64,
    config: &StepConfig,
) -> Option<StepEvent> {
    window.push(timestamp_ms, magnitude);
    if window.len() < config.min_points {
        return None;
    }

    let points: Vec<_> = window.iter().copied().collect();
    let values: Vec<f64> = points.iter().map(|p| p.value).collect();
    let threshold = mean(&values) + variance(&values).sqrt() * config.threshold_std_factor;

    let mut peak_count = 0;
    let mut last_peak: Option<u64> = None;
    for triple in points.windows(3) {
        let (prev, cur, next) = (triple[0], triple[1], triple[2]);
        let spaced = last_peak
            .map_or(true, |t| cur.timestamp_ms.saturating_sub(t) >= config.min_interval_ms);
        if cur.value > prev.value && cur.value > next.value && cur.value > threshold && spaced {
            peak_count += 1;
            last_peak = Some(cur.timestamp_ms);
        }
    }

    let window_minutes = window.max_age_ms() as f64 / 60_000.0;
    let frequency = if window_minutes > 0.0 {
        peak_count as f64 / window_minutes
    } else {
        0.0
    };

    Some(StepEvent {
        peak_count,
        frequency,
        threshold,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn feed(window: &mut AgedWindow<f64>, hz: f64, rate_hz: f64, seconds: f64) -> Option<StepEvent> {
        let config = StepConfig::default();
        let dt_ms = (1000.0 / rate_hz) as u64;
        let n = (seconds * rate_hz) as u64;
        let mut last = None;
        for i in 0..n {
            let t = (i * dt_ms) as f64 / 1000.0;
            let magnitude = 9.81 + 3.0 * (2.0 * PI * hz * t).sin();
            last = detect_steps(window, magnitude, i * dt_ms, &config);
        }
        last
    }

    #[test]
    fn test_too_few_points() {
        let mut window = AgedWindow::new(3000);
        let config = StepConfig::default();
        for i in 0..9 {
            assert!(detect_steps(&mut window, 9.81, i * 20, &config).is_none());
        }
        assert!(detect_steps(&mut window, 9.81, 180, &config).is_some());
    }

    #[test]
    fn test_two_hz_oscillation() {
        let mut window = AgedWindow::new(3000);
        let event = feed(&mut window, 2.0, 50.0, 4.0).unwrap();
        assert!(
            (event.frequency - 120.0).abs() <= 20.0,
            "expected ~120 steps/min, got {}",
            event.frequency
        );
    }

    #[test]
    fn test_flat_signal_has_no_steps() {
        let mut window = AgedWindow::new(3000);
        let config = StepConfig::default();
        let mut event = None;
        for i in 0..50 {
            event = detect_steps(&mut window, 9.81, i * 20, &config);
        }
        assert_eq!(event.map(|e| e.peak_count), Some(0));
    }

    #[test]
    fn test_min_interval_rejects_close_peaks() {
        // peaks every 100ms: only every other one can be accepted
        let mut window = AgedWindow::new(3000);
        let config = StepConfig::default();
        let mut event = None;
        for i in 0..60u64 {
            let magnitude = if i % 5 == 0 { 14.0 } else { 9.0 };
            event = detect_steps(&mut window, magnitude, i * 20, &config);
        }
        let event = event.unwrap();
        // peaks at 100, 200, ..., 1100 ms (the first at 0 has no left neighbour)
        assert_eq!(event.peak_count, 6);
    }
}
