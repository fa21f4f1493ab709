//! Dominant frequency by brute-force correlation sweep.
//!
//! Not an FFT: every candidate frequency is correlated against the buffer
//! directly, with a fixed assumed sample rate.

use std::f64::consts::PI;

use contracts::{FrequencyAnalysis, FrequencyConfig};

/// Candidate frequencies of the sweep, inclusive of both ends
pub fn sweep_frequencies(config: &FrequencyConfig) -> impl Iterator<Item = f64> + '_ {
    let span = config.sweep_end_hz - config.sweep_start_hz;
    let steps = if config.sweep_step_hz > 0.0 && span >= 0.0 {
        // epsilon guards 4.5 / 0.1 landing just under 45
        (span / config.sweep_step_hz + 1e-9).floor() as usize
    } else {
        0
    };
    (0..=steps).map(move |k| config.sweep_start_hz + config.sweep_step_hz * k as f64)
}

/// Correlation power of `data` at `freq`
#[inline]
pub fn correlation_power(data: &[f64], freq: f64, sample_rate_hz: f64) -> f64 {
    let (real, imag) = data
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(re, im), (i, v)| {
            let angle = -2.0 * PI * freq * i as f64 / sample_rate_hz;
            (re + v * angle.cos(), im + v * angle.sin())
        });
    real * real + imag * imag
}

/// Frequency with the highest correlation power over the newest samples
///
/// Fewer than `min_samples` values yield `{0, 0}`. A later candidate must be
/// strictly stronger to replace an earlier one.
pub fn dominant_frequency(data: &[f64], config: &FrequencyConfig) -> FrequencyAnalysis {
    if data.len() < config.min_samples {
        return FrequencyAnalysis::default();
    }
    let n = data.len().min(config.buffer_size);
    let data = &data[data.len() - n..];

    sweep_frequencies(config).fold(FrequencyAnalysis::default(), |best, freq| {
        let power = correlation_power(data, freq, config.assumed_sample_rate_hz);
        if power > best.power {
            FrequencyAnalysis {
                dominant_freq: freq,
                power,
            }
        } else {
            best
        }
    })
}
