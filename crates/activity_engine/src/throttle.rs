//! Throttle gate between sensor callbacks and the pipeline.

/// Whether a pipeline pass may run at `now_ms`
///
/// The first pass is always allowed. Clock steps backwards count as zero elapsed.
#[inline]
pub fn should_process(now_ms: u64, last_processed_ms: Option<u64>, interval_ms: f64) -> bool {
    match last_processed_ms {
        None => true,
        Some(last) => now_ms.saturating_sub(last) as f64 >= interval_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_pass_allowed() {
        assert!(should_process(0, None, 20.0));
    }

    #[test]
    fn test_interval_boundary() {
        assert!(!should_process(119, Some(100), 20.0));
        assert!(should_process(120, Some(100), 20.0));
    }

    #[test]
    fn test_backwards_clock() {
        assert!(!should_process(50, Some(100), 20.0));
    }

    #[test]
    fn test_fractional_interval() {
        // 60 Hz
        let interval = 1000.0 / 60.0;
        assert!(!should_process(116, Some(100), interval));
        assert!(should_process(117, Some(100), interval));
    }
}
