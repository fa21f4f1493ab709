//! `record` command implementation.

use anyhow::{Context, Result};
use contracts::SimulatedMotion;
use ingestion::{epoch_ms, Recording};
use tracing::info;

use crate::cli::RecordArgs;

/// Execute the `record` command
pub fn run_record(args: &RecordArgs) -> Result<()> {
    if !(args.rate_hz.is_finite() && args.rate_hz > 0.0) {
        anyhow::bail!("--rate-hz must be a positive number, got {}", args.rate_hz);
    }

    let motion = SimulatedMotion::from(args.motion);
    let start_ms = args.start_ms.unwrap_or_else(epoch_ms);
    let recording = Recording::synthesize(motion, args.rate_hz, args.duration * 1000, start_ms);

    recording
        .save(&args.output)
        .with_context(|| format!("Failed to write recording to {}", args.output.display()))?;

    info!(
        path = %args.output.display(),
        motion = ?motion,
        readings = recording.len(),
        duration_ms = recording.duration_ms(),
        "Recording written"
    );
    println!(
        "✓ Wrote {} readings ({:?}, {} s) to {}",
        recording.len(),
        motion,
        args.duration,
        args.output.display()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::MotionArg;
    use tempfile::tempdir;

    #[test]
    fn test_record_then_load() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("run.jsonl");
        run_record(&RecordArgs {
            output: output.clone(),
            motion: MotionArg::Running,
            duration: 2,
            rate_hz: 25.0,
            start_ms: Some(0),
        })
        .unwrap();

        let recording = Recording::load(&output).unwrap();
        assert_eq!(recording.len(), 150);
        assert_eq!(recording.readings()[0].timestamp_ms, 0);
    }

    #[test]
    fn test_record_rejects_zero_rate() {
        let dir = tempdir().unwrap();
        let result = run_record(&RecordArgs {
            output: dir.path().join("bad.jsonl"),
            motion: MotionArg::Idle,
            duration: 1,
            rate_hz: 0.0,
            start_ms: None,
        });
        assert!(result.is_err());
        assert!(!dir.path().join("bad.jsonl").exists());
    }
}
