//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::{GpsSourceKind, MonitorBlueprint, SourceKind};
use std::time::Duration;
use tracing::{info, warn};

use super::load_blueprint;
use crate::cli::RunArgs;
use crate::monitor::{Monitor, MonitorConfig};

/// Execute the `run` command
pub async fn run_monitor(args: &RunArgs) -> Result<()> {
    let mut blueprint = load_blueprint(args.config.as_deref())?;

    apply_overrides(&mut blueprint, args);
    config_loader::validate(&blueprint).context("Configuration invalid after CLI overrides")?;

    info!(
        source = ?blueprint.source.kind,
        motion = ?blueprint.source.motion,
        gps = ?blueprint.gps.kind,
        sampling_rate_hz = blueprint.engine.sampling_rate_hz,
        sinks = blueprint.sinks.len(),
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    let monitor = Monitor::new(MonitorConfig {
        blueprint,
        duration: (args.duration > 0).then(|| Duration::from_secs(args.duration)),
        status_interval: Duration::from_secs(args.status_interval.max(1)),
    });

    info!("Starting monitor...");
    let stats = monitor
        .run(shutdown_signal())
        .await
        .context("Monitoring run failed")?;

    info!(
        classifications = stats.ingestion.classifications,
        sudden_stops = stats.summary.sudden_stops,
        duration_secs = stats.duration.as_secs_f64(),
        "Monitoring completed"
    );
    stats.print_summary();

    info!("HAR Monitor finished");
    Ok(())
}

/// Apply CLI overrides on top of the loaded blueprint
fn apply_overrides(blueprint: &mut MonitorBlueprint, args: &RunArgs) {
    if let Some(motion) = args.motion {
        info!(motion = ?motion, "Overriding source with simulated motion");
        blueprint.source.kind = SourceKind::Simulated;
        blueprint.source.motion = motion.into();
    }
    if let Some(ref path) = args.replay {
        info!(path = %path.display(), "Overriding source with replay file");
        blueprint.source.kind = SourceKind::Replay;
        blueprint.source.path = Some(path.clone());
    }
    if let Some(speed) = args.gps_speed {
        info!(speed_mps = speed, "Overriding GPS with fixed speed");
        blueprint.gps.kind = GpsSourceKind::Fixed;
        blueprint.gps.speed_mps = speed;
        blueprint.engine.gps.enabled = true;
    }
}

/// Resolves on Ctrl+C or SIGTERM
///
/// A handler that fails to install is logged and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &MonitorBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("Source:");
    println!("  Kind: {:?}", blueprint.source.kind);
    match blueprint.source.kind {
        SourceKind::Simulated => println!("  Motion: {:?}", blueprint.source.motion),
        SourceKind::Replay => {
            if let Some(ref path) = blueprint.source.path {
                println!("  Recording: {}", path.display());
            }
        }
    }
    println!("  Rate: {} Hz", blueprint.source.rate_hz);

    println!("\nEngine:");
    println!("  Sampling rate: {} Hz", blueprint.engine.sampling_rate_hz);
    println!("  Window size: {}", blueprint.engine.window_size);
    println!("  GPS: {:?}", blueprint.gps.kind);

    if !blueprint.sinks.is_empty() {
        println!("\nSinks ({}):", blueprint.sinks.len());
        for sink in &blueprint.sinks {
            println!("  - {} ({:?})", sink.name, sink.sink_type);
        }
    }

    println!();
}
