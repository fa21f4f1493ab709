//! `info` command implementation.

use activity_engine::MODEL_VERSION;
use anyhow::{Context, Result};
use contracts::{
    ActivityLabel, ActivitySignature, EngineConfig, MonitorBlueprint, OrientationRequirement,
};
use serde::Serialize;

use super::load_blueprint;
use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo<'a> {
    model_version: &'static str,
    blueprint: &'a MonitorBlueprint,
    emergency_activities: Vec<ActivityLabel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    signatures: Option<Vec<ActivitySignature>>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    let blueprint = load_blueprint(args.config.as_deref())?;

    if args.json {
        let info = ConfigInfo {
            model_version: MODEL_VERSION,
            blueprint: &blueprint,
            emergency_activities: emergency_activities(),
            signatures: args.signatures.then(|| ActivitySignature::DEFAULTS.to_vec()),
        };
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, args);
    }

    Ok(())
}

fn emergency_activities() -> Vec<ActivityLabel> {
    ActivityLabel::ALL
        .iter()
        .copied()
        .filter(ActivityLabel::is_emergency)
        .collect()
}

fn print_config_info(blueprint: &MonitorBlueprint, args: &InfoArgs) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               HAR Monitor Configuration                      ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("🧠 Engine");
    println!("   ├─ Model version: {}", MODEL_VERSION);
    println!("   ├─ Config version: {:?}", blueprint.version);
    println!("   ├─ Sampling rate: {} Hz", blueprint.engine.sampling_rate_hz);
    println!(
        "   └─ Window: {} samples (classify after {})",
        blueprint.engine.window_size, blueprint.engine.min_samples_to_classify
    );
    if args.engine {
        print_engine_tunables(&blueprint.engine);
    }

    let source = &blueprint.source;
    println!("\n📡 Source");
    println!("   ├─ Kind: {:?}", source.kind);
    println!("   ├─ Motion: {:?}", source.motion);
    match source.path {
        Some(ref path) => println!("   ├─ Recording: {}", path.display()),
        None => println!("   ├─ Recording: (none)"),
    }
    println!("   └─ Rate: {} Hz per channel", source.rate_hz);

    println!("\n🛰  GPS");
    println!("   ├─ Provider: {:?}", blueprint.gps.kind);
    println!("   ├─ Speed: {} m/s", blueprint.gps.speed_mps);
    println!("   └─ Max fix age: {} ms", blueprint.engine.gps.max_age_ms);

    if !blueprint.sinks.is_empty() {
        println!("\n📤 Sinks ({})", blueprint.sinks.len());
        for (i, sink) in blueprint.sinks.iter().enumerate() {
            let is_last = i == blueprint.sinks.len() - 1;
            let prefix = if is_last { "└─" } else { "├─" };
            println!(
                "   {} {} ({:?}, queue {})",
                prefix, sink.name, sink.sink_type, sink.queue_capacity
            );
        }
    }

    if args.signatures {
        print_signatures();
    }

    println!();
}

fn print_engine_tunables(engine: &EngineConfig) {
    let anomaly = &engine.anomaly;
    println!(
        "      Step: window {} ms, min interval {} ms, threshold mean + {}σ",
        engine.step.window_ms, engine.step.min_interval_ms, engine.step.threshold_std_factor
    );
    println!(
        "      Orientation: window {} ms, upright below {}°",
        engine.orientation.window_ms, engine.orientation.upright_limit_deg
    );
    println!(
        "      Frequency sweep: {}-{} Hz step {} over {} samples",
        engine.frequency.sweep_start_hz,
        engine.frequency.sweep_end_hz,
        engine.frequency.sweep_step_hz,
        engine.frequency.buffer_size
    );
    println!(
        "      Sudden stop: movement < {} after > {} within {} ms (confidence {})",
        anomaly.sudden_stop_movement_drop,
        anomaly.sudden_stop_prior_level,
        anomaly.sudden_stop_lookback_ms,
        anomaly.sudden_stop_confidence
    );
    println!(
        "      Activity log: compact {} → {}",
        engine.history.activity_log_cap, engine.history.activity_log_compact_to
    );
}

fn print_signatures() {
    println!("\n📋 Activity Signatures");
    println!(
        "   {:<12} {:>16} {:>16} {:>10}",
        "ACTIVITY", "STEP FREQ", "VARIANCE", "UPRIGHT"
    );
    for signature in &ActivitySignature::DEFAULTS {
        let upright = match signature.orientation {
            OrientationRequirement::Upright => "required",
            OrientationRequirement::Any => "any",
        };
        println!(
            "   {:<12} {:>16} {:>16} {:>10}",
            signature.activity.as_str(),
            format!("{:.1}-{:.1}", signature.step_freq_range.0, signature.step_freq_range.1),
            format!("{:.2}-{:.2}", signature.variance_range.0, signature.variance_range.1),
            upright
        );
    }
}
