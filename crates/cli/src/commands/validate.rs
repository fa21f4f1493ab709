//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{GpsSourceKind, MonitorBlueprint, SinkType, SourceKind};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    source: String,
    source_rate_hz: f64,
    sampling_rate_hz: f64,
    gps: String,
    sink_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            let source = match blueprint.source.kind {
                SourceKind::Simulated => format!("simulated ({:?})", blueprint.source.motion),
                SourceKind::Replay => format!(
                    "replay ({})",
                    blueprint
                        .source
                        .path
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default()
                ),
            };

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    source,
                    source_rate_hz: blueprint.source.rate_hz,
                    sampling_rate_hz: blueprint.engine.sampling_rate_hz,
                    gps: format!("{:?}", blueprint.gps.kind),
                    sink_count: blueprint.sinks.len(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &MonitorBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.sinks.is_empty() {
        warnings.push("No sinks configured - events are not routed anywhere".to_string());
    } else if !blueprint
        .sinks
        .iter()
        .any(|s| s.sink_type == SinkType::Alert)
    {
        warnings.push("No alert sink configured - sudden stops are only logged".to_string());
    }

    if blueprint.source.rate_hz < blueprint.engine.sampling_rate_hz {
        warnings.push(format!(
            "source.rate_hz ({}) is below engine.sampling_rate_hz ({}) - ticks follow the source rate",
            blueprint.source.rate_hz, blueprint.engine.sampling_rate_hz
        ));
    }

    if blueprint.engine.gps.enabled && blueprint.gps.kind == GpsSourceKind::None {
        warnings.push("engine.gps.enabled but no GPS provider configured - GPS is ignored".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Source: {} @ {} Hz", summary.source, summary.source_rate_hz);
            println!("  Sampling rate: {} Hz", summary.sampling_rate_hz);
            println!("  GPS: {}", summary.gps);
            println!("  Sinks: {}", summary.sink_count);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config_loader::ConfigLoader;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_blueprint_warnings() {
        let warnings = collect_warnings(&ConfigLoader::default_blueprint());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("GPS"));
    }

    #[test]
    fn test_missing_alert_sink_warning() {
        let mut blueprint = ConfigLoader::default_blueprint();
        blueprint.sinks.retain(|s| s.sink_type != SinkType::Alert);
        blueprint.source.rate_hz = 10.0;
        let warnings = collect_warnings(&blueprint);
        assert!(warnings.iter().any(|w| w.contains("alert sink")));
        assert!(warnings.iter().any(|w| w.contains("source.rate_hz")));
    }

    #[test]
    fn test_validate_missing_file() {
        let result = validate_config(&ValidateArgs {
            config: PathBuf::from("/nonexistent/monitor.toml"),
            json: false,
        });
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("File not found"));
    }

    #[test]
    fn test_validate_file() {
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(
            file,
            r#"
[source]
kind = "simulated"
motion = "walking"

[[sinks]]
name = "events"
sink_type = "file"
"#
        )
        .unwrap();

        let result = validate_config(&ValidateArgs {
            config: file.path().to_path_buf(),
            json: true,
        });
        assert!(result.valid);
        let summary = result.summary.unwrap();
        assert_eq!(summary.source, "simulated (Walking)");
        assert_eq!(summary.sink_count, 1);
    }
}
