//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files
//! - Validate engine tunables, sources and sinks
//! - Generate `MonitorBlueprint`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let blueprint = ConfigLoader::load_from_path(Path::new("monitor.toml")).unwrap();
//! println!("Sampling at {} Hz", blueprint.engine.sampling_rate_hz);
//! ```

mod parser;
mod validator;

pub use contracts::MonitorBlueprint;
pub use parser::ConfigFormat;
pub use validator::validate;

use contracts::{ContractError, SinkConfig, SinkType};
use std::collections::HashMap;
use std::path::Path;

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<MonitorBlueprint, ContractError> {
        let format = Self::detect_format(path)?;
        let content = std::fs::read_to_string(path)?;
        Self::load_from_str(&content, format)
    }

    /// Default configuration: simulated idle source, one log sink and one alert sink
    pub fn default_blueprint() -> MonitorBlueprint {
        MonitorBlueprint {
            version: Default::default(),
            engine: Default::default(),
            source: Default::default(),
            gps: Default::default(),
            sinks: vec![
                SinkConfig {
                    name: "log".into(),
                    sink_type: SinkType::Log,
                    queue_capacity: 100,
                    params: HashMap::new(),
                },
                SinkConfig {
                    name: "alerts".into(),
                    sink_type: SinkType::Alert,
                    queue_capacity: 16,
                    params: HashMap::new(),
                },
            ],
        }
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<MonitorBlueprint, ContractError> {
        let blueprint = parser::parse(content, format)?;
        validator::validate(&blueprint)?;
        Ok(blueprint)
    }

    /// Serialize MonitorBlueprint to TOML string
    pub fn to_toml(blueprint: &MonitorBlueprint) -> Result<String, ContractError> {
        toml::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize MonitorBlueprint to JSON string
    pub fn to_json(blueprint: &MonitorBlueprint) -> Result<String, ContractError> {
        serde_json::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => ConfigFormat::from_extension(ext).ok_or_else(|| {
                ContractError::config_parse(format!("unsupported config format: .{ext}"))
            }),
            None => Err(ContractError::config_parse(format!(
                "{} has no .toml/.json extension",
                path.display()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{GpsSourceKind, SimulatedMotion};
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL_TOML: &str = r#"
[engine]
sampling_rate_hz = 40.0

[engine.anomaly]
sudden_stop_lookback_ms = 2500

[source]
kind = "simulated"
motion = "sudden_stop"
rate_hz = 40.0

[gps]
kind = "fixed"
speed_mps = 2.5

[[sinks]]
name = "log_sink"
sink_type = "log"

[[sinks]]
name = "events"
sink_type = "file"
[sinks.params]
path = "./output/events.jsonl"
"#;

    #[test]
    fn test_load_from_str_toml() {
        let result = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let bp = result.unwrap();
        assert_eq!(bp.engine.sampling_rate_hz, 40.0);
        assert_eq!(bp.engine.anomaly.sudden_stop_lookback_ms, 2500);
        assert_eq!(bp.source.motion, SimulatedMotion::SuddenStop);
        assert_eq!(bp.gps.kind, GpsSourceKind::Fixed);
        assert_eq!(bp.sinks[1].params["path"], "./output/events.jsonl");
    }

    #[test]
    fn test_json_export_reloads() {
        let bp = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&bp).unwrap();
        let reloaded = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(reloaded.engine, bp.engine);
        assert_eq!(reloaded.gps.speed_mps, 2.5);
        assert_eq!(reloaded.sinks[1].params["path"], "./output/events.jsonl");
    }

    #[test]
    fn test_validation_runs_after_parse() {
        let content = r#"
[engine.history]
activity_log_cap = 100
activity_log_compact_to = 200
"#;
        let result = ConfigLoader::load_from_str(content, ConfigFormat::Toml);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("activity_log_compact_to"));
    }

    #[test]
    fn test_default_blueprint_is_valid() {
        let bp = ConfigLoader::default_blueprint();
        let toml = ConfigLoader::to_toml(&bp).unwrap();
        assert!(ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).is_ok());
    }

    #[test]
    fn test_load_from_path_detects_format() {
        let mut file = NamedTempFile::with_suffix(".json").unwrap();
        write!(file, r#"{{ "engine": {{ "window_size": 64 }} }}"#).unwrap();
        let bp = ConfigLoader::load_from_path(file.path()).unwrap();
        assert_eq!(bp.engine.window_size, 64);
    }

    #[test]
    fn test_load_from_path_unknown_extension() {
        let file = NamedTempFile::with_suffix(".yaml").unwrap();
        let err = ConfigLoader::load_from_path(file.path()).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"));
    }
}
