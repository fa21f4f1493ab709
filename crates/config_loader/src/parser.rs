//! 配置解析模块
//!
//! 支持 TOML (主要) 和 JSON (可选) 格式。

use contracts::{ContractError, MonitorBlueprint};

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML 格式 (推荐)
    Toml,
    /// JSON 格式
    Json,
}

impl ConfigFormat {
    /// 从文件扩展名推断格式
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// 解析 TOML 格式配置
pub fn parse_toml(content: &str) -> Result<MonitorBlueprint, ContractError> {
    toml::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 解析 JSON 格式配置
pub fn parse_json(content: &str) -> Result<MonitorBlueprint, ContractError> {
    serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 根据格式解析配置
pub fn parse(content: &str, format: ConfigFormat) -> Result<MonitorBlueprint, ContractError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{SimulatedMotion, SinkType, SourceKind};

    #[test]
    fn test_parse_toml_minimal() {
        let content = r#"
[engine]
sampling_rate_hz = 25.0

[source]
kind = "simulated"
motion = "walking"

[[sinks]]
name = "log_sink"
sink_type = "log"
"#;
        let result = parse_toml(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let bp = result.unwrap();
        assert_eq!(bp.engine.sampling_rate_hz, 25.0);
        assert_eq!(bp.engine.window_size, 128);
        assert_eq!(bp.source.kind, SourceKind::Simulated);
        assert_eq!(bp.source.motion, SimulatedMotion::Walking);
        assert_eq!(bp.sinks.len(), 1);
        assert_eq!(bp.sinks[0].queue_capacity, 100);
    }

    #[test]
    fn test_parse_empty_toml_uses_defaults() {
        let bp = parse_toml("").unwrap();
        assert_eq!(bp.engine.sampling_rate_hz, 50.0);
        assert_eq!(bp.source.rate_hz, 50.0);
        assert!(bp.sinks.is_empty());
    }

    #[test]
    fn test_parse_json_minimal() {
        let content = r#"{
            "engine": { "anomaly": { "sudden_stop_lookback_ms": 1500 } },
            "source": { "kind": "replay", "path": "walk.jsonl" },
            "gps": { "kind": "fixed", "speed_mps": 1.2 },
            "sinks": [{ "name": "alerts", "sink_type": "alert", "params": { "cooldown_ms": "1000" } }]
        }"#;
        let result = parse_json(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let bp = result.unwrap();
        assert_eq!(bp.engine.anomaly.sudden_stop_lookback_ms, 1500);
        assert_eq!(bp.engine.anomaly.sudden_stop_prior_level, 3.0);
        assert_eq!(bp.sinks[0].sink_type, SinkType::Alert);
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let content = "invalid toml [[[";
        let result = parse_toml(content);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
    }

    #[test]
    fn test_unknown_sink_type_rejected() {
        let content = r#"
[[sinks]]
name = "net"
sink_type = "network"
"#;
        assert!(parse_toml(content).is_err());
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ConfigFormat::from_extension("toml"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("TOML"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("json"),
            Some(ConfigFormat::Json)
        );
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
