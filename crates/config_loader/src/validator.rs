//! 配置校验模块
//!
//! 校验规则：
//! - sampling_rate_hz / source.rate_hz > 0 且有限
//! - 各窗口、缓冲区非零
//! - recent_window <= window_size，min_samples_to_classify <= window_size
//! - activity_log_compact_to < activity_log_cap，sample_log 同理
//! - 频率扫描区间有序、步长 > 0
//! - replay 来源必须给出 path
//! - 固定 GPS 速度有限且 >= 0
//! - sink 名称非空且唯一，queue_capacity > 0

use std::collections::HashSet;

use contracts::{
    ContractError, EngineConfig, GpsSourceConfig, GpsSourceKind, MonitorBlueprint, SourceConfig,
    SourceKind,
};

/// 校验 MonitorBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &MonitorBlueprint) -> Result<(), ContractError> {
    validate_engine(&blueprint.engine)?;
    validate_source(&blueprint.source)?;
    validate_gps(&blueprint.gps)?;
    validate_sinks(blueprint)?;
    Ok(())
}

fn positive(field: &str, value: f64) -> Result<(), ContractError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ContractError::config_validation(
            field,
            format!("must be > 0, got {value}"),
        ))
    }
}

fn non_zero(field: &str, value: u64) -> Result<(), ContractError> {
    if value == 0 {
        return Err(ContractError::config_validation(field, "must be non-zero"));
    }
    Ok(())
}

/// 校验引擎参数
fn validate_engine(engine: &EngineConfig) -> Result<(), ContractError> {
    positive("engine.sampling_rate_hz", engine.sampling_rate_hz)?;

    non_zero("engine.window_size", engine.window_size as u64)?;
    non_zero("engine.recent_window", engine.recent_window as u64)?;
    non_zero("engine.step.window_ms", engine.step.window_ms)?;
    non_zero("engine.orientation.window_ms", engine.orientation.window_ms)?;
    non_zero("engine.frequency.buffer_size", engine.frequency.buffer_size as u64)?;
    non_zero("engine.history.step_event_window_ms", engine.history.step_event_window_ms)?;

    if engine.recent_window > engine.window_size {
        return Err(ContractError::config_validation(
            "engine.recent_window",
            format!(
                "recent_window ({}) must be <= window_size ({})",
                engine.recent_window, engine.window_size
            ),
        ));
    }
    if engine.min_samples_to_classify > engine.window_size {
        return Err(ContractError::config_validation(
            "engine.min_samples_to_classify",
            format!(
                "min_samples_to_classify ({}) must be <= window_size ({})",
                engine.min_samples_to_classify, engine.window_size
            ),
        ));
    }

    let history = &engine.history;
    if history.activity_log_compact_to >= history.activity_log_cap {
        return Err(ContractError::config_validation(
            "engine.history.activity_log_compact_to",
            format!(
                "activity_log_compact_to ({}) must be < activity_log_cap ({})",
                history.activity_log_compact_to, history.activity_log_cap
            ),
        ));
    }
    if history.sample_log_compact_to >= history.sample_log_cap {
        return Err(ContractError::config_validation(
            "engine.history.sample_log_compact_to",
            format!(
                "sample_log_compact_to ({}) must be < sample_log_cap ({})",
                history.sample_log_compact_to, history.sample_log_cap
            ),
        ));
    }

    let freq = &engine.frequency;
    positive("engine.frequency.sweep_step_hz", freq.sweep_step_hz)?;
    positive("engine.frequency.assumed_sample_rate_hz", freq.assumed_sample_rate_hz)?;
    if !(freq.sweep_start_hz >= 0.0 && freq.sweep_start_hz <= freq.sweep_end_hz) {
        return Err(ContractError::config_validation(
            "engine.frequency.sweep_start_hz / engine.frequency.sweep_end_hz",
            format!(
                "sweep range must satisfy 0 <= start ({}) <= end ({})",
                freq.sweep_start_hz, freq.sweep_end_hz
            ),
        ));
    }

    let confidence = engine.anomaly.sudden_stop_confidence;
    if !(0.0..=1.0).contains(&confidence) {
        return Err(ContractError::config_validation(
            "engine.anomaly.sudden_stop_confidence",
            format!("must be within [0, 1], got {confidence}"),
        ));
    }

    Ok(())
}

/// 校验传感器来源
fn validate_source(source: &SourceConfig) -> Result<(), ContractError> {
    positive("source.rate_hz", source.rate_hz)?;
    if source.kind == SourceKind::Replay && source.path.is_none() {
        return Err(ContractError::config_validation(
            "source.path",
            "replay source requires a path",
        ));
    }
    Ok(())
}

/// 校验 GPS 来源
fn validate_gps(gps: &GpsSourceConfig) -> Result<(), ContractError> {
    if gps.kind == GpsSourceKind::Fixed && !(gps.speed_mps.is_finite() && gps.speed_mps >= 0.0) {
        return Err(ContractError::config_validation(
            "gps.speed_mps",
            format!("must be finite and >= 0, got {}", gps.speed_mps),
        ));
    }
    Ok(())
}

/// 校验 sink 配置
fn validate_sinks(blueprint: &MonitorBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, sink) in blueprint.sinks.iter().enumerate() {
        if sink.name.is_empty() {
            return Err(ContractError::config_validation(
                format!("sinks[{}].name", idx),
                "sink name cannot be empty",
            ));
        }
        if !seen.insert(sink.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("sinks[name={}]", sink.name),
                "duplicate sink name",
            ));
        }
        if sink.queue_capacity == 0 {
            return Err(ContractError::config_validation(
                format!("sinks[{}].queue_capacity", sink.name),
                "queue_capacity must be > 0",
            ));
        }
    }
    Ok(())
}
