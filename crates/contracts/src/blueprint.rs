//! MonitorBlueprint - Config Loader 输出
//!
//! 描述完整的监控配置：引擎参数、传感器来源、GPS 来源、事件输出路由。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::EngineConfig;

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// 完整的监控配置蓝图
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorBlueprint {
    /// 配置版本
    #[serde(default)]
    pub version: ConfigVersion,

    /// 引擎参数
    #[serde(default)]
    pub engine: EngineConfig,

    /// 运动传感器来源
    #[serde(default)]
    pub source: SourceConfig,

    /// GPS 来源
    #[serde(default)]
    pub gps: GpsSourceConfig,

    /// 输出路由配置
    #[serde(default)]
    pub sinks: Vec<SinkConfig>,
}

/// Motion sensor source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub kind: SourceKind,

    /// Emission rate per channel (Hz), must be > 0
    #[serde(default = "default_source_rate")]
    pub rate_hz: f64,

    /// Motion script for the simulated source
    #[serde(default)]
    pub motion: SimulatedMotion,

    /// JSONL recording for the replay source
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::Simulated,
            rate_hz: default_source_rate(),
            motion: SimulatedMotion::default(),
            path: None,
        }
    }
}

fn default_source_rate() -> f64 {
    50.0
}

/// 传感器来源类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// 合成信号
    Simulated,
    /// 回放 JSONL 录制文件
    Replay,
}

/// Synthetic motion played by the simulated source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulatedMotion {
    #[default]
    Idle,
    Walking,
    Running,
    /// Running burst followed by abrupt stillness
    SuddenStop,
}

/// GPS 来源配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GpsSourceConfig {
    #[serde(default)]
    pub kind: GpsSourceKind,

    /// Speed reported by a fixed provider (m/s)
    #[serde(default)]
    pub speed_mps: f64,

    /// Reported horizontal accuracy (m)
    #[serde(default)]
    pub accuracy_m: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GpsSourceKind {
    /// 无 GPS
    #[default]
    None,
    /// 固定速度
    Fixed,
}

/// Sink 输出配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Sink 名称
    pub name: String,

    /// Sink 类型
    pub sink_type: SinkType,

    /// 队列容量
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// 类型特定参数
    #[serde(default)]
    pub params: HashMap<String, String>,
}

fn default_queue_capacity() -> usize {
    100
}

/// Sink 类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// 日志输出
    Log,
    /// JSONL 文件输出
    File,
    /// 紧急告警转发
    Alert,
}

impl MonitorBlueprint {
    /// Engine config with GPS usage aligned to the configured provider
    pub fn to_engine_config(&self) -> EngineConfig {
        let mut engine = self.engine.clone();
        if self.gps.kind == GpsSourceKind::None {
            engine.gps.enabled = false;
        }
        engine
    }
}
