//! Ingestion 错误类型

use activity_engine::EngineError;
use contracts::{ContractError, SensorChannel};
use thiserror::Error;

/// Ingestion 错误
#[derive(Debug, Error)]
pub enum IngestionError {
    /// 引擎拒绝了本次 tick
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    /// 会话已在运行
    #[error("monitoring session is already running")]
    AlreadyRunning,

    /// 会话未运行
    #[error("monitoring session is not running")]
    NotRunning,

    /// 传感器源不可用
    #[error("source for {channel} unavailable: {message}")]
    SourceUnavailable {
        /// 通道
        channel: SensorChannel,
        /// 错误消息
        message: String,
    },

    /// 录制文件 / GPS 等契约层错误
    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl IngestionError {
    /// Create source unavailable error
    pub fn source_unavailable(channel: SensorChannel, message: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            channel,
            message: message.into(),
        }
    }
}

/// Ingestion Result 类型别名
pub type Result<T> = std::result::Result<T, IngestionError>;
