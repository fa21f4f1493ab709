//! # Ingestion
//!
//! 传感器接入模块（SampleIngestor）。
//!
//! 负责：
//! - 合并加速度计 / 陀螺仪 / 磁力计三路回调为一条当前记录
//! - 按 `1000 / sampling_rate_hz` ms 节流，驱动引擎完成一次推理
//! - 按 sensor → activity → anomaly 顺序分发事件
//! - GPS 缓存（最长 5 s），失败时退化为无 GPS
//! - 监控会话的原子启停
//!
//! ## 使用示例
//!
//! ```ignore
//! use ingestion::{MonitoringSession, MockSensorSource, SampleIngestor};
//!
//! let ingestor = SampleIngestor::new(blueprint.to_engine_config(), dispatcher.clone());
//! let sources = MockSensorSource::trio(SimulatedMotion::Walking, 50.0, epoch_ms());
//! let session = MonitoringSession::new(ingestor, sources);
//! session.start()?;
//! // ...
//! session.stop()?;
//! ```
//!
//! ## 回放
//!
//! ```ignore
//! let recording = Recording::load("walk.jsonl")?;
//! let classified = recording.replay_into(&mut ingestor);
//! ```

mod error;
mod gps;
mod ingestor;
mod metrics;
mod mock;
mod replay;
mod session;

pub use error::{IngestionError, Result};
pub use gps::{provider_from_config, GpsCache, GpsStep, ScriptedGpsProvider, StaticGpsProvider};
pub use ingestor::{CurrentReadings, SampleIngestor};
pub use metrics::{IngestionMetrics, MetricsSnapshot};
pub use mock::{epoch_ms, MockSensorConfig, MockSensorSource, MotionProfile, GRAVITY};
pub use replay::{Recording, ReplaySource};
pub use session::{sources_from_config, MonitoringSession};
