//! # Activity Engine
//!
//! 实时人体活动识别引擎（规则驱动，非机器学习模型）。
//!
//! 负责：
//! - 有界滚动窗口 (`HistoryStore`)
//! - 特征提取：步频、姿态、主频、节律
//! - 五种活动签名打分分类
//! - 急停覆盖与异常标记
//!
//! ## 使用示例
//!
//! ```ignore
//! use activity_engine::{ActivityEngine, EngineConfig};
//! use contracts::TimeContext;
//!
//! let mut engine = ActivityEngine::new(EngineConfig::default());
//! engine.initialize();
//!
//! // Feed merged samples as the throttle admits them
//! if let Some(result) = engine.process(sample, gps.as_ref(), TimeContext::from_hour(14))? {
//!     println!("{} ({:.0}%)", result.activity, result.confidence * 100.0);
//! }
//! ```

mod anomaly;
mod classifier;
mod engine;
mod error;
mod features;
mod history;
mod orientation;
mod spectrum;
mod state;
mod stats;
mod steps;
mod throttle;
mod window;

pub use anomaly::{AnomalyDetector, Verdict};
pub use classifier::{probabilities, ActivityClassifier, Classification, SignatureScore};
pub use engine::{ActivityEngine, ModelInfo, MODEL_VERSION};
pub use error::EngineError;
pub use features::{gps_context, intensity_scores, rhythmicity, FeatureExtractor};
pub use history::{HistoryStats, HistoryStore, StepEvent, Tilt};
pub use orientation::{analyze_orientation, tilt_from_accel};
pub use spectrum::{correlation_power, dominant_frequency, sweep_frequencies};
pub use state::EngineState;
pub use steps::detect_steps;
pub use throttle::should_process;
pub use window::{AgedWindow, SizedWindow, Stamped};

// Re-export contracts types
pub use contracts::{ClassificationResult, EngineConfig, FeatureVector, SensorSample};
