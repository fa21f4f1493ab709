//! # Dispatcher
//!
//! 事件分发模块（EventDispatcher）。
//!
//! 负责：
//! - 同步 fan-out `EngineEvent` 到所有订阅者
//! - 隔离失败/panic 的订阅者，不影响其他订阅者和引擎
//! - 慢 sink 通过有界队列 + 后台任务隔离，队列满时丢弃
//!
//! ## 使用示例
//!
//! ```ignore
//! let dispatcher = EventDispatcher::new();
//! let _sub = dispatcher.subscribe_fn("ui", |event| {
//!     println!("{}", event.kind());
//! });
//! let sinks = SinkSet::attach(&dispatcher, &blueprint.sinks)?;
//! dispatcher.dispatch(&event);
//! sinks.shutdown().await;
//! ```

pub mod dispatcher;
pub mod error;
pub mod handle;
pub mod metrics;
pub mod sinks;
pub mod subscriber;

pub use contracts::{EngineEvent, EventSink};
pub use dispatcher::{
    create_sink_handle, DispatchReport, EventDispatcher, SinkSet, Subscription, SubscriptionId,
};
pub use error::DispatcherError;
pub use handle::SubscriberHandle;
pub use metrics::{DispatchSnapshot, MetricsSnapshot, SinkMetrics};
pub use sinks::{AlertRequest, AlertSink, AlertSinkConfig, FileSink, FileSinkConfig, LogSink};
pub use subscriber::{EventFilter, EventSubscriber, FnSubscriber};
