//! Sink implementations
//!
//! Contains LogSink, FileSink, and AlertSink.

mod alert;
mod file;
mod log;

pub use self::alert::{AlertRequest, AlertSink, AlertSinkConfig};
pub use self::file::{FileSink, FileSinkConfig};
pub use self::log::LogSink;
