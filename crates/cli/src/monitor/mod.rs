//! Monitoring session orchestration.

mod orchestrator;
mod stats;

pub use orchestrator::{Monitor, MonitorConfig};
pub use stats::RunStats;
