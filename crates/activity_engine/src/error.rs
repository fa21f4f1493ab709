//! Engine error types.

use thiserror::Error;

/// Errors from a single processing pass
///
/// None of them leaves buffers or state modified.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    /// `initialize` was not called, or the engine was reset since
    #[error("activity engine not initialized")]
    NotInitialized,

    /// A reading contained NaN or infinity
    #[error("non-finite sensor sample at {timestamp_ms} ms")]
    NonFiniteSample { timestamp_ms: u64 },
}
