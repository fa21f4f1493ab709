//! EventSink trait - async output interface used behind dispatcher subscribers.

use crate::{ContractError, EngineEvent};

/// Event output trait
#[trait_variant::make(EventSink: Send)]
pub trait LocalEventSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Write one engine event
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn write(&mut self, event: &EngineEvent) -> Result<(), ContractError>;

    /// Flush buffer (if any)
    async fn flush(&mut self) -> Result<(), ContractError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), ContractError>;
}
