//! EventSubscriber trait - synchronous receiver of engine events

use contracts::EngineEvent;

use crate::error::DispatcherError;

/// Receiver registered with an `EventDispatcher`
///
/// Called on the dispatching thread; implementations must not block for long.
/// Slow consumers belong behind a `SubscriberHandle`.
pub trait EventSubscriber: Send + Sync {
    /// Subscriber name (used for logging)
    fn name(&self) -> &str;

    /// Handle one event
    ///
    /// # Errors
    /// Errors are logged by the dispatcher and never reach other subscribers.
    fn on_event(&self, event: &EngineEvent) -> Result<(), DispatcherError>;
}

/// Closure-backed subscriber
pub struct FnSubscriber<F> {
    name: String,
    f: F,
}

impl<F> FnSubscriber<F>
where
    F: Fn(&EngineEvent) + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> EventSubscriber for FnSubscriber<F>
where
    F: Fn(&EngineEvent) + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn on_event(&self, event: &EngineEvent) -> Result<(), DispatcherError> {
        (self.f)(event);
        Ok(())
    }
}

/// Which events a sink-backed subscriber forwards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventFilter {
    /// Every event, sensor ticks included
    #[default]
    All,
    /// Activity and anomaly events
    Classifications,
    /// Events that engage the alerting collaborator
    Alerts,
}

impl EventFilter {
    pub fn accepts(&self, event: &EngineEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::Classifications => !matches!(event, EngineEvent::Sensor { .. }),
            EventFilter::Alerts => event.requires_alert(),
        }
    }

    /// Parse the `events` sink parameter
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" => Some(EventFilter::All),
            "classifications" => Some(EventFilter::Classifications),
            "alerts" => Some(EventFilter::Alerts),
            _ => None,
        }
    }
}
