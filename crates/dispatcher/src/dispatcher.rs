//! EventDispatcher - synchronous fan-out to registered subscribers

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::{debug, error, info, instrument, warn};

use contracts::{EngineEvent, SinkConfig, SinkType};

use crate::error::DispatcherError;
use crate::handle::SubscriberHandle;
use crate::metrics::{DispatchMetrics, DispatchSnapshot, MetricsSnapshot};
use crate::sinks::{AlertSink, FileSink, LogSink};
use crate::subscriber::{EventFilter, EventSubscriber, FnSubscriber};

/// Identifier of one registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Entry {
    id: SubscriptionId,
    subscriber: Arc<dyn EventSubscriber>,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    entries: Vec<Entry>,
}

struct Shared {
    registry: RwLock<Registry>,
    metrics: DispatchMetrics,
}

impl Shared {
    fn remove(&self, id: SubscriptionId) -> bool {
        let mut registry = self.registry.write();
        let before = registry.entries.len();
        registry.entries.retain(|e| e.id != id);
        before != registry.entries.len()
    }
}

/// Outcome of dispatching one event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Publish/subscribe registry
///
/// Cloning yields another handle to the same registry.
#[derive(Clone)]
pub struct EventDispatcher {
    shared: Arc<Shared>,
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                registry: RwLock::new(Registry::default()),
                metrics: DispatchMetrics::default(),
            }),
        }
    }

    /// Register a subscriber; it stays registered while the returned guard lives
    pub fn subscribe(&self, subscriber: Arc<dyn EventSubscriber>) -> Subscription {
        let mut registry = self.shared.registry.write();
        let id = SubscriptionId(registry.next_id);
        registry.next_id += 1;
        debug!(subscriber = subscriber.name(), id = id.0, "Subscriber registered");
        registry.entries.push(Entry { id, subscriber });

        Subscription {
            id,
            shared: Arc::downgrade(&self.shared),
            active: true,
        }
    }

    /// Register a closure
    pub fn subscribe_fn<F>(&self, name: impl Into<String>, f: F) -> Subscription
    where
        F: Fn(&EngineEvent) + Send + Sync + 'static,
    {
        self.subscribe(Arc::new(FnSubscriber::new(name, f)))
    }

    pub fn subscriber_count(&self) -> usize {
        self.shared.registry.read().entries.len()
    }

    /// Deliver `event` to every subscriber in registration order
    ///
    /// Works on a snapshot of the registry, so subscribers may (un)subscribe
    /// from inside `on_event`. Errors and panics are logged per subscriber.
    pub fn dispatch(&self, event: &EngineEvent) -> DispatchReport {
        let subscribers: Vec<Arc<dyn EventSubscriber>> = self
            .shared
            .registry
            .read()
            .entries
            .iter()
            .map(|e| Arc::clone(&e.subscriber))
            .collect();

        let metrics = &self.shared.metrics;
        metrics.inc_events();
        let mut report = DispatchReport::default();

        for subscriber in subscribers {
            match catch_unwind(AssertUnwindSafe(|| subscriber.on_event(event))) {
                Ok(Ok(())) => {
                    metrics.inc_deliveries();
                    report.delivered += 1;
                }
                Ok(Err(e)) => {
                    metrics.inc_failures();
                    report.failed += 1;
                    warn!(
                        subscriber = subscriber.name(),
                        event = event.kind(),
                        error = %e,
                        "Subscriber failed"
                    );
                }
                Err(_) => {
                    metrics.inc_panics();
                    report.failed += 1;
                    error!(
                        subscriber = subscriber.name(),
                        event = event.kind(),
                        "Subscriber panicked"
                    );
                }
            }
        }

        report
    }

    /// Remove every subscriber; outstanding guards become no-ops
    pub fn clear(&self) {
        let removed = {
            let mut registry = self.shared.registry.write();
            std::mem::take(&mut registry.entries).len()
        };
        debug!(removed, "Subscribers cleared");
    }

    pub fn metrics(&self) -> DispatchSnapshot {
        self.shared.metrics.snapshot()
    }
}

/// Drop guard of a registration
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: SubscriptionId,
    shared: Weak<Shared>,
    active: bool,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Unsubscribe now; returns false if already removed
    pub fn unsubscribe(mut self) -> bool {
        self.release()
    }

    /// Keep the subscriber registered for the dispatcher's lifetime
    pub fn detach(mut self) {
        self.active = false;
    }

    fn release(&mut self) -> bool {
        if !std::mem::replace(&mut self.active, false) {
            return false;
        }
        self.shared
            .upgrade()
            .is_some_and(|shared| shared.remove(self.id))
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

/// Create a SubscriberHandle from configuration
///
/// Spawns the sink worker, so it must run inside a Tokio runtime.
#[instrument(
    name = "dispatcher_create_sink_handle",
    skip(config),
    fields(sink = %config.name, sink_type = ?config.sink_type)
)]
pub fn create_sink_handle(config: &SinkConfig) -> Result<SubscriberHandle, DispatcherError> {
    let filter = match config.params.get("events") {
        Some(value) => EventFilter::parse(value).ok_or_else(|| {
            DispatcherError::sink_creation(&config.name, format!("unknown event filter '{value}'"))
        })?,
        None => default_filter(config.sink_type),
    };

    match config.sink_type {
        SinkType::Log => {
            let sink = LogSink::new(&config.name);
            Ok(SubscriberHandle::spawn(sink, config.queue_capacity, filter))
        }
        SinkType::File => {
            let sink = FileSink::from_params(&config.name, &config.params)
                .map_err(|e| DispatcherError::sink_creation(&config.name, e.to_string()))?;
            Ok(SubscriberHandle::spawn(sink, config.queue_capacity, filter))
        }
        SinkType::Alert => {
            let sink = AlertSink::from_params(&config.name, &config.params)
                .map_err(|e| DispatcherError::sink_creation(&config.name, e.to_string()))?;
            Ok(SubscriberHandle::spawn(sink, config.queue_capacity, filter))
        }
    }
}

fn default_filter(sink_type: SinkType) -> EventFilter {
    match sink_type {
        SinkType::Log => EventFilter::Classifications,
        SinkType::File => EventFilter::All,
        SinkType::Alert => EventFilter::Alerts,
    }
}

/// Sink-backed subscribers attached to one dispatcher
pub struct SinkSet {
    handles: Vec<Arc<SubscriberHandle>>,
    subscriptions: Vec<Subscription>,
}

impl SinkSet {
    /// Build every configured sink and subscribe it
    #[instrument(
        name = "dispatcher_attach_sinks",
        skip(dispatcher, configs),
        fields(sink_count = configs.len())
    )]
    pub fn attach(
        dispatcher: &EventDispatcher,
        configs: &[SinkConfig],
    ) -> Result<Self, DispatcherError> {
        let mut set = Self {
            handles: Vec::with_capacity(configs.len()),
            subscriptions: Vec::with_capacity(configs.len()),
        };
        for config in configs {
            set.push(dispatcher, create_sink_handle(config)?);
        }
        info!(sinks = set.handles.len(), "Sinks attached");
        Ok(set)
    }

    /// Subscribe an already running handle
    pub fn push(&mut self, dispatcher: &EventDispatcher, handle: SubscriberHandle) {
        let handle = Arc::new(handle);
        self.subscriptions
            .push(dispatcher.subscribe(handle.clone() as Arc<dyn EventSubscriber>));
        self.handles.push(handle);
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Get metrics for all sinks
    pub fn metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        self.handles
            .iter()
            .map(|h| (h.name().to_string(), h.metrics().snapshot()))
            .collect()
    }

    /// Unsubscribe, then drain and close every sink
    #[instrument(name = "dispatcher_sinks_shutdown", skip(self))]
    pub async fn shutdown(self) {
        drop(self.subscriptions);
        for handle in self.handles {
            handle.shutdown().await;
        }
        info!("Sinks shutdown complete");
    }
}
