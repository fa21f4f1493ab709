//! SubscriberHandle - runs an async sink behind an isolated queue and worker task

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};

use contracts::{EngineEvent, EventSink};

use crate::error::DispatcherError;
use crate::metrics::SinkMetrics;
use crate::subscriber::{EventFilter, EventSubscriber};

/// Handle to a running sink worker
///
/// Implements `EventSubscriber`: events are queued with `try_send` so a slow
/// sink never blocks dispatch; a full queue drops the event.
pub struct SubscriberHandle {
    /// Sink name
    name: String,
    filter: EventFilter,
    /// Channel to the worker; `None` after shutdown
    tx: Mutex<Option<mpsc::Sender<EngineEvent>>>,
    /// Shared metrics
    metrics: Arc<SinkMetrics>,
    /// Worker task handle
    worker_handle: Mutex<Option<JoinHandle<()>>>,
}

impl SubscriberHandle {
    /// Create a new SubscriberHandle and spawn the worker task
    pub fn spawn<S: EventSink + Send + 'static>(
        sink: S,
        queue_capacity: usize,
        filter: EventFilter,
    ) -> Self {
        let name = sink.name().to_string();
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let metrics = Arc::new(SinkMetrics::new());

        let worker_metrics = Arc::clone(&metrics);
        let worker_name = name.clone();

        let worker_handle = tokio::spawn(async move {
            sink_worker(sink, rx, worker_metrics, worker_name).await;
        });

        Self {
            name,
            filter,
            tx: Mutex::new(Some(tx)),
            metrics,
            worker_handle: Mutex::new(Some(worker_handle)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn filter(&self) -> EventFilter {
        self.filter
    }

    pub fn metrics(&self) -> &Arc<SinkMetrics> {
        &self.metrics
    }

    /// Queue an event for the sink (non-blocking)
    ///
    /// Returns true if queued, false if dropped
    pub fn try_send(&self, event: EngineEvent) -> bool {
        let guard = self.tx.lock();
        let Some(tx) = guard.as_ref() else {
            debug!(sink = %self.name, "Sink already shut down, event ignored");
            return false;
        };

        match tx.try_send(event) {
            Ok(()) => {
                self.metrics
                    .set_queue_len(tx.max_capacity() - tx.capacity());
                true
            }
            Err(mpsc::error::TrySendError::Full(e)) => {
                self.metrics.inc_dropped_count();
                warn!(
                    sink = %self.name,
                    event = e.kind(),
                    timestamp_ms = e.timestamp_ms(),
                    "Queue full, event dropped"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                error!(sink = %self.name, "Sink worker closed unexpectedly");
                false
            }
        }
    }

    /// Shutdown the sink worker gracefully
    ///
    /// Queued events are still written before the sink is flushed and closed.
    #[instrument(name = "subscriber_handle_shutdown", skip(self), fields(sink = %self.name))]
    pub async fn shutdown(&self) {
        // Drop sender to signal worker to stop
        drop(self.tx.lock().take());
        let worker = self.worker_handle.lock().take();
        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                error!(sink = %self.name, error = ?e, "Worker task panicked");
            }
        }
        debug!(sink = %self.name, "SubscriberHandle shutdown complete");
    }
}

impl EventSubscriber for SubscriberHandle {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_event(&self, event: &EngineEvent) -> Result<(), DispatcherError> {
        if self.filter.accepts(event) {
            // a full queue is accounted in the sink metrics, not reported as a failure
            self.try_send(event.clone());
        }
        Ok(())
    }
}

/// Worker task that consumes events and writes to the sink
#[instrument(
    name = "sink_worker_loop",
    skip(sink, rx, metrics),
    fields(sink = %name)
)]
async fn sink_worker<S: EventSink>(
    mut sink: S,
    mut rx: mpsc::Receiver<EngineEvent>,
    metrics: Arc<SinkMetrics>,
    name: String,
) {
    debug!(sink = %name, "Sink worker started");

    while let Some(event) = rx.recv().await {
        metrics.set_queue_len(rx.len());

        match sink.write(&event).await {
            Ok(()) => {
                metrics.inc_write_count();
            }
            Err(e) => {
                metrics.inc_failure_count();
                error!(
                    sink = %name,
                    event = event.kind(),
                    timestamp_ms = event.timestamp_ms(),
                    error = %e,
                    "Write failed"
                );
            }
        }
    }

    if let Err(e) = sink.flush().await {
        error!(sink = %name, error = %e, "Flush failed on shutdown");
    }
    if let Err(e) = sink.close().await {
        error!(sink = %name, error = %e, "Close failed on shutdown");
    }

    debug!(sink = %name, "Sink worker stopped");
}
