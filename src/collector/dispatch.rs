// src/collector/dispatch.rs
//! Outbound host calls
//!
//! Every delivery runs as its own task, so a slow or hung host call never holds
//! up later batches. Deliveries wait until the remote reset has settled, and at
//! most a fixed number of them are in flight; past that, batches stay in the
//! bounded pending queue.

use crate::collector::entry::{LogEntry, LogLevel};
use crate::console::Console;
use crate::transport::{Transport, TransportError};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, watch};

pub(crate) struct Dispatcher {
    runtime: Handle,
    transport: Arc<dyn Transport>,
    console: Arc<dyn Console>,
    in_flight: Arc<Semaphore>,
    /// Flips to true once the remote reset finished, successfully or not.
    reset_settled: Arc<watch::Sender<bool>>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("free_slots", &self.in_flight.available_permits())
            .field("reset_settled", &*self.reset_settled.borrow())
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    pub(crate) fn new(
        runtime: Handle,
        transport: Arc<dyn Transport>,
        console: Arc<dyn Console>,
        max_in_flight: usize,
    ) -> Self {
        let (reset_settled, _) = watch::channel(false);
        Self {
            runtime,
            transport,
            console,
            in_flight: Arc::new(Semaphore::new(max_in_flight.clamp(1, Semaphore::MAX_PERMITS))),
            reset_settled: Arc::new(reset_settled),
        }
    }

    /// Start the remote reset. Callers issue it once, before any delivery.
    pub(crate) fn reset(&self) {
        let transport = Arc::clone(&self.transport);
        let console = Arc::clone(&self.console);
        let settled = Arc::clone(&self.reset_settled);
        self.runtime.spawn(async move {
            if let Err(e) = transport.reset_remote().await {
                console.write(LogLevel::Warn, &format!("[console-relay] failed to reset remote log state: {e}"));
            }
            settled.send_replace(true);
        });
    }

    /// A delivery slot, if one is free.
    pub(crate) fn try_slot(&self) -> Option<OwnedSemaphorePermit> {
        Arc::clone(&self.in_flight).try_acquire_owned().ok()
    }

    /// Send a batch on its own task without waiting for the outcome.
    pub(crate) fn deliver(&self, batch: Vec<LogEntry>, slot: OwnedSemaphorePermit) {
        let transport = Arc::clone(&self.transport);
        let console = Arc::clone(&self.console);
        let settled = self.reset_settled.subscribe();
        self.runtime.spawn(async move {
            let _ = send_batch(transport.as_ref(), console.as_ref(), settled, batch).await;
            drop(slot);
        });
    }

    /// Send a batch and wait for the host, queueing for a slot if needed.
    pub(crate) async fn deliver_and_wait(&self, batch: Vec<LogEntry>) -> Result<(), TransportError> {
        let _slot = Arc::clone(&self.in_flight)
            .acquire_owned()
            .await
            .map_err(|_| TransportError::Closed)?;
        let settled = self.reset_settled.subscribe();
        send_batch(self.transport.as_ref(), self.console.as_ref(), settled, batch).await
    }
}

async fn send_batch(
    transport: &dyn Transport,
    console: &dyn Console,
    mut settled: watch::Receiver<bool>,
    batch: Vec<LogEntry>,
) -> Result<(), TransportError> {
    // The sender lives as long as the dispatcher; if it is gone, go ahead.
    let _ = settled.wait_for(|done| *done).await;
    let count = batch.len();
    let result = transport.deliver(batch).await;
    if let Err(e) = &result {
        console.write(LogLevel::Error, &delivery_failure(count, e));
    }
    result
}

pub(crate) fn delivery_failure(count: usize, error: &TransportError) -> String {
    format!("[console-relay] failed to deliver {count} log entries: {error}")
}
