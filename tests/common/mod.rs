#![allow(dead_code)]

use console_relay::{Collector, CollectorConfig, LogEntry, MemoryConsole, Transport, TransportError};
use futures::FutureExt;
use futures::future::BoxFuture;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Host double that records every call.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<MockState>,
}

#[derive(Default)]
struct MockState {
    batches: Mutex<Vec<Vec<LogEntry>>>,
    calls: Mutex<Vec<&'static str>>,
    fail_deliveries: AtomicBool,
    fail_resets: AtomicBool,
    /// Deliveries left that never resolve.
    hanging: AtomicUsize,
    reset_delay: Mutex<Option<Duration>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let transport = Self::default();
        transport.state.fail_deliveries.store(true, Ordering::SeqCst);
        transport
    }

    pub fn fail_resets(&self) {
        self.state.fail_resets.store(true, Ordering::SeqCst);
    }

    /// Make the next `count` deliveries hang forever.
    pub fn hang_deliveries(&self, count: usize) {
        self.state.hanging.store(count, Ordering::SeqCst);
    }

    /// Resets take `delay` and are only recorded once they complete.
    pub fn slow_resets(&self, delay: Duration) {
        *self.state.reset_delay.lock().unwrap() = Some(delay);
    }

    pub fn batches(&self) -> Vec<Vec<LogEntry>> {
        self.state.batches.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.state.calls.lock().unwrap().clone()
    }

    pub fn deliveries(&self) -> usize {
        self.calls().iter().filter(|c| **c == "deliver").count()
    }

    pub fn resets(&self) -> usize {
        self.calls().iter().filter(|c| **c == "reset").count()
    }
}

impl Transport for MockTransport {
    fn deliver(&self, batch: Vec<LogEntry>) -> BoxFuture<'_, Result<(), TransportError>> {
        async move {
            self.state.calls.lock().unwrap().push("deliver");
            let hang = self
                .state
                .hanging
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if hang {
                futures::future::pending::<()>().await;
            }
            if self.state.fail_deliveries.load(Ordering::SeqCst) {
                return Err(TransportError::Rejected("host unavailable".into()));
            }
            self.state.batches.lock().unwrap().push(batch);
            Ok(())
        }
        .boxed()
    }

    fn reset_remote(&self) -> BoxFuture<'_, Result<(), TransportError>> {
        async move {
            let delay = *self.state.reset_delay.lock().unwrap();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            self.state.calls.lock().unwrap().push("reset");
            if self.state.fail_resets.load(Ordering::SeqCst) {
                return Err(TransportError::Rejected("cannot truncate".into()));
            }
            Ok(())
        }
        .boxed()
    }
}

pub fn collector(transport: &MockTransport, ready: bool) -> (Collector, Arc<MemoryConsole>) {
    collector_with(transport, ready, CollectorConfig::default())
}

pub fn collector_with(
    transport: &MockTransport,
    ready: bool,
    config: CollectorConfig,
) -> (Collector, Arc<MemoryConsole>) {
    let console = Arc::new(MemoryConsole::new());
    let collector = Collector::builder(transport.clone())
        .config(config)
        .console(console.clone())
        .ready(ready)
        .build();
    (collector, console)
}

/// Let spawned tasks run without reaching the next flush tick.
pub async fn settle() {
    for _ in 0..5 {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
}
