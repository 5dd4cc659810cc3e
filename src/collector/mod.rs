// src/collector/mod.rs
//! The log collector: facade, read API and the shared state behind it
//!
//! A [`Collector`] is a cheap handle. The application builds one at startup and
//! hands clones to whoever needs to log or read entries. Every record lands in
//! two places: the ring buffer backing the read API, and the pending batch that
//! is flushed to the host once the transport is ready.

pub mod entry;
pub mod format;
pub mod gate;
pub mod hooks;
pub mod origin;
pub mod pending;
pub mod ring;
pub mod store;

mod dispatch;
mod scheduler;

use crate::collector::dispatch::Dispatcher;
use crate::collector::entry::{Arg, LogEntry, LogLevel};
use crate::collector::gate::TransportGate;
use crate::collector::origin::StackFilter;
use crate::collector::pending::PendingBatch;
use crate::collector::store::{LogStats, LogStore};
use crate::config::CollectorConfig;
use crate::console::{Console, EnvConsole};
use crate::transport::{Transport, TransportError};
use std::panic::Location;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Handle to the collector. Clones share the same buffers and latches.
#[derive(Clone)]
pub struct Collector {
    shared: Arc<Shared>,
}

struct Shared {
    config: CollectorConfig,
    filter: StackFilter,
    transport: Arc<dyn Transport>,
    console: Arc<dyn Console>,
    /// Timer host. Without it no flush is ever scheduled.
    runtime: Option<Handle>,
    dispatcher: Option<Dispatcher>,
    gate: TransportGate,
    state: Mutex<State>,
}

struct State {
    store: LogStore,
    pending: PendingBatch,
    /// Present exactly while a flush timer is armed and has not fired.
    timer: Option<JoinHandle<()>>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub struct CollectorBuilder {
    config: CollectorConfig,
    transport: Arc<dyn Transport>,
    console: Option<Arc<dyn Console>>,
    runtime: Option<Handle>,
    ready: bool,
}

impl CollectorBuilder {
    pub fn config(mut self, config: CollectorConfig) -> Self {
        self.config = config;
        self
    }

    /// Original console channel. Defaults to [`EnvConsole::from_env`].
    pub fn console(mut self, console: Arc<dyn Console>) -> Self {
        self.console = Some(console);
        self
    }

    /// Runtime used for timers and host calls. Defaults to the current one.
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Mark the transport as already available at construction.
    pub fn ready(mut self, ready: bool) -> Self {
        self.ready = ready;
        self
    }

    pub fn build(self) -> Collector {
        let console = self
            .console
            .unwrap_or_else(|| Arc::new(EnvConsole::from_env()));
        let runtime = self.runtime.or_else(|| Handle::try_current().ok());
        if runtime.is_none() {
            log::warn!("no tokio runtime available, entries will be buffered but never flushed");
        }
        let dispatcher = runtime
            .as_ref()
            .map(|rt| {
                Dispatcher::new(
                    rt.clone(),
                    Arc::clone(&self.transport),
                    Arc::clone(&console),
                    self.config.max_in_flight_deliveries,
                )
            });

        let config = self.config;
        let shared = Shared {
            filter: StackFilter::new(config.internal_markers.clone(), config.vendor_markers.clone()),
            state: Mutex::new(State {
                store: LogStore::new(config.buffer_capacity),
                pending: PendingBatch::new(config.pending_capacity),
                timer: None,
            }),
            config,
            transport: self.transport,
            console,
            runtime,
            dispatcher,
            gate: TransportGate::new(),
        };

        let collector = Collector {
            shared: Arc::new(shared),
        };
        if self.ready {
            collector.set_transport_ready();
        }
        collector
    }
}

impl Collector {
    pub fn builder<T: Transport>(transport: T) -> CollectorBuilder {
        Self::builder_arc(Arc::new(transport))
    }

    pub fn builder_arc(transport: Arc<dyn Transport>) -> CollectorBuilder {
        CollectorBuilder {
            config: CollectorConfig::default(),
            transport,
            console: None,
            runtime: None,
            ready: false,
        }
    }

    #[track_caller]
    pub fn log(&self, args: Vec<Arg>) {
        self.console_call(LogLevel::Log, args, Location::caller());
    }

    #[track_caller]
    pub fn info(&self, args: Vec<Arg>) {
        self.console_call(LogLevel::Info, args, Location::caller());
    }

    #[track_caller]
    pub fn warn(&self, args: Vec<Arg>) {
        self.console_call(LogLevel::Warn, args, Location::caller());
    }

    #[track_caller]
    pub fn error(&self, args: Vec<Arg>) {
        self.console_call(LogLevel::Error, args, Location::caller());
    }

    #[track_caller]
    pub fn debug(&self, args: Vec<Arg>) {
        self.console_call(LogLevel::Debug, args, Location::caller());
    }

    /// Record an entry without origin tagging or console output.
    pub fn record(&self, level: LogLevel, args: Vec<Arg>) {
        self.record_with_stack(level, args, None);
    }

    pub(crate) fn record_with_stack(&self, level: LogLevel, args: Vec<Arg>, stack: Option<String>) {
        let message = format::format_args(&args);
        self.shared.enqueue(LogEntry::new(level, message, args, stack));
    }

    fn console_call(&self, level: LogLevel, args: Vec<Arg>, caller: &Location<'_>) {
        let origin = self.capture_origin(caller);
        self.emit(level, args, origin.as_deref());
    }

    /// Origin of the current call, from a full backtrace when configured,
    /// otherwise from the call-site location alone.
    fn capture_origin(&self, caller: &Location<'_>) -> Option<String> {
        let stack = self
            .shared
            .config
            .capture_backtraces
            .then(|| origin::capture_stack(true))
            .flatten()
            .unwrap_or_else(|| origin::location_stack(caller));
        self.shared.filter.extract_origin(&stack)
    }

    /// Mirror to the original console, then record.
    pub(crate) fn emit(&self, level: LogLevel, args: Vec<Arg>, origin: Option<&str>) {
        let args = origin::tag_origin(args, origin);
        let message = format::format_args(&args);
        self.shared.console.write(level, &message);
        self.shared.enqueue(LogEntry::new(level, message, args, None));
    }

    pub(crate) fn console_only(&self, level: LogLevel, message: &str) {
        self.shared.console.write(level, message);
    }

    /// Host-ready notification. The remote reset is only ever issued once;
    /// later calls just attempt a flush.
    pub fn set_transport_ready(&self) {
        if self.shared.gate.open() {
            log::debug!("transport ready");
        }
        self.shared.reset_remote_once();
        self.shared.attempt_flush();
    }

    pub fn is_ready(&self) -> bool {
        self.shared.gate.is_ready()
    }

    /// Deliver everything pending now and wait for the host.
    ///
    /// Returns the number of entries delivered; `Ok(0)` when not ready or
    /// nothing is pending. A failed batch is dropped, as with timed flushes.
    pub async fn flush(&self) -> Result<usize, TransportError> {
        if !self.is_ready() {
            return Ok(0);
        }
        let batch = self.shared.lock().pending.take();
        if batch.is_empty() {
            return Ok(0);
        }
        let count = batch.len();
        let result = match &self.shared.dispatcher {
            Some(dispatcher) => {
                self.shared.reset_remote_once();
                dispatcher.deliver_and_wait(batch).await
            }
            None => {
                if self.shared.gate.claim_reset() {
                    if let Err(e) = self.shared.transport.reset_remote().await {
                        self.shared.console.write(
                            LogLevel::Warn,
                            &format!("[console-relay] failed to reset remote log state: {e}"),
                        );
                    }
                }
                let result = self.shared.transport.deliver(batch).await;
                if let Err(e) = &result {
                    self.shared
                        .console
                        .write(LogLevel::Error, &dispatch::delivery_failure(count, e));
                }
                result
            }
        };
        result.map(|()| count)
    }

    pub fn get_all(&self) -> Vec<LogEntry> {
        self.shared.lock().store.get_all()
    }

    pub fn get_by_level(&self, level: LogLevel) -> Vec<LogEntry> {
        self.shared.lock().store.get_by_level(level)
    }

    pub fn get_errors(&self) -> Vec<LogEntry> {
        self.shared.lock().store.get_errors()
    }

    pub fn get_recent(&self, count: usize) -> Vec<LogEntry> {
        self.shared.lock().store.get_recent(count)
    }

    pub fn get_stats(&self) -> LogStats {
        self.shared.lock().store.get_stats()
    }

    /// Empty the ring buffer. Undelivered entries are kept.
    pub fn clear(&self) {
        self.shared.lock().store.clear();
    }

    pub fn pending_len(&self) -> usize {
        self.shared.lock().pending.len()
    }

    /// Entries evicted from the pending batch before delivery.
    pub fn dropped_pending(&self) -> u64 {
        self.shared.lock().pending.dropped()
    }

    pub fn flush_scheduled(&self) -> bool {
        self.shared.lock().timer.is_some()
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.shared.config
    }

    pub(crate) fn stack_filter(&self) -> &StackFilter {
        &self.shared.filter
    }
}

impl std::fmt::Debug for Collector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collector")
            .field("ready", &self.is_ready())
            .field("pending", &self.pending_len())
            .finish_non_exhaustive()
    }
}
