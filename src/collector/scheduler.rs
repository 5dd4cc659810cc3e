// src/collector/scheduler.rs
//! Readiness-gated flush scheduling
//!
//! State machine over the readiness latch, the armed timer and the pending
//! batch. At most one timer is outstanding; while the transport is not ready
//! every firing re-arms it, so the check runs once per interval until the host
//! shows up.

use crate::collector::entry::{LogEntry, LogLevel};
use crate::collector::{Shared, State};
use std::sync::Arc;

impl Shared {
    /// Store the entry in both containers and request a flush.
    pub(super) fn enqueue(self: &Arc<Self>, entry: LogEntry) {
        let mut state = self.lock();
        state.store.append(entry.clone());
        state.pending.push(entry);
        self.request_flush(&mut state);
    }

    /// Arm the one-shot timer unless one is armed or there is no timer host.
    fn request_flush(self: &Arc<Self>, state: &mut State) {
        if state.timer.is_some() {
            return;
        }
        let Some(runtime) = &self.runtime else {
            return;
        };

        let weak = Arc::downgrade(self);
        let interval = self.config.flush_interval();
        state.timer = Some(runtime.spawn(async move {
            tokio::time::sleep(interval).await;
            if let Some(shared) = weak.upgrade() {
                shared.on_timer_fired();
            }
        }));
    }

    fn on_timer_fired(self: &Arc<Self>) {
        let mut state = self.lock();
        state.timer = None;
        self.attempt_flush_locked(&mut state);
    }

    pub(super) fn attempt_flush(self: &Arc<Self>) {
        let mut state = self.lock();
        self.attempt_flush_locked(&mut state);
    }

    fn attempt_flush_locked(self: &Arc<Self>, state: &mut State) {
        if !self.gate.is_ready() {
            self.request_flush(state);
            return;
        }
        if state.pending.is_empty() {
            return;
        }
        let Some(dispatcher) = &self.dispatcher else {
            return;
        };

        // Whoever sends first also issues the reset, so no batch goes out ahead of it.
        self.reset_remote_once();
        let Some(slot) = dispatcher.try_slot() else {
            log::debug!("all delivery slots busy, holding {} entries", state.pending.len());
            self.request_flush(state);
            return;
        };
        let batch = state.pending.take();
        log::debug!("flushing {} log entries", batch.len());
        dispatcher.deliver(batch, slot);
    }

    /// Issue the remote reset the first time it can actually be sent.
    pub(super) fn reset_remote_once(&self) {
        let Some(dispatcher) = &self.dispatcher else {
            if !self.gate.reset_done() {
                self.console.write(
                    LogLevel::Warn,
                    "[console-relay] no async runtime, remote log reset deferred",
                );
            }
            return;
        };
        if self.gate.claim_reset() {
            dispatcher.reset();
        }
    }
}
