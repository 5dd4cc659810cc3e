// src/collector/gate.rs
//! Readiness latch and one-time remote reset latch

use std::sync::atomic::{AtomicBool, Ordering};

/// Two monotonic latches: transport readiness and the remote reset.
#[derive(Debug, Default)]
pub struct TransportGate {
    ready: AtomicBool,
    reset_done: AtomicBool,
}

impl TransportGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Flip to ready. Returns true only for the call that made the transition.
    pub fn open(&self) -> bool {
        !self.ready.swap(true, Ordering::SeqCst)
    }

    /// Claim the remote reset. Returns true exactly once.
    pub fn claim_reset(&self) -> bool {
        !self.reset_done.swap(true, Ordering::SeqCst)
    }

    pub fn reset_done(&self) -> bool {
        self.reset_done.load(Ordering::SeqCst)
    }
}
