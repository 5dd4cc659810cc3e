// src/collector/pending.rs
//! Entries recorded but not yet handed to the host

use crate::collector::entry::LogEntry;
use crate::collector::ring::RingBuffer;

/// Default bound on undelivered entries, which also caps a batch.
pub const MAX_PENDING_ENTRIES: usize = 200;

/// Undelivered entries. Only ever emptied as a whole.
#[derive(Debug)]
pub struct PendingBatch {
    entries: RingBuffer<LogEntry>,
    dropped: u64,
}

impl Default for PendingBatch {
    fn default() -> Self {
        Self::new(MAX_PENDING_ENTRIES)
    }
}

impl PendingBatch {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RingBuffer::new(capacity),
            dropped: 0,
        }
    }

    pub fn push(&mut self, entry: LogEntry) {
        self.dropped += self.entries.push(entry) as u64;
    }

    /// Take the whole batch, leaving the accumulator empty.
    pub fn take(&mut self) -> Vec<LogEntry> {
        self.entries.drain()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries evicted before they could be delivered.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}
