// src/collector/store.rs
//! Bounded in-memory log store with filtered reads and stats

use crate::collector::entry::{LogEntry, LogLevel};
use crate::collector::ring::RingBuffer;
use serde::Serialize;
use std::collections::BTreeMap;

/// Default number of entries retained by the store.
pub const MAX_LOG_ENTRIES: usize = 1000;

/// Counts over the entries currently held.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogStats {
    pub total: usize,
    /// Always contains every level, zero when absent.
    pub by_level: BTreeMap<LogLevel, usize>,
}

impl LogStats {
    pub fn count(&self, level: LogLevel) -> usize {
        self.by_level.get(&level).copied().unwrap_or(0)
    }
}

/// The ring buffer of recorded entries. All reads return owned snapshots.
#[derive(Debug)]
pub struct LogStore {
    entries: RingBuffer<LogEntry>,
}

impl Default for LogStore {
    fn default() -> Self {
        Self::new(MAX_LOG_ENTRIES)
    }
}

impl LogStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RingBuffer::new(capacity),
        }
    }

    pub fn append(&mut self, entry: LogEntry) {
        self.entries.push(entry);
    }

    pub fn get_all(&self) -> Vec<LogEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn get_by_level(&self, level: LogLevel) -> Vec<LogEntry> {
        self.entries
            .iter()
            .filter(|e| e.level == level)
            .cloned()
            .collect()
    }

    pub fn get_errors(&self) -> Vec<LogEntry> {
        self.get_by_level(LogLevel::Error)
    }

    /// Last `count` entries in insertion order.
    pub fn get_recent(&self, count: usize) -> Vec<LogEntry> {
        let skip = self.entries.len().saturating_sub(count);
        self.entries.iter().skip(skip).cloned().collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn get_stats(&self) -> LogStats {
        let mut by_level: BTreeMap<LogLevel, usize> =
            LogLevel::ALL.iter().map(|level| (*level, 0)).collect();
        for entry in self.entries.iter() {
            *by_level.entry(entry.level).or_insert(0) += 1;
        }
        LogStats {
            total: self.entries.len(),
            by_level,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
