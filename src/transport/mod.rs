// src/transport/mod.rs
//! Delivery of log batches to the host process

pub mod channel;

pub use channel::{ChannelTransport, HostMessage};

use crate::collector::entry::LogEntry;
use futures::future::BoxFuture;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("host channel closed")]
    Closed,
    #[error("host rejected the request: {0}")]
    Rejected(String),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// The host side of the pipeline.
///
/// Both calls are spawned and never awaited by the scheduler; a slow host does
/// not hold up recording.
pub trait Transport: Send + Sync + 'static {
    /// Append a batch of entries to the host's log.
    fn deliver(&self, batch: Vec<LogEntry>) -> BoxFuture<'_, Result<(), TransportError>>;

    /// Ask the host to clear or rotate whatever it persisted earlier.
    fn reset_remote(&self) -> BoxFuture<'_, Result<(), TransportError>>;
}
