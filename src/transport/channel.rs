// src/transport/channel.rs
//! Transport that forwards batches to a host task over an mpsc channel

use crate::collector::entry::LogEntry;
use crate::transport::{Transport, TransportError};
use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::mpsc;

/// What the host task receives.
#[derive(Debug)]
pub enum HostMessage {
    /// A batch to append, already encoded as one JSON line per entry.
    Append(Vec<String>),
    /// Clear previously persisted entries.
    Reset,
}

/// Sends each batch to the receiving half held by the host.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    tx: mpsc::UnboundedSender<HostMessage>,
}

impl ChannelTransport {
    pub fn new(tx: mpsc::UnboundedSender<HostMessage>) -> Self {
        Self { tx }
    }

    /// Create a transport together with the host's receiver.
    pub fn pair() -> (Self, mpsc::UnboundedReceiver<HostMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    fn send(&self, message: HostMessage) -> Result<(), TransportError> {
        self.tx.send(message).map_err(|_| TransportError::Closed)
    }
}

impl Transport for ChannelTransport {
    fn deliver(&self, batch: Vec<LogEntry>) -> BoxFuture<'_, Result<(), TransportError>> {
        let encoded = batch
            .iter()
            .map(serde_json::to_string)
            .collect::<Result<Vec<_>, _>>();
        async move { self.send(HostMessage::Append(encoded?)) }.boxed()
    }

    fn reset_remote(&self) -> BoxFuture<'_, Result<(), TransportError>> {
        async move { self.send(HostMessage::Reset) }.boxed()
    }
}
