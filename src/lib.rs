// src/lib.rs
//! Runtime log collector for an embedded frontend.
//!
//! Console-style calls and uncaught errors are kept in a bounded ring buffer
//! and forwarded in batches to a host process once its transport is ready.

pub mod collector;
pub mod config;
pub mod console;
pub mod logger;
pub mod transport;

pub use collector::entry::{Arg, ArgValue, ErrorValue, LogEntry, LogLevel};
pub use collector::hooks::{UncaughtError, install_panic_hook, spawn_reporting};
pub use collector::store::LogStats;
pub use collector::{Collector, CollectorBuilder};
pub use config::{CollectorConfig, ConfigError};
pub use console::{Console, EnvConsole, MemoryConsole};
pub use logger::RelayLogger;
pub use transport::{ChannelTransport, HostMessage, Transport, TransportError};
