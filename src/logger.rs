// src/logger.rs
//! `log` crate bridge that feeds every record into the collector
//!
//! Installing [`RelayLogger`] is the Rust counterpart of wrapping the page
//! console: `log::info!` and friends still reach the original console, and
//! each record is also stored and forwarded to the host.

use crate::collector::Collector;
use crate::collector::entry::{Arg, LogLevel};
use log::{Log, Metadata, Record};

/// Records from this crate skip the pipeline and only reach the console.
const OWN_TARGET: &str = env!("CARGO_CRATE_NAME");

pub struct RelayLogger {
    collector: Collector,
    level: log::LevelFilter,
}

impl RelayLogger {
    pub fn new(collector: Collector, level: log::LevelFilter) -> Self {
        Self { collector, level }
    }

    /// Install as the global logger.
    pub fn init(collector: Collector, level: log::LevelFilter) -> Result<(), log::SetLoggerError> {
        log::set_boxed_logger(Box::new(RelayLogger::new(collector, level)))?;
        log::set_max_level(level);
        Ok(())
    }

    fn is_internal(target: &str) -> bool {
        target == OWN_TARGET || target.starts_with(&format!("{OWN_TARGET}::"))
    }
}

impl Log for RelayLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let level = LogLevel::from_log_level(record.level());
        let message = record.args().to_string();

        if Self::is_internal(record.target()) {
            self.collector
                .console_only(level, &format!("[{}] {}", record.target(), message));
            return;
        }

        let origin = match (record.file(), record.line()) {
            (Some(file), Some(line)) => Some(format!("at {} ({}:{})", record.target(), file, line)),
            _ => None,
        };
        self.collector
            .emit(level, vec![Arg::Text(message)], origin.as_deref());
    }

    fn flush(&self) {}
}
