// src/console.rs
//! The original console channel that collector output is mirrored to

use crate::collector::entry::LogLevel;
use log::Log;
use std::sync::{Mutex, PoisonError};

/// Target used for lines written by the console passthrough.
pub const CONSOLE_TARGET: &str = "console";

/// Where developer-facing output goes before (and independently of) recording.
pub trait Console: Send + Sync + 'static {
    fn write(&self, level: LogLevel, message: &str);
}

/// Writes through an `env_logger` instance that is never installed globally,
/// so output reaches stderr without passing through the `log` bridge.
pub struct EnvConsole {
    logger: env_logger::Logger,
}

impl EnvConsole {
    pub fn new(logger: env_logger::Logger) -> Self {
        Self { logger }
    }

    /// Build from `RUST_LOG`, showing everything the console levels can carry.
    pub fn from_env() -> Self {
        let logger = env_logger::Builder::new()
            .filter_level(log::LevelFilter::Debug)
            .parse_default_env()
            .format_timestamp_millis()
            .build();
        Self::new(logger)
    }
}

impl Default for EnvConsole {
    fn default() -> Self {
        Self::from_env()
    }
}

impl Console for EnvConsole {
    fn write(&self, level: LogLevel, message: &str) {
        self.logger.log(
            &log::Record::builder()
                .level(level.to_log_level())
                .target(CONSOLE_TARGET)
                .args(format_args!("{message}"))
                .build(),
        );
    }
}

/// Keeps every line in memory. Useful for tests and headless hosts.
#[derive(Debug, Default)]
pub struct MemoryConsole {
    lines: Mutex<Vec<(LogLevel, String)>>,
}

impl MemoryConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<(LogLevel, String)> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|(_, line)| line.contains(needle))
    }
}

impl Console for MemoryConsole {
    fn write(&self, level: LogLevel, message: &str) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((level, message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_console_keeps_lines() {
        let console = MemoryConsole::new();
        console.write(LogLevel::Warn, "careful");
        assert_eq!(console.lines(), vec![(LogLevel::Warn, "careful".to_string())]);
        assert!(console.contains("care"));
    }

    #[test]
    fn test_env_console_does_not_panic() {
        EnvConsole::from_env().write(LogLevel::Debug, "hello");
    }
}
