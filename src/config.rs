// src/config.rs
//! Collector configuration loaded from TOML

use crate::collector::pending::MAX_PENDING_ENTRIES;
use crate::collector::store::MAX_LOG_ENTRIES;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Entries kept in memory for the read API.
    pub buffer_capacity: usize,
    /// Undelivered entries kept; also the largest batch sent.
    pub pending_capacity: usize,
    /// Delay between a flush request and the delivery attempt.
    pub flush_interval_ms: u64,
    /// Host deliveries allowed to be outstanding at once.
    pub max_in_flight_deliveries: usize,
    /// Capture a full backtrace for every facade call instead of the call site.
    pub capture_backtraces: bool,
    /// Frame fragments that identify the collector itself.
    pub internal_markers: Vec<String>,
    /// Frame fragments of runtime and dependency code, skipped for origins.
    pub vendor_markers: Vec<String>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: MAX_LOG_ENTRIES,
            pending_capacity: MAX_PENDING_ENTRIES,
            flush_interval_ms: 1000,
            max_in_flight_deliveries: 4,
            capture_backtraces: false,
            internal_markers: vec![format!("{}::", env!("CARGO_CRATE_NAME"))],
            vendor_markers: [
                "std::",
                "core::",
                "alloc::",
                "tokio::",
                "futures_",
                "/rustc/",
                ".cargo/registry",
                "__rust",
                "__libc_start",
                "<unknown>",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl CollectorConfig {
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// `<config dir>/console-relay/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("console-relay").join("config.toml"))
    }

    /// Load from `path`, or from the default location when `None`.
    ///
    /// A missing default file yields defaults; a missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match Self::default_path() {
                Some(p) => (p, false),
                None => return Ok(Self::default()),
            },
        };

        match std::fs::read_to_string(&path) {
            Ok(content) => {
                log::debug!("loading collector config from {}", path.display());
                Self::from_toml_str(&content)
            }
            Err(e) if !explicit && e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Io { path, source }),
        }
    }
}
