//! JSON configuration for the recorder
//!
//! Mirrors the on-disk `config.json` layout:
//!
//! ```json
//! {
//!   "debug_level": "debug",
//!   "log_length": { "hour": 0, "minute": 30, "second": 0 },
//!   "inputs":  [ { "name": "controller", "ip": "0.0.0.0", "port": 20002 } ],
//!   "outputs": [ { "name": "overlay", "ip": "127.0.0.1", "port": 30001 } ]
//! }
//! ```

use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::CONTROL_SOURCE_NAME;
use crate::error::{Error, Result};

/// Diagnostic verbosity, as written in the config file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebugLevel {
    Info,
    Debug,
    Warning,
}

impl DebugLevel {
    /// Directive string for the tracing `EnvFilter`
    pub fn filter_directive(self) -> &'static str {
        match self {
            DebugLevel::Info => "info",
            DebugLevel::Debug => "debug",
            DebugLevel::Warning => "warn",
        }
    }
}

/// Log rotation interval, split into fields as the config file writes it
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LogLength {
    pub hour: u64,
    pub minute: u64,
    pub second: u64,
}

impl LogLength {
    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.hour * 3600 + self.minute * 60 + self.second)
    }
}

/// One UDP endpoint entry (input or output)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub name: String,
    pub ip: String,
    pub port: u16,
}

impl EndpointConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }
}

/// Top-level application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub debug_level: DebugLevel,
    pub log_length: LogLength,
    pub inputs: Vec<EndpointConfig>,
    #[serde(default)]
    pub outputs: Vec<EndpointConfig>,
}

impl AppConfig {
    /// Load and validate configuration from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let config: AppConfig = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| Error::Config(format!("invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants the ingest loop relies on.
    ///
    /// The arriving socket's local port is the sole key used to resolve a
    /// datagram to its logical source, so duplicate input ports would make
    /// demultiplexing ambiguous. Duplicate names are allowed.
    pub fn validate(&self) -> Result<()> {
        if self.inputs.is_empty() {
            return Err(Error::Config("no inputs configured".into()));
        }

        let mut seen = HashSet::new();
        for input in &self.inputs {
            if !seen.insert(input.port) {
                return Err(Error::Config(format!(
                    "duplicate input port {} ({})",
                    input.port, input.name
                )));
            }
        }

        if self.control_source_index().is_none() {
            return Err(Error::Config(format!(
                "no input named \"{CONTROL_SOURCE_NAME}\" configured"
            )));
        }

        Ok(())
    }

    /// Index of the designated control source in `inputs`
    pub fn control_source_index(&self) -> Option<usize> {
        self.inputs
            .iter()
            .position(|i| i.name == CONTROL_SOURCE_NAME)
    }

    /// Configured rotation interval
    pub fn rotation_interval(&self) -> Duration {
        self.log_length.as_duration()
    }
}
