//! # Telemetry DVR
//!
//! Multi-source UDP telemetry recorder with remote start/stop control.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  Sensor A      Sensor B      Camera 1        dvr-control CLI     │
//! │  (UDP)         (UDP)         (UDP)           (start/stop/close)  │
//! └────┬──────────────┬──────────────┬──────────────┬────────────────┘
//!      │              │              │              │
//!      ▼              ▼              ▼              ▼
//! ┌──────────────────────────────────────────────────────────────────┐
//! │              Ingest thread (network::ingest)                     │
//! │    poll bound sockets → demux by local port → timestamp          │
//! └────┬──────────────┬──────────────┬──────────────┬────────────────┘
//!      │              │              │              │ decoded command
//!      ▼              ▼              ▼              ▼
//! ┌─────────┐   ┌─────────┐   ┌─────────┐   ┌────────────────────────┐
//! │ Slot 0  │   │ Slot 1  │   │ Slot 2  │   │    command channel     │
//! │ latest  │   │ latest  │   │ latest  │   └───────────┬────────────┘
//! │ packet  │   │ packet  │   │ packet  │               ▼
//! └─────────┘   └─────────┘   └─────────┘   ┌────────────────────────┐
//!      ▲ overwrite-on-full, never blocks    │   Controller (main)    │
//!      │                                    │   recording state      │
//!      └──────────── stop signal ◄──────────│   log rotation check   │
//!                   (drain + exit)          └────────────────────────┘
//! ```

pub mod buffer;
pub mod command;
pub mod config;
pub mod controller;
pub mod error;
pub mod logging;
pub mod network;

pub use error::{Error, Result};

/// Application-wide constants
pub mod constants {
    /// Maximum UDP payload accepted per datagram
    pub const MAX_DATAGRAM_SIZE: usize = 1024;

    /// Reserved input name whose payloads are interpreted as commands
    pub const CONTROL_SOURCE_NAME: &str = "controller";

    /// Capacity of the ingest → controller command channel
    pub const COMMAND_CHANNEL_CAPACITY: usize = 64;

    /// Default address the control CLI sends commands to
    pub const DEFAULT_CONTROL_ADDR: &str = "127.0.0.1:20002";

    /// Ingest poll back-off when no socket was readable (microseconds)
    pub const POLL_IDLE_SLEEP_US: u64 = 500;

    /// Controller loop back-off between iterations (milliseconds)
    pub const CONTROLLER_IDLE_SLEEP_MS: u64 = 20;

    /// Default configuration file path
    pub const DEFAULT_CONFIG_PATH: &str = "config.json";

    /// Default log folder
    pub const LOG_FOLDER: &str = "log";

    /// Default log file prefix
    pub const LOG_PREFIX: &str = "debug";

    /// Default log file extension
    pub const LOG_EXTENSION: &str = "log";
}
