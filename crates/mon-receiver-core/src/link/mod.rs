//! Serial Link Acquisition
//!
//! Finds the controller among the attached serial adapters, keeps the
//! connection open and streams delimited chunks to the frame decoder.
//! Losing the device sends the supervisor back to discovery.

mod channel;
mod error;
pub mod serial;
mod supervisor;

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use channel::{read_probe, read_until_delimiter, LinkChannel, ReadOutcome};
pub use error::LinkError;
pub use serial::{SerialBackend, SystemSerial};
pub use supervisor::{LinkHandle, LinkStatus, LinkSupervisor};

/// Default baud rate of the controller
pub const DEFAULT_BAUD_RATE: u32 = 115200;

/// Default read timeout while probing, in milliseconds
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 4000;

/// Default read timeout once connected, in milliseconds
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 1000;

/// Bytes a candidate must deliver to pass the probe.
/// More than the typical 2-byte glitch seen when a port opens.
pub const DEFAULT_PROBE_BYTES: usize = 4;

/// Default pause between discovery passes, in milliseconds
pub const DEFAULT_BACKOFF_MS: u64 = 1000;

/// Link configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Device path prefixes considered candidates (e.g. "/dev/ttyUSB")
    pub device_patterns: Vec<String>,
    /// Baud rate
    pub baud_rate: u32,
    /// Read timeout while probing, in milliseconds
    pub probe_timeout_ms: u64,
    /// Bytes that must be read for a probe to succeed
    pub probe_bytes: usize,
    /// Read timeout once connected, in milliseconds
    pub read_timeout_ms: u64,
    /// Pause after a discovery pass that found nothing, in milliseconds
    pub backoff_ms: u64,
}

impl LinkConfig {
    /// Probe read timeout
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// Steady-state read timeout
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Discovery backoff
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            device_patterns: serial::default_patterns(),
            baud_rate: DEFAULT_BAUD_RATE,
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
            probe_bytes: DEFAULT_PROBE_BYTES,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            backoff_ms: DEFAULT_BACKOFF_MS,
        }
    }
}
