//! Link errors

use std::io;

use thiserror::Error;

/// Errors that can occur while probing or reading the serial link
#[derive(Error, Debug)]
pub enum LinkError {
    /// The device could not be opened
    #[error("Could not open serial port {device}: {reason}")]
    Open {
        /// Device path
        device: String,
        /// What the serial layer reported
        reason: String,
    },

    /// The probe read fewer bytes than requested before timing out
    #[error("Serial port {device} yielded {read} of {expected} probe bytes")]
    ShortRead {
        /// Device path
        device: String,
        /// Bytes the probe asked for
        expected: usize,
        /// Bytes that arrived
        read: usize,
    },

    /// A read failed with something other than a timeout
    #[error("Could not read from serial port {device}: {source}")]
    Read {
        /// Device path
        device: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The port reported end of stream
    #[error("Serial port {device} closed")]
    Closed {
        /// Device path
        device: String,
    },
}

impl LinkError {
    /// Device the error refers to
    pub fn device(&self) -> &str {
        match self {
            LinkError::Open { device, .. }
            | LinkError::ShortRead { device, .. }
            | LinkError::Read { device, .. }
            | LinkError::Closed { device } => device,
        }
    }
}
