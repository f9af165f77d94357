//! Sink errors

use thiserror::Error;

use super::Measurement;

/// Errors reported by a time-series store
#[derive(Error, Debug)]
pub enum StoreError {
    /// No connection is installed, or it was closed
    #[error("Not connected to store")]
    NotConnected,

    /// The request did not complete
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The store answered with a non-success status
    #[error("Store answered {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, if any
        body: String,
    },

    /// Any other store failure
    #[error("Store error: {0}")]
    Other(String),
}

/// A measurement the queue refused; the measurement is handed back
#[derive(Error, Debug, PartialEq)]
pub enum QueueError {
    /// The queue is at capacity
    #[error("Measurement queue is full")]
    Full(Measurement),

    /// The writer side is gone
    #[error("Measurement queue has no consumer")]
    Disconnected(Measurement),
}

impl QueueError {
    /// The measurement that was not enqueued
    pub fn into_inner(self) -> Measurement {
        match self {
            QueueError::Full(m) | QueueError::Disconnected(m) => m,
        }
    }
}
