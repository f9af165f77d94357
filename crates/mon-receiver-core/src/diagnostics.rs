//! Diagnostic reporting
//!
//! Every stage reports recoverable failures and state changes through an
//! injected [`Diagnostics`] collaborator instead of logging directly. The
//! default implementation forwards to `tracing`.

use std::sync::Mutex;

use thiserror::Error;

use crate::link::LinkError;
use crate::protocol::ProtocolError;
use crate::sink::StoreError;

/// Something worth telling an operator about. None of these are fatal.
#[derive(Error, Debug)]
pub enum Diagnostic {
    /// A candidate device failed its probe
    #[error("Probe failed: {0}")]
    LinkProbeFailure(#[source] LinkError),

    /// The active link failed and was torn down
    #[error("Link lost: {0}")]
    LinkReadFailure(#[source] LinkError),

    /// A probed device was opened for streaming
    #[error("Using serial port {device}")]
    LinkEstablished {
        /// Device path now streaming
        device: String,
    },

    /// A whole discovery pass found nothing usable
    #[error("No usable serial port among {candidates} candidates")]
    NoCandidates {
        /// Candidates tried in the pass
        candidates: usize,
    },

    /// A frame was discarded by the decoder
    #[error("Frame dropped: {0}")]
    FrameDropped(#[source] ProtocolError),

    /// The measurement queue was full
    #[error("Measurement queue full, dropped '{measurement}' stamped {time}")]
    QueueOverflow {
        /// Series of the dropped measurement
        measurement: String,
        /// Its ingestion time
        time: String,
    },

    /// The pending batch grew past its limit and was discarded
    #[error("Point buffer too big, dropped {dropped} points")]
    BatchOverflow {
        /// Points discarded
        dropped: usize,
    },

    /// A batch write failed; the batch is kept for retry
    #[error("Could not write {pending} points: {source}")]
    StoreWriteFailure {
        /// Points kept for the next attempt
        pending: usize,
        /// Why the write failed
        #[source]
        source: StoreError,
    },

    /// The store did not answer a ping or could not be reached
    #[error("Store connection failed: {0}")]
    StoreConnectionFailure(#[source] StoreError),

    /// A fresh store connection replaced the old one
    #[error("Connected to store")]
    StoreConnected,
}

/// Flat classification of [`Diagnostic`]s
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// [`Diagnostic::LinkProbeFailure`]
    LinkProbeFailure,
    /// [`Diagnostic::LinkReadFailure`]
    LinkReadFailure,
    /// [`Diagnostic::LinkEstablished`]
    LinkEstablished,
    /// [`Diagnostic::NoCandidates`]
    NoCandidates,
    /// Frame was not valid COBS
    FrameDecodeFailure,
    /// Record had the wrong size or an unusable name
    StructuralDecodeFailure,
    /// Record failed its CRC check
    ChecksumMismatch,
    /// Unterminated data was discarded
    BufferOverflow,
    /// [`Diagnostic::QueueOverflow`]
    QueueOverflow,
    /// [`Diagnostic::BatchOverflow`]
    BatchOverflow,
    /// [`Diagnostic::StoreWriteFailure`]
    StoreWriteFailure,
    /// [`Diagnostic::StoreConnectionFailure`]
    StoreConnectionFailure,
    /// [`Diagnostic::StoreConnected`]
    StoreConnected,
}

impl Diagnostic {
    /// Classify this event
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            Diagnostic::LinkProbeFailure(_) => DiagnosticKind::LinkProbeFailure,
            Diagnostic::LinkReadFailure(_) => DiagnosticKind::LinkReadFailure,
            Diagnostic::LinkEstablished { .. } => DiagnosticKind::LinkEstablished,
            Diagnostic::NoCandidates { .. } => DiagnosticKind::NoCandidates,
            Diagnostic::FrameDropped(err) => match err {
                ProtocolError::Stuffing { .. } => DiagnosticKind::FrameDecodeFailure,
                ProtocolError::CrcMismatch { .. } => DiagnosticKind::ChecksumMismatch,
                ProtocolError::BufferOverflow(_) => DiagnosticKind::BufferOverflow,
                ProtocolError::Malformed { .. }
                | ProtocolError::NonAsciiName(_)
                | ProtocolError::NameTooLong(_) => DiagnosticKind::StructuralDecodeFailure,
            },
            Diagnostic::QueueOverflow { .. } => DiagnosticKind::QueueOverflow,
            Diagnostic::BatchOverflow { .. } => DiagnosticKind::BatchOverflow,
            Diagnostic::StoreWriteFailure { .. } => DiagnosticKind::StoreWriteFailure,
            Diagnostic::StoreConnectionFailure(_) => DiagnosticKind::StoreConnectionFailure,
            Diagnostic::StoreConnected => DiagnosticKind::StoreConnected,
        }
    }
}

/// Receiver of diagnostic events, shared by all stages
pub trait Diagnostics: Send + Sync {
    /// Report one event. Must not block.
    fn report(&self, event: Diagnostic);
}

/// Forwards diagnostics to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn report(&self, event: Diagnostic) {
        match &event {
            Diagnostic::LinkProbeFailure(err) => {
                tracing::debug!(error = %err, "Couldn't probe serial port")
            }
            Diagnostic::LinkReadFailure(err) => {
                tracing::info!(error = %err, "Serial link lost, searching again")
            }
            Diagnostic::LinkEstablished { device } => {
                tracing::info!(%device, "Using serial port")
            }
            Diagnostic::NoCandidates { candidates } => {
                tracing::debug!(candidates, "No usable serial port found")
            }
            Diagnostic::FrameDropped(err) => {
                tracing::debug!(kind = ?event.kind(), error = %err, "Discarding frame")
            }
            Diagnostic::QueueOverflow { measurement, time } => {
                tracing::warn!(%measurement, %time, "Couldn't add packet to queue")
            }
            Diagnostic::BatchOverflow { dropped } => {
                tracing::warn!(dropped, "Point buffer too big, dropping data points")
            }
            Diagnostic::StoreWriteFailure { pending, source } => {
                tracing::warn!(pending, error = %source, "Couldn't write points to store")
            }
            Diagnostic::StoreConnectionFailure(err) => {
                tracing::warn!(error = %err, "Store unreachable, reconnecting")
            }
            Diagnostic::StoreConnected => tracing::info!("Connected to store"),
        }
    }
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct MemoryDiagnostics {
    events: Mutex<Vec<(DiagnosticKind, String)>>,
}

impl MemoryDiagnostics {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Kinds of all events reported so far
    pub fn events(&self) -> Vec<DiagnosticKind> {
        self.events
            .lock()
            .map(|e| e.iter().map(|(kind, _)| *kind).collect())
            .unwrap_or_default()
    }

    /// Rendered messages of all events reported so far
    pub fn messages(&self) -> Vec<String> {
        self.events
            .lock()
            .map(|e| e.iter().map(|(_, msg)| msg.clone()).collect())
            .unwrap_or_default()
    }

    /// Number of events of one kind
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.events().into_iter().filter(|k| *k == kind).count()
    }
}

impl Diagnostics for MemoryDiagnostics {
    fn report(&self, event: Diagnostic) {
        if let Ok(mut events) = self.events.lock() {
            events.push((event.kind(), event.to_string()));
        }
    }
}
