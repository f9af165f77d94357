//! Link supervision
//!
//! Drives the `Searching -> Connected -> Searching` cycle. Discovery probes
//! every candidate in order; streaming pushes each delimited chunk to the
//! registered listener until a read fails.

use std::io::BufReader;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::channel::{read_probe, read_until_delimiter, ReadOutcome};
use super::serial::sort_candidates;
use super::{LinkChannel, LinkConfig, LinkError, SerialBackend};
use crate::clock::Clock;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::pipeline::RawDataSink;
use crate::protocol::DELIMITER;

/// An open, verified connection to the controller
pub struct LinkHandle {
    device: String,
    reader: BufReader<Box<dyn LinkChannel>>,
}

impl LinkHandle {
    fn new(device: String, channel: Box<dyn LinkChannel>) -> Self {
        Self {
            device,
            reader: BufReader::new(channel),
        }
    }

    /// Device path of this connection
    pub fn device(&self) -> &str {
        &self.device
    }
}

/// Observable supervisor state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkStatus {
    /// No device held; the next step runs a discovery pass
    Searching,
    /// Streaming from the named device
    Connected(String),
}

enum LinkState {
    Searching,
    Connected(LinkHandle),
}

/// Owns the serial connection and its recovery loop
pub struct LinkSupervisor<B: SerialBackend> {
    backend: B,
    config: LinkConfig,
    state: LinkState,
    listener: Option<Box<dyn RawDataSink>>,
    diagnostics: Arc<dyn Diagnostics>,
    clock: Arc<dyn Clock>,
    shutdown: Arc<AtomicBool>,
    /// Reused read buffer
    chunk: Vec<u8>,
}

impl<B: SerialBackend> LinkSupervisor<B> {
    /// Create a supervisor in the searching state
    pub fn new(
        backend: B,
        config: LinkConfig,
        diagnostics: Arc<dyn Diagnostics>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            backend,
            config,
            state: LinkState::Searching,
            listener: None,
            diagnostics,
            clock,
            shutdown: Arc::new(AtomicBool::new(false)),
            chunk: Vec::with_capacity(64),
        }
    }

    /// Register the raw data listener, replacing any previous one
    pub fn set_listener(&mut self, listener: Box<dyn RawDataSink>) {
        self.listener = Some(listener);
    }

    /// Remove the raw data listener
    pub fn clear_listener(&mut self) {
        self.listener = None;
    }

    /// Flag that stops [`run`](Self::run) once set to `true`
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        self.shutdown.clone()
    }

    /// Current state
    pub fn status(&self) -> LinkStatus {
        match &self.state {
            LinkState::Searching => LinkStatus::Searching,
            LinkState::Connected(handle) => LinkStatus::Connected(handle.device.clone()),
        }
    }

    /// Open `device` briefly and check that it is streaming
    ///
    /// The probe connection is closed before returning, whatever the outcome.
    pub fn probe(&self, device: &str) -> Result<(), LinkError> {
        let mut channel = self.backend.open(device, self.config.probe_timeout())?;
        let expected = self.config.probe_bytes;
        let read = read_probe(&mut channel, expected).map_err(|source| LinkError::Read {
            device: device.to_string(),
            source,
        })?;

        if read == expected {
            Ok(())
        } else {
            Err(LinkError::ShortRead {
                device: device.to_string(),
                expected,
                read,
            })
        }
    }

    /// One discovery pass over the current candidates
    ///
    /// Returns the first candidate that passes the probe and reopens cleanly.
    pub fn discover(&mut self) -> Option<LinkHandle> {
        let mut candidates = self.backend.candidates();
        sort_candidates(&mut candidates);

        for device in &candidates {
            if let Err(err) = self.probe(device) {
                self.diagnostics.report(Diagnostic::LinkProbeFailure(err));
                continue;
            }

            match self.backend.open(device, self.config.read_timeout()) {
                Ok(channel) => {
                    self.diagnostics.report(Diagnostic::LinkEstablished {
                        device: device.clone(),
                    });
                    return Some(LinkHandle::new(device.clone(), channel));
                }
                Err(err) => self.diagnostics.report(Diagnostic::LinkProbeFailure(err)),
            }
        }

        self.diagnostics.report(Diagnostic::NoCandidates {
            candidates: candidates.len(),
        });
        None
    }

    /// Advance the state machine by one discovery pass or one read
    pub fn step(&mut self) -> LinkStatus {
        match std::mem::replace(&mut self.state, LinkState::Searching) {
            LinkState::Searching => match self.discover() {
                Some(handle) => self.state = LinkState::Connected(handle),
                None => self.clock.sleep(self.config.backoff()),
            },
            LinkState::Connected(mut handle) => match self.read_chunk(&mut handle) {
                Ok(()) => self.state = LinkState::Connected(handle),
                // Dropping the handle closes the port
                Err(err) => self.diagnostics.report(Diagnostic::LinkReadFailure(err)),
            },
        }

        self.status()
    }

    /// Read and forward chunks until the link fails or shutdown is requested
    pub fn stream_loop(&mut self) {
        while matches!(self.state, LinkState::Connected(_)) && !self.is_shut_down() {
            self.step();
        }
    }

    /// Alternate discovery and streaming until shutdown is requested
    pub fn run(&mut self) {
        while !self.is_shut_down() {
            match self.state {
                LinkState::Searching => {
                    self.step();
                }
                LinkState::Connected(_) => self.stream_loop(),
            }
        }
    }

    fn is_shut_down(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    /// One bounded read-until-delimiter, forwarding whatever arrived
    fn read_chunk(&mut self, handle: &mut LinkHandle) -> Result<(), LinkError> {
        self.chunk.clear();
        let outcome = read_until_delimiter(&mut handle.reader, DELIMITER, &mut self.chunk)
            .map_err(|source| LinkError::Read {
                device: handle.device.clone(),
                source,
            })?;

        if !self.chunk.is_empty() {
            if let Some(listener) = self.listener.as_mut() {
                listener.on_data(&self.chunk);
            }
        }

        match outcome {
            ReadOutcome::Delimited | ReadOutcome::TimedOut => Ok(()),
            ReadOutcome::Eof => Err(LinkError::Closed {
                device: handle.device.clone(),
            }),
        }
    }
}
