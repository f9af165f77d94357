//! Frame recovery
//!
//! Rebuilds delimiter-terminated COBS frames from arbitrary read chunks and
//! turns each one into a validated [`Packet`].

use std::sync::Arc;

use super::{Packet, ProtocolError, DELIMITER, MAX_BUFFER_SIZE};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::pipeline::{PacketSink, RawDataSink};

/// Undo byte stuffing and decode one frame (delimiter excluded)
pub fn decode_frame(frame: &[u8]) -> Result<Packet, ProtocolError> {
    let record =
        cobs::decode_vec(frame).map_err(|_| ProtocolError::Stuffing { len: frame.len() })?;
    Packet::from_record(&record)
}

/// Stateful decoder fed by the serial link
///
/// Not meant to be shared between producers: one link, one decoder.
pub struct FrameDecoder {
    /// Received bytes not yet discarded
    buffer: Vec<u8>,
    /// Bytes of `buffer` already split off into frames
    consumed: usize,
    /// Upper bound on unterminated data kept around
    max_buffer: usize,
    listener: Option<Box<dyn PacketSink>>,
    diagnostics: Arc<dyn Diagnostics>,
}

impl FrameDecoder {
    /// Create a decoder with no listener
    pub fn new(diagnostics: Arc<dyn Diagnostics>) -> Self {
        Self {
            buffer: Vec::with_capacity(64),
            consumed: 0,
            max_buffer: MAX_BUFFER_SIZE,
            listener: None,
            diagnostics,
        }
    }

    /// Override the unterminated-data limit
    pub fn with_max_buffer(mut self, max_buffer: usize) -> Self {
        self.max_buffer = max_buffer;
        self
    }

    /// Register the packet listener, replacing any previous one
    pub fn set_listener(&mut self, listener: Box<dyn PacketSink>) {
        self.listener = Some(listener);
    }

    /// Remove the packet listener
    pub fn clear_listener(&mut self) {
        self.listener = None;
    }

    /// Number of buffered bytes waiting for a delimiter
    pub fn pending(&self) -> usize {
        self.buffer.len() - self.consumed
    }

    /// Split off and decode the first complete frame, if there is one
    ///
    /// Returns `None` when no delimiter is buffered.
    pub fn decode_pass(&mut self) -> Option<Result<Packet, ProtocolError>> {
        let unconsumed = &self.buffer[self.consumed..];
        let end = unconsumed.iter().position(|&b| b == DELIMITER)?;
        let result = decode_frame(&unconsumed[..end]);
        self.consumed += end + 1;
        Some(result)
    }

    /// Drain every complete frame currently buffered
    fn drain_frames(&mut self) {
        while let Some(result) = self.decode_pass() {
            match result {
                Ok(packet) => {
                    if let Some(listener) = self.listener.as_mut() {
                        listener.on_packet(packet);
                    }
                }
                Err(err) => self.diagnostics.report(Diagnostic::FrameDropped(err)),
            }
        }
    }

    /// Drop consumed bytes, and everything if a delimiter never showed up
    fn compact(&mut self) {
        if self.consumed > 0 {
            self.buffer.drain(..self.consumed);
            self.consumed = 0;
        }

        if self.buffer.len() > self.max_buffer {
            let dropped = self.buffer.len();
            self.buffer.clear();
            self.diagnostics
                .report(Diagnostic::FrameDropped(ProtocolError::BufferOverflow(dropped)));
        }
    }
}

impl RawDataSink for FrameDecoder {
    fn on_data(&mut self, chunk: &[u8]) {
        if chunk.is_empty() {
            return;
        }

        self.buffer.extend_from_slice(chunk);
        if chunk.contains(&DELIMITER) {
            self.drain_frames();
        }
        self.compact();
    }
}
