//! Protocol errors

use thiserror::Error;

/// Errors that can occur while recovering packets from the byte stream
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    /// The frame was not valid COBS
    #[error("Frame of {len} bytes is not COBS-decodable")]
    Stuffing {
        /// Length of the rejected frame
        len: usize,
    },

    /// The unstuffed record has the wrong size
    #[error("Malformed packet: expected {expected} bytes, got {actual}")]
    Malformed {
        /// Record size the protocol expects
        expected: usize,
        /// Size actually received
        actual: usize,
    },

    /// The name field is not printable ASCII
    #[error("Malformed packet: name is not printable ASCII ({0:02x?})")]
    NonAsciiName(Vec<u8>),

    /// The record checksum does not match its contents
    #[error("CRC mismatch: expected {expected:#010x}, got {actual:#010x}")]
    CrcMismatch {
        /// CRC computed over the received bytes
        expected: u32,
        /// CRC carried in the record
        actual: u32,
    },

    /// An outgoing packet name does not fit the fixed-width field
    #[error("Packet name '{0}' does not fit in {max} ASCII bytes", max = super::NAME_LEN)]
    NameTooLong(String),

    /// Unterminated data grew past the decoder's limit
    #[error("Buffer overflow: {0} bytes without a frame delimiter")]
    BufferOverflow(usize),
}
