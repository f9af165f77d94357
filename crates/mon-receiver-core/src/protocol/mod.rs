//! Controller Wire Protocol
//!
//! Implements the framing used by the ventilator controller: fixed-width
//! measurement records, CRC32-protected, COBS-stuffed and separated by a
//! single `0x00` delimiter.

mod error;
pub mod frame;
mod packet;

pub use error::ProtocolError;
pub use frame::{decode_frame, FrameDecoder};
pub use packet::Packet;

/// Frame delimiter; never appears inside a stuffed frame
pub const DELIMITER: u8 = 0x00;

/// Width of the NUL-padded name field
pub const NAME_LEN: usize = 6;

/// Offset of the CRC field, which covers every byte before it
pub const CRC_OFFSET: usize = NAME_LEN + 4;

/// Size of an unstuffed record
pub const RECORD_LEN: usize = CRC_OFFSET + 4;

/// Maximum unterminated data kept by the decoder
pub const MAX_BUFFER_SIZE: usize = 8192;
