//! Packet encoding/decoding
//!
//! Implements the fixed-width measurement record sent by the controller.
//!
//! Record format (after COBS unstuffing, little-endian):
//! - 6 bytes: ASCII name, NUL-padded on the right
//! - 4 bytes: f32 value
//! - 4 bytes: CRC32 of the preceding 10 bytes

use std::fmt;

use byteorder::{ByteOrder, LittleEndian};

use super::{ProtocolError, CRC_OFFSET, DELIMITER, NAME_LEN, RECORD_LEN};

/// A validated measurement packet
#[derive(Debug, Clone, PartialEq)]
pub struct Packet {
    name: String,
    value: f32,
    checksum: u32,
}

impl Packet {
    /// Create an outgoing packet, computing its checksum
    pub fn new(name: &str, value: f32) -> Result<Self, ProtocolError> {
        if !is_printable(name.as_bytes()) {
            return Err(ProtocolError::NonAsciiName(name.as_bytes().to_vec()));
        }
        if name.len() > NAME_LEN {
            return Err(ProtocolError::NameTooLong(name.to_string()));
        }

        let mut record = [0u8; RECORD_LEN];
        write_body(&mut record, name, value);
        let checksum = crc32fast::hash(&record[..CRC_OFFSET]);

        Ok(Self {
            name: name.to_string(),
            value,
            checksum,
        })
    }

    /// Decode and verify an unstuffed record
    pub fn from_record(data: &[u8]) -> Result<Self, ProtocolError> {
        if data.len() != RECORD_LEN {
            return Err(ProtocolError::Malformed {
                expected: RECORD_LEN,
                actual: data.len(),
            });
        }

        let name = decode_name(&data[..NAME_LEN])?;
        let value = LittleEndian::read_f32(&data[NAME_LEN..CRC_OFFSET]);
        let received_crc = LittleEndian::read_u32(&data[CRC_OFFSET..]);

        let expected_crc = crc32fast::hash(&data[..CRC_OFFSET]);
        if received_crc != expected_crc {
            return Err(ProtocolError::CrcMismatch {
                expected: expected_crc,
                actual: received_crc,
            });
        }

        Ok(Self {
            name,
            value,
            checksum: received_crc,
        })
    }

    /// Encode the packet to its 14-byte record
    pub fn to_record(&self) -> [u8; RECORD_LEN] {
        let mut record = [0u8; RECORD_LEN];
        write_body(&mut record, &self.name, self.value);
        LittleEndian::write_u32(&mut record[CRC_OFFSET..], self.checksum);
        record
    }

    /// Encode the packet as a COBS frame terminated by the delimiter
    pub fn to_frame(&self) -> Vec<u8> {
        let mut frame = cobs::encode_vec(&self.to_record());
        frame.push(DELIMITER);
        frame
    }

    /// Measurement name, without padding
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Measured value
    pub fn value(&self) -> f32 {
        self.value
    }

    /// CRC32 carried in the record
    pub fn checksum(&self) -> u32 {
        self.checksum
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={} (crc {:#010x})", self.name, self.value, self.checksum)
    }
}

fn write_body(record: &mut [u8; RECORD_LEN], name: &str, value: f32) {
    record[..name.len()].copy_from_slice(name.as_bytes());
    LittleEndian::write_f32(&mut record[NAME_LEN..CRC_OFFSET], value);
}

/// Interpret the name field, dropping trailing NUL padding
fn decode_name(raw: &[u8]) -> Result<String, ProtocolError> {
    let end = raw.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    let trimmed = &raw[..end];
    if !is_printable(trimmed) {
        return Err(ProtocolError::NonAsciiName(raw.to_vec()));
    }
    Ok(String::from_utf8_lossy(trimmed).into_owned())
}

/// ASCII without control bytes; embedded NULs count as control bytes
fn is_printable(bytes: &[u8]) -> bool {
    bytes.iter().all(|b| b.is_ascii() && !b.is_ascii_control())
}
