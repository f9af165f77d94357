//! Link channel abstraction
//!
//! Anything the supervisor can read from: a real serial port, or an in-memory
//! script in tests.

use std::io::{self, BufRead, Read};

/// Abstraction for byte sources feeding the link supervisor
pub trait LinkChannel: Read + Send {}

impl<T: Read + Send> LinkChannel for T {}

/// Outcome of one bounded read-until-delimiter
#[derive(Debug, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The delimiter arrived; the chunk ends with it
    Delimited,
    /// The read timeout expired first; the chunk may be empty
    TimedOut,
    /// The channel reported end of stream
    Eof,
}

/// Read into `chunk` up to and including `delimiter`
///
/// A timeout is not an error: whatever arrived before it stays in `chunk`.
pub fn read_until_delimiter<R: BufRead + ?Sized>(
    reader: &mut R,
    delimiter: u8,
    chunk: &mut Vec<u8>,
) -> io::Result<ReadOutcome> {
    match reader.read_until(delimiter, chunk) {
        Ok(0) => Ok(ReadOutcome::Eof),
        Ok(_) if chunk.last() == Some(&delimiter) => Ok(ReadOutcome::Delimited),
        // Data ran out without a delimiter, the next read reports EOF
        Ok(_) => Ok(ReadOutcome::TimedOut),
        Err(e) if is_timeout(&e) => Ok(ReadOutcome::TimedOut),
        Err(e) => Err(e),
    }
}

/// Read exactly `expected` bytes, reporting how many arrived on timeout
pub fn read_probe<R: Read + ?Sized>(reader: &mut R, expected: usize) -> io::Result<usize> {
    let mut buf = vec![0u8; expected];
    let mut filled = 0;

    while filled < expected {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) if is_timeout(&e) => break,
            Err(e) => return Err(e),
        }
    }

    Ok(filled)
}

fn is_timeout(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
    )
}
