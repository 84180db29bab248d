//! Variable-length integer encoding/decoding for IWA format
//!
//! IWA record headers are length-delimited: each `ArchiveInfo` is preceded
//! by its byte length encoded as a Protocol Buffers varint, which stores
//! values in 7-bit chunks with the most significant bit indicating
//! continuation.

use std::io::{self, Read};

/// Encode a u64 value as a variable-length integer
pub fn encode_varint(mut value: u64) -> Vec<u8> {
    let mut buf = Vec::new();
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        buf.push(byte);
        if value == 0 {
            break;
        }
    }
    buf
}

/// Decode a variable-length integer from a reader
pub fn decode_varint<R: Read>(reader: &mut R) -> io::Result<u64> {
    match try_decode_varint(reader)? {
        Some(value) => Ok(value),
        None => Err(io::Error::from(io::ErrorKind::UnexpectedEof)),
    }
}

/// Decode a variable-length integer, returning `None` when the reader is
/// already at end of stream.
///
/// End of stream after the first byte is an `UnexpectedEof` error.
pub fn try_decode_varint<R: Read>(reader: &mut R) -> io::Result<Option<u64>> {
    let mut value: u64 = 0;
    let mut shift = 0;
    let mut buf = [0u8; 1];

    loop {
        let n = read_byte(reader, &mut buf)?;
        if n == 0 {
            if shift == 0 {
                return Ok(None);
            }
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "Truncated variable-length integer",
            ));
        }
        let byte = buf[0];

        // Check for overflow
        if shift >= 64 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Variable-length integer overflow",
            ));
        }

        value |= ((byte & 0x7F) as u64) << shift;

        if (byte & 0x80) == 0 {
            break;
        }

        shift += 7;
    }

    Ok(Some(value))
}

fn read_byte<R: Read>(reader: &mut R, buf: &mut [u8; 1]) -> io::Result<usize> {
    loop {
        match reader.read(buf) {
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            other => return other,
        }
    }
}
