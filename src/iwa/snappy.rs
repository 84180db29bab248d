//! Snappy decompression for iWork IWA files
//!
//! iWork uses a reduced variant of the Snappy framing format:
//! - Custom chunk header format (4 bytes: type + 24-bit little-endian length)
//! - No CRC-32C checksums in front of the chunk payload
//! - The optional stream identifier chunk is validated and then skipped
//!
//! [`SnappyStream`] decodes one chunk at a time into a bounded output buffer
//! and exposes the result through [`std::io::Read`], so message payloads never
//! have to be buffered beyond a single 64 KiB block.

use std::fmt;
use std::io::{self, Read};

use snap::raw::{Decoder, decompress_len};

use crate::iwa::{Error, Result};

/// Capacity of the raw frame payload buffer
pub const INPUT_CAPACITY: usize = 128 * 1024;

/// Capacity of the buffer holding one decoded block
pub const OUTPUT_CAPACITY: usize = 64 * 1024;

/// Payload of the stream identifier chunk
pub const STREAM_MAGIC: [u8; 6] = *b"sNaPpY";

const CHUNK_COMPRESSED: u8 = 0x00;
const CHUNK_UNCOMPRESSED: u8 = 0x01;
const CHUNK_PADDING: u8 = 0xFE;
const CHUNK_STREAM_IDENTIFIER: u8 = 0xFF;

/// Streaming decompressor for the CRC-less Snappy framing used by IWA files
pub struct SnappyStream<R> {
    inner: R,
    decoder: Decoder,
    input: Box<[u8]>,
    output: Box<[u8]>,
    pos: usize,
    filled: usize,
    eof: bool,
}

impl<R: Read> SnappyStream<R> {
    /// Wrap a framed byte stream
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            decoder: Decoder::new(),
            input: vec![0u8; INPUT_CAPACITY].into_boxed_slice(),
            output: vec![0u8; OUTPUT_CAPACITY].into_boxed_slice(),
            pos: 0,
            filled: 0,
            eof: false,
        }
    }

    /// Decompress a whole framed stream into memory
    pub fn decompress(reader: R) -> Result<Vec<u8>> {
        let mut stream = Self::new(reader);
        let mut data = Vec::new();
        stream.read_to_end(&mut data)?;
        Ok(data)
    }

    /// Consume the decompressor and return the wrapped stream
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Read the next 4-byte frame header.
    ///
    /// Running out of input anywhere inside the header is the logical end of
    /// the stream.
    fn read_header(&mut self) -> Result<Option<(u8, usize)>> {
        let mut header = [0u8; 4];
        let mut read = 0;
        while read < header.len() {
            match self.inner.read(&mut header[read..]) {
                Ok(0) => return Ok(None),
                Ok(n) => read += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        let length = u32::from_le_bytes([header[1], header[2], header[3], 0]) as usize;
        Ok(Some((header[0], length)))
    }

    /// Read exactly `buf.len()` payload bytes; a short read is a format error.
    fn read_payload(inner: &mut R, buf: &mut [u8]) -> Result<()> {
        match inner.read_exact(buf) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(Error::Format(format!(
                "Truncated frame: expected {} payload bytes",
                buf.len()
            ))),
            Err(e) => Err(e.into()),
        }
    }

    fn skip_payload(&mut self, length: usize) -> Result<()> {
        let skipped = io::copy(&mut (&mut self.inner).take(length as u64), &mut io::sink())?;
        if skipped < length as u64 {
            return Err(Error::Format(format!(
                "Truncated frame: expected {} payload bytes, got {}",
                length, skipped
            )));
        }
        Ok(())
    }

    /// Refill the output buffer with the next data chunk.
    ///
    /// Returns `false` once the framed stream is exhausted.
    fn fill_buffer(&mut self) -> Result<bool> {
        loop {
            if self.eof {
                return Ok(false);
            }

            let Some((chunk_type, length)) = self.read_header()? else {
                self.eof = true;
                return Ok(false);
            };

            self.pos = 0;
            self.filled = 0;

            match chunk_type {
                CHUNK_COMPRESSED => {
                    if length > INPUT_CAPACITY {
                        return Err(Error::Format(format!(
                            "Compressed chunk size exceeds buffer capacity: {} > {}",
                            length, INPUT_CAPACITY
                        )));
                    }
                    Self::read_payload(&mut self.inner, &mut self.input[..length])?;

                    let compressed = &self.input[..length];
                    let expected = decompress_len(compressed).map_err(|e| {
                        Error::Format(format!("Corrupt compressed chunk: {}", e))
                    })?;
                    if expected > OUTPUT_CAPACITY {
                        return Err(Error::Format(format!(
                            "Decompressed chunk size exceeds buffer capacity: {} > {}",
                            expected, OUTPUT_CAPACITY
                        )));
                    }

                    self.filled = self
                        .decoder
                        .decompress(compressed, &mut self.output)
                        .map_err(|e| Error::Format(format!("Decompression failed: {}", e)))?;
                },
                CHUNK_UNCOMPRESSED => {
                    if length > OUTPUT_CAPACITY {
                        return Err(Error::Format(format!(
                            "Uncompressed chunk size exceeds buffer capacity: {} > {}",
                            length, OUTPUT_CAPACITY
                        )));
                    }
                    Self::read_payload(&mut self.inner, &mut self.output[..length])?;
                    self.filled = length;
                },
                CHUNK_PADDING => self.skip_payload(length)?,
                CHUNK_STREAM_IDENTIFIER => {
                    if length != STREAM_MAGIC.len() {
                        return Err(Error::Format(format!(
                            "Stream identifier data should be exactly 6 bytes long, but was: {}",
                            length
                        )));
                    }
                    let mut magic = [0u8; 6];
                    Self::read_payload(&mut self.inner, &mut magic)?;
                    if magic != STREAM_MAGIC {
                        return Err(Error::Format(
                            "Could not find magic bytes in stream identifier".to_string(),
                        ));
                    }
                },
                other if other & 0x80 != 0 => self.skip_payload(length)?,
                other => {
                    return Err(Error::Format(format!(
                        "Detected unskippable snappy chunk; type={}; len={}",
                        other, length
                    )));
                },
            }

            // Empty data chunks carry nothing; keep going so a read never
            // reports a premature end of stream.
            if self.filled > 0 {
                return Ok(true);
            }
        }
    }
}

impl<R: Read> Read for SnappyStream<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.pos >= self.filled && !self.fill_buffer().map_err(Error::into_io)? {
            return Ok(0);
        }

        let n = buf.len().min(self.filled - self.pos);
        buf[..n].copy_from_slice(&self.output[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

impl<R> fmt::Debug for SnappyStream<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnappyStream")
            .field("pos", &self.pos)
            .field("filled", &self.filled)
            .field("eof", &self.eof)
            .finish_non_exhaustive()
    }
}
