//! Pull-based code unit sources
//!
//! A `UnitSource` is what a replace stream reads from. It behaves like
//! `std::io::Read` over UTF-16 code units: `Ok(0)` for a non-empty buffer
//! means end of stream.

use std::io::{self, Read};

use super::utf8_decoder::Utf8Decoder;
use super::CodeUnit;

/// Default byte chunk for reader-backed sources
const DEFAULT_BYTE_CHUNK: usize = 8 * 1024;

/// Incremental source of code units
pub trait UnitSource {
    /// Fill `buf` with up to `buf.len()` units.
    ///
    /// Returns the number written; 0 (for a non-empty `buf`) means exhausted.
    fn read_units(&mut self, buf: &mut [CodeUnit]) -> io::Result<usize>;
}

impl<S: UnitSource + ?Sized> UnitSource for &mut S {
    fn read_units(&mut self, buf: &mut [CodeUnit]) -> io::Result<usize> {
        (**self).read_units(buf)
    }
}

impl<S: UnitSource + ?Sized> UnitSource for Box<S> {
    fn read_units(&mut self, buf: &mut [CodeUnit]) -> io::Result<usize> {
        (**self).read_units(buf)
    }
}

/// In-memory text, held as UTF-16
#[derive(Debug, Clone, Default)]
pub struct StrSource {
    units: Vec<CodeUnit>,
    position: usize,
}

impl StrSource {
    pub fn new(text: &str) -> Self {
        Self::from_units(text.encode_utf16().collect())
    }

    pub fn from_units(units: Vec<CodeUnit>) -> Self {
        Self { units, position: 0 }
    }

    /// Units not yet read
    pub fn remaining(&self) -> usize {
        self.units.len() - self.position
    }
}

impl From<&str> for StrSource {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for StrSource {
    fn from(text: String) -> Self {
        Self::new(&text)
    }
}

impl UnitSource for StrSource {
    fn read_units(&mut self, buf: &mut [CodeUnit]) -> io::Result<usize> {
        let count = self.remaining().min(buf.len());
        buf[..count].copy_from_slice(&self.units[self.position..self.position + count]);
        self.position += count;
        Ok(count)
    }
}

/// Decodes a UTF-8 byte reader on demand
pub struct Utf8ReadSource<R> {
    reader: R,
    decoder: Utf8Decoder,
    /// Raw bytes read per pull
    bytes: Vec<u8>,
    /// Decoded units not yet handed out
    decoded: Vec<CodeUnit>,
    /// Read position in `decoded`
    position: usize,
    /// Reader returned 0
    eof: bool,
}

impl<R: Read> Utf8ReadSource<R> {
    pub fn new(reader: R) -> Self {
        Self::with_chunk_size(reader, DEFAULT_BYTE_CHUNK)
    }

    /// Create with a custom number of bytes read per pull
    pub fn with_chunk_size(reader: R, chunk_size: usize) -> Self {
        Self {
            reader,
            decoder: Utf8Decoder::new(),
            bytes: vec![0u8; chunk_size.max(1)],
            decoded: Vec::new(),
            position: 0,
            eof: false,
        }
    }

    /// Give back the wrapped reader
    pub fn into_inner(self) -> R {
        self.reader
    }

    fn pull(&mut self) -> io::Result<()> {
        self.decoded.clear();
        self.position = 0;

        let read = loop {
            match self.reader.read(&mut self.bytes) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        };

        if read == 0 {
            self.eof = true;
            self.decoder.finish(&mut self.decoded);
        } else {
            self.decoder.decode_chunk(&self.bytes[..read], &mut self.decoded);
        }
        Ok(())
    }
}

impl<R: Read> UnitSource for Utf8ReadSource<R> {
    fn read_units(&mut self, buf: &mut [CodeUnit]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        // A pull may decode nothing (only a held-back partial sequence)
        while self.position == self.decoded.len() {
            if self.eof {
                return Ok(0);
            }
            self.pull()?;
        }

        let available = &self.decoded[self.position..];
        let count = available.len().min(buf.len());
        buf[..count].copy_from_slice(&available[..count]);
        self.position += count;
        Ok(count)
    }
}
