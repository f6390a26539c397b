//! Incremental UTF-8 to UTF-16 Decoder
//!
//! Multi-byte UTF-8 characters can split across read boundaries.
//! This decoder buffers an incomplete trailing sequence until the next
//! chunk arrives, so a byte reader can feed the engine chunk by chunk.
//!
//! At most 3 bytes are ever held back: the lead byte tells how long its
//! sequence is, and anything that cannot be completed by later bytes is
//! decoded (lossily) right away.
//!
//! Malformed input decodes to U+FFFD, as `String::from_utf8_lossy` does.

use super::CodeUnit;

/// Decodes UTF-8 chunks into UTF-16 code units, carrying split sequences.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    /// Leftover bytes from previous chunk (max 3 for an incomplete sequence)
    leftover: [u8; 4],
    leftover_len: usize,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `chunk`, appending code units to `out`.
    ///
    /// An incomplete sequence at the end of the chunk is held back.
    pub fn decode_chunk(&mut self, chunk: &[u8], out: &mut Vec<CodeUnit>) {
        let mut start = 0;

        // Step 1: finish a sequence left over from the previous chunk
        if self.leftover_len > 0 {
            let expected = Self::sequence_length(self.leftover[0]);
            while self.leftover_len < expected
                && start < chunk.len()
                && Self::is_continuation(chunk[start])
            {
                self.leftover[self.leftover_len] = chunk[start];
                self.leftover_len += 1;
                start += 1;
            }

            if self.leftover_len < expected && start == chunk.len() {
                // Still incomplete, wait for more
                return;
            }

            // Either complete, or cut short by a non-continuation byte
            let pending = &self.leftover[..self.leftover_len];
            extend_lossy(pending, out);
            self.leftover_len = 0;
        }

        // Step 2: find where complete sequences end in the rest
        let rest = &chunk[start..];
        let valid_end = Self::find_valid_boundary(rest);

        // Step 3: decode the complete part
        extend_lossy(&rest[..valid_end], out);

        // Step 4: hold back the incomplete tail
        let tail = &rest[valid_end..];
        self.leftover[..tail.len()].copy_from_slice(tail);
        self.leftover_len = tail.len();
    }

    /// Flush at end of input: a dangling partial sequence decodes lossily,
    /// exactly as it would at the end of one whole buffer
    pub fn finish(&mut self, out: &mut Vec<CodeUnit>) {
        extend_lossy(&self.leftover[..self.leftover_len], out);
        self.leftover_len = 0;
    }

    /// True while an incomplete sequence is buffered
    pub fn has_pending(&self) -> bool {
        self.leftover_len > 0
    }

    /// `10xxxxxx`
    #[inline]
    pub fn is_continuation(byte: u8) -> bool {
        (byte & 0b11000000) == 0b10000000
    }

    /// Sequence length announced by a lead byte; stray bytes count as 1
    #[inline]
    pub fn sequence_length(first_byte: u8) -> usize {
        match first_byte {
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => 1,
        }
    }

    /// Length of the prefix of `chunk` that ends on a sequence boundary
    fn find_valid_boundary(chunk: &[u8]) -> usize {
        // Scan backwards over at most 4 bytes for the last sequence start
        let mut i = chunk.len();
        while i > 0 && i > chunk.len().saturating_sub(4) {
            i -= 1;
            if !Self::is_continuation(chunk[i]) {
                let expected = Self::sequence_length(chunk[i]);
                if chunk.len() - i < expected {
                    return i;
                }
                break;
            }
        }
        chunk.len()
    }
}

fn extend_lossy(bytes: &[u8], out: &mut Vec<CodeUnit>) {
    if bytes.is_empty() {
        return;
    }
    out.extend(String::from_utf8_lossy(bytes).encode_utf16());
}
