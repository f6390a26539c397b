//! Streaming Replacer
//!
//! Pulls code units from a source, rewrites them with compiled rules and
//! hands them out on demand. Input is never materialized as a whole:
//! - inbound holds unmatched input, at least `min_lookahead` units unless
//!   the source is drained
//! - outbound holds units already decided and ready for the caller
//!
//! Each step resolves one input position: the longest rule starting there is
//! replaced and skipped, otherwise one unit passes through unchanged.

use std::io::Write;
use std::mem;

use log::{debug, warn};

use super::strategy::{Compiled, CompiledRuleSet};
use crate::config::BufferLimits;
use crate::error::{ReplaceError, Result};
use crate::streaming::{BoundedRingBuffer, CodeUnit, UnitSource};
use crate::telemetry::StreamStats;

/// Units moved per internal read when draining to a string or writer
const DRAIN_CHUNK: usize = 4096;

/// A compiled rule set bound to one source. Single owner, not shared.
pub struct ReplaceStream<S> {
    rules: CompiledRuleSet,
    source: S,
    limits: BufferLimits,
    /// Source units not yet matched
    inbound: BoundedRingBuffer<CodeUnit>,
    /// Replaced units ready to read
    outbound: BoundedRingBuffer<CodeUnit>,
    /// Refill staging area
    scratch: Vec<CodeUnit>,
    /// Source returned end of stream
    exhausted: bool,
    stats: StreamStats,
}

impl<S: UnitSource> ReplaceStream<S> {
    /// Bind compiled rules to a source with the given buffer sizing
    pub fn new(rules: CompiledRuleSet, source: S, limits: BufferLimits) -> Self {
        let stats = StreamStats::new(rules.strategy());
        Self {
            inbound: BoundedRingBuffer::new(limits.inbound_initial, limits.inbound_max),
            outbound: BoundedRingBuffer::new(limits.outbound_initial, limits.outbound_max),
            scratch: vec![0; limits.read_chunk_size.max(1)],
            exhausted: false,
            rules,
            source,
            limits,
            stats,
        }
    }

    /// Read one replaced unit; `None` at end of stream
    pub fn read(&mut self) -> Result<Option<CodeUnit>> {
        while self.outbound.is_empty() {
            if !self.advance()? {
                return Ok(None);
            }
        }
        let unit = self.outbound.take()?;
        self.stats.units_written += 1;
        Ok(Some(unit))
    }

    /// Fill `buf` with replaced units.
    ///
    /// Returns how many were written, or `None` at end of stream. Only the
    /// end of the stream yields fewer than `buf.len()`.
    pub fn read_into(&mut self, buf: &mut [CodeUnit]) -> Result<Option<usize>> {
        if buf.is_empty() {
            return Ok(Some(0));
        }

        if self.outbound.is_empty() && self.inbound.is_empty() && !self.exhausted {
            let rules = self.rules.clone();
            if let Compiled::Direct(table) = rules.compiled() {
                return self.read_direct(table, buf);
            }
        }

        let mut written = 0;
        while written < buf.len() {
            if self.outbound.is_empty() {
                if !self.advance()? {
                    break;
                }
                continue;
            }
            written += self.outbound.take_into(&mut buf[written..]);
        }

        self.stats.units_written += written as u64;
        Ok(if written == 0 { None } else { Some(written) })
    }

    /// Drain the rest of the stream into a string
    pub fn read_to_string(&mut self) -> Result<String> {
        let mut units = Vec::new();
        let mut chunk = vec![0; DRAIN_CHUNK];
        while let Some(n) = self.read_into(&mut chunk)? {
            units.extend_from_slice(&chunk[..n]);
        }
        Ok(String::from_utf16_lossy(&units))
    }

    /// Drain the rest of the stream into `writer` as UTF-8.
    ///
    /// Returns the number of bytes written.
    pub fn copy_to<W: Write>(&mut self, writer: &mut W) -> Result<u64> {
        let mut chunk = vec![0; DRAIN_CHUNK];
        let mut text = String::new();
        let mut carry = None;
        let mut total = 0u64;

        loop {
            // A high surrogate held back from the previous chunk goes first
            let start = match carry.take() {
                Some(high) => {
                    chunk[0] = high;
                    1
                }
                None => 0,
            };
            let Some(n) = self.read_into(&mut chunk[start..])? else {
                if start == 1 {
                    text.clear();
                    text.push(char::REPLACEMENT_CHARACTER);
                    total += write_text(writer, &text)?;
                }
                break;
            };

            let mut end = start + n;
            if is_high_surrogate(chunk[end - 1]) {
                carry = Some(chunk[end - 1]);
                end -= 1;
            }

            text.clear();
            text.extend(
                char::decode_utf16(chunk[..end].iter().copied())
                    .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER)),
            );
            total += write_text(writer, &text)?;
        }

        writer.flush().map_err(ReplaceError::SinkWrite)?;
        Ok(total)
    }

    /// New stream over `source` sharing these compiled rules and sizing,
    /// with fresh empty buffers
    pub fn fork<T: UnitSource>(&self, source: T) -> ReplaceStream<T> {
        debug!("Forking {:?} stream", self.rules.strategy());
        ReplaceStream::new(self.rules.clone(), source, self.limits)
    }

    /// Rebind to a new source, dropping all in-flight state.
    ///
    /// Returns the previous source.
    pub fn set_source(&mut self, source: S) -> S {
        debug!(
            "Rebinding stream source ({} units pending discarded)",
            self.inbound.len() + self.outbound.len()
        );
        let previous = mem::replace(&mut self.source, source);
        self.inbound.clear();
        self.outbound.clear();
        self.exhausted = false;
        self.stats.reset();
        previous
    }

    pub fn rules(&self) -> &CompiledRuleSet {
        &self.rules
    }

    pub fn stats(&self) -> &StreamStats {
        &self.stats
    }

    pub fn limits(&self) -> BufferLimits {
        self.limits
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn into_source(self) -> S {
        self.source
    }

    /// Direct table fast path: read straight into the caller's buffer and
    /// map in place, pulling until `buf` is full or the source runs dry.
    /// Only valid while both buffers are empty.
    fn read_direct(&mut self, table: &[CodeUnit], buf: &mut [CodeUnit]) -> Result<Option<usize>> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = pull(&mut self.source, &mut buf[filled..])?;
            if n == 0 {
                self.exhausted = true;
                break;
            }

            for unit in &mut buf[filled..filled + n] {
                let mapped = table[usize::from(*unit)];
                if mapped != *unit {
                    self.stats.replacements += 1;
                    *unit = mapped;
                }
            }
            filled += n;
        }

        self.stats.units_read += filled as u64;
        self.stats.units_written += filled as u64;
        if filled == 0 {
            self.mark_end();
            return Ok(None);
        }
        Ok(Some(filled))
    }

    fn advance(&mut self) -> Result<bool> {
        self.step().map_err(|e| {
            if e.is_capacity_exceeded() {
                warn!(
                    "Stream buffer ceiling hit (inbound max {}, outbound max {}, lookahead {})",
                    self.limits.inbound_max,
                    self.limits.outbound_max,
                    self.rules.min_lookahead()
                );
            }
            e
        })
    }

    /// Resolve one input position. `false` once input is drained.
    fn step(&mut self) -> Result<bool> {
        self.refill()?;
        if self.inbound.is_empty() {
            self.mark_end();
            return Ok(false);
        }

        match self.rules.compiled() {
            Compiled::Direct(table) => {
                let unit = self.inbound.take()?;
                let mapped = table[usize::from(unit)];
                if mapped != unit {
                    self.stats.replacements += 1;
                }
                self.outbound.put(mapped)?;
            }
            Compiled::Expansion(table) => {
                let unit = self.inbound.take()?;
                match &table[usize::from(unit)] {
                    Some(fragment) => {
                        self.outbound.put_all(fragment)?;
                        self.stats.replacements += 1;
                    }
                    None => self.outbound.put(unit)?,
                }
            }
            Compiled::General(trie) => match trie.longest_match_at_head(&self.inbound) {
                Some(terminal) => {
                    debug!("Matched {:?} ({} units)", terminal.key, terminal.key_len);
                    self.inbound.skip(terminal.key_len)?;
                    self.outbound.put_all(&terminal.replacement)?;
                    self.stats.replacements += 1;
                }
                None => {
                    let unit = self.inbound.take()?;
                    self.outbound.put(unit)?;
                }
            },
        }
        Ok(true)
    }

    /// Top inbound up to the lookahead, unless the source is drained
    fn refill(&mut self) -> Result<()> {
        let lookahead = self.rules.min_lookahead();
        while !self.exhausted && self.inbound.len() < lookahead {
            let room = self.inbound.max_capacity() - self.inbound.len();
            let want = match self.rules.compiled() {
                Compiled::General(_) => self.scratch.len().min(room),
                // Table variants hold at most one input unit
                Compiled::Direct(_) | Compiled::Expansion(_) => lookahead - self.inbound.len(),
            }
            .max(1);

            let n = pull(&mut self.source, &mut self.scratch[..want])?;
            if n == 0 {
                self.exhausted = true;
                break;
            }
            self.stats.units_read += n as u64;
            self.inbound.put_all(&self.scratch[..n])?;
        }
        Ok(())
    }

    fn mark_end(&mut self) {
        if !self.stats.end_of_stream {
            self.stats.end_of_stream = true;
            if self.limits.log_stats {
                self.stats.emit();
            }
        }
    }
}

impl<S: UnitSource> Iterator for ReplaceStream<S> {
    type Item = Result<CodeUnit>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read().transpose()
    }
}

fn pull<S: UnitSource>(source: &mut S, buf: &mut [CodeUnit]) -> Result<usize> {
    source.read_units(buf).map_err(|e| {
        warn!("Source read failed: {}", e);
        ReplaceError::SourceRead(e)
    })
}

fn write_text<W: Write>(writer: &mut W, text: &str) -> Result<u64> {
    writer
        .write_all(text.as_bytes())
        .map_err(ReplaceError::SinkWrite)?;
    Ok(text.len() as u64)
}

#[inline]
fn is_high_surrogate(unit: CodeUnit) -> bool {
    (0xD800..=0xDBFF).contains(&unit)
}
