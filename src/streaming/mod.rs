//! Streaming primitives for the substitution engine
//!
//! This module provides:
//! - A bounded, growable ring buffer (backing store for all stream state)
//! - A prefix tree for longest-match rule lookup
//! - Pull-based code unit sources, including incremental UTF-8 decoding

pub mod ring_buffer;
pub mod rule_trie;
pub mod source;
pub mod utf8_decoder;

/// The atomic symbol the engine operates on: one UTF-16 code unit
pub type CodeUnit = u16;

pub use ring_buffer::BoundedRingBuffer;
pub use rule_trie::{RuleTrie, Terminal};
pub use source::{StrSource, UnitSource, Utf8ReadSource};
pub use utf8_decoder::Utf8Decoder;
