//! Brute-force reference replacer
//!
//! Defines the semantics every optimized variant must reproduce. For the
//! remaining input at `pos`, every rule key is searched from `pos`; the match
//! that starts earliest wins, and on equal starts the longest key wins. The
//! untouched gap is copied, then the replacement, and `pos` moves past the
//! key. O(n * m) - for verification only.

use super::rules::RuleSet;
use crate::error::Result;
use crate::streaming::{BoundedRingBuffer, CodeUnit};

/// Correctness oracle for the streaming replacers
#[derive(Debug, Clone)]
pub struct ReferenceReplacer {
    rules: Vec<(Vec<CodeUnit>, Vec<CodeUnit>)>,
}

impl ReferenceReplacer {
    pub fn new(rules: &RuleSet) -> Result<Self> {
        rules.validate()?;
        Ok(Self {
            rules: rules
                .iter()
                .map(|(k, v)| (k.encode_utf16().collect(), v.encode_utf16().collect()))
                .collect(),
        })
    }

    pub fn transform(&self, input: &str) -> Result<String> {
        let units: Vec<CodeUnit> = input.encode_utf16().collect();
        let mut text = BoundedRingBuffer::new(units.len(), units.len());
        text.put_all(&units)?;

        let mut out = Vec::with_capacity(units.len());
        let mut pos = 0;

        while pos < text.len() {
            let Some((start, rule)) = self.earliest_match(&text, pos) else {
                break;
            };
            let (key, value) = &self.rules[rule];

            out.extend(text.subrange(pos, start)?.iter());
            out.extend_from_slice(value);
            pos = start + key.len();
        }

        out.extend(text.subrange(pos, text.len())?.iter());
        Ok(String::from_utf16_lossy(&out))
    }

    /// (start, rule index) of the earliest match at or after `pos`,
    /// longest key first on a tie
    fn earliest_match(&self, text: &BoundedRingBuffer<CodeUnit>, pos: usize) -> Option<(usize, usize)> {
        let mut best: Option<(usize, usize)> = None;
        for (i, (key, _)) in self.rules.iter().enumerate() {
            let Some(start) = text.index_of(key, pos) else {
                continue;
            };
            let better = match best {
                None => true,
                Some((best_start, best_rule)) => {
                    start < best_start
                        || (start == best_start && key.len() > self.rules[best_rule].0.len())
                }
            };
            if better {
                best = Some((start, i));
            }
        }
        best
    }
}
