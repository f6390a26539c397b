//! Strategy selection and rule compilation
//!
//! Rules are compiled once into the cheapest representation that can
//! express them, then shared by every stream built from them:
//! - Direct: single unit -> single unit, one flat table lookup
//! - Expansion: single unit -> any string, one flat table of fragments
//! - General: anything else, prefix tree plus lookahead buffering

use std::fmt;
use std::sync::Arc;

use log::debug;
use serde::Serialize;

use super::rules::RuleSet;
use super::stream::ReplaceStream;
use crate::config::{BufferLimits, EngineConfig};
use crate::error::{ReplaceError, Result};
use crate::streaming::{CodeUnit, RuleTrie, StrSource, UnitSource};

/// One table slot per possible code unit
const TABLE_SIZE: usize = 1 << 16;

/// Replacer variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Every key and value is one code unit
    Direct,
    /// Every key is one code unit
    Expansion,
    /// Arbitrary keys
    General,
}

impl Strategy {
    /// Whether `rules` satisfy this variant's precondition
    pub fn supports(&self, rules: &RuleSet) -> bool {
        match self {
            Strategy::Direct => rules.all_keys_single_unit() && rules.all_values_single_unit(),
            Strategy::Expansion => rules.all_keys_single_unit(),
            Strategy::General => true,
        }
    }
}

/// Cheapest variant that can express `rules`. Pure.
pub fn select_strategy(rules: &RuleSet) -> Strategy {
    if !rules.all_keys_single_unit() {
        Strategy::General
    } else if rules.all_values_single_unit() {
        Strategy::Direct
    } else {
        Strategy::Expansion
    }
}

/// Compiled lookup structure, one per variant
pub(crate) enum Compiled {
    /// `table[u]` is the replacement for `u` (identity by default)
    Direct(Box<[CodeUnit]>),
    /// `table[u]` is the expansion for `u`; `None` means emit `u` unchanged
    Expansion(Box<[Option<Box<[CodeUnit]>>]>),
    General(RuleTrie),
}

struct Inner {
    compiled: Compiled,
    strategy: Strategy,
    rule_count: usize,
    min_lookahead: usize,
    max_replacement_len: usize,
}

/// Immutable compiled rules, cheap to clone and safe to share across threads.
///
/// Streams built from the same `CompiledRuleSet` share its tables but own
/// their buffers.
#[derive(Clone)]
pub struct CompiledRuleSet {
    inner: Arc<Inner>,
}

impl CompiledRuleSet {
    /// Compile with the cheapest sufficient strategy
    pub fn compile(rules: &RuleSet) -> Result<Self> {
        Self::compile_with(rules, select_strategy(rules))
    }

    /// Compile with an explicit strategy.
    ///
    /// Fails with `InvalidRuleSet` if the rules do not meet the strategy's
    /// precondition (e.g. a multi-unit key for `Direct`).
    pub fn compile_with(rules: &RuleSet, strategy: Strategy) -> Result<Self> {
        rules.validate()?;
        if !strategy.supports(rules) {
            return Err(ReplaceError::invalid_rules(format!(
                "rules do not fit the {:?} strategy",
                strategy
            )));
        }

        let compiled = match strategy {
            Strategy::Direct => Compiled::Direct(build_direct_table(rules)),
            Strategy::Expansion => Compiled::Expansion(build_expansion_table(rules)),
            Strategy::General => {
                let mut trie = RuleTrie::new();
                for (key, value) in rules.iter() {
                    trie.insert(key, value);
                }
                Compiled::General(trie)
            }
        };

        let min_lookahead = rules.max_key_len().max(1);
        debug!(
            "Compiled {} rules with {:?} strategy (lookahead {})",
            rules.len(),
            strategy,
            min_lookahead
        );

        Ok(Self {
            inner: Arc::new(Inner {
                compiled,
                strategy,
                rule_count: rules.len(),
                min_lookahead,
                max_replacement_len: rules.max_value_len(),
            }),
        })
    }

    pub fn strategy(&self) -> Strategy {
        self.inner.strategy
    }

    pub fn rule_count(&self) -> usize {
        self.inner.rule_count
    }

    /// Units of input needed to resolve the longest key (at least 1)
    pub fn min_lookahead(&self) -> usize {
        self.inner.min_lookahead
    }

    /// Longest replacement in code units
    pub fn max_replacement_len(&self) -> usize {
        self.inner.max_replacement_len
    }

    /// Bind to a source with default buffer sizing, raised to fit these rules
    pub fn stream<S: UnitSource>(&self, source: S) -> ReplaceStream<S> {
        ReplaceStream::new(self.clone(), source, self.default_limits())
    }

    /// Bind to a source with buffer sizing from `config` (its rules are ignored)
    pub fn stream_with_config<S: UnitSource>(&self, source: S, config: &EngineConfig) -> ReplaceStream<S> {
        ReplaceStream::new(self.clone(), source, config.limits())
    }

    /// Rewrite a whole string
    pub fn transform(&self, input: &str) -> Result<String> {
        match &self.inner.compiled {
            Compiled::Direct(table) => {
                let units: Vec<CodeUnit> = input
                    .encode_utf16()
                    .map(|u| table[usize::from(u)])
                    .collect();
                Ok(String::from_utf16_lossy(&units))
            }
            Compiled::Expansion(table) => {
                let mut units = Vec::with_capacity(input.len());
                for u in input.encode_utf16() {
                    match &table[usize::from(u)] {
                        Some(fragment) => units.extend_from_slice(fragment),
                        None => units.push(u),
                    }
                }
                Ok(String::from_utf16_lossy(&units))
            }
            Compiled::General(_) => self.stream(StrSource::new(input)).read_to_string(),
        }
    }

    fn default_limits(&self) -> BufferLimits {
        BufferLimits::default().fitted(self.min_lookahead(), self.max_replacement_len())
    }

    pub(crate) fn compiled(&self) -> &Compiled {
        &self.inner.compiled
    }
}

impl fmt::Debug for CompiledRuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledRuleSet")
            .field("strategy", &self.inner.strategy)
            .field("rule_count", &self.inner.rule_count)
            .field("min_lookahead", &self.inner.min_lookahead)
            .finish()
    }
}

/// The code unit of a one-unit string
fn single_unit(s: &str) -> Option<CodeUnit> {
    let mut units = s.encode_utf16();
    match (units.next(), units.next()) {
        (Some(u), None) => Some(u),
        _ => None,
    }
}

fn build_direct_table(rules: &RuleSet) -> Box<[CodeUnit]> {
    let mut table: Vec<CodeUnit> = (0..=CodeUnit::MAX).collect();
    for (key, value) in rules.iter() {
        if let (Some(k), Some(v)) = (single_unit(key), single_unit(value)) {
            table[usize::from(k)] = v;
        }
    }
    table.into_boxed_slice()
}

fn build_expansion_table(rules: &RuleSet) -> Box<[Option<Box<[CodeUnit]>>]> {
    let mut table: Vec<Option<Box<[CodeUnit]>>> = vec![None; TABLE_SIZE];
    for (key, value) in rules.iter() {
        if let Some(k) = single_unit(key) {
            table[usize::from(k)] = Some(value.encode_utf16().collect());
        }
    }
    table.into_boxed_slice()
}
