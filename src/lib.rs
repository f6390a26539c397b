//! Streaming multi-pattern string substitution
//!
//! Rewrites a character stream according to a fixed set of
//! (source string -> destination string) rules. At every position the
//! longest rule starting there wins; the output is produced incrementally
//! without materializing the whole input.
//!
//! Rules are compiled once into the cheapest sufficient representation:
//! - Direct: single unit -> single unit (flat table)
//! - Expansion: single unit -> any string (flat table of fragments)
//! - General: arbitrary keys (prefix tree with lookahead)
//!
//! ```
//! use subst_stream::{CompiledRuleSet, RuleSet, StrSource};
//!
//! let rules = RuleSet::from([("a", "foo"), ("aa", "bar"), ("aaa", "zoo")]);
//! let compiled = CompiledRuleSet::compile(&rules).unwrap();
//! assert_eq!(compiled.transform("aaaa").unwrap(), "zoofoo");
//!
//! // Each stream owns its buffers; the compiled rules are shared
//! let mut stream = compiled.stream(StrSource::new("a aa"));
//! assert_eq!(stream.read_to_string().unwrap(), "foo bar");
//! ```
//!
//! Logging goes through the `log` facade; install any logger to see it.

pub mod config;
pub mod error;
pub mod replace;
pub mod streaming;
pub mod telemetry;

pub use config::{BufferLimits, EngineConfig};
pub use error::{BufferError, ConfigError, ReplaceError, Result};
pub use replace::{
    select_strategy, CompiledRuleSet, ReferenceReplacer, ReplaceStream, RuleSet, Strategy,
};
pub use streaming::{BoundedRingBuffer, CodeUnit, RuleTrie, StrSource, UnitSource, Utf8ReadSource};
pub use telemetry::StreamStats;

/// Compile `rules` and rewrite `input` in one go
pub fn transform(rules: &RuleSet, input: &str) -> Result<String> {
    CompiledRuleSet::compile(rules)?.transform(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_helper() {
        let rules = RuleSet::from([("a", "foo"), ("b", "bar")]);
        assert_eq!(transform(&rules, "manyafal b").unwrap(), "mfoonyfooffool bar");
    }

    #[test]
    fn test_no_rules_is_identity() {
        assert_eq!(transform(&RuleSet::new(), "klamm").unwrap(), "klamm");
    }

    #[test]
    fn test_empty_key_is_rejected() {
        let rules = RuleSet::from([("", "x")]);
        assert!(matches!(
            transform(&rules, "abc"),
            Err(ReplaceError::InvalidRuleSet { .. })
        ));
    }
}
