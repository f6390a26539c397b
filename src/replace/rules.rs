//! Rule sets: source string -> destination string

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ReplaceError, Result};

/// Length of a string in code units
#[inline]
pub(crate) fn unit_len(s: &str) -> usize {
    s.encode_utf16().count()
}

/// Immutable-by-convention mapping of keys to replacement values.
///
/// Keys are distinct; inserting an existing key replaces its value.
/// Deserializes from a plain JSON object: `{"a": "foo", "b": "bar"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet {
    rules: BTreeMap<String, String>,
}

impl RuleSet {
    /// Create an empty rule set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule, returning the value it replaced (last write wins)
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.rules.insert(key.into(), value.into())
    }

    /// Builder-style insert
    pub fn with_rule(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.rules.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterate rules in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.rules.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Longest key in code units (0 if empty)
    pub fn max_key_len(&self) -> usize {
        self.rules.keys().map(|k| unit_len(k)).max().unwrap_or(0)
    }

    /// Longest value in code units (0 if empty)
    pub fn max_value_len(&self) -> usize {
        self.rules.values().map(|v| unit_len(v)).max().unwrap_or(0)
    }

    /// Every key is exactly one code unit
    pub fn all_keys_single_unit(&self) -> bool {
        self.rules.keys().all(|k| unit_len(k) == 1)
    }

    /// Every value is exactly one code unit
    pub fn all_values_single_unit(&self) -> bool {
        self.rules.values().all(|v| unit_len(v) == 1)
    }

    /// Reject empty keys; behavior is only defined for non-empty ones
    pub fn validate(&self) -> Result<()> {
        if self.rules.contains_key("") {
            return Err(ReplaceError::invalid_rules("empty key is not allowed"));
        }
        Ok(())
    }
}

impl<K, V> FromIterator<(K, V)> for RuleSet
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut rules = RuleSet::new();
        for (k, v) in iter {
            rules.insert(k, v);
        }
        rules
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for RuleSet
where
    K: Into<String>,
    V: Into<String>,
{
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}
