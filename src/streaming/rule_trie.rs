//! Prefix Tree for Longest-Match Rule Lookup
//!
//! One node per code unit on some rule's key path. Shared prefixes collapse
//! into shared nodes, so a lookup is a single walk from the root:
//! - O(k) per lookup where k is the longest key
//! - Deepest terminal on the walked path wins ("aa" beats "a")
//! - Running out of buffered units ends the walk; it is not an error

use std::collections::HashMap;

use super::ring_buffer::BoundedRingBuffer;
use super::CodeUnit;

/// Payload of a node that ends a rule's key
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Terminal {
    /// The full rule key (for logging)
    pub key: String,
    /// Key length in code units - how far a match advances the input
    pub key_len: usize,
    /// Replacement code units (may be empty)
    pub replacement: Box<[CodeUnit]>,
}

#[derive(Clone, Debug, Default)]
struct TrieNode {
    children: HashMap<CodeUnit, TrieNode>,
    terminal: Option<Terminal>,
}

/// Prefix tree built once from a rule set
#[derive(Clone, Debug, Default)]
pub struct RuleTrie {
    /// Root carries no code unit and is never terminal
    root: TrieNode,
    /// Number of terminal nodes
    rule_count: usize,
    /// Longest key in code units
    max_key_len: usize,
}

impl RuleTrie {
    /// Create an empty trie
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule - O(|key|).
    ///
    /// An empty key is ignored (the root is never terminal). Re-inserting a
    /// key replaces its value and returns the old terminal.
    pub fn insert(&mut self, key: &str, value: &str) -> Option<Terminal> {
        let key_units: Vec<CodeUnit> = key.encode_utf16().collect();
        if key_units.is_empty() {
            return None;
        }

        let mut node = &mut self.root;
        for &unit in &key_units {
            node = node.children.entry(unit).or_default();
        }

        let previous = node.terminal.replace(Terminal {
            key: key.to_string(),
            key_len: key_units.len(),
            replacement: value.encode_utf16().collect(),
        });
        if previous.is_none() {
            self.rule_count += 1;
        }
        self.max_key_len = self.max_key_len.max(key_units.len());
        previous
    }

    /// Deepest rule whose key is a prefix of the buffer's unread front.
    ///
    /// `None` if the front unit starts no rule, or the buffer is empty.
    pub fn longest_match_at_head(&self, buffer: &BoundedRingBuffer<CodeUnit>) -> Option<&Terminal> {
        self.longest_match(buffer.iter())
    }

    /// Deepest rule whose key is a prefix of `units`
    pub fn longest_match<I>(&self, units: I) -> Option<&Terminal>
    where
        I: IntoIterator<Item = CodeUnit>,
    {
        let mut node = &self.root;
        let mut best = None;

        for unit in units {
            let Some(child) = node.children.get(&unit) else {
                break;
            };
            node = child;
            if node.terminal.is_some() {
                best = node.terminal.as_ref();
            }
        }

        best
    }

    /// Number of rules stored
    pub fn len(&self) -> usize {
        self.rule_count
    }

    pub fn is_empty(&self) -> bool {
        self.rule_count == 0
    }

    /// Longest key in code units (0 for an empty trie)
    pub fn max_key_len(&self) -> usize {
        self.max_key_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer_of(s: &str) -> BoundedRingBuffer<CodeUnit> {
        let mut buf = BoundedRingBuffer::new(8, 1024);
        buf.put_all(&s.encode_utf16().collect::<Vec<_>>()).unwrap();
        buf
    }

    fn replacement(t: &Terminal) -> String {
        String::from_utf16_lossy(&t.replacement)
    }

    #[test]
    fn test_longest_rule_wins() {
        let mut trie = RuleTrie::new();
        trie.insert("a", "X");
        trie.insert("aa", "Y");

        let m = trie.longest_match_at_head(&buffer_of("aab")).unwrap();
        assert_eq!(m.key, "aa");
        assert_eq!(m.key_len, 2);
        assert_eq!(replacement(m), "Y");
    }

    #[test]
    fn test_falls_back_to_shorter_terminal() {
        let mut trie = RuleTrie::new();
        trie.insert("a", "foo");
        trie.insert("abc", "zoo");

        // "ab" is on the path to "abc" but not terminal
        let m = trie.longest_match_at_head(&buffer_of("abx")).unwrap();
        assert_eq!(m.key, "a");
    }

    #[test]
    fn test_lookahead_exhaustion_keeps_match() {
        let mut trie = RuleTrie::new();
        trie.insert("a", "1");
        trie.insert("aaa", "3");

        let m = trie.longest_match_at_head(&buffer_of("aa")).unwrap();
        assert_eq!(m.key, "a");
    }

    #[test]
    fn test_no_match() {
        let mut trie = RuleTrie::new();
        trie.insert("bc", "Z");

        assert!(trie.longest_match_at_head(&buffer_of("abc")).is_none());
        assert!(trie.longest_match_at_head(&buffer_of("")).is_none());
        // Non-terminal prefix only
        assert!(trie.longest_match_at_head(&buffer_of("b")).is_none());
    }

    #[test]
    fn test_shared_prefixes_and_counts() {
        let mut trie = RuleTrie::new();
        assert!(trie.is_empty());
        trie.insert("abc", "1");
        trie.insert("abd", "2");
        trie.insert("ab", "3");
        assert_eq!(trie.len(), 3);
        assert_eq!(trie.max_key_len(), 3);

        let m = trie.longest_match("abd!".encode_utf16()).unwrap();
        assert_eq!(replacement(m), "2");
    }

    #[test]
    fn test_reinsert_replaces_value() {
        let mut trie = RuleTrie::new();
        assert!(trie.insert("k", "old").is_none());
        let previous = trie.insert("k", "new").unwrap();
        assert_eq!(replacement(&previous), "old");
        assert_eq!(trie.len(), 1);

        let m = trie.longest_match("k".encode_utf16()).unwrap();
        assert_eq!(replacement(m), "new");
    }

    #[test]
    fn test_empty_key_ignored() {
        let mut trie = RuleTrie::new();
        assert!(trie.insert("", "x").is_none());
        assert!(trie.is_empty());
        assert!(trie.longest_match("abc".encode_utf16()).is_none());
    }

    #[test]
    fn test_empty_replacement() {
        let mut trie = RuleTrie::new();
        trie.insert("drop", "");
        let m = trie.longest_match("drop it".encode_utf16()).unwrap();
        assert_eq!(m.key_len, 4);
        assert!(m.replacement.is_empty());
    }

    #[test]
    fn test_surrogate_pair_key() {
        let mut trie = RuleTrie::new();
        trie.insert("🦀", "crab");
        assert_eq!(trie.max_key_len(), 2);
        let m = trie.longest_match("🦀!".encode_utf16()).unwrap();
        assert_eq!(replacement(m), "crab");
    }
}
