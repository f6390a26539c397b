//! Configuration for the substitution engine
//!
//! Loaded from JSON bytes (or built in code). Every field has a default, so
//! `{}` is a valid configuration: no rules, 64K buffer ceilings.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::replace::{CompiledRuleSet, RuleSet};

/// Engine configuration: the rules plus buffer sizing for streams
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Substitution rules (key -> replacement)
    #[serde(default)]
    pub rules: RuleSet,

    /// Starting size of the inbound (unmatched input) buffer
    #[serde(default = "default_initial_capacity")]
    pub inbound_initial_capacity: usize,

    /// Ceiling of the inbound buffer; must cover the longest rule key
    #[serde(default = "default_max_capacity")]
    pub inbound_max_capacity: usize,

    /// Starting size of the outbound (ready to read) buffer
    #[serde(default = "default_initial_capacity")]
    pub outbound_initial_capacity: usize,

    /// Ceiling of the outbound buffer; must cover the longest replacement
    #[serde(default = "default_max_capacity")]
    pub outbound_max_capacity: usize,

    /// Code units pulled from the source per refill
    #[serde(default = "default_read_chunk_size")]
    pub read_chunk_size: usize,

    /// Emit stream statistics as a log line at end of stream
    #[serde(default)]
    pub log_stats: bool,
}

fn default_initial_capacity() -> usize {
    16
}

fn default_max_capacity() -> usize {
    64 * 1024 // 64K units
}

fn default_read_chunk_size() -> usize {
    1024
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rules: RuleSet::default(),
            inbound_initial_capacity: default_initial_capacity(),
            inbound_max_capacity: default_max_capacity(),
            outbound_initial_capacity: default_initial_capacity(),
            outbound_max_capacity: default_max_capacity(),
            read_chunk_size: default_read_chunk_size(),
            log_stats: false,
        }
    }
}

impl EngineConfig {
    /// Parse and validate configuration from JSON bytes
    pub fn from_bytes(bytes: &[u8]) -> std::result::Result<Self, ConfigError> {
        let config_str =
            std::str::from_utf8(bytes).map_err(|e| ConfigError::InvalidUtf8(e.to_string()))?;

        let config: Self =
            serde_json::from_str(config_str).map_err(|e| ConfigError::InvalidJson(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Same defaults, different rules
    pub fn with_rules(rules: RuleSet) -> Self {
        Self {
            rules,
            ..Default::default()
        }
    }

    /// Check buffer sizing is usable
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.inbound_max_capacity == 0 {
            return Err(ConfigError::Invalid(
                "inbound_max_capacity must be > 0".to_string(),
            ));
        }
        if self.outbound_max_capacity == 0 {
            return Err(ConfigError::Invalid(
                "outbound_max_capacity must be > 0".to_string(),
            ));
        }
        if self.read_chunk_size == 0 {
            return Err(ConfigError::Invalid("read_chunk_size must be > 0".to_string()));
        }
        if self.read_chunk_size > self.inbound_max_capacity {
            return Err(ConfigError::Invalid(format!(
                "read_chunk_size ({}) exceeds inbound_max_capacity ({})",
                self.read_chunk_size, self.inbound_max_capacity
            )));
        }
        Ok(())
    }

    /// Compile the configured rules
    pub fn compile(&self) -> Result<CompiledRuleSet> {
        CompiledRuleSet::compile(&self.rules)
    }

    /// Buffer sizing for streams, without the rules
    pub fn limits(&self) -> BufferLimits {
        BufferLimits {
            inbound_initial: self.inbound_initial_capacity,
            inbound_max: self.inbound_max_capacity,
            outbound_initial: self.outbound_initial_capacity,
            outbound_max: self.outbound_max_capacity,
            read_chunk_size: self.read_chunk_size.max(1),
            log_stats: self.log_stats,
        }
    }
}

/// Per-stream buffer sizing, carried by each stream and its forks
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferLimits {
    pub inbound_initial: usize,
    pub inbound_max: usize,
    pub outbound_initial: usize,
    pub outbound_max: usize,
    pub read_chunk_size: usize,
    pub log_stats: bool,
}

impl Default for BufferLimits {
    fn default() -> Self {
        EngineConfig::default().limits()
    }
}

impl BufferLimits {
    /// Raise the ceilings so `lookahead` and `replacement_len` always fit
    pub fn fitted(mut self, lookahead: usize, replacement_len: usize) -> Self {
        self.inbound_max = self.inbound_max.max(lookahead);
        self.outbound_max = self.outbound_max.max(replacement_len);
        self
    }
}
