//! Error types
//!
//! Two layers:
//! - `BufferError` for ring buffer contract violations
//! - `ReplaceError` for everything a caller of the engine can observe

use thiserror::Error;

/// Ring buffer failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    /// A put would grow the buffer past its hard ceiling
    #[error("buffer capacity exceeded (max {max_capacity} units)")]
    CapacityExceeded {
        /// The configured ceiling
        max_capacity: usize,
    },

    /// Take on an empty buffer
    #[error("buffer is empty")]
    Empty,

    /// Peek or copy past the logical end of the buffer
    #[error("offset {offset} out of range for buffer of length {len}")]
    OutOfRange {
        /// Requested offset (or end of range)
        offset: usize,
        /// Logical length at the time of the call
        len: usize,
    },
}

/// Configuration parsing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid UTF-8: {0}")]
    InvalidUtf8(String),

    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors surfaced by compiling rules or reading a replace stream
#[derive(Error, Debug)]
pub enum ReplaceError {
    /// The rule set cannot be compiled (empty key, or a strategy whose
    /// precondition the rules do not meet)
    #[error("invalid rule set: {reason}")]
    InvalidRuleSet {
        /// Why the rule set was rejected
        reason: String,
    },

    /// Buffer failure while streaming
    #[error("buffer error: {0}")]
    Buffer(#[from] BufferError),

    /// The underlying source failed; not retried
    #[error("source read failed: {0}")]
    SourceRead(#[from] std::io::Error),

    /// Writing replaced output to a sink failed
    #[error("sink write failed: {0}")]
    SinkWrite(std::io::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ReplaceError {
    pub(crate) fn invalid_rules(reason: impl Into<String>) -> Self {
        ReplaceError::InvalidRuleSet {
            reason: reason.into(),
        }
    }

    /// True if a buffer hit its ceiling
    pub fn is_capacity_exceeded(&self) -> bool {
        matches!(
            self,
            ReplaceError::Buffer(BufferError::CapacityExceeded { .. })
        )
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, ReplaceError>;
