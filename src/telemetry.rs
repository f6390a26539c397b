//! Stream statistics
//!
//! Each replace stream counts what it consumed and produced. The counters
//! serialize to one JSON log line so hosts can collect them with whatever
//! logger they install behind the `log` facade.

use log::{info, warn};
use serde::Serialize;

use crate::replace::Strategy;

/// Counters for one replace stream since its last (re)bind
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamStats {
    /// Replacer variant in use
    pub strategy: Strategy,
    /// Code units pulled from the source
    pub units_read: u64,
    /// Code units handed to the caller
    pub units_written: u64,
    /// Rule applications (for the direct table: units that changed)
    pub replacements: u64,
    /// The source has been drained
    pub end_of_stream: bool,
}

impl StreamStats {
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            units_read: 0,
            units_written: 0,
            replacements: 0,
            end_of_stream: false,
        }
    }

    /// Zero the counters, keeping the strategy
    pub fn reset(&mut self) {
        *self = Self::new(self.strategy);
    }

    /// Log the stats as JSON
    pub fn emit(&self) {
        match serde_json::to_string(self) {
            Ok(json) => info!("[SUBST-STATS] {}", json),
            Err(e) => warn!("Failed to serialize stream stats: {}", e),
        }
    }
}
