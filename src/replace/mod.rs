//! Replace module
//!
//! This module provides:
//! - Rule sets (source string -> destination string)
//! - Strategy selection and one-time rule compilation
//! - Streaming replacers bound to a pull-based source
//! - A brute-force reference replacer that defines correct output

pub mod reference;
pub mod rules;
pub mod strategy;
pub mod stream;

pub use reference::ReferenceReplacer;
pub use rules::RuleSet;
pub use strategy::{select_strategy, CompiledRuleSet, Strategy};
pub use stream::ReplaceStream;
