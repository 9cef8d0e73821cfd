mod reachability;
mod rules;
mod sweep;

pub use reachability::{ReachabilityEngine, ReachedSet, WorklistOrder};
pub use rules::{
    rules_from_config, AnnotationRule, EntryPointRule, KeepRule, NamePatternRule, RuleError,
};
pub use sweep::{SweepOutcome, SweepReport, Sweeper};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::hash::Hash;

/// A keep rule that failed on one class.
///
/// The class contributes no roots from that rule; the pass goes on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RuleFault {
    pub rule: String,
    pub class: String,
    pub message: String,
}

impl std::fmt::Display for RuleFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rule '{}' failed on {}: {}", self.rule, self.class, self.message)
    }
}

/// Union of every rule's keep set over every class
#[derive(Debug, Clone)]
pub struct RootSet<H> {
    pub symbols: HashSet<H>,
    pub faults: Vec<RuleFault>,
}

impl<H: Eq + Hash> RootSet<H> {
    pub fn new() -> Self {
        Self {
            symbols: HashSet::new(),
            faults: Vec::new(),
        }
    }

    /// Union with another partial result; order does not matter
    pub fn merge(mut self, other: RootSet<H>) -> Self {
        self.symbols.extend(other.symbols);
        self.faults.extend(other.faults);
        self
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl<H: Eq + Hash> Default for RootSet<H> {
    fn default() -> Self {
        Self::new()
    }
}
