//! deadsweep - Mark-and-sweep shrinking of class-structured programs
//!
//! Removes every class, method and field that cannot be reached from a set
//! of keep rules, and leaves the rest of the program untouched.
//!
//! # Architecture
//!
//! A shrink pass consists of:
//! 1. **Graph Building** - Build a symbol graph from the program model,
//!    including the full override index
//! 2. **Keep Rules** - Evaluate every rule against every class to get roots
//! 3. **Marking** - Compute the closure of the roots over references,
//!    hierarchy edges and overrides
//! 4. **Sweeping** - Verify the reached set is closed, then drop everything
//!    outside it
//! 5. **Reporting** - Output what was removed in various formats

pub mod analysis;
pub mod config;
pub mod error;
pub mod graph;
pub mod program;
pub mod report;
pub mod shrinker;

pub use analysis::{
    KeepRule, ReachabilityEngine, ReachedSet, RuleFault, SweepOutcome, SweepReport, Sweeper,
    WorklistOrder,
};
pub use config::Config;
pub use error::{ShrinkError, Stage};
pub use graph::{EdgeKind, GraphBuilder, ProgramGraph, SymbolGraph, SymbolKind};
pub use program::{ClassDef, MemberDef, MemberKind, Program, SymbolRef, Visibility};
pub use report::{ReportFormat, Reporter};
pub use shrinker::Shrinker;
