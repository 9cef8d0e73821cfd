//! Fatal conditions of a shrink pass.
//!
//! Everything here stops the pipeline: the reached set can no longer be
//! trusted to be referentially closed, so no artifact is produced. Soft
//! failures (keep-rule faults) are not errors and live in the report instead.

use miette::Diagnostic;
use thiserror::Error;

/// Pipeline stage that raised a fatal error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Graph,
    Mark,
    Sweep,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Graph => "graph construction",
            Stage::Mark => "mark",
            Stage::Sweep => "sweep",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum ShrinkError {
    #[error("Symbol '{name}' is defined more than once")]
    #[diagnostic(
        code(deadsweep::graph::duplicate),
        help("each class name and each member name+descriptor within a class must be unique")
    )]
    DuplicateSymbol { name: String },

    #[error("'{from}' references '{target}', which is not declared anywhere in its hierarchy")]
    #[diagnostic(
        code(deadsweep::graph::unresolved_member),
        help(
            "the owner and all of its supertypes are defined in the program, \
             so the member must be too"
        )
    )]
    UnresolvedMember { from: String, target: String },

    #[error("Edge from '{from}' points at a node outside the graph: {target}")]
    #[diagnostic(code(deadsweep::mark::dangling_edge))]
    DanglingEdge { from: String, target: String },

    #[error("Retained symbol '{from}' references removed symbol '{target}'")]
    #[diagnostic(
        code(deadsweep::sweep::integrity),
        help("the graph builder is missing an edge; the reached set is not referentially closed")
    )]
    IntegrityViolation { from: String, target: String },
}

impl ShrinkError {
    /// The collaborator stage that failed
    pub fn stage(&self) -> Stage {
        match self {
            ShrinkError::DuplicateSymbol { .. } | ShrinkError::UnresolvedMember { .. } => {
                Stage::Graph
            }
            ShrinkError::DanglingEdge { .. } => Stage::Mark,
            ShrinkError::IntegrityViolation { .. } => Stage::Sweep,
        }
    }
}

pub type Result<T, E = ShrinkError> = std::result::Result<T, E>;
