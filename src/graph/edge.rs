use serde::{Deserialize, Serialize};

/// Kind of edge between symbols
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeKind {
    /// Method call, field access, type use, or member-of-class
    References,

    /// Class to its superclass
    Extends,

    /// Class to an implemented interface
    Implements,

    /// Overriding method to the method it overrides
    Overrides,

    /// Symbol to the annotation class it carries
    AnnotatedBy,
}

impl EdgeKind {
    /// Whether marking follows this edge directly.
    ///
    /// Overrides are followed through the override index in both directions
    /// instead, and annotations do not keep their annotation class alive.
    pub fn is_traversed(&self) -> bool {
        matches!(
            self,
            EdgeKind::References | EdgeKind::Extends | EdgeKind::Implements
        )
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            EdgeKind::References => "references",
            EdgeKind::Extends => "extends",
            EdgeKind::Implements => "implements",
            EdgeKind::Overrides => "overrides",
            EdgeKind::AnnotatedBy => "annotated-by",
        }
    }
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
