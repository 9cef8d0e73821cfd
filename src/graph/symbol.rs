use serde::{Deserialize, Serialize};

/// Kind of symbol node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Class,
    Method,
    Field,

    /// Placeholder for a symbol defined outside the analyzed program
    Boundary,
}

impl SymbolKind {
    pub fn is_member(&self) -> bool {
        matches!(self, SymbolKind::Method | SymbolKind::Field)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SymbolKind::Class => "class",
            SymbolKind::Method => "method",
            SymbolKind::Field => "field",
            SymbolKind::Boundary => "external",
        }
    }
}

/// Where a node came from in the program model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Index into `Program::classes`
    Class(usize),
    /// (class index, member index)
    Member(usize, usize),
    Boundary,
}

/// Node weight of the program graph
#[derive(Debug, Clone)]
pub struct SymbolNode {
    /// Class name, or `Owner.name:descriptor` for members
    pub qualified_name: String,

    pub kind: SymbolKind,

    pub origin: Origin,
}

impl SymbolNode {
    pub fn new(qualified_name: String, kind: SymbolKind, origin: Origin) -> Self {
        Self {
            qualified_name,
            kind,
            origin,
        }
    }

    pub fn boundary(qualified_name: String) -> Self {
        Self::new(qualified_name, SymbolKind::Boundary, Origin::Boundary)
    }

    pub fn display(&self) -> String {
        format!("{} {}", self.kind.display_name(), self.qualified_name)
    }
}

impl std::fmt::Display for SymbolNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.qualified_name)
    }
}
