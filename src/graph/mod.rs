mod builder;
mod edge;
mod overrides;
mod symbol;

pub use builder::GraphBuilder;
pub use edge::EdgeKind;
pub use overrides::OverrideIndex;
pub use symbol::{Origin, SymbolKind, SymbolNode};

use crate::program::{MemberKind, Program, STATIC_INITIALIZER};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Read-only view of a program as a graph of classes, methods and fields.
///
/// The handle type is opaque to consumers: the reachability engine, keep
/// rules and tests only ever go through these operations, so the same engine
/// runs over decoded programs and synthetic test graphs alike.
///
/// Member names follow `Owner.name:descriptor`; keep rules match against
/// that exact shape.
pub trait SymbolGraph: Sync {
    type Handle: Copy + Eq + Hash + Debug + Send + Sync;

    /// Every class defined in the program (boundary nodes excluded)
    fn classes(&self) -> Vec<Self::Handle>;

    /// Qualified name of a class, or `Owner.name:descriptor` for a member
    fn class_name(&self, node: Self::Handle) -> &str;

    fn kind(&self, node: Self::Handle) -> SymbolKind;

    /// Declaring class of a member
    fn owner(&self, node: Self::Handle) -> Option<Self::Handle>;

    /// Methods and fields declared on the class, not inherited ones
    fn members(&self, class: Self::Handle) -> Vec<Self::Handle>;

    fn methods(&self, class: Self::Handle) -> Vec<Self::Handle> {
        self.members(class)
            .into_iter()
            .filter(|&m| self.kind(m) == SymbolKind::Method)
            .collect()
    }

    fn fields(&self, class: Self::Handle) -> Vec<Self::Handle> {
        self.members(class)
            .into_iter()
            .filter(|&m| self.kind(m) == SymbolKind::Field)
            .collect()
    }

    fn superclass(&self, class: Self::Handle) -> Option<Self::Handle>;

    fn interfaces(&self, class: Self::Handle) -> Vec<Self::Handle>;

    fn outgoing_edges(&self, node: Self::Handle) -> Vec<(Self::Handle, EdgeKind)>;

    /// Methods this method overrides, up the hierarchy
    fn overrides(&self, method: Self::Handle) -> Vec<Self::Handle>;

    /// Methods overriding this method in known subclasses. Also answers for a
    /// boundary node standing for a library method.
    fn overridden_by(&self, method: Self::Handle) -> Vec<Self::Handle>;

    /// Opaque annotation tags attached to the symbol
    fn annotations(&self, node: Self::Handle) -> &[String];

    fn static_initializer(&self, class: Self::Handle) -> Option<Self::Handle> {
        let marker = format!(".{}:", STATIC_INITIALIZER);
        self.methods(class)
            .into_iter()
            .find(|&m| self.class_name(m).contains(&marker))
    }

    fn is_boundary(&self, node: Self::Handle) -> bool {
        self.kind(node) == SymbolKind::Boundary
    }

    /// Placeholders for symbols referenced but not defined in the program
    fn boundaries(&self) -> Vec<Self::Handle>;

    /// Whether the handle denotes a node of this graph
    fn contains(&self, node: Self::Handle) -> bool;
}

/// The program model as a symbol graph.
///
/// Built by [`GraphBuilder`]; the override index is complete before the graph
/// is handed out.
#[derive(Debug)]
pub struct ProgramGraph<'p, P = serde_json::Value> {
    program: &'p Program<P>,

    /// Nodes are symbols, edges are typed relations
    inner: DiGraph<SymbolNode, EdgeKind>,

    /// Qualified name to node
    name_index: HashMap<String, NodeIndex>,

    /// Node of each class, by position in `Program::classes`
    class_nodes: Vec<NodeIndex>,

    /// Member nodes, by class position then member position
    member_nodes: Vec<Vec<NodeIndex>>,

    overrides: OverrideIndex,

    boundaries: Vec<NodeIndex>,
}

impl<'p, P> ProgramGraph<'p, P> {
    pub fn program(&self) -> &'p Program<P> {
        self.program
    }

    pub fn node(&self, id: NodeIndex) -> &SymbolNode {
        &self.inner[id]
    }

    /// Find a symbol by qualified name
    pub fn find(&self, qualified_name: &str) -> Option<NodeIndex> {
        self.name_index.get(qualified_name).copied()
    }

    pub fn class_node(&self, class_idx: usize) -> NodeIndex {
        self.class_nodes[class_idx]
    }

    pub fn member_node(&self, class_idx: usize, member_idx: usize) -> NodeIndex {
        self.member_nodes[class_idx][member_idx]
    }

    pub fn override_index(&self) -> &OverrideIndex {
        &self.overrides
    }

    /// Get the underlying petgraph for advanced operations
    pub fn inner(&self) -> &DiGraph<SymbolNode, EdgeKind> {
        &self.inner
    }

    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    fn targets(&self, node: NodeIndex, kind: EdgeKind) -> impl Iterator<Item = NodeIndex> + '_ {
        self.inner
            .edges_directed(node, Direction::Outgoing)
            .filter(move |e| *e.weight() == kind)
            .map(|e| e.target())
    }
}

impl<'p, P: Sync> SymbolGraph for ProgramGraph<'p, P> {
    type Handle = NodeIndex;

    fn classes(&self) -> Vec<NodeIndex> {
        self.class_nodes.clone()
    }

    fn class_name(&self, node: NodeIndex) -> &str {
        &self.inner[node].qualified_name
    }

    fn kind(&self, node: NodeIndex) -> SymbolKind {
        self.inner[node].kind
    }

    fn owner(&self, node: NodeIndex) -> Option<NodeIndex> {
        match self.inner[node].origin {
            Origin::Member(class_idx, _) => Some(self.class_nodes[class_idx]),
            _ => None,
        }
    }

    fn members(&self, class: NodeIndex) -> Vec<NodeIndex> {
        match self.inner[class].origin {
            Origin::Class(class_idx) => self.member_nodes[class_idx].clone(),
            _ => Vec::new(),
        }
    }

    fn superclass(&self, class: NodeIndex) -> Option<NodeIndex> {
        self.targets(class, EdgeKind::Extends).next()
    }

    fn interfaces(&self, class: NodeIndex) -> Vec<NodeIndex> {
        let mut interfaces: Vec<_> = self.targets(class, EdgeKind::Implements).collect();
        interfaces.sort();
        interfaces
    }

    fn outgoing_edges(&self, node: NodeIndex) -> Vec<(NodeIndex, EdgeKind)> {
        self.inner
            .edges_directed(node, Direction::Outgoing)
            .map(|e| (e.target(), *e.weight()))
            .collect()
    }

    fn overrides(&self, method: NodeIndex) -> Vec<NodeIndex> {
        self.overrides.overrides(method).to_vec()
    }

    fn overridden_by(&self, method: NodeIndex) -> Vec<NodeIndex> {
        self.overrides.overridden_by(method).to_vec()
    }

    fn annotations(&self, node: NodeIndex) -> &[String] {
        match self.inner[node].origin {
            Origin::Class(c) => &self.program.classes[c].annotations,
            Origin::Member(c, m) => &self.program.classes[c].members[m].annotations,
            Origin::Boundary => &[],
        }
    }

    fn static_initializer(&self, class: NodeIndex) -> Option<NodeIndex> {
        let Origin::Class(class_idx) = self.inner[class].origin else {
            return None;
        };
        self.program.classes[class_idx]
            .members
            .iter()
            .position(|m| m.kind == MemberKind::Method && m.name == STATIC_INITIALIZER)
            .map(|member_idx| self.member_nodes[class_idx][member_idx])
    }

    fn boundaries(&self) -> Vec<NodeIndex> {
        self.boundaries.clone()
    }

    fn contains(&self, node: NodeIndex) -> bool {
        node.index() < self.inner.node_count()
    }
}
