use super::overrides::{self, MemberPos};
use super::{EdgeKind, OverrideIndex, Origin, ProgramGraph, SymbolKind, SymbolNode};
use crate::error::{Result, ShrinkError};
use crate::program::{member_key, ClassDef, MemberKind, Program, SymbolRef};
use petgraph::graph::{DiGraph, NodeIndex};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, info};

/// Builder for constructing the program graph
pub struct GraphBuilder {
    /// Resolve references and overrides class-by-class on the rayon pool
    parallel: bool,
}

/// Edge target before boundary nodes exist
#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    Node(NodeIndex),
    External(String),
}

struct PendingEdge {
    from: NodeIndex,
    to: Target,
    kind: EdgeKind,
}

/// Lookup tables over the program, shared read-only by resolution workers
struct Resolver<'p, P> {
    program: &'p Program<P>,
    class_by_name: HashMap<&'p str, usize>,
    /// (name, descriptor) to member position, per class
    member_by_key: Vec<HashMap<(&'p str, &'p str), usize>>,
    class_nodes: Vec<NodeIndex>,
    member_nodes: Vec<Vec<NodeIndex>>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self { parallel: false }
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Build the graph for one shrink pass.
    ///
    /// Every edge and the full override index exist before this returns.
    pub fn build<'p, P: Sync>(&self, program: &'p Program<P>) -> Result<ProgramGraph<'p, P>> {
        info!("Building symbol graph for {} classes...", program.classes.len());

        let mut inner = DiGraph::new();
        let mut name_index = HashMap::new();
        let mut class_by_name = HashMap::new();
        let mut member_by_key = Vec::with_capacity(program.classes.len());
        let mut class_nodes = Vec::with_capacity(program.classes.len());
        let mut member_nodes = Vec::with_capacity(program.classes.len());

        // Nodes
        for (class_idx, class) in program.classes.iter().enumerate() {
            if name_index.contains_key(&class.name) {
                return Err(ShrinkError::DuplicateSymbol {
                    name: class.name.clone(),
                });
            }
            let node = inner.add_node(SymbolNode::new(
                class.name.clone(),
                SymbolKind::Class,
                Origin::Class(class_idx),
            ));
            name_index.insert(class.name.clone(), node);
            class_by_name.insert(class.name.as_str(), class_idx);
            class_nodes.push(node);

            let mut by_key = HashMap::new();
            let mut nodes = Vec::with_capacity(class.members.len());
            for (member_idx, member) in class.members.iter().enumerate() {
                let key = member.qualified_name(&class.name);
                if by_key
                    .insert((member.name.as_str(), member.descriptor.as_str()), member_idx)
                    .is_some()
                    || name_index.contains_key(&key)
                {
                    return Err(ShrinkError::DuplicateSymbol { name: key });
                }
                let kind = match member.kind {
                    MemberKind::Method => SymbolKind::Method,
                    MemberKind::Field => SymbolKind::Field,
                };
                let node = inner.add_node(SymbolNode::new(
                    key.clone(),
                    kind,
                    Origin::Member(class_idx, member_idx),
                ));
                name_index.insert(key, node);
                nodes.push(node);
            }
            member_by_key.push(by_key);
            member_nodes.push(nodes);
        }

        let resolver = Resolver {
            program,
            class_by_name,
            member_by_key,
            class_nodes,
            member_nodes,
        };

        // Edges, resolved per class
        let pending: Vec<PendingEdge> = if self.parallel {
            let per_class: Vec<Vec<PendingEdge>> = (0..program.classes.len())
                .into_par_iter()
                .map(|class_idx| resolver.edges_for(class_idx))
                .collect::<Result<_>>()?;
            per_class.into_iter().flatten().collect()
        } else {
            let mut all = Vec::new();
            for class_idx in 0..program.classes.len() {
                all.extend(resolver.edges_for(class_idx)?);
            }
            all
        };

        let mut boundaries = Vec::new();
        let mut seen = HashSet::new();
        for edge in pending {
            let to = match edge.to {
                Target::Node(node) => node,
                Target::External(name) => match name_index.get(&name) {
                    Some(&node) => node,
                    None => {
                        debug!("Opaque boundary: {}", name);
                        let node = inner.add_node(SymbolNode::boundary(name.clone()));
                        name_index.insert(name, node);
                        boundaries.push(node);
                        node
                    }
                },
            };
            if seen.insert((edge.from, to, edge.kind)) {
                inner.add_edge(edge.from, to, edge.kind);
            }
        }

        // Override index, only once the hierarchy is complete
        let mut override_index = OverrideIndex::new();
        let pairs = overrides::compute_pairs(program, &resolver.class_by_name, self.parallel);
        for (overrider, overridden) in pairs {
            let from = resolver.member_node(overrider);
            let to = resolver.member_node(overridden);
            override_index.insert(from, to);
            inner.add_edge(from, to, EdgeKind::Overrides);
        }

        // Library methods the program knows about through boundary nodes
        let boundary_members: HashMap<&str, NodeIndex> = boundaries
            .iter()
            .map(|&node| (inner[node].qualified_name.as_str(), node))
            .collect();
        let library_pairs = overrides::boundary_pairs(
            program,
            &resolver.class_by_name,
            &boundary_members,
            self.parallel,
        );
        for (overrider, boundary) in library_pairs {
            let from = resolver.member_node(overrider);
            override_index.insert(from, boundary);
            inner.add_edge(from, boundary, EdgeKind::Overrides);
        }
        override_index.normalize();

        info!(
            "Graph: {} nodes, {} edges, {} boundary nodes, {} overrides",
            inner.node_count(),
            inner.edge_count(),
            boundaries.len(),
            override_index.len()
        );

        let Resolver {
            class_nodes,
            member_nodes,
            ..
        } = resolver;

        Ok(ProgramGraph {
            program,
            inner,
            name_index,
            class_nodes,
            member_nodes,
            overrides: override_index,
            boundaries,
        })
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<'p, P> Resolver<'p, P> {
    fn member_node(&self, (class_idx, member_idx): MemberPos) -> NodeIndex {
        self.member_nodes[class_idx][member_idx]
    }

    /// All edges leaving a class and its members
    fn edges_for(&self, class_idx: usize) -> Result<Vec<PendingEdge>> {
        let class = &self.program.classes[class_idx];
        let class_node = self.class_nodes[class_idx];
        let mut edges = Vec::new();

        if let Some(superclass) = &class.superclass {
            edges.push(PendingEdge {
                from: class_node,
                to: self.resolve_class(superclass),
                kind: EdgeKind::Extends,
            });
        }
        for interface in &class.interfaces {
            edges.push(PendingEdge {
                from: class_node,
                to: self.resolve_class(interface),
                kind: EdgeKind::Implements,
            });
        }
        self.annotation_edges(class_node, &class.annotations, &mut edges);

        for (member_idx, member) in class.members.iter().enumerate() {
            let member_node = self.member_nodes[class_idx][member_idx];

            // A live member needs its declaring class
            edges.push(PendingEdge {
                from: member_node,
                to: Target::Node(class_node),
                kind: EdgeKind::References,
            });
            self.annotation_edges(member_node, &member.annotations, &mut edges);

            for reference in &member.references {
                let to =
                    self.resolve_reference(class, &member.name, &member.descriptor, reference)?;
                edges.push(PendingEdge {
                    from: member_node,
                    to,
                    kind: EdgeKind::References,
                });

                // The named owner must survive even when the member is inherited
                if reference.name.is_some() {
                    if let Some(&owner_idx) = self.class_by_name.get(reference.owner.as_str()) {
                        edges.push(PendingEdge {
                            from: member_node,
                            to: Target::Node(self.class_nodes[owner_idx]),
                            kind: EdgeKind::References,
                        });
                    }
                }
            }
        }

        Ok(edges)
    }

    /// Annotation tags naming a class of the program
    fn annotation_edges(&self, from: NodeIndex, tags: &[String], edges: &mut Vec<PendingEdge>) {
        for tag in tags {
            if let Some(&class_idx) = self.class_by_name.get(tag.as_str()) {
                edges.push(PendingEdge {
                    from,
                    to: Target::Node(self.class_nodes[class_idx]),
                    kind: EdgeKind::AnnotatedBy,
                });
            }
        }
    }

    fn resolve_class(&self, name: &str) -> Target {
        match self.class_by_name.get(name) {
            Some(&class_idx) => Target::Node(self.class_nodes[class_idx]),
            None => Target::External(name.to_string()),
        }
    }

    fn resolve_reference(
        &self,
        from_class: &ClassDef<P>,
        from_name: &str,
        from_descriptor: &str,
        reference: &SymbolRef,
    ) -> Result<Target> {
        let Some(name) = &reference.name else {
            return Ok(self.resolve_class(&reference.owner));
        };
        let descriptor = reference.descriptor.as_deref().unwrap_or("");

        let Some(&owner_idx) = self.class_by_name.get(reference.owner.as_str()) else {
            return Ok(Target::External(reference.qualified_name()));
        };

        match self.lookup_member(owner_idx, name, descriptor) {
            Lookup::Found(pos) => Ok(Target::Node(self.member_node(pos))),
            Lookup::MaybeInherited => Ok(Target::External(reference.qualified_name())),
            Lookup::Missing => Err(ShrinkError::UnresolvedMember {
                from: member_key(&from_class.name, from_name, from_descriptor),
                target: reference.qualified_name(),
            }),
        }
    }

    /// Find the declaration a member reference binds to: the owner first, then
    /// its superclass chain, then interfaces breadth-first.
    fn lookup_member(&self, owner_idx: usize, name: &str, descriptor: &str) -> Lookup {
        let mut saw_external = false;
        let mut visited = HashSet::new();

        // Superclass chain
        let mut chain = Vec::new();
        let mut current = Some(owner_idx);
        while let Some(class_idx) = current {
            if !visited.insert(class_idx) {
                break;
            }
            if let Some(&member_idx) = self.member_by_key[class_idx].get(&(name, descriptor)) {
                return Lookup::Found((class_idx, member_idx));
            }
            chain.push(class_idx);
            current = match &self.program.classes[class_idx].superclass {
                Some(superclass) => {
                    let next = self.class_by_name.get(superclass.as_str()).copied();
                    saw_external |= next.is_none();
                    next
                }
                None => None,
            };
        }

        // Interfaces of every class on the chain
        let mut queue: VecDeque<usize> = VecDeque::new();
        for &class_idx in &chain {
            for interface in &self.program.classes[class_idx].interfaces {
                match self.class_by_name.get(interface.as_str()) {
                    Some(&idx) => queue.push_back(idx),
                    None => saw_external = true,
                }
            }
        }
        let mut seen_interfaces = HashSet::new();
        while let Some(class_idx) = queue.pop_front() {
            if !seen_interfaces.insert(class_idx) {
                continue;
            }
            if let Some(&member_idx) = self.member_by_key[class_idx].get(&(name, descriptor)) {
                return Lookup::Found((class_idx, member_idx));
            }
            for interface in &self.program.classes[class_idx].interfaces {
                match self.class_by_name.get(interface.as_str()) {
                    Some(&idx) => queue.push_back(idx),
                    None => saw_external = true,
                }
            }
        }

        if saw_external {
            Lookup::MaybeInherited
        } else {
            Lookup::Missing
        }
    }
}

enum Lookup {
    Found(MemberPos),
    /// Not declared in the program, but some supertype is external
    MaybeInherited,
    Missing,
}
