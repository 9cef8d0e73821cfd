use super::{KeepRule, RootSet, RuleFault};
use crate::error::{Result, ShrinkError};
use crate::graph::{SymbolGraph, SymbolKind};
use dashmap::DashSet;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::hash::Hash;
use tracing::{debug, info, warn};

/// Order in which the sequential worklist is drained.
///
/// Only affects traversal, never the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorklistOrder {
    #[default]
    DepthFirst,
    BreadthFirst,
}

/// Symbols that must remain after the sweep
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReachedSet<H: Eq + Hash> {
    nodes: HashSet<H>,
}

impl<H: Copy + Eq + Hash> ReachedSet<H> {
    pub fn contains(&self, node: H) -> bool {
        self.nodes.contains(&node)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = H> + '_ {
        self.nodes.iter().copied()
    }

    pub fn as_set(&self) -> &HashSet<H> {
        &self.nodes
    }

    /// Qualified names of the reached symbols, comparable across graph builds
    pub fn qualified_names<G>(&self, graph: &G) -> BTreeSet<String>
    where
        G: SymbolGraph<Handle = H>,
    {
        self.nodes
            .iter()
            .map(|&n| graph.class_name(n).to_string())
            .collect()
    }
}

impl<H: Copy + Eq + Hash> FromIterator<H> for ReachedSet<H> {
    fn from_iter<I: IntoIterator<Item = H>>(iter: I) -> Self {
        Self {
            nodes: iter.into_iter().collect(),
        }
    }
}

/// Mark phase of the shrinker: roots from keep rules, then the transitive
/// closure over references, hierarchy edges and overrides.
pub struct ReachabilityEngine {
    parallel: bool,
    order: WorklistOrder,
}

impl ReachabilityEngine {
    pub fn new() -> Self {
        Self {
            parallel: false,
            order: WorklistOrder::default(),
        }
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_order(mut self, order: WorklistOrder) -> Self {
        self.order = order;
        self
    }

    /// Evaluate every rule against every class and union the results.
    ///
    /// A failing rule only loses the roots of the class it failed on.
    pub fn compute_roots<G: SymbolGraph>(
        &self,
        graph: &G,
        rules: &[Box<dyn KeepRule<G>>],
    ) -> RootSet<G::Handle> {
        let evaluate = |class: G::Handle| -> RootSet<G::Handle> {
            let mut partial = RootSet::new();
            for rule in rules {
                match rule.keep_symbols(class, graph) {
                    Ok(symbols) => partial.symbols.extend(symbols),
                    Err(e) => {
                        let fault = RuleFault {
                            rule: rule.name(),
                            class: graph.class_name(class).to_string(),
                            message: e.to_string(),
                        };
                        warn!("{}", fault);
                        partial.faults.push(fault);
                    }
                }
            }
            partial
        };

        let classes = graph.classes();
        let mut roots = if self.parallel {
            classes
                .into_par_iter()
                .map(evaluate)
                .reduce(RootSet::new, RootSet::merge)
        } else {
            classes
                .into_iter()
                .map(evaluate)
                .fold(RootSet::new(), RootSet::merge)
        };
        roots.faults.sort();

        info!(
            "Keep rules: {} roots from {} rules ({} faults)",
            roots.len(),
            rules.len(),
            roots.faults.len()
        );

        roots
    }

    /// Compute the reached closure of `roots`.
    ///
    /// Boundary nodes are always reached. An edge to a node outside the graph
    /// means the graph builder is broken and aborts the pass.
    pub fn mark<G: SymbolGraph>(
        &self,
        graph: &G,
        roots: &HashSet<G::Handle>,
    ) -> Result<ReachedSet<G::Handle>> {
        let mut seeds: Vec<G::Handle> = graph.boundaries();
        for &root in roots {
            if !graph.contains(root) {
                return Err(ShrinkError::DanglingEdge {
                    from: "keep rules".to_string(),
                    target: format!("{:?}", root),
                });
            }
            seeds.push(root);
        }

        let nodes = if self.parallel {
            self.mark_parallel(graph, seeds)?
        } else {
            self.mark_sequential(graph, seeds)?
        };

        info!("Mark: {} symbols reached from {} roots", nodes.len(), roots.len());

        Ok(ReachedSet { nodes })
    }

    fn mark_sequential<G: SymbolGraph>(
        &self,
        graph: &G,
        seeds: Vec<G::Handle>,
    ) -> Result<HashSet<G::Handle>> {
        let mut reached = HashSet::new();
        let mut worklist: VecDeque<G::Handle> = seeds.into();

        loop {
            let next = match self.order {
                WorklistOrder::DepthFirst => worklist.pop_back(),
                WorklistOrder::BreadthFirst => worklist.pop_front(),
            };
            let Some(node) = next else {
                break;
            };
            if !reached.insert(node) {
                continue;
            }
            for successor in successors(graph, node)? {
                if !reached.contains(&successor) {
                    worklist.push_back(successor);
                }
            }
        }

        Ok(reached)
    }

    /// Level-synchronous expansion; `DashSet::insert` is the test-and-mark,
    /// so each node is expanded by exactly one worker.
    fn mark_parallel<G: SymbolGraph>(
        &self,
        graph: &G,
        seeds: Vec<G::Handle>,
    ) -> Result<HashSet<G::Handle>> {
        let reached: DashSet<G::Handle> = DashSet::new();
        let mut frontier: Vec<G::Handle> =
            seeds.into_iter().filter(|&s| reached.insert(s)).collect();
        let mut rounds = 0usize;

        while !frontier.is_empty() {
            rounds += 1;
            let next: Vec<Vec<G::Handle>> = frontier
                .par_iter()
                .map(|&node| -> Result<Vec<G::Handle>> {
                    let fresh: Vec<G::Handle> = successors(graph, node)?
                        .into_iter()
                        .filter(|&s| reached.insert(s))
                        .collect();
                    Ok(fresh)
                })
                .collect::<Result<_>>()?;
            frontier = next.into_iter().flatten().collect();
        }

        debug!("Parallel mark finished after {} rounds", rounds);

        Ok(reached.into_iter().collect())
    }
}

impl Default for ReachabilityEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Nodes a reached node keeps alive
fn successors<G: SymbolGraph>(graph: &G, node: G::Handle) -> Result<Vec<G::Handle>> {
    let mut next: Vec<G::Handle> = graph
        .outgoing_edges(node)
        .into_iter()
        .filter(|(_, kind)| kind.is_traversed())
        .map(|(target, _)| target)
        .collect();

    match graph.kind(node) {
        // Override closure, both directions; a boundary may stand for a
        // library method overridden in the program
        SymbolKind::Method | SymbolKind::Boundary => {
            next.extend(graph.overridden_by(node));
            next.extend(graph.overrides(node));
        }
        SymbolKind::Class => next.extend(graph.static_initializer(node)),
        SymbolKind::Field => {}
    }

    if let Some(&dangling) = next.iter().find(|&&t| !graph.contains(t)) {
        return Err(ShrinkError::DanglingEdge {
            from: graph.class_name(node).to_string(),
            target: format!("{:?}", dangling),
        });
    }

    Ok(next)
}
