// Override index - computed once per graph, before any marking starts

use crate::program::{member_key, Program};
use petgraph::graph::NodeIndex;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet, VecDeque};

/// Bidirectional override relation between methods
#[derive(Debug, Clone, Default)]
pub struct OverrideIndex {
    /// Method to the methods it overrides
    overrides: HashMap<NodeIndex, Vec<NodeIndex>>,

    /// Method to the methods overriding it
    overridden_by: HashMap<NodeIndex, Vec<NodeIndex>>,
}

impl OverrideIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, overrider: NodeIndex, overridden: NodeIndex) {
        self.overrides.entry(overrider).or_default().push(overridden);
        self.overridden_by.entry(overridden).or_default().push(overrider);
    }

    pub fn overrides(&self, method: NodeIndex) -> &[NodeIndex] {
        self.overrides.get(&method).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn overridden_by(&self, method: NodeIndex) -> &[NodeIndex] {
        self.overridden_by.get(&method).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of (overrider, overridden) pairs
    pub fn len(&self) -> usize {
        self.overrides.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }

    /// Sort and dedup every adjacency list so lookups are stable
    pub(super) fn normalize(&mut self) {
        for list in self.overrides.values_mut().chain(self.overridden_by.values_mut()) {
            list.sort();
            list.dedup();
        }
    }
}

/// A member addressed by (class position, member position)
pub(super) type MemberPos = (usize, usize);

/// Virtual methods of each class keyed by (name, descriptor)
fn virtual_methods<P>(program: &Program<P>) -> Vec<HashMap<(&str, &str), usize>> {
    program
        .classes
        .iter()
        .map(|class| {
            class
                .members
                .iter()
                .enumerate()
                .filter(|(_, m)| m.is_virtual())
                .map(|(idx, m)| ((m.name.as_str(), m.descriptor.as_str()), idx))
                .collect()
        })
        .collect()
}

/// Implementation each virtual call on the class dispatches to: its own
/// methods first, then the nearest declaration up the superclass chain.
fn dispatch_table<'p, P>(
    program: &'p Program<P>,
    class_by_name: &HashMap<&str, usize>,
    virtuals: &[HashMap<(&'p str, &'p str), usize>],
    class_idx: usize,
) -> HashMap<(&'p str, &'p str), MemberPos> {
    let mut table = HashMap::new();
    let mut seen = HashSet::new();
    let mut current = Some(class_idx);

    while let Some(idx) = current {
        if !seen.insert(idx) {
            break;
        }
        for (&key, &member_idx) in &virtuals[idx] {
            table.entry(key).or_insert((idx, member_idx));
        }
        current = program.classes[idx]
            .superclass
            .as_deref()
            .and_then(|name| class_by_name.get(name).copied());
    }

    table
}

fn for_each_class<T, F>(count: usize, parallel: bool, pairs_for: F) -> Vec<T>
where
    T: Send + Ord,
    F: Fn(usize) -> Vec<T> + Sync + Send,
{
    let mut pairs: Vec<T> = if parallel {
        (0..count).into_par_iter().flat_map_iter(pairs_for).collect()
    } else {
        (0..count).flat_map(pairs_for).collect()
    };
    pairs.sort();
    pairs.dedup();
    pairs
}

/// Find every (overrider, overridden) pair among the program's methods.
///
/// A virtual method overrides each virtual method with the same name and
/// descriptor declared on any transitive supertype of a class it is
/// dispatched from. That covers a method inherited from a superclass that
/// implements an interface of the subclass.
pub(super) fn compute_pairs<P: Sync>(
    program: &Program<P>,
    class_by_name: &HashMap<&str, usize>,
    parallel: bool,
) -> Vec<(MemberPos, MemberPos)> {
    let virtuals = virtual_methods(program);

    let pairs_for = |class_idx: usize| -> Vec<(MemberPos, MemberPos)> {
        let table = dispatch_table(program, class_by_name, &virtuals, class_idx);
        if table.is_empty() {
            return Vec::new();
        }
        let mut pairs = Vec::new();
        for super_idx in supertypes(program, class_by_name, class_idx).internal {
            for (key, &implementation) in &table {
                if implementation.0 == super_idx {
                    continue;
                }
                if let Some(&super_member) = virtuals[super_idx].get(key) {
                    pairs.push((implementation, (super_idx, super_member)));
                }
            }
        }
        pairs
    };

    for_each_class(program.classes.len(), parallel, pairs_for)
}

/// Pair program methods with the boundary methods they may override.
///
/// `boundary_members` maps the qualified names of boundary nodes to their
/// nodes. A method dispatched from a class overrides `Super.name:descriptor`
/// when such a boundary exists for one of the class's supertypes, external or
/// not.
pub(super) fn boundary_pairs<P: Sync>(
    program: &Program<P>,
    class_by_name: &HashMap<&str, usize>,
    boundary_members: &HashMap<&str, NodeIndex>,
    parallel: bool,
) -> Vec<(MemberPos, NodeIndex)> {
    if boundary_members.is_empty() {
        return Vec::new();
    }
    let virtuals = virtual_methods(program);

    let pairs_for = |class_idx: usize| -> Vec<(MemberPos, NodeIndex)> {
        let table = dispatch_table(program, class_by_name, &virtuals, class_idx);
        if table.is_empty() {
            return Vec::new();
        }
        let supers = supertypes(program, class_by_name, class_idx);
        let names = supers
            .internal
            .iter()
            .map(|&idx| program.classes[idx].name.as_str())
            .chain(supers.external.iter().copied());

        let mut pairs = Vec::new();
        for owner in names {
            for (&(name, descriptor), &implementation) in &table {
                let key = member_key(owner, name, descriptor);
                if let Some(&boundary) = boundary_members.get(key.as_str()) {
                    pairs.push((implementation, boundary));
                }
            }
        }
        pairs
    };

    for_each_class(program.classes.len(), parallel, pairs_for)
}

/// Transitive supertypes of a class, excluding the class itself
#[derive(Debug, Default, PartialEq, Eq)]
pub(super) struct Supertypes<'p> {
    /// Supertypes defined in the program, by position
    pub internal: Vec<usize>,
    /// Names where the walk leaves the program
    pub external: Vec<&'p str>,
}

/// Walk every supertype of a class. Tolerates cyclic hierarchies.
pub(super) fn supertypes<'p, P>(
    program: &'p Program<P>,
    class_by_name: &HashMap<&str, usize>,
    class_idx: usize,
) -> Supertypes<'p> {
    let mut seen = HashSet::from([class_idx]);
    let mut seen_external = HashSet::new();
    let mut queue = VecDeque::from([class_idx]);
    let mut result = Supertypes::default();

    while let Some(current) = queue.pop_front() {
        let class = &program.classes[current];
        let parents = class.superclass.iter().chain(class.interfaces.iter());
        for parent in parents {
            match class_by_name.get(parent.as_str()) {
                Some(&parent_idx) => {
                    if seen.insert(parent_idx) {
                        result.internal.push(parent_idx);
                        queue.push_back(parent_idx);
                    }
                }
                None => {
                    if seen_external.insert(parent.as_str()) {
                        result.external.push(parent.as_str());
                    }
                }
            }
        }
    }

    result
}
