use super::{ReachedSet, RuleFault};
use crate::error::{Result, ShrinkError};
use crate::graph::{ProgramGraph, SymbolGraph, SymbolKind};
use crate::program::{ClassDef, MemberDef, MemberKind, Program};
use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// What a shrink pass removed and kept
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    pub classes_removed: usize,
    pub methods_removed: usize,
    pub fields_removed: usize,

    pub classes_retained: usize,
    pub methods_retained: usize,
    pub fields_retained: usize,

    /// Retained classes left with no members
    pub empty_classes_retained: usize,

    /// Annotation tags dropped because their annotation class was removed
    pub annotations_stripped: usize,

    pub roots: usize,
    pub reached: usize,

    /// Qualified names of every removed class and member, sorted
    #[serde(default)]
    pub removed: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rule_faults: Vec<RuleFault>,
}

impl SweepReport {
    pub fn total_removed(&self) -> usize {
        self.classes_removed + self.methods_removed + self.fields_removed
    }

    fn count_removed<P>(&mut self, member: &MemberDef<P>) {
        match member.kind {
            MemberKind::Method => self.methods_removed += 1,
            MemberKind::Field => self.fields_removed += 1,
        }
    }

    fn count_retained<P>(&mut self, member: &MemberDef<P>) {
        match member.kind {
            MemberKind::Method => self.methods_retained += 1,
            MemberKind::Field => self.fields_retained += 1,
        }
    }
}

/// The filtered program and what was removed from it
#[derive(Debug, Clone)]
pub struct SweepOutcome<P = serde_json::Value> {
    pub program: Program<P>,
    pub report: SweepReport,
}

/// Materializes a reached set as a filtered program
pub struct Sweeper;

impl Sweeper {
    pub fn new() -> Self {
        Self
    }

    /// Drop every class and member that was not reached.
    ///
    /// Runs only after marking has finished. Fails without producing anything
    /// when the reached set is not referentially closed.
    pub fn sweep<P: Clone + Sync>(
        &self,
        graph: &ProgramGraph<'_, P>,
        reached: &ReachedSet<NodeIndex>,
    ) -> Result<SweepOutcome<P>> {
        Self::verify_integrity(graph, reached)?;

        let mut report = SweepReport {
            reached: reached.len(),
            ..SweepReport::default()
        };
        let mut classes = Vec::new();

        for (class_idx, class) in graph.program().classes.iter().enumerate() {
            if !reached.contains(graph.class_node(class_idx)) {
                debug!("Removing class {}", class.name);
                report.classes_removed += 1;
                report.removed.push(class.name.clone());
                for member in &class.members {
                    report.count_removed(member);
                    report.removed.push(member.qualified_name(&class.name));
                }
                continue;
            }

            let mut members = Vec::new();
            for (member_idx, member) in class.members.iter().enumerate() {
                // The static initializer of a reached class was marked with it
                if reached.contains(graph.member_node(class_idx, member_idx)) {
                    report.count_retained(member);
                    let mut member = member.clone();
                    member.annotations =
                        self.live_annotations(graph, reached, &member.annotations, &mut report);
                    members.push(member);
                } else {
                    let name = member.qualified_name(&class.name);
                    debug!("Removing {}", name);
                    report.count_removed(member);
                    report.removed.push(name);
                }
            }

            report.classes_retained += 1;
            if members.is_empty() {
                report.empty_classes_retained += 1;
            }

            classes.push(ClassDef {
                name: class.name.clone(),
                superclass: class.superclass.clone(),
                interfaces: class.interfaces.clone(),
                annotations: self.live_annotations(graph, reached, &class.annotations, &mut report),
                members,
                payload: class.payload.clone(),
            });
        }

        report.removed.sort();

        info!(
            "Sweep: removed {} classes, {} methods, {} fields",
            report.classes_removed, report.methods_removed, report.fields_removed
        );

        Ok(SweepOutcome {
            program: Program::new(classes),
            report,
        })
    }

    /// Check that every reached symbol only references reached symbols.
    ///
    /// Reports the lexically smallest violation so failures are reproducible.
    pub fn verify_integrity<G: SymbolGraph>(
        graph: &G,
        reached: &ReachedSet<G::Handle>,
    ) -> Result<()> {
        let mut violations: Vec<(String, String)> = Vec::new();

        for node in reached.iter() {
            for (target, kind) in graph.outgoing_edges(node) {
                if !kind.is_traversed() || reached.contains(target) {
                    continue;
                }
                let target_name = if graph.contains(target) {
                    graph.class_name(target).to_string()
                } else {
                    format!("{:?}", target)
                };
                violations.push((graph.class_name(node).to_string(), target_name));
            }
        }

        match violations.into_iter().min() {
            Some((from, target)) => Err(ShrinkError::IntegrityViolation { from, target }),
            None => Ok(()),
        }
    }

    /// Annotation tags minus those naming a removed class of the program
    fn live_annotations<P: Sync>(
        &self,
        graph: &ProgramGraph<'_, P>,
        reached: &ReachedSet<NodeIndex>,
        tags: &[String],
        report: &mut SweepReport,
    ) -> Vec<String> {
        tags.iter()
            .filter(|tag| {
                let removed = graph
                    .find(tag)
                    .map(|node| graph.kind(node) == SymbolKind::Class && !reached.contains(node))
                    .unwrap_or(false);
                if removed {
                    report.annotations_stripped += 1;
                }
                !removed
            })
            .cloned()
            .collect()
    }
}

impl Default for Sweeper {
    fn default() -> Self {
        Self::new()
    }
}
