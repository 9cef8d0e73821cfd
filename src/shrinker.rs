use crate::analysis::{rules_from_config, KeepRule, ReachabilityEngine, SweepOutcome, Sweeper};
use crate::config::Config;
use crate::error::Result;
use crate::graph::{GraphBuilder, ProgramGraph};
use crate::program::Program;
use std::time::Instant;
use tracing::info;

/// One complete shrink pass: build the graph, compute roots, mark, sweep.
///
/// Nothing is produced unless every stage succeeds.
pub struct Shrinker<'a> {
    config: &'a Config,
}

impl<'a> Shrinker<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Shrink with the keep rules described by the configuration
    pub fn run<P: Clone + Sync>(&self, program: &Program<P>) -> Result<SweepOutcome<P>> {
        self.run_with_rules(program, |_| Vec::new())
    }

    /// Shrink with the configured rules plus extra rules built for the graph
    pub fn run_with_rules<'p, P, F>(
        &self,
        program: &'p Program<P>,
        extra: F,
    ) -> Result<SweepOutcome<P>>
    where
        P: Clone + Sync,
        F: FnOnce(&ProgramGraph<'p, P>) -> Vec<Box<dyn KeepRule<ProgramGraph<'p, P>>>>,
    {
        let start = Instant::now();
        let analysis = &self.config.analysis;

        let graph = GraphBuilder::new()
            .with_parallel(analysis.parallel)
            .build(program)?;

        let mut rules: Vec<Box<dyn KeepRule<ProgramGraph<'p, P>>>> = rules_from_config(self.config);
        rules.extend(extra(&graph));

        let engine = ReachabilityEngine::new()
            .with_parallel(analysis.parallel)
            .with_order(analysis.worklist);

        let roots = engine.compute_roots(&graph, &rules);
        let reached = engine.mark(&graph, &roots.symbols)?;

        let mut outcome = Sweeper::new().sweep(&graph, &reached)?;
        outcome.report.roots = roots.len();
        outcome.report.rule_faults = roots.faults;

        info!(
            "Shrink complete in {:.2?}: kept {} classes, removed {} symbols",
            start.elapsed(),
            outcome.report.classes_retained,
            outcome.report.total_removed()
        );

        Ok(outcome)
    }
}
