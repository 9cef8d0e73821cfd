use crate::analysis::{RuleFault, SweepReport};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::path::PathBuf;

/// JSON reporter for programmatic output
pub struct JsonReporter {
    output_path: Option<PathBuf>,
}

impl JsonReporter {
    pub fn new(output_path: Option<PathBuf>) -> Self {
        Self { output_path }
    }

    pub fn report(&self, report: &SweepReport) -> Result<()> {
        let json = render(report)?;

        if let Some(path) = &self.output_path {
            std::fs::write(path, &json).into_diagnostic()?;
            println!("Report written to: {}", path.display());
        } else {
            println!("{}", json);
        }

        Ok(())
    }
}

/// Pretty JSON document for a sweep report
pub fn render(report: &SweepReport) -> Result<String> {
    serde_json::to_string_pretty(&JsonReport::from_sweep(report)).into_diagnostic()
}

#[derive(Serialize)]
struct JsonReport<'a> {
    version: &'static str,
    total_removed: usize,
    removed: JsonCounts,
    retained: JsonCounts,
    empty_classes_retained: usize,
    annotations_stripped: usize,
    roots: usize,
    reached: usize,
    symbols: &'a [String],
    rule_faults: &'a [RuleFault],
}

#[derive(Serialize)]
struct JsonCounts {
    classes: usize,
    methods: usize,
    fields: usize,
}

impl<'a> JsonReport<'a> {
    fn from_sweep(report: &'a SweepReport) -> Self {
        Self {
            version: "1.0",
            total_removed: report.total_removed(),
            removed: JsonCounts {
                classes: report.classes_removed,
                methods: report.methods_removed,
                fields: report.fields_removed,
            },
            retained: JsonCounts {
                classes: report.classes_retained,
                methods: report.methods_retained,
                fields: report.fields_retained,
            },
            empty_classes_retained: report.empty_classes_retained,
            annotations_stripped: report.annotations_stripped,
            roots: report.roots,
            reached: report.reached,
            symbols: &report.removed,
            rule_faults: &report.rule_faults,
        }
    }
}
