mod terminal;
mod json;

pub use terminal::TerminalReporter;
pub use json::JsonReporter;

use crate::analysis::SweepReport;
use miette::Result;
use std::path::PathBuf;

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Terminal,
    Json,
}

impl ReportFormat {
    /// Parse the `report.format` configuration value
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "terminal" | "text" => Some(Self::Terminal),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Reporter for outputting the result of a shrink pass
pub struct Reporter {
    format: ReportFormat,
    output_path: Option<PathBuf>,
    show_symbols: bool,
}

impl Reporter {
    pub fn new(format: ReportFormat, output_path: Option<PathBuf>) -> Self {
        Self {
            format,
            output_path,
            show_symbols: true,
        }
    }

    /// List removed symbols in terminal output, not just the counts
    pub fn with_symbols(mut self, show: bool) -> Self {
        self.show_symbols = show;
        self
    }

    pub fn report(&self, report: &SweepReport) -> Result<()> {
        match &self.format {
            ReportFormat::Terminal => {
                let reporter = TerminalReporter::new().with_symbols(self.show_symbols);
                reporter.report(report)
            }
            ReportFormat::Json => {
                let reporter = JsonReporter::new(self.output_path.clone());
                reporter.report(report)
            }
        }
    }
}
