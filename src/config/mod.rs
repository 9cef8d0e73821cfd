mod loader;

pub use loader::{AnalysisConfig, Config, KeepConfig, ReportConfig};
