use crate::analysis::WorklistOrder;
use miette::{IntoDiagnostic, Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for a shrink pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Name-pattern keep rules
    pub keep: Vec<KeepConfig>,

    /// Annotation markers whose carriers are kept
    pub keep_annotations: Vec<String>,

    /// Classes or members called from outside the program
    pub entry_points: Vec<String>,

    /// Analysis configuration
    pub analysis: AnalysisConfig,

    /// Report configuration
    pub report: ReportConfig,
}

/// Keep methods named in `methods` on classes whose name ends with `class`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeepConfig {
    pub class: String,
    #[serde(default)]
    pub methods: Vec<String>,
}

impl KeepConfig {
    /// Parse the command-line form `Class:method1,method2`
    pub fn parse(rule: &str) -> Result<Self> {
        let (class, methods) = match rule.split_once(':') {
            Some((class, methods)) => (class.trim(), methods),
            None => (rule.trim(), ""),
        };

        if class.is_empty() {
            miette::bail!("Invalid keep rule '{}': expected CLASS:method1,method2", rule);
        }

        let methods = methods
            .split(',')
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(String::from)
            .collect();

        Ok(Self {
            class: class.to_string(),
            methods,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Build the graph, evaluate rules and mark on the rayon pool
    pub parallel: bool,

    /// Drain order of the sequential worklist
    pub worklist: WorklistOrder,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Output format: terminal, json
    pub format: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: "terminal".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a file (YAML or TOML)
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        match extension {
            "yml" | "yaml" => serde_yaml::from_str(&contents)
                .into_diagnostic()
                .wrap_err("Failed to parse YAML config"),
            "toml" => toml::from_str(&contents)
                .into_diagnostic()
                .wrap_err("Failed to parse TOML config"),
            _ => {
                // Try YAML first, then TOML
                if let Ok(config) = serde_yaml::from_str(&contents) {
                    Ok(config)
                } else {
                    toml::from_str(&contents)
                        .into_diagnostic()
                        .wrap_err("Failed to parse config file")
                }
            }
        }
    }

    /// Try to load configuration from default locations
    pub fn from_default_locations(dir: &Path) -> Result<Self> {
        let default_names = [
            ".deadsweep.yml",
            ".deadsweep.yaml",
            ".deadsweep.toml",
            "deadsweep.yml",
            "deadsweep.yaml",
            "deadsweep.toml",
        ];

        for name in &default_names {
            let path = dir.join(name);
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        // No config file found, use defaults
        Ok(Self::default())
    }

    /// Whether any keep rule is configured at all
    pub fn has_keep_rules(&self) -> bool {
        !self.keep.is_empty() || !self.keep_annotations.is_empty() || !self.entry_points.is_empty()
    }
}
