use crate::config::Config;
use crate::graph::SymbolGraph;
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

/// Why a keep rule could not evaluate a class
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("{0}")]
    Failed(String),
}

/// Policy deciding which symbols of a class are kept unconditionally.
///
/// Implementations read the graph only, so one rule may be evaluated for many
/// classes at once, and results from several rules are combined by union.
pub trait KeepRule<G: SymbolGraph>: Send + Sync {
    /// Short label used in logs and fault reports
    fn name(&self) -> String;

    fn keep_symbols(&self, class: G::Handle, graph: &G) -> Result<HashSet<G::Handle>, RuleError>;
}

/// Keeps methods by name in classes selected by a name suffix.
///
/// A method matches when its `Owner.name:descriptor` string contains
/// `.name:` for one of the configured names. Both tests are unanchored:
/// suffix `FooTest` also selects `BarFooTest`, and the method test is a raw
/// substring over the whole key.
#[derive(Debug, Clone)]
pub struct NamePatternRule {
    class_suffix: String,
    method_names: Vec<String>,
    /// `.name:` for each method name
    tokens: Vec<String>,
}

impl NamePatternRule {
    pub fn new<S: Into<String>>(
        class_suffix: impl Into<String>,
        method_names: impl IntoIterator<Item = S>,
    ) -> Self {
        let method_names: Vec<String> = method_names.into_iter().map(Into::into).collect();
        let tokens = method_names.iter().map(|m| format!(".{}:", m)).collect();
        Self {
            class_suffix: class_suffix.into(),
            method_names,
            tokens,
        }
    }
}

impl<G: SymbolGraph> KeepRule<G> for NamePatternRule {
    fn name(&self) -> String {
        format!("keep {} {{{}}}", self.class_suffix, self.method_names.join(", "))
    }

    fn keep_symbols(&self, class: G::Handle, graph: &G) -> Result<HashSet<G::Handle>, RuleError> {
        let mut symbols = HashSet::new();

        if graph.class_name(class).ends_with(&self.class_suffix) {
            for member in graph.methods(class) {
                let name = graph.class_name(member);
                if self.tokens.iter().any(|token| name.contains(token.as_str())) {
                    debug!("Kept by name pattern: {}", name);
                    symbols.insert(member);
                }
            }
        }

        Ok(symbols)
    }
}

/// Keeps every symbol of the class carrying a marker annotation
#[derive(Debug, Clone)]
pub struct AnnotationRule {
    marker: String,
    /// `.Marker`, to match qualified tags
    qualified_suffix: String,
}

impl AnnotationRule {
    pub fn new(marker: impl Into<String>) -> Self {
        let marker = marker.into();
        let qualified_suffix = format!(".{}", marker);
        Self {
            marker,
            qualified_suffix,
        }
    }

    fn matches(&self, tag: &str) -> bool {
        let tag = tag.strip_prefix('@').unwrap_or(tag);
        tag == self.marker || tag.ends_with(&self.qualified_suffix)
    }
}

impl<G: SymbolGraph> KeepRule<G> for AnnotationRule {
    fn name(&self) -> String {
        format!("keep @{}", self.marker)
    }

    fn keep_symbols(&self, class: G::Handle, graph: &G) -> Result<HashSet<G::Handle>, RuleError> {
        let symbols: HashSet<_> = std::iter::once(class)
            .chain(graph.members(class))
            .filter(|&symbol| graph.annotations(symbol).iter().any(|tag| self.matches(tag)))
            .collect();

        for &symbol in &symbols {
            debug!("Kept by annotation @{}: {}", self.marker, graph.class_name(symbol));
        }

        Ok(symbols)
    }
}

/// Keeps symbols the runtime or a framework calls from outside the program.
///
/// An entry is a class name, a full `Owner.name:descriptor` member key, or
/// `Owner.name` to keep every overload.
#[derive(Debug, Clone, Default)]
pub struct EntryPointRule {
    entries: HashSet<String>,
    /// `Owner.name:` prefixes for overload entries
    prefixes: Vec<String>,
}

impl EntryPointRule {
    pub fn new<S: Into<String>>(entries: impl IntoIterator<Item = S>) -> Self {
        let entries: HashSet<String> = entries.into_iter().map(Into::into).collect();
        let mut prefixes: Vec<String> = entries
            .iter()
            .filter(|e| !e.contains(':'))
            .map(|e| format!("{}:", e))
            .collect();
        prefixes.sort();
        Self { entries, prefixes }
    }

    fn matches(&self, qualified_name: &str) -> bool {
        self.entries.contains(qualified_name)
            || self.prefixes.iter().any(|p| qualified_name.starts_with(p.as_str()))
    }
}

impl<G: SymbolGraph> KeepRule<G> for EntryPointRule {
    fn name(&self) -> String {
        format!("entry points ({})", self.entries.len())
    }

    fn keep_symbols(&self, class: G::Handle, graph: &G) -> Result<HashSet<G::Handle>, RuleError> {
        let mut symbols = HashSet::new();

        if self.entries.contains(graph.class_name(class)) {
            debug!("Entry point class: {}", graph.class_name(class));
            symbols.insert(class);
        }

        for member in graph.members(class) {
            if self.matches(graph.class_name(member)) {
                debug!("Entry point: {}", graph.class_name(member));
                symbols.insert(member);
            }
        }

        Ok(symbols)
    }
}

/// Build the keep rules described by the configuration
pub fn rules_from_config<G: SymbolGraph>(config: &Config) -> Vec<Box<dyn KeepRule<G>>> {
    let mut rules: Vec<Box<dyn KeepRule<G>>> = Vec::new();

    for keep in &config.keep {
        rules.push(Box::new(NamePatternRule::new(
            keep.class.clone(),
            keep.methods.iter().cloned(),
        )));
    }

    for marker in &config.keep_annotations {
        rules.push(Box::new(AnnotationRule::new(marker.clone())));
    }

    if !config.entry_points.is_empty() {
        rules.push(Box::new(EntryPointRule::new(config.entry_points.iter().cloned())));
    }

    rules
}
