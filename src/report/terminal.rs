use crate::analysis::SweepReport;
use colored::Colorize;
use miette::Result;
use std::collections::BTreeMap;

/// Terminal reporter with colored output
pub struct TerminalReporter {
    /// List each removed symbol, grouped by class
    show_symbols: bool,
}

impl TerminalReporter {
    pub fn new() -> Self {
        Self { show_symbols: true }
    }

    pub fn with_symbols(mut self, show: bool) -> Self {
        self.show_symbols = show;
        self
    }

    pub fn report(&self, report: &SweepReport) -> Result<()> {
        println!();

        if report.total_removed() == 0 {
            println!("{}", "Nothing to remove, every symbol is reachable".green().bold());
        } else {
            println!(
                "{}",
                format!("Removed {} symbols:", report.total_removed())
                    .yellow()
                    .bold()
            );
            println!();

            if self.show_symbols {
                self.print_removed(report);
            }
        }

        if !report.rule_faults.is_empty() {
            println!("{}", "Keep rule faults:".red().bold());
            for fault in &report.rule_faults {
                println!("  {} {}", "!".red(), fault);
            }
            println!();
        }

        self.print_summary(report);

        Ok(())
    }

    fn print_removed(&self, report: &SweepReport) {
        let by_class = group_by_class(&report.removed);

        for (class, members) in by_class {
            if members.is_empty() {
                println!("  {} {}", "class".red(), class.white().bold());
            } else {
                println!("{}", class.cyan().bold());
                for member in members {
                    println!("    {} {}", "-".dimmed(), member);
                }
            }
        }
        println!();
    }

    fn print_summary(&self, report: &SweepReport) {
        println!("{}", "─".repeat(60).dimmed());

        println!(
            "Removed:  {} classes, {} methods, {} fields",
            report.classes_removed.to_string().red(),
            report.methods_removed.to_string().red(),
            report.fields_removed.to_string().red()
        );
        println!(
            "Retained: {} classes, {} methods, {} fields",
            report.classes_retained.to_string().green(),
            report.methods_retained.to_string().green(),
            report.fields_retained.to_string().green()
        );
        println!(
            "{}",
            format!("{} roots, {} symbols reached", report.roots, report.reached).dimmed()
        );

        if report.empty_classes_retained > 0 {
            println!(
                "{}",
                format!("{} retained classes have no members left", report.empty_classes_retained)
                    .dimmed()
            );
        }
        if report.annotations_stripped > 0 {
            println!(
                "{}",
                format!("{} annotations of removed classes stripped", report.annotations_stripped)
                    .dimmed()
            );
        }

        println!();
    }
}

impl Default for TerminalReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Removed names keyed by class. A removed class maps to no members; the
/// members it took with it are not repeated.
fn group_by_class(removed: &[String]) -> BTreeMap<&str, Vec<&str>> {
    let mut removed_classes: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    let mut by_class: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

    for name in removed {
        match split_member(name) {
            Some((class, member)) => by_class.entry(class).or_default().push(member),
            None => {
                removed_classes.insert(name.as_str(), Vec::new());
            }
        }
    }

    by_class.retain(|class, _| !removed_classes.contains_key(class));
    by_class.extend(removed_classes);
    by_class
}

/// `Owner.name:desc` into (`Owner`, `name:desc`); class names have no ':'
fn split_member(name: &str) -> Option<(&str, &str)> {
    let colon = name.find(':')?;
    let dot = name[..colon].rfind('.')?;
    Some((&name[..dot], &name[dot + 1..]))
}
