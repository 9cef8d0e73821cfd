use clap::Parser;
use colored::Colorize;
use deadsweep::config::KeepConfig;
use deadsweep::{Config, Program, ReportFormat, Reporter, Shrinker, WorklistOrder};
use miette::{IntoDiagnostic, Result, WrapErr};
use std::path::{Path, PathBuf};
use tracing::info;

/// deadsweep - Remove unreachable classes, methods and fields from a program
#[derive(Parser, Debug)]
#[command(name = "deadsweep")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Program model to shrink (JSON)
    input: PathBuf,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the shrunk program here (omit for a dry run)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Report format (defaults to the configured one)
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Write the JSON report to a file instead of stdout
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,

    /// Keep methods of matching classes, as CLASS_SUFFIX:method1,method2
    /// (can be specified multiple times)
    #[arg(long, value_name = "RULE")]
    keep: Vec<String>,

    /// Keep classes and members carrying this annotation
    /// (can be specified multiple times)
    #[arg(long, value_name = "NAME")]
    keep_annotation: Vec<String>,

    /// Class or member called from outside the program
    /// (can be specified multiple times)
    #[arg(long, value_name = "NAME")]
    entry_point: Vec<String>,

    /// Build, evaluate rules and mark in parallel
    #[arg(long)]
    parallel: bool,

    /// Drain the worklist breadth-first
    #[arg(long)]
    bfs: bool,

    /// Only print counts, not every removed symbol
    #[arg(long)]
    summary: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode - only output results
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, Default)]
enum OutputFormat {
    #[default]
    Terminal,
    Json,
}

impl From<OutputFormat> for ReportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Terminal => ReportFormat::Terminal,
            OutputFormat::Json => ReportFormat::Json,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose, cli.quiet);

    info!("deadsweep v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = load_config(&cli)?;

    run(&config, &cli)
}

fn init_logging(verbose: bool, quiet: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    // Logs go to stderr so JSON on stdout stays parseable
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else {
        // Try to load from default locations next to the input
        let dir = cli
            .input
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        Config::from_default_locations(dir)?
    };

    // Override with CLI arguments
    for rule in &cli.keep {
        config.keep.push(KeepConfig::parse(rule)?);
    }
    config.keep_annotations.extend(cli.keep_annotation.clone());
    config.entry_points.extend(cli.entry_point.clone());

    if cli.parallel {
        config.analysis.parallel = true;
    }
    if cli.bfs {
        config.analysis.worklist = WorklistOrder::BreadthFirst;
    }

    Ok(config)
}

fn read_program(path: &Path) -> Result<Program> {
    let contents = std::fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read program: {}", path.display()))?;

    serde_json::from_str(&contents)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to parse program model: {}", path.display()))
}

fn run(config: &Config, cli: &Cli) -> Result<()> {
    let format = match cli.format {
        Some(format) => format.into(),
        None => ReportFormat::from_name(&config.report.format).ok_or_else(|| {
            miette::miette!("Unknown report format '{}' in configuration", config.report.format)
        })?,
    };

    let program = read_program(&cli.input)?;
    let (classes, methods, fields) = program.counts();
    info!(
        "Loaded {} classes, {} methods, {} fields from {}",
        classes,
        methods,
        fields,
        cli.input.display()
    );

    if !config.has_keep_rules() && !cli.quiet {
        eprintln!(
            "{}",
            "Warning: no keep rules configured, everything will be removed".yellow()
        );
    }

    let outcome = Shrinker::new(config).run(&program).map_err(|e| {
        let stage = e.stage();
        miette::Report::new(e).wrap_err(format!("Shrink failed in {} stage", stage))
    })?;

    if let Some(output) = &cli.output {
        let json = serde_json::to_string_pretty(&outcome.program).into_diagnostic()?;
        std::fs::write(output, json)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to write output: {}", output.display()))?;
        info!("Shrunk program written to {}", output.display());
    } else {
        info!("Dry run, no output written");
    }

    let reporter = Reporter::new(format, cli.report.clone()).with_symbols(!cli.summary);
    reporter.report(&outcome.report)?;

    Ok(())
}
