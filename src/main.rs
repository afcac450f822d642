//! plansim - query plan simulator
//!
//! Command-line entry point: plan a single query, or start the REPL.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use plansim::planner::RuleSet;
use plansim::session::{Repl, Workbench, WorkbenchConfig};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    /// Only errors
    Error,
    /// Warnings and errors
    Warn,
    /// Info, warnings, and errors
    Info,
    /// Debug messages and above (verbose)
    Debug,
    /// All messages including trace (very verbose)
    Trace,
    /// Disable all logging
    Off,
}

impl LogLevel {
    fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
            LogLevel::Off => log::LevelFilter::Off,
        }
    }
}

/// Build a naive query plan and optimize it with cost-based rewrite rules
#[derive(Parser, Debug)]
#[command(name = "plansim")]
#[command(version)]
struct Cli {
    /// Query to plan. Starts the interactive REPL when omitted
    query: Option<String>,

    /// Catalog JSON file (defaults to the built-in demo schema)
    #[arg(short = 'c', long = "catalog")]
    catalog: Option<PathBuf>,

    /// Enabled rules: comma-separated ids, `all` or `none`
    #[arg(short = 'r', long = "rules", default_value = "all")]
    rules: String,

    /// Print the export document as JSON instead of plan trees
    #[arg(long)]
    json: bool,

    /// Skip query pre-validation
    #[arg(long = "no-validate")]
    no_validate: bool,

    /// Set log level (error, warn, info, debug, trace, off)
    #[arg(short = 'l', long = "log-level", value_enum)]
    log_level: Option<LogLevel>,

    /// Verbose mode (equivalent to --log-level debug)
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match (cli.log_level, cli.verbose) {
        (Some(level), _) => level.to_level_filter(),
        (None, true) => log::LevelFilter::Debug,
        (None, false) => log::LevelFilter::Warn,
    };
    env_logger::Builder::new().filter_level(level).init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = WorkbenchConfig::new()
        .enabled_rules(RuleSet::parse(&cli.rules)?)
        .validate(!cli.no_validate);
    if let Some(path) = cli.catalog {
        config = config.catalog_path(path);
    }
    let mut workbench = Workbench::open(config)?;

    let Some(query) = cli.query else {
        let mut repl = Repl::new(workbench);
        repl.run()?;
        return Ok(());
    };

    let comparison = workbench.submit(&query)?;
    if cli.json {
        println!("{}", comparison.to_json_pretty()?);
        return Ok(());
    }

    println!("Naive {}", comparison.naive());
    println!("Optimized {}", comparison.optimized());
    let improvement = comparison.improvement();
    println!(
        "Cost reduction: {:.2} ({:.1}%)",
        improvement.cost_reduction, improvement.percentage_improvement
    );
    for note in comparison.details() {
        println!("  - {}", note);
    }
    Ok(())
}
