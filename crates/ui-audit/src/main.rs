//! ui-audit - Main Entry Point
//!
//! Exit codes: 0 when the audit passes, 1 when it completes with failures,
//! 2 when it cannot complete.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;

use ui_audit::{AuditPlan, AuditRunner, Report, RunOptions};

/// Visual-regression and layout audit for a running website
#[derive(Parser)]
#[command(name = "ui-audit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// YAML audit plan; built-in defaults when omitted
    #[arg(long, global = true, env = "UI_AUDIT_PLAN")]
    plan: Option<PathBuf>,

    /// Override the plan's base URL
    #[arg(long, global = true, env = "UI_AUDIT_BASE_URL")]
    base_url: Option<String>,

    /// Root directory for screenshots, journal and report
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Console output format
    #[arg(long, default_value = "text", global = true)]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Compare screenshots against stored baselines
    #[arg(long)]
    compare_baselines: bool,

    /// Replace baselines with this run's screenshots
    #[arg(long, conflicts_with = "compare_baselines")]
    update_baselines: bool,

    /// Do not wait for the site before launching the browser
    #[arg(long)]
    skip_preflight: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the report from an existing issue journal
    Rebuild {
        /// Journal written by an earlier run; defaults to the plan's journal path
        #[arg(long)]
        journal: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Grouped listing with a summary table
    #[default]
    Text,
    /// The report JSON
    Json,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(true) => ExitCode::from(0),
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    let mut plan = match &cli.plan {
        Some(path) => AuditPlan::from_file(path)
            .with_context(|| format!("loading audit plan {}", path.display()))?,
        None => AuditPlan::default(),
    };
    if let Some(base_url) = cli.base_url {
        plan.base_url = base_url;
    }
    if let Some(dir) = cli.output {
        plan.reroot_output(dir);
    }

    let options = RunOptions {
        skip_preflight: cli.skip_preflight,
        compare_baselines: cli.compare_baselines,
        update_baselines: cli.update_baselines,
    };
    let runner = AuditRunner::new(plan, options);

    let report = match cli.command {
        Some(Commands::Rebuild { journal }) => {
            let journal = journal.unwrap_or_else(|| runner.plan().output.journal.clone());
            runner
                .rebuild_report(&journal)
                .with_context(|| format!("rebuilding report from {}", journal.display()))?
        }
        None => runner.run().await?,
    };

    print_report(&report, cli.format)?;
    Ok(report.passed())
}

fn print_report(report: &Report, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => print!("{}", report.render_console()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
    }
    Ok(())
}
