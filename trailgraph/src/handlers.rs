use anyhow::{Context, Result, bail};
use clap::ArgMatches;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use trailgraph_core::{RunOptions, RunOutcome, RunProgressCallback, TimeFormat, execute_run};
use trailgraph_engine::frequency::{DEFAULT_PATH_LIMIT, DEFAULT_WINDOW};
use trailgraph_engine::{AnalysisOptions, NodeKey};

pub const DEFAULT_OUTPUT_DIR: &str = "outputs";

/// Expand a leading `~` in a user supplied path.
pub fn resolve_path(raw: &str) -> PathBuf {
    let expanded = shellexpand::tilde(raw);
    PathBuf::from(expanded.as_ref())
}

/// Filter used when `RUST_LOG` is not set.
pub fn default_log_filter(verbose: bool) -> &'static str {
    if verbose { "info" } else { "warn" }
}

/// Send logs to stderr so stdout only carries the output directory.
pub fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_filter(verbose)));

    // A subscriber may already be installed when running under a test harness
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Map `analyze` arguments onto run options.
pub fn build_run_options(args: &ArgMatches) -> Result<RunOptions> {
    let input = args
        .get_one::<String>("INPUT")
        .context("an input CSV file is required")?;
    let output_dir = args
        .get_one::<String>("OUTPUT_DIR")
        .map(String::as_str)
        .unwrap_or(DEFAULT_OUTPUT_DIR);

    let window = args.get_one::<usize>("window").copied().unwrap_or(DEFAULT_WINDOW);
    let min_count = args.get_one::<usize>("min-count").copied().unwrap_or(1);
    let limit = match args.get_one::<usize>("top").copied().unwrap_or(DEFAULT_PATH_LIMIT) {
        0 => None,
        n => Some(n),
    };

    let node_key = match args.get_one::<String>("group-by") {
        Some(raw) => NodeKey::from_str(raw).with_context(|| format!("unknown node key '{}'", raw))?,
        None => NodeKey::default(),
    };
    let time_format = match args.get_one::<String>("time-format") {
        Some(raw) => {
            TimeFormat::from_str(raw).with_context(|| format!("unknown time format '{}'", raw))?
        }
        None => TimeFormat::default(),
    };

    let analysis = AnalysisOptions::new()
        .with_node_key(node_key)
        .with_window(window)
        .with_min_count(min_count)
        .with_path_limit(limit)
        .with_source(args.get_one::<String>("from").cloned())
        .with_target(args.get_one::<String>("to").cloned());
    analysis.validate().context("invalid analysis options")?;

    let mut options = RunOptions::new(resolve_path(input), resolve_path(output_dir));
    options.analysis = analysis;
    options.time_format = time_format;
    options.emit_json = args.get_flag("json");

    Ok(options)
}

fn spinner(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

fn print_outcome(outcome: &RunOutcome, quiet: bool) {
    if !quiet {
        for path in &outcome.writes.written {
            eprintln!("{} {}", "✓".green().bold(), path.display());
        }
        eprintln!(
            "{} {} records, {} nodes, {} edges",
            "→".blue(),
            outcome.record_count,
            outcome.node_count,
            outcome.edge_count
        );
    }
    for failure in &outcome.writes.failures {
        eprintln!("{} {}", "✗".red().bold(), failure);
    }
}

/// Run the `analyze` subcommand.
///
/// Progress and per-artifact status go to stderr; on success the output
/// directory is the only thing printed on stdout.
pub async fn handle_analyze(args: &ArgMatches, quiet: bool) -> Result<()> {
    let options = build_run_options(args)?;
    let input = options.input.clone();

    let spinner = spinner(quiet);
    let progress_callback: RunProgressCallback = {
        let spinner = spinner.clone();
        Arc::new(move |msg: String| spinner.set_message(msg))
    };

    let result = execute_run(options, Some(progress_callback)).await;
    spinner.finish_and_clear();

    let outcome = result.with_context(|| format!("analysis of {} failed", input.display()))?;

    print_outcome(&outcome, quiet);

    if !outcome.is_complete() {
        bail!(
            "{} of {} artifacts could not be written to {}",
            outcome.writes.failures.len(),
            outcome.writes.failures.len() + outcome.writes.written.len(),
            outcome.output_dir.display()
        );
    }

    println!("{}", outcome.output_dir.display());
    Ok(())
}
