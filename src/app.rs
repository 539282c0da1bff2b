// Declare modules
pub mod cli;
pub mod config;
pub mod error;
pub mod expander;
pub mod formatter;
pub mod locator;
pub mod models;
pub mod resolver;
pub mod runner;

use anyhow::{Context, Result};
use clap::Parser;
use std::env;
use std::sync::Arc;

use self::cli::{Cli, Command};
use self::config::resolve_config;
use self::error::{SUCCESS, VIOLATIONS_FOUND};
use self::formatter::{ClangFormat, Formatter};
use self::locator::find_config_slots;
use self::models::{Action, RuntimeConfig};
use self::resolver::{discover_root, resolve_file_set};
use self::runner::build_runner;

/// Parses arguments, resolves the repository and dispatches the subcommand.
///
/// Returns the process exit code.
pub fn run() -> Result<i32> {
    let args = Cli::parse();
    init_logging(&args);

    let start = match &args.directory {
        Some(dir) => dir.clone(),
        None => env::current_dir().context("Failed to get current directory")?,
    };
    let root = discover_root(&start)?;
    log::debug!("Repository root: {}", root.display());

    let config = resolve_config(&args, root)?;
    let formatter: Arc<dyn Formatter> = Arc::new(ClangFormat::new(config.formatter.clone()));

    match &args.command {
        Command::Gen { .. } => generate(&config, formatter.as_ref()),
        Command::Fmt(run) => apply(&config, formatter, Action::Format, run.list),
        Command::Chk(run) => apply(&config, formatter, Action::Check, run.list),
    }
}

fn init_logging(args: &Cli) {
    let level = if args.verbose {
        "debug"
    } else if args.quiet {
        "warn"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn generate(config: &RuntimeConfig, formatter: &dyn Formatter) -> Result<i32> {
    let slots = find_config_slots(&config.root).context("Failed to locate .clang-format files")?;
    if slots.is_empty() {
        log::warn!("No .clang-format files found under {}", config.root.display());
    }

    let result = expander::generate(formatter, &config.intent, &slots)
        .with_context(|| format!("Failed to expand {}", config.intent.display()))?;
    log::info!(
        "{} configuration(s) updated, {} unchanged",
        result.updated.len(),
        result.unchanged.len()
    );
    Ok(SUCCESS)
}

fn apply(
    config: &RuntimeConfig,
    formatter: Arc<dyn Formatter>,
    action: Action,
    list_only: bool,
) -> Result<i32> {
    let slots = find_config_slots(&config.root).context("Failed to locate .clang-format files")?;
    if slots.is_empty() {
        log::warn!("No .clang-format files found under {}", config.root.display());
        return Ok(SUCCESS);
    }

    let files = resolve_file_set(&config.root, &slots, &config.patterns)
        .context("Failed to enumerate tracked files")?;
    log::info!(
        "{} file(s) governed by {} configuration(s)",
        files.len(),
        slots.len()
    );

    if files.is_empty() {
        return Ok(SUCCESS);
    }
    if list_only {
        for file in &files.files {
            println!("{}", file.display());
        }
        return Ok(SUCCESS);
    }

    let report = build_runner(config, formatter).run(&config.root, action, &files)?;
    log::debug!("{report:?}");

    match action {
        Action::Check if !report.succeeded() => {
            if report.cancelled {
                log::error!(
                    "Formatting check failed, halted after {} of {} batch(es)",
                    report.dispatched,
                    report.batches
                );
            } else {
                log::error!("Formatting check failed");
            }
            Ok(VIOLATIONS_FOUND)
        }
        Action::Format if !report.succeeded() => {
            log::warn!("{} of {} batch(es) failed", report.failed, report.batches);
            Ok(SUCCESS)
        }
        _ => Ok(SUCCESS),
    }
}
