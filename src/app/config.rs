use crate::app::cli::{Cli, Command};
use crate::app::error::Error;
use crate::app::models::{RunnerKind, RuntimeConfig};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Per-repository settings, read from the repository root.
pub const REPO_CONFIG_FILE: &str = ".clang-format-runner.toml";

const DEFAULT_FORMATTER: &str = "clang-format";
const DEFAULT_PARALLEL: &str = "parallel";
const DEFAULT_INTENT: &str = ".clang-format-intent";
const DEFAULT_PATTERNS: [&str; 2] = ["*.cpp", "*.h"];
const DEFAULT_BATCH_SIZE: usize = 64;

/// One configuration layer; unset keys fall through to the layer below.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigLayer {
    formatter: Option<String>,
    parallel: Option<String>,
    runner: Option<RunnerKind>,
    intent: Option<PathBuf>,
    patterns: Option<Vec<String>>,
    batch_size: Option<usize>,
    jobs: Option<usize>,
}

impl ConfigLayer {
    /// Values from `over` win.
    fn merge(self, over: ConfigLayer) -> ConfigLayer {
        ConfigLayer {
            formatter: over.formatter.or(self.formatter),
            parallel: over.parallel.or(self.parallel),
            runner: over.runner.or(self.runner),
            intent: over.intent.or(self.intent),
            patterns: over.patterns.or(self.patterns),
            batch_size: over.batch_size.or(self.batch_size),
            jobs: over.jobs.or(self.jobs),
        }
    }

    fn from_cli(cli: &Cli) -> ConfigLayer {
        let intent = match &cli.command {
            Command::Gen { intent } => intent.clone(),
            Command::Fmt(_) | Command::Chk(_) => None,
        };
        ConfigLayer {
            formatter: cli.formatter.clone(),
            parallel: cli.parallel.clone(),
            runner: cli.runner,
            intent,
            patterns: None,
            batch_size: cli.batch_size,
            jobs: cli.jobs,
        }
    }
}

/// Reads a TOML layer; a missing file is an empty layer.
pub fn load_config_file(path: &Path) -> crate::app::error::Result<ConfigLayer> {
    if !path.exists() {
        return Ok(ConfigLayer::default());
    }
    let content = fs::read_to_string(path).map_err(|e| Error::filesystem(path, e))?;
    let layer: ConfigLayer = toml::from_str(&content).map_err(|e| Error::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    if layer.batch_size == Some(0) {
        return Err(Error::Config {
            path: path.to_path_buf(),
            message: "batch_size must be at least 1".to_string(),
        });
    }
    Ok(layer)
}

fn user_config_path() -> Option<PathBuf> {
    let home = dirs::home_dir()?;
    Some(
        home.join(".config")
            .join("clang_format_runner")
            .join("config.toml"),
    )
}

/// Merges user file, repository file and CLI/environment, in increasing precedence.
pub fn resolve_config(cli: &Cli, root: PathBuf) -> Result<RuntimeConfig> {
    let user = match user_config_path() {
        Some(path) => load_config_file(&path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => ConfigLayer::default(),
    };
    let repo_path = root.join(REPO_CONFIG_FILE);
    let repo = load_config_file(&repo_path)
        .with_context(|| format!("Failed to load {}", repo_path.display()))?;

    let merged = user.merge(repo).merge(ConfigLayer::from_cli(cli));
    Ok(finish(root, merged))
}

/// Fills unset keys with defaults. Each layer has already rejected a zero batch size.
fn finish(root: PathBuf, layer: ConfigLayer) -> RuntimeConfig {
    let batch_size = layer.batch_size.unwrap_or(DEFAULT_BATCH_SIZE).max(1);
    let jobs = layer.jobs.filter(|&j| j > 0).unwrap_or_else(|| {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    });
    let intent = root.join(layer.intent.unwrap_or_else(|| PathBuf::from(DEFAULT_INTENT)));

    RuntimeConfig {
        formatter: layer
            .formatter
            .unwrap_or_else(|| DEFAULT_FORMATTER.to_string()),
        parallel: layer
            .parallel
            .unwrap_or_else(|| DEFAULT_PARALLEL.to_string()),
        runner: layer.runner.unwrap_or(RunnerKind::Parallel),
        intent,
        patterns: layer
            .patterns
            .unwrap_or_else(|| DEFAULT_PATTERNS.iter().map(|p| p.to_string()).collect()),
        batch_size,
        jobs,
        root,
    }
}
