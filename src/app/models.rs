use serde::Deserialize;
use std::path::PathBuf;

/// Conventional name of the per-directory style configuration file.
pub const CONFIG_FILE_NAME: &str = ".clang-format";

/// Represents the final configuration after merging config files, environment and CLI args.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub root: PathBuf,
    pub formatter: String,
    pub parallel: String,
    pub runner: RunnerKind,
    pub intent: PathBuf,
    pub patterns: Vec<String>,
    pub batch_size: usize,
    pub jobs: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RunnerKind {
    /// Fan batches out through GNU parallel.
    Parallel,
    /// Fan batches out over an in-process worker pool.
    Builtin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Rewrite files in place.
    Format,
    /// Report the first violation per file and fail.
    Check,
}

impl Action {
    /// Check mode halts outstanding work on the first failing batch.
    pub fn fail_fast(self) -> bool {
        matches!(self, Action::Check)
    }
}

/// A directory holding a `.clang-format` file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ConfigSlot {
    pub dir: PathBuf,
    /// `dir` relative to the repository root; empty for the root itself.
    pub relative_dir: PathBuf,
}

impl ConfigSlot {
    pub fn config_path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE_NAME)
    }

    pub fn relative_config_path(&self) -> PathBuf {
        self.relative_dir.join(CONFIG_FILE_NAME)
    }
}

/// Tracked source files governed by the discovered slots, root-relative and sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSet {
    pub files: Vec<PathBuf>,
}

impl FileSet {
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Outcome of running one action over a file set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    pub batches: usize,
    pub dispatched: usize,
    pub failed: usize,
    pub cancelled: bool,
}

impl RunReport {
    pub fn succeeded(&self) -> bool {
        self.failed == 0
    }
}
