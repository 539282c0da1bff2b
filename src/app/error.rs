use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Success, nothing to report.
pub const SUCCESS: i32 = 0;
/// Check mode found at least one non-conforming file.
pub const VIOLATIONS_FOUND: i32 = 1;
/// Usage, filesystem, configuration or external tool error.
pub const TOOL_ERROR: i32 = 2;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Filesystem error at {}: {source}", .path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} is not inside a git working tree", .0.display())]
    NotARepository(PathBuf),
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),
    #[error("File system walk error: {0}")]
    Walk(#[from] ignore::Error),
    #[error("Invalid glob pattern: {0}")]
    Pattern(#[from] globset::Error),
    #[error("Failed to run '{tool}': {source}")]
    ToolSpawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },
    #[error("'{tool}' exited with {status}")]
    ToolFailed { tool: String, status: ExitStatus },
    #[error("Failed to start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
    #[error("Invalid configuration in {}: {message}", .path.display())]
    Config { path: PathBuf, message: String },
}

impl Error {
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
