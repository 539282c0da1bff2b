use crate::app::error::{Error, Result};
use crate::app::models::Action;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// The external code formatter, as seen by the orchestration code.
pub trait Formatter: Send + Sync {
    /// Executable name or path.
    fn program(&self) -> &str;

    /// Arguments placed before the file list for `action`.
    fn action_args(&self, action: Action) -> Vec<String>;

    /// Prints the fully expanded configuration found in `scratch_dir`, byte for byte.
    fn dump_config(&self, scratch_dir: &Path) -> Result<Vec<u8>>;

    /// Fails with `ToolSpawn` when the executable cannot be started at all.
    ///
    /// Runners that hand the formatter to another process call this first, since
    /// that process would only report a missing formatter as ordinary job failures.
    fn ensure_available(&self) -> Result<()> {
        Command::new(self.program())
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|_| ())
            .map_err(|e| spawn_error(self.program(), e))
    }

    /// Runs `action` over one batch of root-relative files.
    fn run_batch(&self, root: &Path, action: Action, files: &[PathBuf]) -> Result<()> {
        let status = Command::new(self.program())
            .args(self.action_args(action))
            .args(files)
            .current_dir(root)
            .stdin(Stdio::null())
            .status()
            .map_err(|e| spawn_error(self.program(), e))?;
        if status.success() {
            Ok(())
        } else {
            Err(Error::ToolFailed {
                tool: self.program().to_string(),
                status,
            })
        }
    }
}

pub struct ClangFormat {
    program: String,
}

impl ClangFormat {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Formatter for ClangFormat {
    fn program(&self) -> &str {
        &self.program
    }

    fn action_args(&self, action: Action) -> Vec<String> {
        let args: &[&str] = match action {
            Action::Format => &["-i"],
            Action::Check => &[
                "--dry-run",
                "-Werror",
                "--ferror-limit=1",
                "-fcolor-diagnostics",
            ],
        };
        args.iter().map(|a| a.to_string()).collect()
    }

    fn dump_config(&self, scratch_dir: &Path) -> Result<Vec<u8>> {
        let output = Command::new(&self.program)
            .args(["--style=file", "--dump-config"])
            .current_dir(scratch_dir)
            .stdin(Stdio::null())
            .stderr(Stdio::inherit())
            .output()
            .map_err(|e| spawn_error(&self.program, e))?;
        if !output.status.success() {
            return Err(Error::ToolFailed {
                tool: self.program.clone(),
                status: output.status,
            });
        }
        Ok(output.stdout)
    }
}

pub(crate) fn spawn_error(tool: &str, source: std::io::Error) -> Error {
    Error::ToolSpawn {
        tool: tool.to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_limits_errors_and_keeps_color() {
        let args = ClangFormat::new("clang-format").action_args(Action::Check);
        assert!(args.contains(&"--dry-run".to_string()));
        assert!(args.contains(&"-Werror".to_string()));
        assert!(args.contains(&"--ferror-limit=1".to_string()));
        assert!(args.contains(&"-fcolor-diagnostics".to_string()));
    }

    #[test]
    fn format_edits_in_place() {
        let args = ClangFormat::new("clang-format").action_args(Action::Format);
        assert_eq!(args, vec!["-i".to_string()]);
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let formatter = ClangFormat::new("definitely-not-a-real-formatter-binary");
        let err = formatter.dump_config(dir.path()).unwrap_err();
        assert!(matches!(err, Error::ToolSpawn { .. }));

        let err = formatter
            .run_batch(dir.path(), Action::Check, &[PathBuf::from("a.cpp")])
            .unwrap_err();
        assert!(matches!(err, Error::ToolSpawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn availability_ignores_the_exit_status() {
        // `false` starts fine, it just rejects --version
        assert!(ClangFormat::new("false").ensure_available().is_ok());
        let err = ClangFormat::new("definitely-not-a-real-formatter-binary")
            .ensure_available()
            .unwrap_err();
        assert!(matches!(err, Error::ToolSpawn { .. }));
    }
}
