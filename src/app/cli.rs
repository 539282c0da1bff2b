use crate::app::models::RunnerKind;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Regenerate, apply and check .clang-format configurations across a repository",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Discover the repository from this directory instead of the current one
    #[arg(short = 'C', long, global = true)]
    pub directory: Option<PathBuf>,

    /// Formatter executable
    #[arg(long, env = "CLANG_FORMAT", global = true)]
    pub formatter: Option<String>,

    /// GNU parallel executable
    #[arg(long, global = true)]
    pub parallel: Option<String>,

    /// How batches are fanned out
    #[arg(long, value_enum, global = true)]
    pub runner: Option<RunnerKind>,

    /// Files per formatter invocation
    #[arg(
        long,
        global = true,
        value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub batch_size: Option<usize>,

    /// Concurrent formatter invocations (defaults to the number of CPUs)
    #[arg(short = 'j', long, global = true)]
    pub jobs: Option<usize>,

    /// Log debug output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Expand the intent file and write it into every .clang-format
    #[command(name = "gen", visible_alias = "generate")]
    Gen {
        /// Intent file, relative to the repository root
        #[arg(long)]
        intent: Option<PathBuf>,
    },
    /// Format governed files in place
    #[command(name = "fmt", visible_alias = "format")]
    Fmt(RunArgs),
    /// Fail on the first governed file that is not formatted
    #[command(name = "chk", visible_alias = "check")]
    Chk(RunArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Print the governed files and exit without running the formatter
    #[arg(long)]
    pub list: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn parses_each_subcommand_and_alias() {
        for (args, expected) in [
            (vec!["x", "gen"], "gen"),
            (vec!["x", "generate"], "gen"),
            (vec!["x", "fmt"], "fmt"),
            (vec!["x", "format"], "fmt"),
            (vec!["x", "chk", "--list"], "chk"),
            (vec!["x", "check"], "chk"),
        ] {
            let cli = Cli::try_parse_from(args.clone()).unwrap();
            let name = match cli.command {
                Command::Gen { .. } => "gen",
                Command::Fmt(_) => "fmt",
                Command::Chk(_) => "chk",
            };
            assert_eq!(name, expected, "{args:?}");
        }
    }

    #[test]
    fn rejects_unknown_and_missing_subcommands() {
        let err = Cli::try_parse_from(["x", "lint"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);

        let err = Cli::try_parse_from(["x", ""]).unwrap_err();
        assert_eq!(err.exit_code(), 2);

        let err = Cli::try_parse_from(["x"]).unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand | ErrorKind::MissingSubcommand
        ));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn zero_batch_size_is_a_usage_error() {
        let err = Cli::try_parse_from(["x", "fmt", "--batch-size", "0"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
        assert!(err.to_string().contains("--batch-size"));
    }

    #[test]
    fn global_options_follow_the_subcommand() {
        let cli = Cli::try_parse_from([
            "x",
            "chk",
            "--runner",
            "builtin",
            "-j",
            "3",
            "--batch-size",
            "8",
        ])
        .unwrap();
        assert_eq!(cli.runner, Some(RunnerKind::Builtin));
        assert_eq!(cli.jobs, Some(3));
        assert_eq!(cli.batch_size, Some(8));
    }
}
