use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "LoopScore CLI - score RNA loop queries against motif models and record the results.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the result store and optionally register queries as pending.
    Init(InitArgs),
    /// Score one query and persist its results.
    Run(RunArgs),
    /// Set the recorded outcome of a query explicitly.
    Mark(MarkArgs),
    /// Show the recorded outcome of one or more queries.
    Status(StatusArgs),
}

/// Arguments for the `init` subcommand.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path to the SQLite result store. Created if it does not exist.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub database: PathBuf,

    /// Directory holding `<query id>.toml` query files.
    #[arg(short = 'Q', long, value_name = "DIR")]
    pub queries: Option<PathBuf>,

    /// Queries to register as pending.
    #[arg(value_name = "QUERY_ID", requires = "queries")]
    pub query_ids: Vec<String>,
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Identifier of the query to score.
    #[arg(required = true, value_name = "QUERY_ID")]
    pub query_id: String,

    /// Directory holding `<query id>.toml` query files.
    #[arg(short = 'Q', long, required = true, value_name = "DIR")]
    pub queries: PathBuf,

    /// Path to a run configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub output: OutputTarget,

    // --- Model Overrides ---
    /// Override the model file type (e.g., 'bp').
    #[arg(long, value_name = "TYPE")]
    pub model_type: Option<String>,

    /// Override the model-set version (e.g., '0.6').
    #[arg(long, value_name = "VERSION")]
    pub model_version: Option<String>,

    /// Override the base directory of the model repository.
    #[arg(short = 'm', long, value_name = "DIR")]
    pub model_repo: Option<PathBuf>,

    // --- Scoring Overrides ---
    /// Override the maximum alignment range.
    #[arg(short = 'r', long, value_name = "INT")]
    pub max_alignment_range: Option<usize>,

    /// Override the table of precomputed scores used for internal loops.
    #[arg(short = 's', long, value_name = "PATH")]
    pub score_table: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S scoring.max-alignment-range=30
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Where a run writes its results. Exactly one target must be given.
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct OutputTarget {
    /// Write into a SQLite result store created by `init`.
    #[arg(short, long, value_name = "PATH")]
    pub database: Option<PathBuf>,

    /// Write CSV files into this directory instead of a result store.
    #[arg(long, value_name = "DIR")]
    pub csv_dir: Option<PathBuf>,
}

/// Arguments for the `mark` subcommand.
#[derive(Args, Debug)]
pub struct MarkArgs {
    /// Path to the SQLite result store.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub database: PathBuf,

    /// Identifier of the query to mark.
    #[arg(required = true, value_name = "QUERY_ID")]
    pub query_id: String,

    /// Outcome to record.
    #[arg(value_enum, required = true)]
    pub status: MarkStatus,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkStatus {
    Done,
    Failed,
}

/// Arguments for the `status` subcommand.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Path to the SQLite result store.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub database: PathBuf,

    /// Queries to look up.
    #[arg(required = true, value_name = "QUERY_ID")]
    pub query_ids: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_requires_exactly_one_output_target() {
        assert!(Cli::try_parse_from(["loopscore", "run", "Q1", "-Q", "queries"]).is_err());
        assert!(
            Cli::try_parse_from([
                "loopscore",
                "run",
                "Q1",
                "-Q",
                "queries",
                "-d",
                "results.db",
                "--csv-dir",
                "out"
            ])
            .is_err()
        );
    }

    #[test]
    fn run_parses_overrides() {
        let cli = Cli::try_parse_from([
            "loopscore",
            "-vv",
            "run",
            "Q1",
            "-Q",
            "queries",
            "-d",
            "results.db",
            "--model-version",
            "1.0",
            "-r",
            "30",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        let Commands::Run(args) = cli.command else {
            panic!("Expected 'run' subcommand");
        };
        assert_eq!(args.query_id, "Q1");
        assert_eq!(args.output.database, Some(PathBuf::from("results.db")));
        assert_eq!(args.model_version.as_deref(), Some("1.0"));
        assert_eq!(args.max_alignment_range, Some(30));
    }

    #[test]
    fn init_query_ids_require_a_query_directory() {
        assert!(Cli::try_parse_from(["loopscore", "init", "-d", "results.db", "Q1"]).is_err());
        assert!(Cli::try_parse_from(["loopscore", "init", "-d", "results.db"]).is_ok());
    }

    #[test]
    fn mark_parses_status_value() {
        let cli =
            Cli::try_parse_from(["loopscore", "mark", "-d", "results.db", "Q1", "failed"]).unwrap();
        let Commands::Mark(args) = cli.command else {
            panic!("Expected 'mark' subcommand");
        };
        assert_eq!(args.status, MarkStatus::Failed);
    }
}
