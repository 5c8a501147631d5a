//! CLI command definitions

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::keys::KeySet;

/// MatrixBus - scatter-gather data exchange for sharded matrices
#[derive(Parser)]
#[command(
    name = "mb",
    about = "Scatter-gather fetch and push over a partitioned matrix",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show which workers a fetch or push would reach, without sending anything
    Plan {
        /// Cluster description (YAML)
        #[arg(value_name = "CLUSTER")]
        cluster: PathBuf,

        /// Rows to fetch (all, START..END, or 1,2,5)
        #[arg(long, required_unless_present = "push", conflicts_with = "push")]
        fetch: Option<KeySet>,

        /// Rows to push
        #[arg(long)]
        push: Option<KeySet>,

        /// Columns to fetch
        #[arg(long, default_value = "all")]
        cols: KeySet,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Boot in-process workers, push generated rows, then fetch rows back
    Simulate {
        /// Cluster description (YAML)
        #[arg(value_name = "CLUSTER")]
        cluster: PathBuf,

        /// Rows to generate and push
        #[arg(long)]
        push: KeySet,

        /// Rows to fetch after the push
        #[arg(long)]
        fetch: KeySet,

        /// Columns to fetch
        #[arg(long, default_value = "all")]
        cols: KeySet,

        /// Only write rows the workers do not already hold
        #[arg(long)]
        initialize_only: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

/// Output format for plan/simulate
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_plan_fetch() {
        let cli = Cli::try_parse_from(["mb", "plan", "cluster.yml", "--fetch", "2,3,5"]).unwrap();
        match cli.command {
            Command::Plan { fetch, push, cols, format, .. } => {
                assert_eq!(fetch, Some(KeySet::list([2, 3, 5])));
                assert!(push.is_none());
                assert_eq!(cols, KeySet::All);
                assert_eq!(format, OutputFormat::Text);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_plan_requires_fetch_or_push() {
        assert!(Cli::try_parse_from(["mb", "plan", "cluster.yml"]).is_err());
        assert!(Cli::try_parse_from(["mb", "plan", "cluster.yml", "--fetch", "1", "--push", "1"]).is_err());
    }

    #[test]
    fn test_parse_simulate() {
        let cli = Cli::try_parse_from([
            "mb",
            "-l",
            "debug",
            "simulate",
            "c.yml",
            "--push",
            "0..10",
            "--fetch",
            "all",
            "--initialize-only",
            "--format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        match cli.command {
            Command::Simulate {
                push,
                fetch,
                initialize_only,
                format,
                ..
            } => {
                assert_eq!(push, KeySet::range(0, 10));
                assert_eq!(fetch, KeySet::All);
                assert!(initialize_only);
                assert_eq!(format, OutputFormat::Json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_bad_key_set_is_rejected() {
        assert!(Cli::try_parse_from(["mb", "plan", "c.yml", "--fetch", "1,x"]).is_err());
    }
}
