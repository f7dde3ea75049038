//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI parser for `tablegate`.
#[derive(Debug, Parser)]
#[command(name = "tablegate", version, about = "Provision tables and verify loaded data")]
pub struct Cli {
    /// Connection config file. Falls back to `TABLEGATE_CONFIG`, then
    /// `tablegate.yaml`.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create the table described by a `create_table` task file.
    Create {
        /// Path to the task definition.
        task: PathBuf,
    },
    /// Run the sanity checks described by a `sanity_test` task file.
    Verify {
        /// Path to the task definition.
        task: PathBuf,
    },
    /// Report whether a task's completion token exists.
    Status {
        /// Path to the task definition.
        task: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use clap::Parser;
    use std::path::Path;

    #[test]
    fn parses_create_subcommand() {
        let cli = Cli::parse_from(["tablegate", "create", "events.yaml"]);
        assert!(matches!(cli.command, Command::Create { ref task } if task == Path::new("events.yaml")));
        assert!(cli.config.is_none());
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::parse_from(["tablegate", "verify", "t.yaml", "--config", "db.yaml"]);
        assert_eq!(cli.config.as_deref(), Some(Path::new("db.yaml")));
        assert!(matches!(cli.command, Command::Verify { .. }));
    }

    #[test]
    fn status_requires_task_file() {
        assert!(Cli::try_parse_from(["tablegate", "status"]).is_err());
    }
}
