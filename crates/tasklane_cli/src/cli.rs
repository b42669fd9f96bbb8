//! CLI argument definitions.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

/// Tasklane - prioritized tasks grouped by project
#[derive(Debug, Parser)]
#[command(name = "tasklane", version, about = "Prioritized tasks grouped by project")]
pub struct Cli {
    /// SQLite database file
    #[arg(long, global = true, env = "TASKLANE_DB", default_value = "tasklane.sqlite3")]
    pub db: PathBuf,

    /// Log level (trace|debug|info|warn|error)
    #[arg(long, global = true, env = "TASKLANE_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Absolute directory for rolling log files; logging is off when unset
    #[arg(long, global = true, env = "TASKLANE_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Print the resulting board as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage projects
    #[command(subcommand)]
    Project(ProjectCommand),

    /// Add a task at the end of its partition
    Add {
        name: String,
        #[command(flatten)]
        target: PartitionArgs,
    },

    /// Show tasks, grouped by project unless a partition is given
    List {
        #[command(flatten)]
        target: PartitionArgs,
    },

    /// Rename a task
    Rename { id: Uuid, name: String },

    /// Delete a task
    Delete { id: Uuid },

    /// Move a task to the end of another partition
    Move {
        id: Uuid,
        #[command(flatten)]
        target: PartitionArgs,
    },

    /// Rewrite a partition's order; ids are listed first to last
    Reorder {
        #[command(flatten)]
        target: PartitionArgs,
        #[arg(required = true)]
        ids: Vec<Uuid>,
    },
}

#[derive(Debug, Subcommand)]
pub enum ProjectCommand {
    /// Create a project
    Add { name: String },
    /// List projects by name
    List,
    /// Delete a project; its tasks become unassigned
    Delete { id: Uuid },
}

/// Partition selector shared by task commands.
#[derive(Debug, Args)]
pub struct PartitionArgs {
    /// Project id
    #[arg(long, conflicts_with = "unassigned")]
    pub project: Option<Uuid>,

    /// Tasks without a project
    #[arg(long)]
    pub unassigned: bool,
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use clap::{CommandFactory, Parser};

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn reorder_parses_ids_in_order() {
        let first = "00000000-0000-4000-8000-000000000002";
        let second = "00000000-0000-4000-8000-000000000001";
        let cli = Cli::try_parse_from(["tasklane", "reorder", "--unassigned", first, second])
            .unwrap();
        match cli.command {
            Command::Reorder { target, ids } => {
                assert!(target.unassigned);
                assert_eq!(ids[0].to_string(), first);
                assert_eq!(ids[1].to_string(), second);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn project_and_unassigned_conflict() {
        let result = Cli::try_parse_from([
            "tasklane",
            "list",
            "--unassigned",
            "--project",
            "00000000-0000-4000-8000-000000000001",
        ]);
        assert!(result.is_err());
    }
}
