use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use taskboard_kanban::{Lane, ResortOrder};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Yaml,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
pub enum SortBy {
    /// Alphabetical by title
    Title,
    /// Oldest first
    Created,
    /// Flip the current order
    Reverse,
}

impl From<SortBy> for ResortOrder {
    fn from(by: SortBy) -> Self {
        match by {
            SortBy::Title => ResortOrder::Title,
            SortBy::Created => ResortOrder::CreatedAt,
            SortBy::Reverse => ResortOrder::Reverse,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "taskboard")]
#[command(version)]
#[command(about = "A four-lane task board stored next to your project")]
#[command(long_about = "
taskboard keeps a board of tasks in `.taskboard/` under the project directory.
Tasks move through four lanes: todo, in_progress, review and done.

Global arguments can be used with any command:
  --verbose     Show trace output
  --debug       Show debug output
  --quiet       Suppress all output except errors
  --format      Output format (table, json, yaml)

Example usage:
  taskboard init
  taskboard add \"Write release notes\"
  taskboard move 01HV review --index 0
  taskboard --format=json list
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(long, value_enum, global = true)]
    pub format: Option<OutputFormat>,

    /// Project directory holding the board (defaults to the current directory)
    #[arg(short = 'C', long, global = true, value_name = "DIR")]
    pub project_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the board directory
    Init,
    /// Add a task
    Add {
        /// Task title
        title: String,
        /// Longer description
        #[arg(long)]
        description: Option<String>,
        /// Lane to create the task in
        #[arg(long, default_value_t = Lane::Todo)]
        lane: Lane,
    },
    /// Show the board
    List {
        /// Only show this lane
        #[arg(long)]
        lane: Option<Lane>,
    },
    /// Move a task to a lane, optionally at a position
    #[command(long_about = "
Move a task to a lane. Without --index the task goes to the end of the lane.
The index counts positions in the target lane without the moved task, so
`--index 0` always means \"first\".

Moving into done records the completion time; done is always shown most
recently completed first, so --index is ignored there.
")]
    Move {
        /// Task id (a unique prefix is enough)
        id: String,
        /// Target lane
        lane: Lane,
        /// Position in the target lane
        #[arg(long)]
        index: Option<usize>,
    },
    /// Change a task's title or description
    Edit {
        /// Task id (a unique prefix is enough)
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Hide a task from the board without deleting it
    Archive {
        /// Task id (a unique prefix is enough)
        id: String,
    },
    /// Delete a task
    Delete {
        /// Task id (a unique prefix is enough)
        id: String,
    },
    /// Reassign a lane's order
    Resort {
        lane: Lane,
        #[arg(long, value_enum, default_value = "title")]
        by: SortBy,
    },
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
    fn test_parse_move_with_index() {
        let cli = Cli::try_parse_from(["taskboard", "move", "01ABC", "in-progress", "--index", "2"])
            .unwrap();
        match cli.command {
            Commands::Move { id, lane, index } => {
                assert_eq!(id, "01ABC");
                assert_eq!(lane, Lane::InProgress);
                assert_eq!(index, Some(2));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_unknown_lane_is_rejected() {
        assert!(Cli::try_parse_from(["taskboard", "move", "x", "backlog"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["taskboard", "list", "--format", "json", "-q"]).unwrap();
        assert_eq!(cli.format, Some(OutputFormat::Json));
        assert!(cli.quiet);
    }
}
