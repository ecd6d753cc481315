//! CLI interface for pilot.
//!
//! Every subcommand is non-interactive: it discovers the workspace's tours,
//! does one thing, and exits. Tours and steps go to stdout; status lines and
//! discovery warnings go to stderr.
//!
//! Tours are referenced by exact title or by an unambiguous,
//! case-insensitive title prefix. Steps are numbered from 1.

mod format;
mod progress;
mod tours;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::{
    config::Config,
    model::Tour,
    storage::{ProgressStore, Workspace},
    when::WhenContext,
};

/// Pilot: guided walkthroughs of a codebase.
#[derive(Debug, Parser)]
#[command(name = "pilot", after_long_help = WORKFLOW_HELP)]
pub struct Cli {
    /// Workspace holding the tours. Defaults to the current directory.
    #[arg(long, global = true)]
    workspace: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

const WORKFLOW_HELP: &str = r#"Workflow: writing a tour
  1. pilot new "Getting started"
  2. pilot record getting --file src/main.rs --line 12 --description "Entry point"
  3. pilot record getting --directory src/storage --description "Persistence"
  4. pilot walk getting

Reading:
  pilot list
  pilot show "Getting started" --step 2
  pilot export getting --out getting-started.tour"#;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List tours with their step counts and progress.
    List,

    /// Resolve and print one step, marking it visited.
    Show {
        /// Tour title or unambiguous prefix.
        tour: String,

        /// Step to show. Defaults to the first.
        #[arg(long)]
        step: Option<usize>,
    },

    /// Print every step of a tour in order, marking each visited.
    Walk {
        /// Tour title or unambiguous prefix.
        tour: String,

        /// Step to start from. Defaults to the first.
        #[arg(long)]
        from: Option<usize>,
    },

    /// Create an empty tour. Prints the new tour file's path.
    New {
        /// Title of the tour.
        title: String,

        /// Git ref the tour's files are read at.
        #[arg(long = "ref")]
        git_ref: Option<String>,
    },

    /// Add a step to a tour.
    Record(RecordArgs),

    /// Print a self-contained copy of a tour with file contents embedded.
    Export {
        /// Tour title or unambiguous prefix.
        tour: String,

        /// Write here instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Manage recorded progress.
    Progress {
        #[command(subcommand)]
        command: ProgressCommand,
    },
}

/// What a recorded step points at: a line of a file, a whole file, a
/// directory, or nothing (a narrative step).
#[derive(Debug, Args)]
pub struct RecordArgs {
    /// Tour title or unambiguous prefix.
    pub tour: String,

    /// Workspace-relative file the step points at.
    #[arg(long, conflicts_with = "directory")]
    pub file: Option<String>,

    /// Line in `--file`. Anchored by number or by pattern per `record-mode`.
    #[arg(long, requires = "file")]
    pub line: Option<u32>,

    /// Workspace-relative directory the step points at.
    #[arg(long)]
    pub directory: Option<String>,

    /// Step title.
    #[arg(long)]
    pub title: Option<String>,

    /// Markdown shown with the step.
    #[arg(long)]
    pub description: String,

    /// Insert after this step; 0 inserts first. Defaults to the end.
    #[arg(long)]
    pub after: Option<usize>,
}

#[derive(Debug, Subcommand)]
pub enum ProgressCommand {
    /// Forget visited steps of one tour, or of every tour.
    Reset {
        /// Tour title or unambiguous prefix. Omit to reset everything.
        tour: Option<String>,
    },
}

/// Run the CLI, returning an error message on failure.
pub fn run(config: &Config) -> Result<(), String> {
    let cli = Cli::parse();

    let root = match cli.workspace {
        Some(dir) => dir,
        None => std::env::current_dir()
            .map_err(|e| format!("failed to read current directory: {e}"))?,
    };
    let workspace = Workspace::new(root).with_tour_directories(config.tour_directories.clone());

    match cli.command {
        Command::List => tours::cmd_list(config, &workspace),
        Command::Show { tour, step } => tours::cmd_show(config, &workspace, &tour, step),
        Command::Walk { tour, from } => tours::cmd_walk(config, &workspace, &tour, from),
        Command::New { title, git_ref } => tours::cmd_new(&workspace, &title, git_ref),
        Command::Record(args) => tours::cmd_record(config, &workspace, &args),
        Command::Export { tour, out } => tours::cmd_export(&workspace, &tour, out),
        Command::Progress { command } => match command {
            ProgressCommand::Reset { tour } => {
                progress::cmd_reset(config, &workspace, tour.as_deref())
            }
        },
    }
}

/// Discover the workspace's tours, reporting unloadable ones on stderr.
fn discover(workspace: &Workspace) -> Vec<Tour> {
    let discovery = workspace.discover(&WhenContext::current());
    for issue in &discovery.issues {
        eprintln!("warning: {issue}");
    }
    discovery.tours
}

/// Resolve a tour reference (exact title or unambiguous prefix) to a tour.
fn find_tour<'a>(tours: &'a [Tour], reference: &str) -> Result<&'a Tour, String> {
    if let Some(tour) = tours.iter().find(|t| t.title == reference) {
        return Ok(tour);
    }

    let needle = reference.to_lowercase();
    let matches: Vec<&Tour> = tours
        .iter()
        .filter(|t| t.title.to_lowercase().starts_with(&needle))
        .collect();

    match matches.as_slice() {
        [] => Err(format!("no tour matching '{reference}'")),
        [tour] => Ok(*tour),
        _ => {
            let titles: Vec<&str> = matches.iter().map(|t| t.title.as_str()).collect();
            Err(format!(
                "ambiguous tour '{reference}' matches: {}",
                titles.join(", ")
            ))
        }
    }
}

/// A user-facing step number as a 0-based index.
fn step_index(number: usize) -> Result<usize, String> {
    number
        .checked_sub(1)
        .ok_or_else(|| "steps are numbered from 1".to_string())
}

fn open_progress(config: &Config) -> Result<ProgressStore, String> {
    let path = config
        .progress_db_path()
        .ok_or("could not determine home directory")?;
    ProgressStore::open(&path)
        .map_err(|e| format!("failed to open progress at {}: {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::TourId;

    fn tours(titles: &[&str]) -> Vec<Tour> {
        titles
            .iter()
            .map(|t| Tour::new(TourId::new(format!("file:///w/.tours/{t}.tour")), *t))
            .collect()
    }

    #[test]
    fn exact_title_wins_over_prefix() {
        let tours = tours(&["Setup", "Setup advanced"]);
        assert_eq!(find_tour(&tours, "Setup").unwrap().title, "Setup");
    }

    #[test]
    fn unambiguous_prefix_ignores_case() {
        let tours = tours(&["Getting started", "Storage"]);
        assert_eq!(find_tour(&tours, "get").unwrap().title, "Getting started");
        assert_eq!(find_tour(&tours, "STOR").unwrap().title, "Storage");
    }

    #[test]
    fn ambiguous_prefix_lists_candidates() {
        let tours = tours(&["Setup", "Setup advanced", "Storage"]);
        let err = find_tour(&tours, "s").unwrap_err();
        assert!(err.contains("ambiguous"));
        assert!(err.contains("Setup advanced"));
        assert!(err.contains("Storage"));
    }

    #[test]
    fn unknown_reference_is_an_error() {
        let tours = tours(&["Setup"]);
        assert!(find_tour(&tours, "x").unwrap_err().contains("no tour matching"));
        assert!(find_tour(&[], "Setup").is_err());
    }

    #[test]
    fn step_numbers_start_at_one() {
        assert_eq!(step_index(1).unwrap(), 0);
        assert_eq!(step_index(4).unwrap(), 3);
        assert!(step_index(0).is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn record_line_requires_file() {
        let parsed = Cli::try_parse_from([
            "pilot",
            "record",
            "intro",
            "--line",
            "3",
            "--description",
            "d",
        ]);
        assert!(parsed.is_err());

        let parsed = Cli::try_parse_from([
            "pilot",
            "--workspace",
            "/w",
            "record",
            "intro",
            "--file",
            "src/a.rs",
            "--line",
            "3",
            "--description",
            "d",
        ])
        .unwrap();
        let Command::Record(args) = parsed.command else {
            panic!("expected record");
        };
        assert_eq!(args.file.as_deref(), Some("src/a.rs"));
        assert_eq!(args.line, Some(3));
        assert_eq!(parsed.workspace, Some(PathBuf::from("/w")));
    }
}
