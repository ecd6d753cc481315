//! Local persistence for tours and progress.
//!
//! Tours are JSON files inside the workspace:
//!
//! ```text
//! <root>/.tour                  # main tour
//! <root>/.vscode/main.tour      # main tour
//! <root>/main.tour              # main tour
//! <root>/.tours/**/*.tour
//! <root>/.vscode/tours/**/*.tour
//! <root>/.github/tours/**/*.tour
//! ```
//!
//! Progress lives outside the workspace in a `SQLite` file, by default
//! `~/.pilot/progress.sqlite`.

mod progress;
mod tours;

use std::{io, path::PathBuf};

use crate::{model::TourId, resolve::ResolveError};

pub use progress::ProgressStore;
pub use tours::{
    Discovery, SCHEMA_URL, Workspace, delete_tour, export_tour, load_tour, save_tour, slug,
};

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A tour file that cannot be turned into a tour. Discovery reports it
    /// and carries on with the other tours.
    #[error("malformed tour {}: {reason}", path.display())]
    MalformedTour { path: PathBuf, reason: String },

    #[error("tour already exists: {}", .0.display())]
    TourAlreadyExists(PathBuf),

    #[error("tour is not stored in a local file: {0}")]
    NotLocal(TourId),

    #[error("corrupt progress database: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type Result<T> = core::result::Result<T, StorageError>;
