//! Tour files: discovery, saving, creation and export.

use std::{
    collections::BTreeSet,
    fs,
    path::{Path, PathBuf},
};

use ignore::WalkBuilder;
use serde::Serialize;
use url::Url;

use crate::{
    model::{Target, Tour, TourId},
    resolve::{Context, ResolveError, WorkspaceRoots, document_uri},
    when::{self, WhenContext},
};

use super::{Result, StorageError};

/// Schema reference written at the top of every saved tour.
pub const SCHEMA_URL: &str = "https://aka.ms/codetour-schema";

/// Single-file tours at fixed places in the workspace.
const MAIN_TOUR_FILES: [&str; 3] = [".tour", ".vscode/main.tour", "main.tour"];

/// Directories searched recursively for `*.tour` files.
const TOUR_DIRECTORIES: [&str; 3] = [".tours", ".vscode/tours", ".github/tours"];

/// Where new tours go unless a custom directory is configured.
const NEW_TOUR_DIRECTORY: &str = ".tours";

/// The on-disk shape of a saved tour.
#[derive(Serialize)]
struct TourFile<'a> {
    #[serde(rename = "$schema")]
    schema: &'static str,

    #[serde(flatten)]
    tour: &'a Tour,
}

/// Result of scanning a workspace for tours.
#[derive(Debug, Default)]
pub struct Discovery {
    /// Loaded tours whose `when` holds, sorted by title.
    pub tours: Vec<Tour>,

    /// Tours that could not be loaded. Each excludes only its own tour.
    pub issues: Vec<StorageError>,
}

/// A workspace directory holding tours.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
    tour_directories: Vec<String>,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            tour_directories: Vec::new(),
        }
    }

    /// Adds workspace-relative directories searched besides the defaults.
    /// The first one also receives newly created tours.
    #[must_use]
    pub fn with_tour_directories(mut self, directories: Vec<String>) -> Self {
        self.tour_directories = directories;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The workspace root as a directory URL, for resolving relative paths.
    pub fn root_url(&self) -> Option<Url> {
        Url::from_directory_path(&self.root).ok()
    }

    /// Loads every tour in the workspace whose `when` condition holds.
    pub fn discover(&self, ctx: &WhenContext) -> Discovery {
        let mut discovery = Discovery::default();

        for path in self.tour_files() {
            let tour = match load_tour(&path) {
                Ok(tour) => tour,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping tour");
                    discovery.issues.push(e);
                    continue;
                }
            };

            if let Some(condition) = &tour.when {
                match when::evaluate(condition, ctx) {
                    Ok(true) => {}
                    Ok(false) => {
                        tracing::debug!(tour = %tour.id, condition, "tour hidden by condition");
                        continue;
                    }
                    Err(e) => {
                        let issue = StorageError::MalformedTour {
                            path,
                            reason: e.to_string(),
                        };
                        tracing::warn!(error = %issue, "skipping tour");
                        discovery.issues.push(issue);
                        continue;
                    }
                }
            }

            discovery.tours.push(tour);
        }

        discovery.tours.sort_by(|a, b| a.title.cmp(&b.title));
        discovery
    }

    /// Every tour file in the workspace, in a stable order, each once.
    fn tour_files(&self) -> Vec<PathBuf> {
        let mut seen = BTreeSet::new();
        let mut files = Vec::new();

        for name in MAIN_TOUR_FILES {
            let path = self.root.join(name);
            if path.is_file() && seen.insert(path.clone()) {
                files.push(path);
            }
        }

        let directories = TOUR_DIRECTORIES
            .iter()
            .map(|d| (*d).to_string())
            .chain(self.tour_directories.iter().cloned());
        for directory in directories {
            let dir = self.root.join(&directory);
            if !dir.is_dir() {
                continue;
            }
            let walker = WalkBuilder::new(&dir)
                .hidden(false)
                .ignore(false)
                .git_ignore(false)
                .git_global(false)
                .git_exclude(false)
                .parents(false)
                .sort_by_file_name(Ord::cmp)
                .build();
            for entry in walker.flatten() {
                let path = entry.path();
                let is_tour = entry.file_type().is_some_and(|ft| ft.is_file())
                    && path.extension().is_some_and(|e| e == "tour");
                if is_tour && seen.insert(path.to_path_buf()) {
                    files.push(path.to_path_buf());
                }
            }
        }
        files
    }

    /// Creates and saves a new, empty tour named after `title`.
    pub fn create_tour(&self, title: &str, git_ref: Option<String>) -> Result<Tour> {
        let directory = self
            .tour_directories
            .first()
            .map_or(NEW_TOUR_DIRECTORY, String::as_str);
        let path = self.root.join(directory).join(format!("{}.tour", slug(title)));
        if path.exists() {
            return Err(StorageError::TourAlreadyExists(path));
        }

        let mut tour = Tour::new(TourId::for_path(&path), title);
        tour.git_ref = git_ref;
        save_tour(&tour)?;
        Ok(tour)
    }
}

impl WorkspaceRoots for Workspace {
    fn root_for(&self, _tour: &TourId) -> Option<Url> {
        self.root_url()
    }
}

/// Writes `tour` back to the file its id names.
pub fn save_tour(tour: &Tour) -> Result<PathBuf> {
    let path = tour
        .id
        .to_file_path()
        .ok_or_else(|| StorageError::NotLocal(tour.id.clone()))?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = TourFile {
        schema: SCHEMA_URL,
        tour,
    };
    let mut json = serde_json::to_string_pretty(&file)?;
    json.push('\n');
    fs::write(&path, json)?;
    tracing::debug!(tour = %tour.id, "saved tour");
    Ok(path)
}

/// Deletes a tour's file.
pub fn delete_tour(tour: &Tour) -> Result<()> {
    let path = tour
        .id
        .to_file_path()
        .ok_or_else(|| StorageError::NotLocal(tour.id.clone()))?;
    fs::remove_file(path)?;
    Ok(())
}

/// Renders a self-contained copy of `tour`: every file step carries its
/// file's contents, and the id and ref are dropped.
pub fn export_tour(tour: &Tour, ctx: &Context<'_>) -> Result<String> {
    let mut exported = tour.clone();
    for step in &mut exported.steps {
        step.marker_title = None;
        let Target::File { path } = &step.target else {
            continue;
        };
        let file = path.clone();
        let uri = document_uri(tour, step, ctx)?;
        let contents = ctx
            .reader
            .read_text(&uri)
            .map_err(|source| ResolveError::AnchorUnresolved {
                location: uri.to_string(),
                source,
            })?;
        step.target = Target::Embedded {
            file: Some(file),
            contents,
        };
    }
    exported.git_ref = None;

    Ok(serde_json::to_string_pretty(&exported)?)
}

/// Reads one tour file.
pub fn load_tour(path: &Path) -> Result<Tour> {
    let malformed = |reason: String| StorageError::MalformedTour {
        path: path.to_path_buf(),
        reason,
    };
    let text = fs::read_to_string(path).map_err(|e| malformed(e.to_string()))?;
    let mut tour: Tour = serde_json::from_str(&text).map_err(|e| malformed(e.to_string()))?;
    tour.id = TourId::for_path(path);
    Ok(tour)
}

/// File name stem for a tour title: lowercase, whitespace to `-`, anything
/// else that is not a word character dropped.
pub fn slug(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .filter_map(|c| {
            if c.is_whitespace() {
                Some('-')
            } else if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                Some(c)
            } else {
                None
            }
        })
        .collect()
}
