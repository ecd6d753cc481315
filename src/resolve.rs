//! Anchor resolution: where does a step point right now?
//!
//! Maps a step to a concrete document, line and selection. Lines come from,
//! in order: the explicit `line`, the end of the `selection`, the first
//! match of the `pattern`, the tour's marker comment, and finally the end of
//! the document. Only an unreadable document is an error; a pattern or
//! marker that no longer matches degrades to [`AnchorLine::EndOfDocument`].
//!
//! Files and refs are read through the [`FileReader`] and [`RefResolver`]
//! collaborators so the resolver itself does no I/O.

pub mod git;
mod marker;
mod pattern;

#[cfg(test)]
pub(crate) mod fakes;

use std::io;

use url::Url;

use crate::model::{Selection, Step, Target, Tour, TourId};

pub use marker::{MarkerMatch, find_marker, refresh_marker_titles};
pub use pattern::{
    RecordError, compile, count_matching_lines, escape_line, find_pattern_line, line_at_offset,
    line_text, pattern_for_line,
};

/// Scheme of synthetic documents showing embedded step content.
pub const CONTENT_SCHEME: &str = "tour";

/// Scheme of the document shown for steps without any target.
pub const NOTE_SCHEME: &str = "tour-content";

/// Scheme of documents read at a historical revision.
pub const HISTORICAL_SCHEME: &str = "git";

/// Reads document text.
pub trait FileReader {
    fn read_text(&self, uri: &Url) -> io::Result<String>;
}

/// What the working tree has checked out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Head {
    /// Branch name, `None` when detached.
    pub name: Option<String>,

    /// Commit id.
    pub commit: Option<String>,
}

/// Answers version-control questions about a document.
pub trait RefResolver {
    /// The checked-out head of the repository containing `uri`, if any.
    fn head(&self, uri: &Url) -> Option<Head>;

    /// The commit `git_ref` points at, if it exists.
    fn resolve_ref(&self, uri: &Url, git_ref: &str) -> Option<String>;

    /// A URI reading `uri` as of `git_ref`.
    fn to_historical_uri(&self, uri: &Url, git_ref: &str) -> io::Result<Url>;

    /// Whether the working tree already sits on `git_ref`.
    ///
    /// True when `git_ref` is the current branch, the current commit, or a
    /// tag/branch pointing at the current commit. Without a repository there
    /// is nothing to rewind to, so the live tree is used.
    fn current_revision_matches(&self, uri: &Url, git_ref: &str) -> bool {
        let Some(head) = self.head(uri) else {
            return true;
        };
        if head.name.as_deref() == Some(git_ref) {
            return true;
        }
        let Some(commit) = head.commit else {
            return false;
        };
        commit == git_ref || self.resolve_ref(uri, git_ref).as_deref() == Some(commit.as_str())
    }
}

/// Finds the workspace a tour's relative paths resolve against.
pub trait WorkspaceRoots {
    fn root_for(&self, tour: &TourId) -> Option<Url>;
}

/// A `RefResolver` for documents outside any repository.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRepository;

impl RefResolver for NoRepository {
    fn head(&self, _uri: &Url) -> Option<Head> {
        None
    }

    fn resolve_ref(&self, _uri: &Url, _git_ref: &str) -> Option<String> {
        None
    }

    fn to_historical_uri(&self, uri: &Url, git_ref: &str) -> io::Result<Url> {
        historical_uri(uri, git_ref)
    }
}

/// Everything resolution needs besides the step itself.
#[derive(Clone, Copy)]
pub struct Context<'a> {
    /// Root that relative `file` and `directory` paths hang off.
    pub workspace_root: Option<&'a Url>,
    pub reader: &'a dyn FileReader,
    pub refs: &'a dyn RefResolver,
}

/// Errors resolving a step.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("tour {tour} has no step {index}")]
    NoSuchStep { tour: TourId, index: usize },

    /// The step's document cannot be opened: deleted, unreadable, or an
    /// invalid historical ref. The tour needs fixing.
    #[error("anchor unresolved: cannot read {location}: {source}")]
    AnchorUnresolved {
        location: String,
        #[source]
        source: io::Error,
    },
}

/// A 0-based point in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub line: u32,
    pub character: u32,
}

/// A 0-based range in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub start: Point,
    pub end: Point,
}

impl From<Selection> for Range {
    fn from(selection: Selection) -> Self {
        let point = |p: crate::model::Position| Point {
            line: p.line.saturating_sub(1),
            character: p.character.saturating_sub(1),
        };
        Self {
            start: point(selection.start),
            end: point(selection.end),
        }
    }
}

/// The line a step is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorLine {
    /// A 0-based line.
    Line(u32),

    /// No anchor could be found; show the step at the end of the document.
    EndOfDocument,
}

impl AnchorLine {
    pub fn line(self) -> Option<u32> {
        match self {
            Self::Line(line) => Some(line),
            Self::EndOfDocument => None,
        }
    }
}

/// Where a step points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// A document, possibly historical or synthetic.
    Document {
        uri: Url,
        line: AnchorLine,
        selection: Option<Range>,
    },

    /// A directory to reveal.
    Directory { uri: Url },

    /// A host panel to focus.
    View { name: String },
}

/// The outcome of resolving a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub location: Location,

    /// Title captured from the step's marker comment, for display only.
    pub marker_title: Option<String>,
}

/// Resolves step `index` of `tour`.
pub fn resolve_step(
    tour: &Tour,
    index: usize,
    ctx: &Context<'_>,
) -> Result<Resolution, ResolveError> {
    let step = tour.steps.get(index).ok_or_else(|| ResolveError::NoSuchStep {
        tour: tour.id.clone(),
        index,
    })?;

    let (uri, text) = match &step.target {
        Target::Directory { path } => {
            let uri = relative_uri(path, ctx.workspace_root).map_err(|e| unresolved(path, e))?;
            return Ok(Resolution {
                location: Location::Directory { uri },
                marker_title: None,
            });
        }
        Target::View { name } => {
            return Ok(Resolution {
                location: Location::View { name: name.clone() },
                marker_title: None,
            });
        }
        Target::Embedded { file, contents } => {
            (content_uri(file.as_deref()).map_err(|e| unresolved("content", e))?, contents.clone())
        }
        Target::Note => (note_uri().map_err(|e| unresolved("note", e))?, String::new()),
        Target::File { .. } | Target::Uri { .. } => {
            let uri = document_uri(tour, step, ctx)?;
            let text = ctx
                .reader
                .read_text(&uri)
                .map_err(|e| unresolved(uri.as_str(), e))?;
            (uri, text)
        }
    };

    let mut marker_title = None;
    let line = if let Some(line) = step.line {
        AnchorLine::Line(line.saturating_sub(1))
    } else if let Some(selection) = step.selection {
        AnchorLine::Line(selection.end.line.saturating_sub(1))
    } else if let Some(line) = step.pattern.as_deref().and_then(|p| find_pattern_line(&text, p)) {
        AnchorLine::Line(line)
    } else if let Some(found) = marker_for(tour, index, &text) {
        marker_title = Some(found.title);
        AnchorLine::Line(found.line)
    } else {
        AnchorLine::EndOfDocument
    };

    Ok(Resolution {
        location: Location::Document {
            uri,
            line,
            selection: step.selection.map(Range::from),
        },
        marker_title,
    })
}

/// The marker anchoring step `index`, when the tour uses markers.
fn marker_for(tour: &Tour, index: usize, text: &str) -> Option<MarkerMatch> {
    if !tour.is_marker_step(index) {
        return None;
    }
    find_marker(text, &tour.step_marker_prefix()?, index)
}

/// The URI a file or URI step reads from, rewritten to a historical
/// revision when the tour is pinned to a ref the working tree is not on.
pub fn document_uri(tour: &Tour, step: &Step, ctx: &Context<'_>) -> Result<Url, ResolveError> {
    let live = match &step.target {
        Target::Uri { uri } => {
            Url::parse(uri).map_err(|e| unresolved(uri, io::Error::new(io::ErrorKind::InvalidInput, e)))?
        }
        Target::File { path } => {
            relative_uri(path, ctx.workspace_root).map_err(|e| unresolved(path, e))?
        }
        Target::Embedded { file, .. } => {
            return content_uri(file.as_deref()).map_err(|e| unresolved("content", e));
        }
        Target::Note => return note_uri().map_err(|e| unresolved("note", e)),
        Target::Directory { path } => {
            return relative_uri(path, ctx.workspace_root).map_err(|e| unresolved(path, e));
        }
        Target::View { name } => {
            return Err(unresolved(
                name,
                io::Error::new(io::ErrorKind::InvalidInput, "view steps have no document"),
            ));
        }
    };

    let Some(git_ref) = tour.pinned_ref() else {
        return Ok(live);
    };
    if ctx.refs.current_revision_matches(&live, git_ref) {
        return Ok(live);
    }
    tracing::debug!(uri = %live, git_ref, "reading step at historical revision");
    ctx.refs
        .to_historical_uri(&live, git_ref)
        .map_err(|e| unresolved(live.as_str(), e))
}

/// Reads the document behind step `index`, or `None` for steps that have
/// no document (directories, views, notes).
pub fn read_step_document(
    tour: &Tour,
    index: usize,
    ctx: &Context<'_>,
) -> Result<Option<String>, ResolveError> {
    let step = tour.steps.get(index).ok_or_else(|| ResolveError::NoSuchStep {
        tour: tour.id.clone(),
        index,
    })?;
    match &step.target {
        Target::File { .. } | Target::Uri { .. } => {
            let uri = document_uri(tour, step, ctx)?;
            ctx.reader
                .read_text(&uri)
                .map(Some)
                .map_err(|e| unresolved(uri.as_str(), e))
        }
        Target::Embedded { contents, .. } => Ok(Some(contents.clone())),
        Target::Directory { .. } | Target::View { .. } | Target::Note => Ok(None),
    }
}

/// Joins a workspace-relative path onto `root`.
///
/// Without a root the path is taken as a URI of its own.
pub fn relative_uri(path: &str, root: Option<&Url>) -> io::Result<Url> {
    let invalid = |reason: &str| io::Error::new(io::ErrorKind::InvalidInput, reason.to_string());
    let Some(root) = root else {
        return Url::parse(path).map_err(|e| invalid(&e.to_string()));
    };

    let mut url = root.clone();
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|()| invalid("workspace root cannot hold paths"))?;
        segments.pop_if_empty();
        for part in path.split(['/', '\\']) {
            match part {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                part => {
                    segments.push(part);
                }
            }
        }
    }
    Ok(url)
}

/// The synthetic document showing an embedded step's content.
pub fn content_uri(file: Option<&str>) -> io::Result<Url> {
    synthetic_uri(CONTENT_SCHEME, file.unwrap_or("content"))
}

/// The synthetic document shown for steps without a target.
pub fn note_uri() -> io::Result<Url> {
    synthetic_uri(NOTE_SCHEME, "Tour")
}

fn synthetic_uri(scheme: &str, name: &str) -> io::Result<Url> {
    let mut url = Url::parse(&format!("{scheme}://current/"))
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    url.path_segments_mut()
        .map_err(|()| io::Error::new(io::ErrorKind::InvalidInput, "synthetic uri"))?
        .pop_if_empty()
        .push(name);
    Ok(url)
}

/// `git:/abs/path?ref=<ref>`, the URI of a file as of `git_ref`.
pub fn historical_uri(uri: &Url, git_ref: &str) -> io::Result<Url> {
    let mut url = Url::parse(&format!("{HISTORICAL_SCHEME}:{}", uri.path()))
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    url.query_pairs_mut().append_pair("ref", git_ref);
    Ok(url)
}

/// The live `file:` URI and ref encoded in a historical URI.
pub fn split_historical_uri(uri: &Url) -> Option<(Url, String)> {
    if uri.scheme() != HISTORICAL_SCHEME {
        return None;
    }
    let git_ref = uri
        .query_pairs()
        .find(|(key, _)| key == "ref")
        .map(|(_, value)| value.into_owned())?;
    let live = Url::parse(&format!("file://{}", uri.path())).ok()?;
    Some((live, git_ref))
}

fn unresolved(location: &str, source: io::Error) -> ResolveError {
    ResolveError::AnchorUnresolved {
        location: location.to_string(),
        source,
    }
}
