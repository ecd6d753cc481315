//! Tour types and the values derived from them.

use std::{
    fmt,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use url::Url;

use super::step::{Step, Target};

/// The ref that means "whatever is checked out".
pub const HEAD_REF: &str = "HEAD";

/// Stable identity of a tour: the URL of the file it was loaded from.
///
/// Derived from storage location, never persisted inside the tour.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TourId(String);

impl TourId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id of a tour stored at `path`.
    pub fn for_path(path: &Path) -> Self {
        match Url::from_file_path(path) {
            Ok(url) => Self(url.to_string()),
            Err(()) => Self(path.to_string_lossy().into_owned()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The tour file's path, when the id is a `file:` URL.
    pub fn to_file_path(&self) -> Option<PathBuf> {
        Url::parse(&self.0).ok()?.to_file_path().ok()
    }
}

impl fmt::Display for TourId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An ordered sequence of steps with shared metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tour {
    #[serde(skip)]
    pub id: TourId,

    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub steps: Vec<Step>,

    /// Git ref the tour's files resolve against. `None` or `"HEAD"` means live.
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_primary: bool,

    /// Title of the tour that follows this one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_tour: Option<String>,

    /// Prefix of marker comments (`<marker>.<N> - title`) anchoring steps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_marker: Option<String>,

    /// Condition deciding whether the tour is offered at all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<String>,
}

impl Tour {
    /// An empty tour with the given identity and title.
    pub fn new(id: TourId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: None,
            steps: Vec::new(),
            git_ref: None,
            is_primary: false,
            next_tour: None,
            step_marker: None,
            when: None,
        }
    }

    /// The leading ordinal of the title: `"#3 - Setup"` → 3.
    pub fn number(&self) -> Option<u32> {
        split_ordinal(&self.title).map(|(n, _)| n)
    }

    /// Title with its ordinal stripped: `"#3 - Setup"` → `"Setup"`.
    pub fn display_title(&self) -> &str {
        split_ordinal(&self.title).map_or(self.title.as_str(), |(_, rest)| rest)
    }

    /// Prefix of the marker comments anchoring this tour's steps.
    ///
    /// The explicit `stepMarker`, else `CT<number>` for numbered tours.
    pub fn step_marker_prefix(&self) -> Option<String> {
        if let Some(marker) = &self.step_marker {
            return Some(marker.clone());
        }
        self.number().map(|n| format!("CT{n}"))
    }

    /// Whether a step anchors through the marker convention: a file step
    /// without an explicit line, in a tour that has a marker prefix.
    pub fn is_marker_step(&self, index: usize) -> bool {
        let Some(step) = self.steps.get(index) else {
            return false;
        };
        matches!(step.target, Target::File { .. })
            && step.line.is_none()
            && self.step_marker_prefix().is_some()
    }

    /// The ref this tour is pinned to, unless it follows the working tree.
    pub fn pinned_ref(&self) -> Option<&str> {
        self.git_ref.as_deref().filter(|r| *r != HEAD_REF)
    }

    /// Human label for a step.
    ///
    /// Falls back from the explicit title to the description's leading
    /// markdown heading, the cached marker title, and finally the target's
    /// path when `default_to_file` is set.
    pub fn step_label(&self, index: usize, numbered: bool, default_to_file: bool) -> String {
        let prefix = if numbered {
            format!("#{} - ", index + 1)
        } else {
            String::new()
        };
        let Some(step) = self.steps.get(index) else {
            return prefix;
        };

        let label = if let Some(title) = &step.title {
            title.clone()
        } else if let Some(heading) = leading_heading(&step.description) {
            heading.to_string()
        } else if let Some(marker) = &step.marker_title {
            marker.clone()
        } else if default_to_file {
            match &step.target {
                Target::File { path } | Target::Directory { path } => path.clone(),
                Target::Uri { uri } => uri.clone(),
                Target::Embedded { file, .. } => file.clone().unwrap_or_default(),
                Target::View { name } => name.clone(),
                Target::Note => String::new(),
            }
        } else {
            String::new()
        };

        format!("{prefix}{label}")
    }
}

/// The tour that follows `tour` among `siblings`.
///
/// `nextTour` by title if set; otherwise the tour numbered one higher.
pub fn next_tour<'a>(tour: &Tour, siblings: &'a [Tour]) -> Option<&'a Tour> {
    if let Some(next) = &tour.next_tour {
        return siblings.iter().find(|t| &t.title == next);
    }
    let next = tour.number()? + 1;
    siblings.iter().find(|t| t.number() == Some(next))
}

/// The tour that precedes `tour` among `siblings`.
///
/// A sibling whose `nextTour` names this tour; otherwise the tour numbered one lower.
pub fn previous_tour<'a>(tour: &Tour, siblings: &'a [Tour]) -> Option<&'a Tour> {
    if let Some(previous) = siblings
        .iter()
        .find(|t| t.next_tour.as_deref() == Some(tour.title.as_str()))
    {
        return Some(previous);
    }
    let previous = tour.number()?.checked_sub(1)?;
    siblings.iter().find(|t| t.number() == Some(previous))
}

/// The tour to start by default: flagged primary, else numbered 1.
pub fn primary_tour(tours: &[Tour]) -> Option<&Tour> {
    tours
        .iter()
        .find(|t| t.is_primary)
        .or_else(|| tours.iter().find(|t| t.number() == Some(1)))
}

/// Split `"#3 - Setup"` into `(3, "Setup")`.
///
/// The ordinal needs an optional `#`, digits, whitespace, then `-`.
fn split_ordinal(title: &str) -> Option<(u32, &str)> {
    let rest = title.strip_prefix('#').unwrap_or(title);
    let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return None;
    }
    let number = rest[..digits].parse().ok()?;
    let after = &rest[digits..];
    let trimmed = after.trim_start();
    if trimmed.len() == after.len() {
        return None;
    }
    let remainder = trimmed.strip_prefix('-')?;
    Some((number, remainder.trim()))
}

/// The text of a leading markdown heading: `"## Setup\n..."` → `"Setup"`.
fn leading_heading(description: &str) -> Option<&str> {
    let first = description.trim().lines().next()?;
    let text = first.strip_prefix('#')?.trim_start_matches('#');
    Some(text.trim())
}
