//! Step types: one addressed location plus narrative text.
//!
//! Tour files describe a step's target loosely: any of `file`, `directory`,
//! `contents`, `uri` or `view` may be present. That shape is validated once,
//! at the JSON boundary, into the closed [`Target`] enum.

use serde::{Deserialize, Serialize};

/// A 1-based line/character position, as persisted in tour files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

/// A 1-based selection range, as persisted in tour files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub start: Position,
    pub end: Position,
}

/// What a step points at. Exactly one per step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A workspace-relative file.
    File { path: String },

    /// An absolute resource locator.
    Uri { uri: String },

    /// A workspace-relative directory.
    Directory { path: String },

    /// Content carried inside the tour itself.
    /// `file` names the synthetic document the content is shown as.
    Embedded {
        file: Option<String>,
        contents: String,
    },

    /// A named panel of the host (e.g. `"explorer"`, `"terminal"`).
    View { name: String },

    /// Narrative only, no location.
    Note,
}

/// One step of a tour.
///
/// Serialized through [`StepRecord`], so a step that names more than one
/// target never gets past deserialization. `marker_title` is a cache filled
/// from marker comments in source and is never written back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StepRecord", into = "StepRecord")]
pub struct Step {
    pub title: Option<String>,
    pub description: String,
    pub icon: Option<String>,
    pub target: Target,

    /// Explicit 1-based line. Wins over every other anchor.
    pub line: Option<u32>,

    /// 1-based selection. Anchors to the line of its end.
    pub selection: Option<Selection>,

    /// Multiline regular expression locating the anchored line.
    pub pattern: Option<String>,

    /// Host commands to run when the step is shown.
    pub commands: Vec<String>,

    pub marker_title: Option<String>,
}

impl Step {
    /// A step with the given target and description and no anchor.
    pub fn new(target: Target, description: impl Into<String>) -> Self {
        Self {
            title: None,
            description: description.into(),
            icon: None,
            target,
            line: None,
            selection: None,
            pattern: None,
            commands: Vec::new(),
            marker_title: None,
        }
    }

    /// The workspace-relative file this step reads from, if any.
    pub fn file(&self) -> Option<&str> {
        match &self.target {
            Target::File { path } => Some(path),
            Target::Embedded { file, .. } => file.as_deref(),
            _ => None,
        }
    }

    /// Whether the step has a line that does not depend on document content.
    pub fn has_static_line(&self) -> bool {
        self.line.is_some() || self.selection.is_some()
    }
}

/// Error converting a loosely-typed step record into a [`Step`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("step names more than one target: {}", .0.join(", "))]
pub struct ConflictingTargets(pub Vec<&'static str>);

/// The persisted shape of a step: every target field optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StepRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,

    #[serde(default)]
    description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    icon: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    file: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    directory: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    contents: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    uri: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    view: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    line: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    selection: Option<Selection>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pattern: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    commands: Vec<String>,
}

impl TryFrom<StepRecord> for Step {
    type Error = ConflictingTargets;

    fn try_from(record: StepRecord) -> Result<Self, Self::Error> {
        // `contents` travels with `file`, which then names the embedded document.
        let mut named = Vec::new();
        if record.file.is_some() || record.contents.is_some() {
            named.push(if record.contents.is_some() { "contents" } else { "file" });
        }
        if record.directory.is_some() {
            named.push("directory");
        }
        if record.uri.is_some() {
            named.push("uri");
        }
        if record.view.is_some() {
            named.push("view");
        }
        if named.len() > 1 {
            return Err(ConflictingTargets(named));
        }

        let target = match (record.file, record.contents) {
            (file, Some(contents)) => Target::Embedded { file, contents },
            (Some(path), None) => Target::File { path },
            (None, None) => {
                if let Some(path) = record.directory {
                    Target::Directory { path }
                } else if let Some(uri) = record.uri {
                    Target::Uri { uri }
                } else if let Some(name) = record.view {
                    Target::View { name }
                } else {
                    Target::Note
                }
            }
        };

        Ok(Self {
            title: record.title,
            description: record.description,
            icon: record.icon,
            target,
            line: record.line,
            selection: record.selection,
            pattern: record.pattern,
            commands: record.commands,
            marker_title: None,
        })
    }
}

impl From<Step> for StepRecord {
    fn from(step: Step) -> Self {
        let mut record = Self {
            title: step.title,
            description: step.description,
            icon: step.icon,
            line: step.line,
            selection: step.selection,
            pattern: step.pattern,
            commands: step.commands,
            ..Self::default()
        };
        match step.target {
            Target::File { path } => record.file = Some(path),
            Target::Uri { uri } => record.uri = Some(uri),
            Target::Directory { path } => record.directory = Some(path),
            Target::Embedded { file, contents } => {
                record.file = file;
                record.contents = Some(contents);
            }
            Target::View { name } => record.view = Some(name),
            Target::Note => {}
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<Step, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[test]
    fn file_step_with_line() {
        let step = parse(r#"{"file": "src/a.ts", "line": 5, "description": "hi"}"#).unwrap();
        assert_eq!(step.target, Target::File { path: "src/a.ts".into() });
        assert_eq!(step.line, Some(5));
        assert_eq!(step.description, "hi");
    }

    #[test]
    fn contents_with_file_is_embedded() {
        let step = parse(r#"{"file": "notes.md", "contents": "x", "description": ""}"#).unwrap();
        assert_eq!(
            step.target,
            Target::Embedded {
                file: Some("notes.md".into()),
                contents: "x".into(),
            }
        );
    }

    #[test]
    fn no_target_is_note() {
        let step = parse(r#"{"title": "Intro", "description": "Welcome"}"#).unwrap();
        assert_eq!(step.target, Target::Note);
        assert_eq!(step.file(), None);
    }

    #[test]
    fn two_targets_are_rejected() {
        let err = parse(r#"{"file": "a.ts", "directory": "src", "description": ""}"#).unwrap_err();
        assert!(err.to_string().contains("file, directory"));

        let err = parse(r#"{"uri": "https://x", "view": "scm", "description": ""}"#).unwrap_err();
        assert!(err.to_string().contains("uri, view"));
    }

    #[test]
    fn marker_title_is_never_written() {
        let mut step = Step::new(Target::File { path: "a.ts".into() }, "d");
        step.marker_title = Some("cached".into());

        let json = serde_json::to_string(&step).unwrap();
        assert!(!json.contains("markerTitle"));
        assert!(!json.contains("cached"));
    }

    #[test]
    fn marker_title_in_file_is_ignored() {
        let step = parse(r#"{"file": "a.ts", "markerTitle": "old", "description": ""}"#).unwrap();
        assert_eq!(step.marker_title, None);
    }

    #[test]
    fn selection_round_trips_one_based() {
        let json = r#"{"file":"a.ts","description":"","selection":{"start":{"line":2,"character":1},"end":{"line":4,"character":9}}}"#;
        let step = parse(json).unwrap();
        let sel = step.selection.unwrap();
        assert_eq!(sel.start, Position { line: 2, character: 1 });
        assert_eq!(sel.end.line, 4);

        let back: Step = parse(&serde_json::to_string(&step).unwrap()).unwrap();
        assert_eq!(back, step);
    }
}
