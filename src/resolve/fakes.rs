//! In-memory collaborators for tests.

use std::{collections::HashMap, io};

use url::Url;

use super::{FileReader, Head, RefResolver, historical_uri};

/// Documents keyed by URI.
#[derive(Debug, Default)]
pub struct MemoryFiles {
    files: HashMap<String, String>,
}

impl MemoryFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, uri: &str, text: &str) -> Self {
        self.files.insert(uri.to_string(), text.to_string());
        self
    }
}

impl FileReader for MemoryFiles {
    fn read_text(&self, uri: &Url) -> io::Result<String> {
        self.files
            .get(uri.as_str())
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, uri.to_string()))
    }
}

/// A repository with a fixed head and a table of refs.
#[derive(Debug, Default)]
pub struct FakeRefs {
    head: Option<Head>,
    refs: HashMap<String, String>,
}

impl FakeRefs {
    /// No repository at all.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn on_branch(name: &str, commit: &str) -> Self {
        let mut refs = HashMap::new();
        refs.insert(name.to_string(), commit.to_string());
        Self {
            head: Some(Head {
                name: Some(name.to_string()),
                commit: Some(commit.to_string()),
            }),
            refs,
        }
    }

    pub fn with_ref(mut self, name: &str, commit: &str) -> Self {
        self.refs.insert(name.to_string(), commit.to_string());
        self
    }
}

impl RefResolver for FakeRefs {
    fn head(&self, _uri: &Url) -> Option<Head> {
        self.head.clone()
    }

    fn resolve_ref(&self, _uri: &Url, git_ref: &str) -> Option<String> {
        self.refs.get(git_ref).cloned()
    }

    fn to_historical_uri(&self, uri: &Url, git_ref: &str) -> io::Result<Url> {
        historical_uri(uri, git_ref)
    }
}
