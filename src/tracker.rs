//! Keeps pattern anchors pointing at their line while a document is edited.
//!
//! When the user types on a line a pattern step is anchored to, the step's
//! pattern is re-derived from the line's new text, so the step still finds
//! its line the next time the tour is resolved. Rewritten tours are queued
//! on a [`Debouncer`] and the caller persists them once edits settle.
//!
//! Edits are described the way editors report incremental changes: a
//! replaced range in the document as it stood before that change, plus the
//! inserted text. Changes in one batch apply in order.

mod debounce;

use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use url::Url;

use crate::{
    model::{Target, Tour, TourId},
    resolve::{
        Range, WorkspaceRoots, count_matching_lines, escape_line, find_pattern_line, line_text,
        relative_uri,
    },
};

pub use debounce::{DEFAULT_WINDOW, Debouncer};

/// One incremental edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChange {
    /// Replaced range, 0-based, in the document before this change.
    pub range: Range,

    /// Text inserted in place of the range.
    pub text: String,
}

impl TextChange {
    /// Newlines the change inserts.
    fn inserted_lines(&self) -> u32 {
        u32::try_from(self.text.matches('\n').count()).unwrap_or(u32::MAX)
    }

    /// Where `line` ends up after this change, and whether its text changed.
    fn map_line(&self, line: u32) -> (u32, bool) {
        let start = self.range.start;
        let end = self.range.end;
        let inserted = self.inserted_lines();

        if start.line > line {
            return (line, false);
        }
        if end.line < line {
            let removed = end.line.saturating_sub(start.line);
            return (shift(line, i64::from(inserted) - i64::from(removed)), false);
        }

        // The change ends exactly where `line` begins. The line's text is
        // untouched if nothing is glued onto its front.
        let glued = if inserted == 0 {
            start.character > 0 || !self.text.is_empty()
        } else {
            !self.text.ends_with('\n')
        };
        if end.line == line && end.character == 0 && !glued {
            return (start.line + inserted, false);
        }

        (start.line + (line - start.line).min(inserted), true)
    }
}

fn shift(line: u32, delta: i64) -> u32 {
    u32::try_from((i64::from(line) + delta).max(0)).unwrap_or(u32::MAX)
}

/// A pattern the tracker replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternRewrite {
    pub tour: TourId,
    pub step: usize,

    /// 0-based line the new pattern anchors.
    pub line: u32,
    pub pattern: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct TrackedStep {
    tour: TourId,
    step: usize,
    line: u32,
}

/// Tracks the pattern steps of open documents.
#[derive(Debug)]
pub struct PatternTracker {
    documents: HashMap<Url, Vec<TrackedStep>>,
    pending: Debouncer<TourId>,
}

impl PatternTracker {
    pub fn new(window: Duration) -> Self {
        Self {
            documents: HashMap::new(),
            pending: Debouncer::new(window),
        }
    }

    /// Starts tracking the pattern steps anchored in `uri`.
    ///
    /// Replaces whatever was tracked for the document before; call again
    /// after steps are added, removed or reordered. Tours pinned to a ref
    /// read historical content and are never tracked. Returns the number of
    /// tracked steps.
    pub fn open_document(
        &mut self,
        uri: &Url,
        text: &str,
        tours: &[Tour],
        roots: &dyn WorkspaceRoots,
    ) -> usize {
        let mut tracked = Vec::new();
        for tour in tours.iter().filter(|t| t.pinned_ref().is_none()) {
            let root = roots.root_for(&tour.id);
            for (index, step) in tour.steps.iter().enumerate() {
                let Some(pattern) = &step.pattern else {
                    continue;
                };
                let step_uri = match &step.target {
                    Target::File { path } => relative_uri(path, root.as_ref()).ok(),
                    Target::Uri { uri } => Url::parse(uri).ok(),
                    _ => None,
                };
                if step_uri.as_ref() != Some(uri) {
                    continue;
                }
                if let Some(line) = find_pattern_line(text, pattern) {
                    tracked.push(TrackedStep {
                        tour: tour.id.clone(),
                        step: index,
                        line,
                    });
                }
            }
        }

        let count = tracked.len();
        tracing::debug!(%uri, count, "tracking pattern steps");
        if tracked.is_empty() {
            self.documents.remove(uri);
        } else {
            self.documents.insert(uri.clone(), tracked);
        }
        count
    }

    /// Stops tracking `uri`. Pending persists are kept.
    pub fn close_document(&mut self, uri: &Url) {
        self.documents.remove(uri);
    }

    /// Last known 0-based line of a tracked step.
    pub fn tracked_line(&self, uri: &Url, tour: &TourId, step: usize) -> Option<u32> {
        self.documents
            .get(uri)?
            .iter()
            .find(|t| &t.tour == tour && t.step == step)
            .map(|t| t.line)
    }

    /// Applies an edit batch to `uri`, rewriting the patterns of steps whose
    /// anchored line changed.
    ///
    /// A line left blank keeps its old pattern: the line may be mid cut and
    /// paste, and an empty pattern would anchor nothing. A new pattern that
    /// matches more than one line is not applied either.
    pub fn on_document_edit(
        &mut self,
        uri: &Url,
        changes: &[TextChange],
        text_after: &str,
        tours: &mut [Tour],
        now: Instant,
    ) -> Vec<PatternRewrite> {
        let Some(tracked) = self.documents.get_mut(uri) else {
            return Vec::new();
        };

        let mut rewrites = Vec::new();
        tracked.retain_mut(|entry| {
            let mut touched = false;
            for change in changes {
                let (line, hit) = change.map_line(entry.line);
                entry.line = line;
                touched |= hit;
            }

            let Some(step) = tours
                .iter_mut()
                .find(|t| t.id == entry.tour)
                .and_then(|t| t.steps.get_mut(entry.step))
            else {
                return false;
            };
            let Some(old) = &step.pattern else {
                return false;
            };
            if !touched {
                return true;
            }

            let Some(pattern) = line_text(text_after, entry.line).and_then(escape_line) else {
                return true;
            };
            if &pattern == old {
                return true;
            }
            let matches = count_matching_lines(text_after, &pattern);
            if matches > 1 {
                tracing::warn!(
                    tour = %entry.tour,
                    step = entry.step,
                    line = entry.line,
                    matches,
                    "edited line is no longer unique; keeping the old pattern"
                );
                return true;
            }

            step.pattern = Some(pattern.clone());
            rewrites.push(PatternRewrite {
                tour: entry.tour.clone(),
                step: entry.step,
                line: entry.line,
                pattern,
            });
            true
        });

        for rewrite in &rewrites {
            tracing::debug!(tour = %rewrite.tour, step = rewrite.step, "pattern rewritten");
            self.pending.schedule(rewrite.tour.clone(), now);
        }
        rewrites
    }

    /// Tours whose rewrites have settled and should be written now.
    pub fn due(&mut self, now: Instant) -> Vec<TourId> {
        self.pending.due(now)
    }

    /// Every tour with unwritten rewrites, settled or not.
    pub fn flush(&mut self) -> Vec<TourId> {
        self.pending.drain()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

impl Default for PatternTracker {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}
