//! Progress: which steps of which tours have been visited.
//!
//! Pure set accumulation. Persisting it is the job of
//! [`ProgressStore`](crate::storage::ProgressStore).

use std::collections::{BTreeMap, BTreeSet};

use crate::model::{Tour, TourId};

/// Visited step indices per tour.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Progress {
    visited: BTreeMap<TourId, BTreeSet<usize>>,
}

impl Progress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a visit. Visiting the same step twice has no further effect.
    ///
    /// Returns whether the step was newly recorded.
    pub fn mark_visited(&mut self, tour: &TourId, step: usize) -> bool {
        self.visited.entry(tour.clone()).or_default().insert(step)
    }

    /// Whether a single step has been visited.
    pub fn is_step_visited(&self, tour: &TourId, step: usize) -> bool {
        self.visited.get(tour).is_some_and(|s| s.contains(&step))
    }

    /// With a step, whether that step was visited; without, whether at least
    /// as many steps were visited as the tour has.
    pub fn is_complete(&self, tour: &Tour, step: Option<usize>) -> bool {
        match step {
            Some(step) => self.is_step_visited(&tour.id, step),
            None => self.visited_count(&tour.id) >= tour.steps.len(),
        }
    }

    pub fn visited_count(&self, tour: &TourId) -> usize {
        self.visited.get(tour).map_or(0, BTreeSet::len)
    }

    /// Whether anything at all has been recorded.
    pub fn has_progress(&self) -> bool {
        self.visited.values().any(|s| !s.is_empty())
    }

    /// Clears one tour's history, or everything.
    pub fn reset(&mut self, tour: Option<&TourId>) {
        match tour {
            Some(id) => {
                self.visited.remove(id);
            }
            None => self.visited.clear(),
        }
    }

    /// All recorded `(tour, step)` pairs, in a stable order.
    pub fn entries(&self) -> impl Iterator<Item = (&TourId, usize)> {
        self.visited
            .iter()
            .flat_map(|(id, steps)| steps.iter().map(move |s| (id, *s)))
    }
}
