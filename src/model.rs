//! Core data model for pilot.
//!
//! Tours and their steps, exactly as they are persisted, plus the values
//! derived from them (ordinals, marker prefixes, labels, tour chaining).
//! No behavior beyond pure derivation lives here.

mod step;
mod tour;

pub use step::{ConflictingTargets, Position, Selection, Step, Target};
pub use tour::{HEAD_REF, Tour, TourId, next_tour, previous_tour, primary_tour};
