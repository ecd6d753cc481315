//! Pilot: guided, step-by-step walkthroughs of a codebase.
//!
//! A tour is an ordered list of steps, each anchored to a place in the
//! workspace: a line of a file, a directory, a host panel, or nothing at
//! all. The modules split along the lifecycle of a tour:
//!
//! - [`storage`] finds tour files in a workspace, saves them, and keeps
//!   per-step progress in `SQLite`.
//! - [`resolve`] turns a step into a concrete location, reading historical
//!   revisions through git when a tour is pinned to a ref.
//! - [`navigator`] holds the active session and records new steps.
//! - [`tracker`] keeps pattern-anchored steps pointing at the right line
//!   while their documents are edited.

pub mod cli;
pub mod config;
pub mod model;
pub mod navigator;
pub mod progress;
pub mod resolve;
pub mod storage;
pub mod tracker;
pub mod when;
