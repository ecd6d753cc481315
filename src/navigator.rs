//! The active tour session.
//!
//! A [`Navigator`] is either idle or holds one [`Session`]: the tour being
//! played, the current step, and whether the user is viewing, recording or
//! editing. Every transition bumps a generation counter and is announced on
//! the [`TourEvent`] channel.
//!
//! Resolving a step can take a while (it may shell out to git). Callers
//! take a [`Ticket`] before resolving and check [`Navigator::accepts`]
//! before showing the result, so a resolution started for a step the user
//! has already left is dropped.

use std::sync::mpsc;

use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::{
    model::{Selection, Step, Target, Tour, TourId},
    resolve::{RecordError, pattern_for_line},
};

/// What the user is doing with the active tour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Viewing,
    Recording,
    Editing,
}

/// How a step recorded at the cursor is anchored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordMode {
    /// Explicit line number.
    #[default]
    Line,

    /// Pattern matching the line's text, falling back to a line number when
    /// the text is blank or not unique.
    Pattern,
}

/// Errors from navigation and recording.
#[derive(Debug, thiserror::Error)]
pub enum NavigationError {
    #[error("no tour is active")]
    Idle,

    #[error("step {index} is out of range for a tour with {len} steps")]
    NoSuchStep { index: usize, len: usize },

    #[error("no step after the current one")]
    AtEnd,

    #[error("no step before the current one")]
    AtStart,

    #[error("the active tour is not being recorded")]
    NotRecording,

    #[error("no tour titled {0:?} next to the active tour")]
    UnknownTour(String),

    #[error("no tour follows or precedes the active tour")]
    NoSiblingTour,

    #[error(transparent)]
    Record(#[from] RecordError),
}

/// Notification of a session transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TourEvent {
    Started { tour: TourId, step: Option<usize> },
    StepChanged { tour: TourId, step: Option<usize> },
    Ended { tour: TourId },
}

/// The active tour being played or recorded.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub tour: Tour,

    /// Current step; `None` only while the tour has no steps.
    pub step: Option<usize>,
    pub mode: Mode,

    /// Root that overrides the tour's own workspace, if any.
    pub workspace_root: Option<Url>,

    /// Tours discovered alongside this one; cross-tour links resolve here.
    pub tours: Vec<Tour>,
}

impl Session {
    pub fn current_step(&self) -> Option<&Step> {
        self.tour.steps.get(self.step?)
    }

    /// Index the next recorded step is inserted at.
    fn insertion_point(&self) -> usize {
        self.step.map_or(0, |s| s + 1)
    }
}

/// How to start a session.
#[derive(Debug, Clone, Default)]
pub struct StartOptions {
    /// 0-based step to open at. Defaults to the first step.
    pub step: Option<usize>,
    pub workspace_root: Option<Url>,
    pub recording: bool,
    pub tours: Vec<Tour>,
}

/// A snapshot of the session a resolution was computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    session: Uuid,
    generation: u64,
    pub step: Option<usize>,
}

/// The active tour no longer exists after re-discovery.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("active tour {tour} disappeared")]
pub struct StaleActiveTour {
    pub tour: TourId,
}

/// What [`Navigator::reconcile`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// No session, or the discovered tour is unchanged.
    Unchanged,

    /// The discovered tour replaced the in-memory copy.
    Merged,

    /// The session ended because its tour is gone.
    Ended(StaleActiveTour),
}

/// Direction of a step move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Movement {
    Back,
    Forward,
}

#[derive(Debug, Default)]
pub struct Navigator {
    session: Option<Session>,
    generation: u64,
    record_mode: RecordMode,
    subscribers: Vec<mpsc::Sender<TourEvent>>,
}

impl Navigator {
    pub fn new(record_mode: RecordMode) -> Self {
        Self {
            record_mode,
            ..Self::default()
        }
    }

    /// Receives every transition from now on.
    pub fn subscribe(&mut self) -> mpsc::Receiver<TourEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn active_tour(&self) -> Option<&Tour> {
        self.session.as_ref().map(|s| &s.tour)
    }

    pub fn step(&self) -> Option<usize> {
        self.session.as_ref()?.step
    }

    pub fn current_step(&self) -> Option<&Step> {
        self.session.as_ref()?.current_step()
    }

    pub fn record_mode(&self) -> RecordMode {
        self.record_mode
    }

    // ── Transitions ──

    /// Starts playing `tour`, ending any active session first.
    pub fn start(&mut self, tour: Tour, options: StartOptions) -> Result<(), NavigationError> {
        let len = tour.steps.len();
        let step = match options.step {
            Some(index) if index >= len => return Err(NavigationError::NoSuchStep { index, len }),
            Some(index) => Some(index),
            None if len > 0 => Some(0),
            None => None,
        };

        self.end(true);

        tracing::debug!(tour = %tour.id, ?step, "starting tour");
        let id = tour.id.clone();
        self.session = Some(Session {
            id: Uuid::new_v4(),
            tour,
            step,
            mode: if options.recording {
                Mode::Recording
            } else {
                Mode::Viewing
            },
            workspace_root: options.workspace_root,
            tours: options.tours,
        });
        self.generation += 1;
        self.emit(TourEvent::Started { tour: id, step });
        Ok(())
    }

    /// Ends the session. Returns the tour that was active, if any.
    pub fn end(&mut self, fire_event: bool) -> Option<Tour> {
        let session = self.session.take()?;
        self.generation += 1;
        tracing::debug!(tour = %session.tour.id, "ending tour");
        if fire_event {
            self.emit(TourEvent::Ended {
                tour: session.tour.id.clone(),
            });
        }
        Some(session.tour)
    }

    pub fn has_next(&self) -> bool {
        self.session
            .as_ref()
            .and_then(|s| s.step.map(|step| step + 1 < s.tour.steps.len()))
            .unwrap_or(false)
    }

    pub fn has_previous(&self) -> bool {
        self.step().is_some_and(|step| step > 0)
    }

    pub fn advance(&mut self) -> Result<usize, NavigationError> {
        if !self.has_next() {
            return Err(self.idle_or(NavigationError::AtEnd));
        }
        let next = self.step().map_or(0, |s| s + 1);
        self.set_step(Some(next))?;
        Ok(next)
    }

    pub fn retreat(&mut self) -> Result<usize, NavigationError> {
        if !self.has_previous() {
            return Err(self.idle_or(NavigationError::AtStart));
        }
        let previous = self.step().map_or(0, |s| s - 1);
        self.set_step(Some(previous))?;
        Ok(previous)
    }

    /// Moves straight to `index`.
    pub fn jump(&mut self, index: usize) -> Result<(), NavigationError> {
        let session = self.session.as_ref().ok_or(NavigationError::Idle)?;
        let len = session.tour.steps.len();
        if index >= len {
            return Err(NavigationError::NoSuchStep { index, len });
        }
        self.set_step(Some(index))
    }

    pub fn set_mode(&mut self, mode: Mode) -> Result<(), NavigationError> {
        let session = self.session.as_mut().ok_or(NavigationError::Idle)?;
        session.mode = mode;
        self.generation += 1;
        Ok(())
    }

    // ── Cross-tour navigation ──

    /// Starts the sibling tour titled `title`, keeping the session's
    /// workspace and sibling list. `step` is 1-based, as in tour links.
    pub fn start_by_title(&mut self, title: &str, step: Option<usize>) -> Result<(), NavigationError> {
        let session = self.session.as_ref().ok_or(NavigationError::Idle)?;
        let tour = session
            .tours
            .iter()
            .find(|t| t.title == title)
            .cloned()
            .ok_or_else(|| NavigationError::UnknownTour(title.to_string()))?;
        let options = StartOptions {
            step: step.map(|s| s.saturating_sub(1)),
            workspace_root: session.workspace_root.clone(),
            recording: false,
            tours: session.tours.clone(),
        };
        self.start(tour, options)
    }

    /// Starts the tour that follows the active one.
    pub fn start_next_tour(&mut self) -> Result<(), NavigationError> {
        self.start_sibling(crate::model::next_tour)
    }

    /// Starts the tour that precedes the active one.
    pub fn start_previous_tour(&mut self) -> Result<(), NavigationError> {
        self.start_sibling(crate::model::previous_tour)
    }

    fn start_sibling(
        &mut self,
        pick: for<'a> fn(&Tour, &'a [Tour]) -> Option<&'a Tour>,
    ) -> Result<(), NavigationError> {
        let session = self.session.as_ref().ok_or(NavigationError::Idle)?;
        let tour = pick(&session.tour, &session.tours)
            .cloned()
            .ok_or(NavigationError::NoSiblingTour)?;
        let options = StartOptions {
            step: None,
            workspace_root: session.workspace_root.clone(),
            recording: false,
            tours: session.tours.clone(),
        };
        self.start(tour, options)
    }

    // ── Staleness ──

    /// Captures the current session and step.
    pub fn ticket(&self) -> Option<Ticket> {
        let session = self.session.as_ref()?;
        Some(Ticket {
            session: session.id,
            generation: self.generation,
            step: session.step,
        })
    }

    /// Whether nothing has happened since `ticket` was taken.
    pub fn accepts(&self, ticket: &Ticket) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.id == ticket.session && self.generation == ticket.generation)
    }

    // ── Editing the active tour ──

    /// Removes steps from the active tour, keeping the session on the same
    /// step where it survives. Returns the removed steps in index order.
    pub fn delete_steps(&mut self, indices: &[usize]) -> Result<Vec<Step>, NavigationError> {
        let session = self.session.as_mut().ok_or(NavigationError::Idle)?;
        let len = session.tour.steps.len();
        let mut indices = indices.to_vec();
        indices.sort_unstable();
        indices.dedup();
        if let Some(&index) = indices.iter().find(|i| **i >= len) {
            return Err(NavigationError::NoSuchStep { index, len });
        }

        let mut removed = Vec::with_capacity(indices.len());
        for index in indices.iter().rev() {
            removed.push(session.tour.steps.remove(*index));
        }
        removed.reverse();

        let remaining = session.tour.steps.len();
        let step = if remaining == 0 {
            None
        } else {
            session.step.map(|step| {
                let before = indices.iter().filter(|i| **i <= step).count();
                step.saturating_sub(before).min(remaining - 1)
            })
        };
        self.set_step(step)?;
        Ok(removed)
    }

    /// Moves step `index` one place. The session follows the step if it is
    /// the current one. Returns the step's new index.
    pub fn move_step(&mut self, index: usize, movement: Movement) -> Result<usize, NavigationError> {
        let session = self.session.as_mut().ok_or(NavigationError::Idle)?;
        let len = session.tour.steps.len();
        let target = match movement {
            Movement::Back => index.checked_sub(1),
            Movement::Forward => Some(index + 1).filter(|t| *t < len),
        };
        let target = match target {
            Some(target) if index < len => target,
            _ => return Err(NavigationError::NoSuchStep { index, len }),
        };

        session.tour.steps.swap(index, target);
        let step = match session.step {
            Some(current) if current == index => Some(target),
            Some(current) if current == target => Some(index),
            other => other,
        };
        self.set_step(step)?;
        Ok(target)
    }

    /// Ends the session if `id` is its tour.
    pub fn tour_deleted(&mut self, id: &TourId) -> bool {
        if self.active_tour().is_some_and(|t| &t.id == id) {
            self.end(true);
            true
        } else {
            false
        }
    }

    /// Applies a fresh discovery pass to the session.
    ///
    /// The active tour's new content replaces the in-memory copy at the same
    /// step (clamped if steps went away); if the tour is gone the session ends.
    pub fn reconcile(&mut self, tours: &[Tour]) -> Reconciliation {
        let Some(session) = self.session.as_mut() else {
            return Reconciliation::Unchanged;
        };
        session.tours = tours.to_vec();

        let Some(fresh) = tours.iter().find(|t| t.id == session.tour.id) else {
            let stale = StaleActiveTour {
                tour: session.tour.id.clone(),
            };
            tracing::warn!(tour = %stale.tour, "active tour disappeared; ending session");
            self.end(true);
            return Reconciliation::Ended(stale);
        };
        if *fresh == session.tour {
            return Reconciliation::Unchanged;
        }

        session.tour = fresh.clone();
        let len = session.tour.steps.len();
        let step = match session.step {
            _ if len == 0 => None,
            Some(step) => Some(step.min(len - 1)),
            None => Some(0),
        };
        if let Err(e) = self.set_step(step) {
            tracing::debug!(error = %e, "reconcile after session ended");
        }
        Reconciliation::Merged
    }

    // ── Recording ──

    /// Inserts a step anchored to the 0-based `line` of `document`, after
    /// the current step, and moves to it.
    ///
    /// In pattern mode a blank or repeated line is anchored by line number
    /// instead.
    pub fn add_step_at_cursor(
        &mut self,
        file: &str,
        line: u32,
        document: &str,
        description: impl Into<String>,
    ) -> Result<usize, NavigationError> {
        let mut step = Step::new(Target::File { path: file.into() }, description);
        match self.record_mode {
            RecordMode::Line => step.line = Some(line + 1),
            RecordMode::Pattern => match pattern_for_line(document, line) {
                Ok(pattern) => step.pattern = Some(pattern),
                Err(e @ RecordError::LineOutOfRange { .. }) => return Err(e.into()),
                Err(e) => {
                    tracing::debug!(file, line, reason = %e, "recording by line number");
                    step.line = Some(line + 1);
                }
            },
        }
        self.insert_step(step)
    }

    /// Inserts a step anchored to a selection (1-based).
    pub fn add_selection_step(
        &mut self,
        file: &str,
        selection: Selection,
        description: impl Into<String>,
    ) -> Result<usize, NavigationError> {
        let mut step = Step::new(Target::File { path: file.into() }, description);
        step.selection = Some(selection);
        self.insert_step(step)
    }

    pub fn add_directory_step(
        &mut self,
        directory: &str,
        description: impl Into<String>,
    ) -> Result<usize, NavigationError> {
        self.insert_step(Step::new(
            Target::Directory {
                path: directory.into(),
            },
            description,
        ))
    }

    /// Inserts a narrative-only step.
    pub fn add_content_step(
        &mut self,
        title: Option<String>,
        description: impl Into<String>,
    ) -> Result<usize, NavigationError> {
        let mut step = Step::new(Target::Note, description);
        step.title = title;
        self.insert_step(step)
    }

    /// Inserts `step` after the current step and moves to it.
    pub fn insert_step(&mut self, step: Step) -> Result<usize, NavigationError> {
        let session = self.session.as_mut().ok_or(NavigationError::Idle)?;
        if session.mode == Mode::Viewing {
            return Err(NavigationError::NotRecording);
        }
        let index = session.insertion_point();
        session.tour.steps.insert(index, step);
        self.set_step(Some(index))?;
        Ok(index)
    }

    // ── Internals ──

    fn set_step(&mut self, step: Option<usize>) -> Result<(), NavigationError> {
        let session = self.session.as_mut().ok_or(NavigationError::Idle)?;
        session.step = step;
        let tour = session.tour.id.clone();
        self.generation += 1;
        self.emit(TourEvent::StepChanged { tour, step });
        Ok(())
    }

    fn idle_or(&self, error: NavigationError) -> NavigationError {
        if self.is_active() {
            error
        } else {
            NavigationError::Idle
        }
    }

    fn emit(&mut self, event: TourEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::Position;

    fn tour(title: &str, steps: usize) -> Tour {
        let mut tour = Tour::new(TourId::new(format!("file:///w/.tours/{title}.tour")), title);
        for i in 0..steps {
            tour.steps.push(Step::new(Target::Note, format!("step {i}")));
        }
        tour
    }

    fn started(steps: usize, at: Option<usize>) -> Navigator {
        let mut nav = Navigator::default();
        nav.start(
            tour("a", steps),
            StartOptions {
                step: at,
                ..StartOptions::default()
            },
        )
        .unwrap();
        nav
    }

    fn recording(steps: usize, at: Option<usize>, mode: RecordMode) -> Navigator {
        let mut nav = Navigator::new(mode);
        nav.start(
            tour("a", steps),
            StartOptions {
                step: at,
                recording: true,
                ..StartOptions::default()
            },
        )
        .unwrap();
        nav
    }

    fn descriptions(nav: &Navigator) -> Vec<String> {
        nav.active_tour()
            .unwrap()
            .steps
            .iter()
            .map(|s| s.description.clone())
            .collect()
    }

    #[test]
    fn start_defaults_to_first_step() {
        let nav = started(3, None);
        assert_eq!(nav.step(), Some(0));
        assert_eq!(nav.session().unwrap().mode, Mode::Viewing);
    }

    #[test]
    fn start_empty_tour_has_no_step() {
        let nav = started(0, None);
        assert!(nav.is_active());
        assert_eq!(nav.step(), None);
        assert!(nav.current_step().is_none());
    }

    #[test]
    fn start_rejects_out_of_range_step() {
        let mut nav = Navigator::default();
        let err = nav
            .start(
                tour("a", 2),
                StartOptions {
                    step: Some(2),
                    ..StartOptions::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, NavigationError::NoSuchStep { index: 2, len: 2 }));
        assert!(!nav.is_active());
    }

    #[test]
    fn advance_retreat_and_jump() {
        let mut nav = started(3, None);
        assert!(!nav.has_previous());
        assert_eq!(nav.advance().unwrap(), 1);
        assert_eq!(nav.advance().unwrap(), 2);
        assert!(!nav.has_next());
        assert!(matches!(nav.advance(), Err(NavigationError::AtEnd)));

        assert_eq!(nav.retreat().unwrap(), 1);
        nav.jump(0).unwrap();
        assert!(matches!(nav.retreat(), Err(NavigationError::AtStart)));
        assert!(matches!(nav.jump(7), Err(NavigationError::NoSuchStep { .. })));
    }

    #[test]
    fn idle_navigator_refuses_to_move() {
        let mut nav = Navigator::default();
        assert!(matches!(nav.advance(), Err(NavigationError::Idle)));
        assert!(matches!(nav.jump(0), Err(NavigationError::Idle)));
        assert!(nav.end(true).is_none());
    }

    #[test]
    fn events_follow_transitions() {
        let mut nav = Navigator::default();
        let events = nav.subscribe();
        let first = tour("a", 2);
        let second = tour("b", 1);

        nav.start(first.clone(), StartOptions::default()).unwrap();
        nav.advance().unwrap();
        nav.start(second.clone(), StartOptions::default()).unwrap();
        nav.end(true);

        let seen: Vec<TourEvent> = events.try_iter().collect();
        assert_eq!(
            seen,
            vec![
                TourEvent::Started { tour: first.id.clone(), step: Some(0) },
                TourEvent::StepChanged { tour: first.id.clone(), step: Some(1) },
                TourEvent::Ended { tour: first.id },
                TourEvent::Started { tour: second.id.clone(), step: Some(0) },
                TourEvent::Ended { tour: second.id },
            ]
        );
    }

    #[test]
    fn silent_end_fires_nothing() {
        let mut nav = started(1, None);
        let events = nav.subscribe();
        assert!(nav.end(false).is_some());
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let mut nav = started(2, None);
        drop(nav.subscribe());
        nav.advance().unwrap();
        assert!(nav.subscribers.is_empty());
    }

    #[test]
    fn ticket_goes_stale_on_any_transition() {
        let mut nav = started(3, None);
        let ticket = nav.ticket().unwrap();
        assert!(nav.accepts(&ticket));

        nav.advance().unwrap();
        assert!(!nav.accepts(&ticket));
        let ticket = nav.ticket().unwrap();
        assert_eq!(ticket.step, Some(1));

        nav.end(true);
        assert!(!nav.accepts(&ticket));
        assert!(nav.ticket().is_none());
    }

    #[test]
    fn restart_of_same_tour_invalidates_ticket() {
        let mut nav = started(3, None);
        let ticket = nav.ticket().unwrap();
        let tour = nav.active_tour().unwrap().clone();
        nav.start(tour, StartOptions::default()).unwrap();
        assert!(!nav.accepts(&ticket));
    }

    #[test]
    fn delete_before_and_at_current_step() {
        let mut nav = started(5, Some(3));
        let removed = nav.delete_steps(&[2, 3]).unwrap();
        assert_eq!(removed.len(), 2);
        assert_eq!(removed[0].description, "step 2");
        assert_eq!(nav.step(), Some(1));
        assert_eq!(descriptions(&nav), ["step 0", "step 1", "step 4"]);
    }

    #[test]
    fn delete_after_current_step_keeps_position() {
        let mut nav = started(5, Some(1));
        nav.delete_steps(&[3, 4]).unwrap();
        assert_eq!(nav.step(), Some(1));
    }

    #[test]
    fn delete_first_step_while_on_it_floors_at_zero() {
        let mut nav = started(3, Some(0));
        nav.delete_steps(&[0]).unwrap();
        assert_eq!(nav.step(), Some(0));
        assert_eq!(descriptions(&nav), ["step 1", "step 2"]);
    }

    #[test]
    fn delete_everything_leaves_no_step() {
        let mut nav = started(3, Some(2));
        nav.delete_steps(&[0, 1, 2]).unwrap();
        assert_eq!(nav.step(), None);
        assert!(nav.is_active());
    }

    #[test]
    fn delete_rejects_unknown_index() {
        let mut nav = started(2, None);
        assert!(matches!(nav.delete_steps(&[5]), Err(NavigationError::NoSuchStep { index: 5, .. })));
        assert_eq!(nav.active_tour().unwrap().steps.len(), 2);
    }

    #[test]
    fn deleting_active_tour_ends_session() {
        let mut nav = started(2, None);
        let id = nav.active_tour().unwrap().id.clone();
        assert!(!nav.tour_deleted(&TourId::new("file:///other.tour")));
        assert!(nav.tour_deleted(&id));
        assert!(!nav.is_active());
    }

    #[test]
    fn moving_current_step_carries_session() {
        let mut nav = started(3, Some(1));
        assert_eq!(nav.move_step(1, Movement::Forward).unwrap(), 2);
        assert_eq!(nav.step(), Some(2));
        assert_eq!(descriptions(&nav), ["step 0", "step 2", "step 1"]);

        // Moving a neighbour into the current slot pushes the session aside.
        nav.move_step(1, Movement::Forward).unwrap();
        assert_eq!(nav.step(), Some(1));

        assert!(nav.move_step(0, Movement::Back).is_err());
        assert!(nav.move_step(2, Movement::Forward).is_err());
    }

    #[test]
    fn reconcile_merges_in_place() {
        let mut nav = started(3, Some(2));
        let mut fresh = nav.active_tour().unwrap().clone();
        fresh.steps.truncate(2);
        fresh.description = Some("edited".into());

        assert_eq!(nav.reconcile(&[fresh.clone()]), Reconciliation::Merged);
        assert_eq!(nav.active_tour(), Some(&fresh));
        assert_eq!(nav.step(), Some(1));
        assert_eq!(nav.reconcile(&[fresh]), Reconciliation::Unchanged);
    }

    #[test]
    fn reconcile_without_active_tour_ends_session() {
        let mut nav = started(3, None);
        let id = nav.active_tour().unwrap().id.clone();
        let events = nav.subscribe();

        let outcome = nav.reconcile(&[tour("other", 1)]);

        assert_eq!(outcome, Reconciliation::Ended(StaleActiveTour { tour: id.clone() }));
        assert!(!nav.is_active());
        assert_eq!(events.try_recv().unwrap(), TourEvent::Ended { tour: id });
    }

    #[test]
    fn recording_requires_recording_mode() {
        let mut nav = started(1, None);
        let err = nav.add_directory_step("src", "").unwrap_err();
        assert!(matches!(err, NavigationError::NotRecording));

        nav.set_mode(Mode::Editing).unwrap();
        assert_eq!(nav.add_directory_step("src", "").unwrap(), 1);
    }

    #[test]
    fn recorded_steps_insert_after_current_and_advance() {
        let mut nav = recording(0, None, RecordMode::Line);
        assert_eq!(nav.add_content_step(Some("Intro".into()), "Welcome").unwrap(), 0);
        assert_eq!(nav.add_directory_step("src", "The sources").unwrap(), 1);

        nav.jump(0).unwrap();
        let selection = Selection {
            start: Position { line: 1, character: 1 },
            end: Position { line: 2, character: 5 },
        };
        assert_eq!(nav.add_selection_step("a.rs", selection, "Between").unwrap(), 1);
        assert_eq!(nav.step(), Some(1));
        assert_eq!(descriptions(&nav), ["Welcome", "Between", "The sources"]);
    }

    #[test]
    fn line_mode_records_one_based_line() {
        let mut nav = recording(0, None, RecordMode::Line);
        nav.add_step_at_cursor("a.rs", 4, "", "here").unwrap();
        let step = nav.current_step().unwrap();
        assert_eq!(step.line, Some(5));
        assert_eq!(step.pattern, None);
    }

    #[test]
    fn pattern_mode_records_unique_lines_by_pattern() {
        let document = "fn a() {}\n\nfn b() {}\n}\n}\n";
        let mut nav = recording(0, None, RecordMode::Pattern);

        nav.add_step_at_cursor("a.rs", 2, document, "unique").unwrap();
        let step = nav.current_step().unwrap();
        assert!(step.pattern.is_some());
        assert_eq!(step.line, None);

        nav.add_step_at_cursor("a.rs", 3, document, "repeated").unwrap();
        assert_eq!(nav.current_step().unwrap().line, Some(4));

        nav.add_step_at_cursor("a.rs", 1, document, "blank").unwrap();
        assert_eq!(nav.current_step().unwrap().line, Some(2));

        let err = nav.add_step_at_cursor("a.rs", 40, document, "past end").unwrap_err();
        assert!(matches!(err, NavigationError::Record(RecordError::LineOutOfRange { .. })));
    }

    #[test]
    fn start_by_title_uses_sibling_tours() {
        let first = tour("#1 - Intro", 2);
        let second = tour("#2 - Next", 3);
        let siblings = vec![first.clone(), second.clone()];
        let mut nav = Navigator::default();
        nav.start(
            first,
            StartOptions {
                tours: siblings,
                ..StartOptions::default()
            },
        )
        .unwrap();

        nav.start_by_title("#2 - Next", Some(3)).unwrap();
        assert_eq!(nav.active_tour().unwrap().id, second.id);
        assert_eq!(nav.step(), Some(2));

        assert!(matches!(
            nav.start_by_title("Missing", None),
            Err(NavigationError::UnknownTour(_))
        ));
    }

    #[test]
    fn next_and_previous_tours() {
        let first = tour("#1 - Intro", 1);
        let second = tour("#2 - Next", 1);
        let siblings = vec![first.clone(), second.clone()];
        let mut nav = Navigator::default();
        nav.start(
            first.clone(),
            StartOptions {
                tours: siblings,
                ..StartOptions::default()
            },
        )
        .unwrap();

        nav.start_next_tour().unwrap();
        assert_eq!(nav.active_tour().unwrap().id, second.id);
        assert!(matches!(nav.start_next_tour(), Err(NavigationError::NoSiblingTour)));
        nav.start_previous_tour().unwrap();
        assert_eq!(nav.active_tour().unwrap().id, first.id);
    }
}
