//! Per-key debouncing with a caller-supplied clock.
//!
//! Scheduling a key that is already pending pushes its deadline back, so a
//! burst of edits to one tour becomes a single write once the burst goes
//! quiet. Nothing here sleeps: callers poll [`Debouncer::due`].

use std::{
    collections::HashMap,
    hash::Hash,
    time::{Duration, Instant},
};

/// Default quiet period before a pending key is due.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct Debouncer<K> {
    window: Duration,
    pending: HashMap<K, Instant>,
}

impl<K: Eq + Hash + Clone> Debouncer<K> {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: HashMap::new(),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Schedules `key` to fire one window after `now`, superseding any
    /// pending deadline. Returns `true` if the key was not already pending.
    pub fn schedule(&mut self, key: K, now: Instant) -> bool {
        self.pending.insert(key, now + self.window).is_none()
    }

    /// Removes and returns every key whose deadline has passed, earliest
    /// first.
    pub fn due(&mut self, now: Instant) -> Vec<K> {
        let mut ready: Vec<(Instant, K)> = self
            .pending
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(key, deadline)| (*deadline, key.clone()))
            .collect();
        ready.sort_by_key(|(deadline, _)| *deadline);

        for (_, key) in &ready {
            self.pending.remove(key);
        }
        ready.into_iter().map(|(_, key)| key).collect()
    }

    /// Removes and returns everything pending, regardless of deadline.
    pub fn drain(&mut self) -> Vec<K> {
        self.pending.drain().map(|(key, _)| key).collect()
    }

    /// Drops a pending key without firing it.
    pub fn cancel(&mut self, key: &K) -> bool {
        self.pending.remove(key).is_some()
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.pending.contains_key(key)
    }

    /// The earliest pending deadline, for callers that want to sleep.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().min().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<K: Eq + Hash + Clone> Default for Debouncer<K> {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}
