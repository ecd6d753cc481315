//! Progress storage: visited steps in a `SQLite` file.

use std::{
    fs,
    path::{Path, PathBuf},
};

use jiff::Timestamp;
use rusqlite::{Connection, OptionalExtension};

use crate::{model::TourId, progress::Progress};

use super::{Result, StorageError};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS progress (
    tour_id    TEXT    NOT NULL,
    step       INTEGER NOT NULL,
    visited_at TEXT    NOT NULL,
    PRIMARY KEY (tour_id, step)
);";

/// Persistent record of visited steps.
pub struct ProgressStore {
    conn: Connection,
}

impl ProgressStore {
    /// Opens (creating if needed) the database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Returns the default database path: `~/.pilot/progress.sqlite`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".pilot").join("progress.sqlite"))
    }

    /// Loads everything recorded so far.
    pub fn load(&self) -> Result<Progress> {
        let mut stmt = self.conn.prepare("SELECT tour_id, step FROM progress")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut progress = Progress::new();
        for row in rows {
            let (tour_id, step) = row?;
            let step = usize::try_from(step)
                .map_err(|e| StorageError::Corrupt(format!("invalid step {step}: {e}")))?;
            progress.mark_visited(&TourId::new(tour_id), step);
        }
        Ok(progress)
    }

    /// Records a visit. Returns `false` if the step was already visited.
    pub fn mark_visited(&self, tour: &TourId, step: usize) -> Result<bool> {
        let rows = self.conn.execute(
            "INSERT OR IGNORE INTO progress (tour_id, step, visited_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![tour.as_str(), step_value(step)?, Timestamp::now().to_string()],
        )?;
        Ok(rows == 1)
    }

    /// When a step was first visited.
    pub fn visited_at(&self, tour: &TourId, step: usize) -> Result<Option<Timestamp>> {
        let visited_at = self
            .conn
            .query_row(
                "SELECT visited_at FROM progress WHERE tour_id = ?1 AND step = ?2",
                rusqlite::params![tour.as_str(), step_value(step)?],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        visited_at
            .map(|s| {
                s.parse::<Timestamp>()
                    .map_err(|e| StorageError::Corrupt(format!("invalid visited_at: {e}")))
            })
            .transpose()
    }

    /// Forgets one tour's visits, or everything. Returns the rows removed.
    pub fn reset(&self, tour: Option<&TourId>) -> Result<usize> {
        let rows = match tour {
            Some(id) => self
                .conn
                .execute("DELETE FROM progress WHERE tour_id = ?1", [id.as_str()])?,
            None => self.conn.execute("DELETE FROM progress", [])?,
        };
        Ok(rows)
    }
}

fn step_value(step: usize) -> Result<i64> {
    i64::try_from(step).map_err(|e| StorageError::Corrupt(format!("invalid step {step}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store() -> (TempDir, ProgressStore) {
        let dir = TempDir::new().unwrap();
        let store = ProgressStore::open(&dir.path().join("state").join("progress.sqlite")).unwrap();
        (dir, store)
    }

    fn tour(name: &str) -> TourId {
        TourId::new(format!("file:///w/.tours/{name}.tour"))
    }

    #[test]
    fn empty_store_has_no_progress() {
        let (_dir, store) = test_store();
        assert!(!store.load().unwrap().has_progress());
    }

    #[test]
    fn visits_persist_across_connections() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("progress.sqlite");
        {
            let store = ProgressStore::open(&path).unwrap();
            assert!(store.mark_visited(&tour("a"), 0).unwrap());
            assert!(store.mark_visited(&tour("a"), 2).unwrap());
        }

        let store = ProgressStore::open(&path).unwrap();
        let progress = store.load().unwrap();
        assert!(progress.is_step_visited(&tour("a"), 0));
        assert!(progress.is_step_visited(&tour("a"), 2));
        assert!(!progress.is_step_visited(&tour("a"), 1));
    }

    #[test]
    fn repeat_visit_keeps_first_timestamp() {
        let (_dir, store) = test_store();
        assert!(store.mark_visited(&tour("a"), 1).unwrap());
        let first = store.visited_at(&tour("a"), 1).unwrap().unwrap();

        assert!(!store.mark_visited(&tour("a"), 1).unwrap());
        assert_eq!(store.visited_at(&tour("a"), 1).unwrap(), Some(first));
        assert_eq!(store.visited_at(&tour("a"), 5).unwrap(), None);
    }

    #[test]
    fn reset_one_tour_or_all() {
        let (_dir, store) = test_store();
        store.mark_visited(&tour("a"), 0).unwrap();
        store.mark_visited(&tour("a"), 1).unwrap();
        store.mark_visited(&tour("b"), 0).unwrap();

        assert_eq!(store.reset(Some(&tour("a"))).unwrap(), 2);
        let progress = store.load().unwrap();
        assert_eq!(progress.visited_count(&tour("a")), 0);
        assert!(progress.is_step_visited(&tour("b"), 0));

        assert_eq!(store.reset(None).unwrap(), 1);
        assert!(!store.load().unwrap().has_progress());
    }
}
