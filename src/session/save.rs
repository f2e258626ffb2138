//! Asynchronous persistence for the editor session.
//!
//! Every mutating action snapshots the store synchronously on the UI
//! thread and hands the snapshot to a [`PendingSave`]. The job runs on a
//! worker thread and reports back through an `mpsc` channel drained on
//! the UI thread, so the worker never touches live state.

use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::thread;

use crate::store::{self, Entity};

/// A save job holding a deep-copied snapshot of the store.
///
/// The snapshot is immutable from the job's point of view; further UI
/// mutations proceed against the live store without racing it.
#[derive(Debug)]
pub struct PendingSave {
    path: PathBuf,
    snapshot: Vec<Entity>,
    index: Option<usize>,
}

impl PendingSave {
    pub fn new(path: PathBuf, snapshot: Vec<Entity>, index: Option<usize>) -> Self {
        Self {
            path,
            snapshot,
            index,
        }
    }

    /// Perform the write and produce the completion outcome.
    pub fn run(self) -> SaveOutcome {
        let error = store::save(&self.path, &self.snapshot)
            .err()
            .map(|e| e.to_string());
        SaveOutcome {
            index: self.index,
            error,
        }
    }

    /// Run the write on a worker thread, sending the outcome through the
    /// channel. The send is allowed to fail if the session is already
    /// gone.
    pub fn dispatch(self, completions: Sender<SaveOutcome>) {
        thread::spawn(move || {
            let _ = completions.send(self.run());
        });
    }
}

/// Completion signal posted back to the UI thread after a save.
#[derive(Debug, Clone)]
pub struct SaveOutcome {
    /// Absolute store index the save was issued for, if any. Must be
    /// re-validated against the live store before use: the store may
    /// have mutated while the write was in flight.
    pub index: Option<usize>,
    /// Write failure message, if the save failed.
    pub error: Option<String>,
}

impl SaveOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::mpsc;
    use tempfile::tempdir;

    fn record(classname: &str) -> Entity {
        let mut key_values = BTreeMap::new();
        key_values.insert("classname".to_string(), classname.to_string());
        Entity { key_values }
    }

    #[test]
    fn test_run_writes_snapshot() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("map.ent");

        let outcome = PendingSave::new(path.clone(), vec![record("light")], Some(0)).run();

        assert!(outcome.is_ok());
        assert_eq!(outcome.index, Some(0));
        let loaded = store::load(&path).unwrap();
        assert_eq!(loaded[0].display_name(), "light");
    }

    #[test]
    fn test_run_reports_write_failure() {
        // A directory that does not exist makes the rename fail
        let path = PathBuf::from("/nonexistent-ripkit-dir/map.ent");
        let outcome = PendingSave::new(path, vec![record("light")], None).run();

        assert!(!outcome.is_ok());
        assert!(outcome.error.is_some());
    }

    #[test]
    fn test_dispatch_posts_completion() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("map.ent");
        let (tx, rx) = mpsc::channel();

        PendingSave::new(path, vec![record("light")], Some(3)).dispatch(tx);

        let outcome = rx.recv().unwrap();
        assert!(outcome.is_ok());
        assert_eq!(outcome.index, Some(3));
    }
}
