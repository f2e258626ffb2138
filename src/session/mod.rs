//! Editor session state machine.
//!
//! Owns the live store, the filtered view, the selection, the text
//! buffer, and the pending-close state. The session is host-UI-agnostic:
//! the terminal adapter translates input events into the action methods
//! here and renders whatever state it reads back. Asynchronous saves are
//! returned as [`PendingSave`] jobs for the adapter to dispatch; their
//! completions come back through [`complete_save`].
//!
//! [`complete_save`]: EditorSession::complete_save

mod save;

pub use save::{PendingSave, SaveOutcome};

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::codec;
use crate::error::Result;
use crate::store::{self, Entity};

/// Pending-close state of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseMode {
    /// No close pending.
    Idle,
    /// Save was pressed: persist, then close without prompting.
    ClosingSilent,
    /// Close was requested from outside; confirmation pending.
    ClosingPrompt,
}

/// What the host should do after a save completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveDisposition {
    /// Nothing further; keep editing.
    Continue,
    /// The silent-close save landed; tear the editor down.
    Close,
}

/// Response to an external close request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseRequest {
    /// Ask the user: apply, discard, or abort.
    Prompt,
    /// A silent close is already in flight; ignore the request.
    AlreadyClosing,
}

/// Terminal action of a confirmed close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    /// Changes persisted; run the external apply step.
    Apply,
    /// Changes discarded; nothing to apply.
    Discard,
}

/// Stateful controller for one entity-editing session.
pub struct EditorSession {
    scratch: PathBuf,
    entities: Vec<Entity>,
    template: Option<BTreeMap<String, String>>,
    filter: String,
    visible: Vec<usize>,
    selected: Option<usize>,
    buffer: String,
    close_mode: CloseMode,
    status: Option<String>,
}

impl EditorSession {
    /// Open a session against an extracted scratch file.
    ///
    /// The initial load is synchronous; a load failure aborts the
    /// session before any UI exists.
    pub fn open(scratch: &Path, template: Option<BTreeMap<String, String>>) -> Result<Self> {
        let entities = store::load(scratch)?;
        let visible: Vec<usize> = (0..entities.len()).collect();
        let selected = if visible.is_empty() { None } else { Some(0) };

        let mut session = Self {
            scratch: scratch.to_path_buf(),
            entities,
            template,
            filter: String::new(),
            visible,
            selected,
            buffer: String::new(),
            close_mode: CloseMode::Idle,
            status: None,
        };
        session.render_selected();
        Ok(session)
    }

    pub fn scratch_path(&self) -> &Path {
        &self.scratch
    }

    /// Display names of the records in the filtered view, in order.
    pub fn entries(&self) -> Vec<&str> {
        self.visible
            .iter()
            .map(|&i| self.entities[i].display_name())
            .collect()
    }

    /// Selected index into the filtered view.
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn filter_text(&self) -> &str {
        &self.filter
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Replace the displayed text. The adapter calls this as the user
    /// edits; nothing is committed to the store until navigation-away or
    /// an explicit action.
    pub fn set_buffer(&mut self, text: String) {
        self.buffer = text;
    }

    pub fn close_mode(&self) -> CloseMode {
        self.close_mode
    }

    /// Last status message, cleared on read.
    pub fn take_status(&mut self) -> Option<String> {
        self.status.take()
    }

    fn absolute_selected(&self) -> Option<usize> {
        self.selected.and_then(|i| self.visible.get(i).copied())
    }

    /// Commit the displayed text back into the selected record's mapping.
    /// Edits are captured here, not auto-saved to disk.
    fn commit_buffer(&mut self) {
        if let Some(abs) = self.absolute_selected() {
            let (mapping, skipped) = codec::parse_with_skipped(&self.buffer);
            self.entities[abs].key_values = mapping;
            if skipped > 0 {
                self.status = Some(format!(
                    "ignored {} line(s) without '='",
                    skipped
                ));
            }
        }
    }

    fn render_selected(&mut self) {
        self.buffer = match self.absolute_selected() {
            Some(abs) => codec::render(&self.entities[abs].key_values),
            None => String::new(),
        };
    }

    fn refresh_view(&mut self) {
        self.visible = store::filter(&self.entities, &self.filter);
    }

    /// Select a record and point the view at a freshly appended record,
    /// clearing the filter when it would hide the newcomer.
    fn select_appended(&mut self, abs: usize) {
        self.refresh_view();
        if !self.visible.contains(&abs) {
            self.filter.clear();
            self.refresh_view();
        }
        self.selected = self.visible.iter().position(|&i| i == abs);
        self.render_selected();
    }

    fn pending_save(&self) -> PendingSave {
        PendingSave::new(
            self.scratch.clone(),
            store::snapshot(&self.entities),
            self.absolute_selected(),
        )
    }

    /// User picked a different row in the filtered view.
    ///
    /// The previously selected record absorbs the displayed text first;
    /// edits are not lost on navigation.
    pub fn select(&mut self, index: usize) {
        if index >= self.visible.len() || Some(index) == self.selected {
            return;
        }
        self.commit_buffer();
        self.selected = Some(index);
        self.render_selected();
    }

    /// Filter text changed: recompute the view, select the first match
    /// or clear selection and text when nothing matches.
    pub fn set_filter(&mut self, needle: &str) {
        self.commit_buffer();
        self.filter = needle.to_string();
        self.refresh_view();
        self.selected = if self.visible.is_empty() { None } else { Some(0) };
        self.render_selected();
    }

    /// Create a record from the default template (deep-copied) or the
    /// fallback, append it, select it, and return the save job.
    pub fn create(&mut self) -> PendingSave {
        self.commit_buffer();
        let record = match &self.template {
            Some(template) if !template.is_empty() => Entity::from_template(template),
            _ => Entity::fallback(),
        };
        self.entities.push(record);
        self.select_appended(self.entities.len() - 1);
        self.pending_save()
    }

    /// Clone the selected record into a new, independently mutable one.
    /// Returns `None` without mutating anything when nothing is selected.
    pub fn clone_selected(&mut self) -> Option<PendingSave> {
        self.absolute_selected()?;
        self.commit_buffer();
        let abs = self.absolute_selected()?;
        let record = self.entities[abs].clone();
        self.entities.push(record);
        self.select_appended(self.entities.len() - 1);
        Some(self.pending_save())
    }

    /// Delete the selected record. Selection shifts to the record that
    /// moved into its filtered position, else the new last, else none.
    pub fn delete_selected(&mut self) -> Option<PendingSave> {
        let position = self.selected?;
        let abs = self.visible.get(position).copied()?;

        self.entities.remove(abs);
        self.refresh_view();
        self.selected = if self.visible.is_empty() {
            None
        } else {
            Some(position.min(self.visible.len() - 1))
        };
        self.render_selected();
        Some(self.pending_save())
    }

    /// Explicit save: commit the displayed text, snapshot, and arm the
    /// silent close. The host dispatches the returned job; the matching
    /// completion drives the close.
    pub fn save(&mut self) -> PendingSave {
        self.commit_buffer();
        self.close_mode = CloseMode::ClosingSilent;
        self.pending_save()
    }

    /// Handle a save completion posted back from the worker.
    ///
    /// The index carried by the outcome is validated against the live
    /// store before any refresh bookkeeping: the store may have mutated
    /// while the write was in flight.
    pub fn complete_save(&mut self, outcome: SaveOutcome) -> SaveDisposition {
        if !outcome.is_ok() {
            self.status = outcome.error.map(|e| format!("save failed: {}", e));
            if self.close_mode == CloseMode::ClosingSilent {
                // Stay open; another Save retries.
                self.close_mode = CloseMode::Idle;
            }
            return SaveDisposition::Continue;
        }

        if let Some(index) = outcome.index {
            if index >= self.entities.len() {
                // Stale completion from before a delete; nothing to refresh.
                return SaveDisposition::Continue;
            }
        }

        if self.close_mode == CloseMode::ClosingSilent {
            SaveDisposition::Close
        } else {
            SaveDisposition::Continue
        }
    }

    /// External close request (the window's close control).
    pub fn request_close(&mut self) -> CloseRequest {
        match self.close_mode {
            CloseMode::ClosingSilent => CloseRequest::AlreadyClosing,
            _ => {
                self.close_mode = CloseMode::ClosingPrompt;
                CloseRequest::Prompt
            }
        }
    }

    /// Abort a prompted close; the session keeps running.
    pub fn cancel_close(&mut self) {
        if self.close_mode == CloseMode::ClosingPrompt {
            self.close_mode = CloseMode::Idle;
        }
    }

    /// Resolve a prompted close. Persist-and-apply writes the live store
    /// synchronously; discard writes nothing. Either way the in-memory
    /// state stays as-is for the host to tear down.
    pub fn confirm_close(&mut self, apply: bool) -> Result<CloseOutcome> {
        if apply {
            self.commit_buffer();
            store::save(&self.scratch, &self.entities)?;
            Ok(CloseOutcome::Apply)
        } else {
            Ok(CloseOutcome::Discard)
        }
    }

    /// Terminal cleanup after any successful close path: remove the
    /// scratch file and return to `Idle` for potential reuse.
    pub fn finish(&mut self) {
        let _ = fs::remove_file(&self.scratch);
        self.close_mode = CloseMode::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::{tempdir, TempDir};

    fn template(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn scratch_with(records: &[&[(&str, &str)]]) -> (TempDir, PathBuf) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("map.ent");
        let entities: Vec<Entity> = records
            .iter()
            .map(|pairs| Entity {
                key_values: template(pairs),
            })
            .collect();
        store::save(&path, &entities).unwrap();
        (dir, path)
    }

    fn open(records: &[&[(&str, &str)]]) -> (TempDir, EditorSession) {
        let (dir, path) = scratch_with(records);
        let session = EditorSession::open(&path, None).unwrap();
        (dir, session)
    }

    #[test]
    fn test_open_selects_first_record() {
        let (_dir, session) = open(&[
            &[("classname", "light")],
            &[("classname", "func_door")],
        ]);

        assert_eq!(session.entries(), vec!["light", "func_door"]);
        assert_eq!(session.selected(), Some(0));
        assert_eq!(session.buffer(), "classname=light");
        assert_eq!(session.close_mode(), CloseMode::Idle);
    }

    #[test]
    fn test_open_empty_store_has_no_selection() {
        let (_dir, session) = open(&[]);
        assert!(session.entries().is_empty());
        assert_eq!(session.selected(), None);
        assert_eq!(session.buffer(), "");
    }

    #[test]
    fn test_open_missing_file_fails() {
        let dir = tempdir().unwrap();
        assert!(EditorSession::open(&dir.path().join("absent.ent"), None).is_err());
    }

    #[test]
    fn test_select_renders_new_record() {
        let (_dir, mut session) = open(&[
            &[("classname", "light")],
            &[("classname", "func_door"), ("speed", "100")],
        ]);

        session.select(1);

        assert_eq!(session.selected(), Some(1));
        assert_eq!(session.buffer(), "classname=func_door\r\nspeed=100");
    }

    #[test]
    fn test_select_commits_edits_to_previous_record() {
        let (_dir, mut session) = open(&[
            &[("classname", "light")],
            &[("classname", "func_door")],
        ]);

        session.set_buffer("classname=light\r\nbrightness=300".to_string());
        session.select(1);
        session.select(0);

        assert_eq!(session.buffer(), "brightness=300\r\nclassname=light");
    }

    #[test]
    fn test_select_out_of_range_is_ignored() {
        let (_dir, mut session) = open(&[&[("classname", "light")]]);
        session.select(5);
        assert_eq!(session.selected(), Some(0));
    }

    #[test]
    fn test_filter_scenario() {
        let (_dir, mut session) = open(&[&[("classname", "a")], &[("classname", "b")]]);

        session.set_filter("b");

        assert_eq!(session.entries(), vec!["b"]);
        assert_eq!(session.selected(), Some(0));
        assert_eq!(session.buffer(), "classname=b");
    }

    #[test]
    fn test_filter_no_match_clears_selection_and_text() {
        let (_dir, mut session) = open(&[&[("classname", "a")]]);

        session.set_filter("zzz");

        assert!(session.entries().is_empty());
        assert_eq!(session.selected(), None);
        assert_eq!(session.buffer(), "");
    }

    #[test]
    fn test_filter_empty_restores_all() {
        let (_dir, mut session) = open(&[&[("classname", "a")], &[("classname", "b")]]);
        session.set_filter("b");
        session.set_filter("");
        assert_eq!(session.entries(), vec!["a", "b"]);
        assert_eq!(session.selected(), Some(0));
    }

    #[test]
    fn test_create_without_template_uses_fallback() {
        let (_dir, mut session) = open(&[]);

        session.create();

        assert_eq!(session.entries(), vec!["new_entity"]);
        assert_eq!(session.selected(), Some(0));
        assert_eq!(session.buffer(), "classname=new_entity");
    }

    #[test]
    fn test_create_deep_copies_template() {
        let (_dir, path) = scratch_with(&[]);
        let tpl = template(&[("classname", "info_null"), ("origin", "0 0 0")]);
        let mut session = EditorSession::open(&path, Some(tpl.clone())).unwrap();

        session.create();
        session.set_buffer("classname=mutated".to_string());
        session.create();

        // Template edits on the first record must not alias the template
        assert_eq!(session.entries(), vec!["mutated", "info_null"]);
        assert_eq!(session.buffer(), "classname=info_null\r\norigin=0 0 0");
    }

    #[test]
    fn test_create_under_filter_clears_filter_to_show_record() {
        let (_dir, mut session) = open(&[&[("classname", "light")]]);
        session.set_filter("light");

        session.create();

        assert_eq!(session.filter_text(), "");
        assert_eq!(session.entries(), vec!["light", "new_entity"]);
        assert_eq!(session.selected(), Some(1));
    }

    #[test]
    fn test_clone_duplicates_and_stays_independent() {
        let (_dir, mut session) = open(&[&[("classname", "light"), ("brightness", "200")]]);

        session.clone_selected().unwrap();
        assert_eq!(session.selected(), Some(1));
        assert_eq!(session.buffer(), "brightness=200\r\nclassname=light");

        // Mutating the clone must not alter the original
        session.set_buffer("classname=spotlight".to_string());
        session.select(0);
        assert_eq!(session.buffer(), "brightness=200\r\nclassname=light");
    }

    #[test]
    fn test_clone_without_selection_is_none() {
        let (_dir, mut session) = open(&[]);
        assert!(session.clone_selected().is_none());
    }

    #[test]
    fn test_delete_middle_shifts_selection_to_successor() {
        let (_dir, mut session) = open(&[
            &[("classname", "a")],
            &[("classname", "b")],
            &[("classname", "c")],
        ]);
        session.select(1);

        session.delete_selected().unwrap();

        assert_eq!(session.entries(), vec!["a", "c"]);
        assert_eq!(session.selected(), Some(1));
        assert_eq!(session.buffer(), "classname=c");
    }

    #[test]
    fn test_delete_last_selects_new_last() {
        let (_dir, mut session) = open(&[&[("classname", "a")], &[("classname", "b")]]);
        session.select(1);

        session.delete_selected().unwrap();

        assert_eq!(session.entries(), vec!["a"]);
        assert_eq!(session.selected(), Some(0));
        assert_eq!(session.buffer(), "classname=a");
    }

    #[test]
    fn test_delete_only_record_clears_selection() {
        let (_dir, mut session) = open(&[&[("classname", "a")]]);

        session.delete_selected().unwrap();

        assert!(session.entries().is_empty());
        assert_eq!(session.selected(), None);
        assert_eq!(session.buffer(), "");
    }

    #[test]
    fn test_delete_without_selection_is_none() {
        let (_dir, mut session) = open(&[]);
        assert!(session.delete_selected().is_none());
    }

    #[test]
    fn test_save_snapshot_does_not_race_later_edits() {
        let (_dir, mut session) = open(&[&[("classname", "light")]]);

        session.set_buffer("classname=edited".to_string());
        let pending = session.save();

        // Mutate the live store after the snapshot was taken
        session.create();

        let outcome = pending.run();
        assert!(outcome.is_ok());
        let written = store::load(session.scratch_path()).unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].display_name(), "edited");
    }

    #[test]
    fn test_save_arms_silent_close_and_completion_closes() {
        let (_dir, mut session) = open(&[&[("classname", "light")]]);

        let pending = session.save();
        assert_eq!(session.close_mode(), CloseMode::ClosingSilent);

        let disposition = session.complete_save(pending.run());
        assert_eq!(disposition, SaveDisposition::Close);
    }

    #[test]
    fn test_save_failure_reports_and_returns_to_idle() {
        let (_dir, mut session) = open(&[&[("classname", "light")]]);
        session.save();

        let disposition = session.complete_save(SaveOutcome {
            index: Some(0),
            error: Some("disk full".to_string()),
        });

        assert_eq!(disposition, SaveDisposition::Continue);
        assert_eq!(session.close_mode(), CloseMode::Idle);
        assert!(session.take_status().unwrap().contains("disk full"));
    }

    #[test]
    fn test_stale_completion_index_is_tolerated() {
        let (_dir, mut session) = open(&[&[("classname", "a")], &[("classname", "b")]]);
        session.select(1);
        let pending = session.delete_selected().unwrap();
        session.delete_selected().unwrap();

        // The completion references an index the store no longer has
        let disposition = session.complete_save(SaveOutcome {
            index: Some(1),
            error: None,
        });
        assert_eq!(disposition, SaveDisposition::Continue);
        drop(pending);
    }

    #[test]
    fn test_close_request_prompts_and_cancel_returns_to_idle() {
        let (_dir, mut session) = open(&[&[("classname", "light")]]);

        assert_eq!(session.request_close(), CloseRequest::Prompt);
        assert_eq!(session.close_mode(), CloseMode::ClosingPrompt);

        session.cancel_close();
        assert_eq!(session.close_mode(), CloseMode::Idle);
    }

    #[test]
    fn test_close_request_during_silent_close_is_ignored() {
        let (_dir, mut session) = open(&[&[("classname", "light")]]);
        session.save();
        assert_eq!(session.request_close(), CloseRequest::AlreadyClosing);
        assert_eq!(session.close_mode(), CloseMode::ClosingSilent);
    }

    #[test]
    fn test_confirm_close_apply_persists_displayed_text() {
        let (_dir, mut session) = open(&[&[("classname", "light")]]);
        session.request_close();
        session.set_buffer("classname=edited".to_string());

        let outcome = session.confirm_close(true).unwrap();

        assert_eq!(outcome, CloseOutcome::Apply);
        let written = store::load(session.scratch_path()).unwrap();
        assert_eq!(written[0].display_name(), "edited");
    }

    #[test]
    fn test_confirm_close_discard_writes_nothing() {
        let (_dir, mut session) = open(&[&[("classname", "light")]]);
        session.request_close();
        session.set_buffer("classname=edited".to_string());

        let outcome = session.confirm_close(false).unwrap();

        assert_eq!(outcome, CloseOutcome::Discard);
        let written = store::load(session.scratch_path()).unwrap();
        assert_eq!(written[0].display_name(), "light");
    }

    #[test]
    fn test_finish_removes_scratch_and_resets() {
        let (_dir, mut session) = open(&[&[("classname", "light")]]);
        session.save();

        session.finish();

        assert!(!session.scratch_path().exists());
        assert_eq!(session.close_mode(), CloseMode::Idle);
    }

    #[test]
    fn test_malformed_lines_surface_a_status_warning() {
        let (_dir, mut session) = open(&[&[("classname", "a")], &[("classname", "b")]]);

        session.set_buffer("classname=a\nbogus line".to_string());
        session.select(1);

        assert!(session.take_status().unwrap().contains("1 line"));
    }
}
