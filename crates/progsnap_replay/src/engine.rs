//! Replay engine: rebuild a work history's text edit by edit.

use crate::applicator::EditApplicator;
use crate::document::TextDocument;
use crate::sync::SyncChecker;
use progsnap_core::{Edit, EditKind, Event, ProgsnapResult};
use progsnap_dataset::WorkHistory;
use serde::{Deserialize, Serialize};

/// Replay engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayConfig {
    /// Check deleted text against the document
    pub verify_deletes: bool,
    /// Compare fulltext checkpoints with the reconstructed text
    pub check_sync: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            verify_deletes: true,
            check_sync: true,
        }
    }
}

/// State after one edit, handed to replay callbacks
#[derive(Debug)]
pub struct ReplayStep<'a> {
    /// Position of the edit among the edits replayed so far
    pub index: usize,
    /// The edit just applied
    pub edit: &'a Edit,
    /// Its decoded type
    pub kind: EditKind,
    /// Document after the edit
    pub document: &'a TextDocument,
}

/// Result of a complete replay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayOutcome {
    /// Final text
    pub text: String,
    /// Number of edits applied
    pub edits_applied: usize,
    /// Fulltext checkpoints compared and found in sync
    pub checkpoints_verified: usize,
}

/// Replays edit sequences
#[derive(Debug, Clone, Default)]
pub struct ReplayEngine {
    config: ReplayConfig,
    applicator: EditApplicator,
}

impl ReplayEngine {
    /// Create a new replay engine
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom config
    #[must_use]
    pub fn with_config(mut self, config: ReplayConfig) -> Self {
        self.config = config;
        self
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &ReplayConfig {
        &self.config
    }

    /// Replay every edit of a work history
    ///
    /// # Errors
    ///
    /// Returns error if the history cannot be loaded or any edit fails
    pub fn replay(&self, history: &WorkHistory) -> ProgsnapResult<ReplayOutcome> {
        self.replay_with_callback(history, |_| Ok(()))
    }

    /// Replay every edit of a work history, calling `on_step` after each
    ///
    /// # Errors
    ///
    /// Returns the first error from loading, applying, sync checking, or
    /// the callback
    pub fn replay_with_callback<F>(
        &self,
        history: &WorkHistory,
        on_step: F,
    ) -> ProgsnapResult<ReplayOutcome>
    where
        F: FnMut(&ReplayStep<'_>) -> ProgsnapResult<()>,
    {
        let outcome = self.replay_events(history.events()?, on_step)?;
        tracing::debug!(
            assignment = history.assign_num(),
            student = history.student_num(),
            edits = outcome.edits_applied,
            checkpoints = outcome.checkpoints_verified,
            "replayed work history"
        );
        Ok(outcome)
    }

    /// Replay the edits among `events`; other events are skipped
    ///
    /// # Errors
    ///
    /// Returns the first error from applying, sync checking, or the
    /// callback
    pub fn replay_events<F>(&self, events: &[Event], mut on_step: F) -> ProgsnapResult<ReplayOutcome>
    where
        F: FnMut(&ReplayStep<'_>) -> ProgsnapResult<()>,
    {
        let mut document = TextDocument::new().with_verify_deletes(self.config.verify_deletes);
        let mut sync = SyncChecker::new();
        let mut applied = 0;

        for edit in events.iter().filter_map(Event::as_edit) {
            let kind = edit.kind().map_err(|e| e.at_edit(edit.editid()))?;
            if self.config.check_sync {
                sync.before_apply(edit, kind)?;
            }
            self.applicator
                .apply(edit, &mut document)
                .map_err(|e| e.at_edit(edit.editid()))?;
            on_step(&ReplayStep {
                index: applied,
                edit,
                kind,
                document: &document,
            })?;
            if self.config.check_sync {
                sync.after_apply(edit, kind, document.text())?;
            }
            applied += 1;
        }

        Ok(ReplayOutcome {
            text: document.text().to_string(),
            edits_applied: applied,
            checkpoints_verified: sync.verified(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use progsnap_core::{ProgsnapError, Submission};
    use serde_json::{Value, json};

    fn edit(value: Value) -> Event {
        Event::Edit(Edit::from_value(value).unwrap())
    }

    fn sequence() -> Vec<Event> {
        vec![
            edit(json!({"ts": 1, "editid": 1, "type": "fulltext", "text": "a\n"})),
            edit(json!({"ts": 2, "editid": 2, "type": "insert", "start": {"row": 1, "col": 0}, "text": "b"})),
            Event::Submission(Submission::from_value(json!({"ts": 3, "snapid": "s"})).unwrap()),
            edit(json!({"ts": 4, "editid": 3, "type": "fulltext", "text": "a\nb\n"})),
            edit(json!({"ts": 5, "editid": 4, "type": "delete", "start": {"row": 0, "col": 0}, "text": "a\n"})),
        ]
    }

    #[test]
    fn test_config_default() {
        let config = ReplayConfig::default();
        assert!(config.verify_deletes);
        assert!(config.check_sync);
    }

    #[test]
    fn test_replay_events() {
        let outcome = ReplayEngine::new().replay_events(&sequence(), |_| Ok(())).unwrap();
        assert_eq!(
            outcome,
            ReplayOutcome {
                text: "b\n".to_string(),
                edits_applied: 4,
                checkpoints_verified: 1,
            }
        );
    }

    #[test]
    fn test_callback_sees_each_edit() {
        let mut seen = Vec::new();
        ReplayEngine::new()
            .replay_events(&sequence(), |step| {
                seen.push((step.index, step.edit.editid(), step.kind, step.document.text().to_string()));
                Ok(())
            })
            .unwrap();
        assert_eq!(seen.len(), 4);
        assert_eq!(seen[1], (1, Some(2), EditKind::Insert, "a\nb".to_string()));
        assert_eq!(seen[3].3, "b\n");
    }

    #[test]
    fn test_callback_error_stops_replay() {
        let err = ReplayEngine::new()
            .replay_events(&sequence(), |step| {
                if step.index == 1 {
                    Err(ProgsnapError::storage("out", "disk full"))
                } else {
                    Ok(())
                }
            })
            .unwrap_err();
        assert!(matches!(err, ProgsnapError::Storage { .. }));
    }

    #[test]
    fn test_out_of_sync_detected() {
        let mut events = sequence();
        events[3] = edit(json!({"ts": 4, "editid": 3, "type": "fulltext", "text": "zzz"}));
        let err = ReplayEngine::new().replay_events(&events, |_| Ok(())).unwrap_err();
        assert_eq!(
            err,
            ProgsnapError::OutOfSync {
                editid: Some(3),
                last_editid: Some(2)
            }
        );

        let config = ReplayConfig {
            check_sync: false,
            ..ReplayConfig::default()
        };
        let outcome = ReplayEngine::new()
            .with_config(config)
            .replay_events(&events, |_| Ok(()))
            .unwrap_err();
        assert_eq!(
            outcome,
            ProgsnapError::delete_mismatch("a\n", "zz").at_edit(Some(4))
        );
    }

    #[test]
    fn test_verify_deletes_off() {
        let events = vec![
            edit(json!({"ts": 1, "type": "fulltext", "text": "abc"})),
            edit(json!({"ts": 2, "type": "delete", "start": {"row": 0, "col": 0}, "text": "xy"})),
        ];
        let strict = ReplayEngine::new().replay_events(&events, |_| Ok(()));
        let err = strict.unwrap_err();
        assert!(matches!(err, ProgsnapError::AtEdit { editid: None, .. }));
        assert!(matches!(err.root(), ProgsnapError::DeleteMismatch { .. }));

        let lenient = ReplayEngine::new()
            .with_config(ReplayConfig {
                verify_deletes: false,
                check_sync: true,
            })
            .replay_events(&events, |_| Ok(()))
            .unwrap();
        assert_eq!(lenient.text, "c");
    }

    #[test]
    fn test_apply_error_names_editid() {
        let events = vec![
            edit(json!({"ts": 1, "editid": 10, "type": "fulltext", "text": "ab"})),
            edit(json!({"ts": 2, "editid": 11, "type": "insert", "start": {"row": 4, "col": 0}, "text": "x"})),
        ];
        let err = ReplayEngine::new().replay_events(&events, |_| Ok(())).unwrap_err();
        assert!(matches!(err, ProgsnapError::AtEdit { editid: Some(11), .. }));
        assert!(err.to_string().starts_with("Edit 11: "));

        let events = vec![edit(json!({"ts": 1, "editid": 12, "type": "rename", "text": ""}))];
        let err = ReplayEngine::new().replay_events(&events, |_| Ok(())).unwrap_err();
        assert_eq!(
            err,
            ProgsnapError::UnsupportedEditType {
                kind: "rename".to_string()
            }
            .at_edit(Some(12))
        );
    }

    #[test]
    fn test_no_edits() {
        let outcome = ReplayEngine::new().replay_events(&[], |_| Ok(())).unwrap();
        assert_eq!(outcome.text, "");
        assert_eq!(outcome.edits_applied, 0);
    }
}
