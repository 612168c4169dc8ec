//! Fulltext synchronization checks.
//!
//! Fulltext edits are periodic snapshots of the whole document. After one
//! is applied, the document must match the text reconstructed just before
//! it, or the first fulltext of the sequence (the user reset their code).
//! Some fulltext snapshots gain or lose a final newline that no edit
//! accounts for, so a single trailing `\n` difference is tolerated here and
//! nowhere else.

use progsnap_core::{Edit, EditKind, ProgsnapError, ProgsnapResult};

/// Whether two texts are equal up to one trailing newline on either side
#[must_use]
pub fn texts_match(actual: &str, expected: &str) -> bool {
    actual == expected
        || expected.strip_suffix('\n') == Some(actual)
        || actual.strip_suffix('\n') == Some(expected)
}

/// Tracks reconstructed text across one edit sequence
#[derive(Debug, Clone, Default)]
pub struct SyncChecker {
    first_fulltext: Option<String>,
    last_text: Option<String>,
    last_editid: Option<i64>,
    verified: usize,
}

impl SyncChecker {
    /// Create a checker for a new sequence
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `edit` before it is applied
    ///
    /// # Errors
    ///
    /// Returns error if a fulltext edit has no text
    pub fn before_apply(&mut self, edit: &Edit, kind: EditKind) -> ProgsnapResult<()> {
        if kind == EditKind::Fulltext && self.first_fulltext.is_none() {
            let text = edit.text()?;
            if !text.is_empty() {
                self.first_fulltext = Some(text.to_string());
            }
        }
        Ok(())
    }

    /// Check the document after `edit` was applied; returns whether a
    /// fulltext checkpoint was compared
    ///
    /// # Errors
    ///
    /// Returns `OutOfSync` if a fulltext edit left text matching neither
    /// the previous text nor the first fulltext
    pub fn after_apply(&mut self, edit: &Edit, kind: EditKind, text: &str) -> ProgsnapResult<bool> {
        let mut checked = false;
        if kind == EditKind::Fulltext {
            if let Some(last) = &self.last_text {
                let in_sync = texts_match(last, text)
                    || self
                        .first_fulltext
                        .as_deref()
                        .is_some_and(|first| texts_match(first, text));
                if !in_sync {
                    return Err(ProgsnapError::OutOfSync {
                        editid: edit.editid(),
                        last_editid: self.last_editid,
                    });
                }
                self.verified += 1;
                checked = true;
            }
        }
        self.last_text = (!text.is_empty()).then(|| text.to_string());
        self.last_editid = edit.editid();
        Ok(checked)
    }

    /// Number of fulltext checkpoints that matched
    #[must_use]
    pub fn verified(&self) -> usize {
        self.verified
    }
}
