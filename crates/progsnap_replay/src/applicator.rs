//! Applying one edit to a document.

use crate::document::TextDocument;
use progsnap_core::{Edit, EditKind, ProgsnapResult};

/// Turns edit records into document operations
#[derive(Debug, Clone, Copy, Default)]
pub struct EditApplicator;

impl EditApplicator {
    /// Create an applicator
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Apply `edit` to `document`, returning the kind that was applied
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedEditType` for unknown edit types, or the
    /// document error if the edit does not fit the current text
    pub fn apply(&self, edit: &Edit, document: &mut TextDocument) -> ProgsnapResult<EditKind> {
        let kind = edit.kind()?;
        match kind {
            EditKind::Insert => {
                let start = edit.start()?;
                document.insert(start.row, start.col, edit.text()?)?;
            }
            EditKind::Delete => {
                let start = edit.start()?;
                document.delete(start.row, start.col, edit.text()?)?;
            }
            EditKind::Fulltext => document.set_text(edit.text()?),
        }
        tracing::trace!(editid = ?edit.editid(), kind = %kind, "applied edit");
        Ok(kind)
    }
}
