//! Mutable text buffer addressed by row and column.
//!
//! Rows are separated by `\n`. Columns, offsets, and lengths count
//! characters (Unicode scalar values), not bytes.

use progsnap_core::{ProgsnapError, ProgsnapResult};

/// Resolved location in the buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Offset {
    chars: usize,
    byte: usize,
}

/// The current text of one source file during replay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextDocument {
    text: String,
    verify_deletes: bool,
}

impl TextDocument {
    /// Create an empty document that verifies deletes
    #[must_use]
    pub fn new() -> Self {
        Self {
            text: String::new(),
            verify_deletes: true,
        }
    }

    /// Turn delete verification on or off
    #[must_use]
    pub fn with_verify_deletes(mut self, verify: bool) -> Self {
        self.verify_deletes = verify;
        self
    }

    /// Whether deletes are checked against the deleted text
    #[must_use]
    pub fn verify_deletes(&self) -> bool {
        self.verify_deletes
    }

    /// Current text
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the whole text
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Length in characters
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Number of lines; a final line without `\n` counts, an empty buffer
    /// has none
    #[must_use]
    pub fn line_count(&self) -> usize {
        let newlines = self.text.matches('\n').count();
        if self.text.is_empty() || self.text.ends_with('\n') {
            newlines
        } else {
            newlines + 1
        }
    }

    /// Line `index`, including its `\n` if it has one
    ///
    /// # Errors
    ///
    /// Returns `NoSuchLine` if the document has fewer lines
    pub fn line(&self, index: usize) -> ProgsnapResult<&str> {
        self.text
            .split_inclusive('\n')
            .nth(index)
            .ok_or(ProgsnapError::NoSuchLine { row: index })
    }

    /// Character offset of `row`/`col`
    ///
    /// `col` is added to the start of `row` without checking the line's
    /// length, so it may run into following lines.
    ///
    /// # Errors
    ///
    /// Returns `NoSuchLine` if there are fewer than `row` newlines and
    /// `OutOfBounds` if the offset lies past the end of the text
    pub fn position_of(&self, row: usize, col: usize) -> ProgsnapResult<usize> {
        self.locate(row, col).map(|offset| offset.chars)
    }

    fn locate(&self, row: usize, col: usize) -> ProgsnapResult<Offset> {
        let mut byte = 0;
        let mut chars = 0;
        for _ in 0..row {
            let rest = &self.text[byte..];
            let newline = rest.find('\n').ok_or(ProgsnapError::NoSuchLine { row })?;
            chars += rest[..newline].chars().count() + 1;
            byte += newline + 1;
        }
        match self.advance(byte, col) {
            Some(end) => Ok(Offset {
                chars: chars + col,
                byte: end,
            }),
            None => Err(ProgsnapError::OutOfBounds {
                row,
                col,
                pos: chars + col,
                len: self.char_len(),
            }),
        }
    }

    /// Byte index `count` characters after `byte`, if still inside the text
    fn advance(&self, byte: usize, count: usize) -> Option<usize> {
        let rest = &self.text[byte..];
        rest.char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(rest.len()))
            .nth(count)
            .map(|i| byte + i)
    }

    /// Insert `text` at `row`/`col`
    ///
    /// # Errors
    ///
    /// Returns error if the position does not exist
    pub fn insert(&mut self, row: usize, col: usize, text: &str) -> ProgsnapResult<()> {
        let at = self.locate(row, col)?;
        self.text.insert_str(at.byte, text);
        Ok(())
    }

    /// Delete `text` starting at `row`/`col`
    ///
    /// A delete running exactly one character past the end is accepted
    /// when `text` ends in `\n`; the missing newline is dropped.
    ///
    /// # Errors
    ///
    /// Returns error if the position does not exist, `DeletionBeyondEnd` if
    /// the range runs past the end, or `DeleteMismatch` when verification
    /// is on and the buffer holds different text
    pub fn delete(&mut self, row: usize, col: usize, text: &str) -> ProgsnapResult<()> {
        let start = self.locate(row, col)?;
        let len = self.char_len();
        let mut expected = text;
        let mut end_chars = start.chars + text.chars().count();
        if end_chars > len {
            match text.strip_suffix('\n') {
                Some(trimmed) if end_chars == len + 1 => {
                    tracing::debug!(row, col, "dropping trailing newline past end of document");
                    expected = trimmed;
                    end_chars = len;
                }
                _ => {
                    return Err(ProgsnapError::DeletionBeyondEnd {
                        pos: end_chars,
                        len,
                    });
                }
            }
        }

        let end = self
            .advance(start.byte, end_chars - start.chars)
            .unwrap_or(self.text.len());
        let actual = &self.text[start.byte..end];
        if self.verify_deletes && actual != expected {
            return Err(ProgsnapError::delete_mismatch(expected, actual));
        }
        self.text.replace_range(start.byte..end, "");
        Ok(())
    }
}

impl Default for TextDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TextDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}
