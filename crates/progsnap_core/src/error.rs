//! Core error types for progsnap.

/// Core result type
pub type ProgsnapResult<T> = Result<T, ProgsnapError>;

/// Every failure the ingestion and replay layers can report.
///
/// None of these are recovered from internally: each one aborts the
/// operation that raised it and carries enough context (line number,
/// entity number, editid) to find the offending record in the source log.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProgsnapError {
    /// Container could not be read
    #[error("Storage error at {path}: {reason}")]
    Storage { path: String, reason: String },

    /// Path does not exist in the container
    #[error("Path not found: {path}")]
    NotFound { path: String },

    /// Record line is not a `{tag, value}` object
    #[error("Invalid data at line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    /// Required property absent from an entity
    #[error("No such property: {name}")]
    MissingProperty { name: String },

    /// Property present but holding the wrong kind of value
    #[error("Property {name} is not {expected}")]
    WrongType { name: String, expected: &'static str },

    /// Assignment number not in the catalog
    #[error("Unknown assignment: {number}")]
    UnknownAssignment { number: i64 },

    /// Student number not in the roster
    #[error("Unknown student: {number}")]
    UnknownStudent { number: i64 },

    /// Several edit events share a snapshot id
    #[error("There are {count} edit events for snapshot {snapid}")]
    AmbiguousLookup { snapid: String, count: usize },

    /// No work history for an explicit (student, assignment) pair
    #[error("No work history for student {student}, assignment {assignment}")]
    NoSuchWorkHistory { student: i64, assignment: i64 },

    /// Row index past the last line of a document
    #[error("No such line in TextDocument: {row}")]
    NoSuchLine { row: usize },

    /// Row/column resolves past the end of a document
    #[error("Position {row}:{col} in TextDocument is out of bounds (pos={pos}, len={len})")]
    OutOfBounds {
        row: usize,
        col: usize,
        pos: usize,
        len: usize,
    },

    /// Delete range runs past the end of a document
    #[error("Deletion beyond end of TextDocument (pos={pos}, len={len})")]
    DeletionBeyondEnd { pos: usize, len: usize },

    /// Deleted text differs from the text the edit claims to delete
    #[error("Delete mismatch: expected {expected}, saw {actual}")]
    DeleteMismatch { expected: String, actual: String },

    /// Edit type other than insert, delete, or fulltext
    #[error("Don't know how to handle edit type {kind}")]
    UnsupportedEditType { kind: String },

    /// Timestamp neither numeric nor in the logged string format
    #[error("Invalid timestamp {value}: {reason}")]
    InvalidTimestamp { value: String, reason: String },

    /// Reconstructed text disagrees with a fulltext checkpoint
    #[error("Fulltext not in sync at editid={}, last edit={}", display_id(.editid), display_id(.last_editid))]
    OutOfSync {
        editid: Option<i64>,
        last_editid: Option<i64>,
    },

    /// Reading the underlying stream failed partway through
    #[error("Read failed at line {line}: {reason}")]
    ReadFailed { line: usize, reason: String },

    /// Error raised while handling one record of a log
    #[error("Record at line {line}: {error}")]
    InRecord {
        line: usize,
        error: Box<ProgsnapError>,
    },

    /// Error raised while reading one file of a dataset
    #[error("{path}: {error}")]
    InFile {
        path: String,
        error: Box<ProgsnapError>,
    },

    /// Error raised while replaying one edit
    #[error("Edit {}: {error}", display_id(.editid))]
    AtEdit {
        editid: Option<i64>,
        error: Box<ProgsnapError>,
    },
}

fn display_id(id: &Option<i64>) -> String {
    match id {
        Some(id) => id.to_string(),
        None => "None".to_string(),
    }
}

impl ProgsnapError {
    /// Build a delete mismatch error, quoting both texts the way the log stores them
    #[must_use]
    pub fn delete_mismatch(expected: &str, actual: &str) -> Self {
        Self::DeleteMismatch {
            expected: quote(expected),
            actual: quote(actual),
        }
    }

    /// Build a storage error from any displayable cause
    #[must_use]
    pub fn storage(path: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Storage {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Attach the 1-based line of the record being handled
    #[must_use]
    pub fn in_record(self, line: usize) -> Self {
        Self::InRecord {
            line,
            error: Box::new(self),
        }
    }

    /// Attach the container path of the file being read
    #[must_use]
    pub fn in_file(self, path: impl Into<String>) -> Self {
        Self::InFile {
            path: path.into(),
            error: Box::new(self),
        }
    }

    /// Attach the editid of the edit being replayed
    #[must_use]
    pub fn at_edit(self, editid: Option<i64>) -> Self {
        Self::AtEdit {
            editid,
            error: Box::new(self),
        }
    }

    /// The innermost error, with every location wrapper stripped
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::InRecord { error, .. } | Self::InFile { error, .. } | Self::AtEdit { error, .. } => {
                error.root()
            }
            other => other,
        }
    }
}

fn quote(text: &str) -> String {
    serde_json::Value::String(text.to_string()).to_string()
}
