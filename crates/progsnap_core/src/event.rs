//! Work-history event types.
//!
//! Each event keeps its full record and normalizes `ts` to epoch
//! milliseconds on construction. Edits additionally promote `start` to a
//! [`Position`] and decode `snapids`.

use crate::entity::Position;
use crate::error::{ProgsnapError, ProgsnapResult};
use crate::props::Props;
use crate::time::EpochMillis;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier tying an edit to the submission/compilation/test results of the same code state
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SnapshotId(String);

impl SnapshotId {
    /// Create from a string
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Decode a logged snapshot id; numbers are rendered in decimal
    ///
    /// # Errors
    ///
    /// Returns `WrongType` for anything but a string or a number
    pub fn from_value(value: &Value) -> ProgsnapResult<Self> {
        match value {
            Value::String(s) => Ok(Self(s.clone())),
            Value::Number(n) => Ok(Self(n.to_string())),
            _ => Err(ProgsnapError::WrongType {
                name: "snapid".to_string(),
                expected: "a string or a number",
            }),
        }
    }

    /// Get as string
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SnapshotId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<i64> for SnapshotId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

/// What an edit does to the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditKind {
    /// Splice text in at `start`
    Insert,
    /// Remove `text` found at `start`
    Delete,
    /// Replace the whole document with `text`
    Fulltext,
}

impl EditKind {
    /// Parse the logged `type` field
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedEditType` for any other value
    pub fn parse(raw: &str) -> ProgsnapResult<Self> {
        match raw {
            "insert" => Ok(Self::Insert),
            "delete" => Ok(Self::Delete),
            "fulltext" => Ok(Self::Fulltext),
            other => Err(ProgsnapError::UnsupportedEditType {
                kind: other.to_string(),
            }),
        }
    }

    /// Name as it appears in the log
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Delete => "delete",
            Self::Fulltext => "fulltext",
        }
    }
}

impl std::fmt::Display for EditKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A logged editor change
#[derive(Debug, Clone, PartialEq)]
pub struct Edit {
    ts: EpochMillis,
    editid: Option<i64>,
    start: Option<Position>,
    snapids: Vec<SnapshotId>,
    props: Props,
}

impl Edit {
    /// Build an edit from its record value
    ///
    /// # Errors
    ///
    /// Returns error if `ts` is missing or malformed, or if `start`,
    /// `editid`, or `snapids` are present with the wrong shape
    pub fn from_value(value: Value) -> ProgsnapResult<Self> {
        let mut props = Props::from_value(value)?;
        let ts = normalize_ts(&mut props)?;
        let editid = props.get_opt_i64("editid")?;
        let start = if props.has("start") {
            Some(Position::from_props(&props.get_props("start")?)?)
        } else {
            None
        };
        let snapids = match props.get_opt("snapids") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(ids)) => ids
                .iter()
                .map(SnapshotId::from_value)
                .collect::<ProgsnapResult<Vec<_>>>()?,
            Some(_) => {
                return Err(ProgsnapError::WrongType {
                    name: "snapids".to_string(),
                    expected: "an array",
                });
            }
        };
        Ok(Self {
            ts,
            editid,
            start,
            snapids,
            props,
        })
    }

    /// Normalized timestamp
    #[must_use]
    pub fn ts(&self) -> EpochMillis {
        self.ts
    }

    /// Per-client edit sequence number, if logged
    #[must_use]
    pub fn editid(&self) -> Option<i64> {
        self.editid
    }

    /// Decoded edit type
    ///
    /// # Errors
    ///
    /// Returns `MissingProperty` if `type` is absent and
    /// `UnsupportedEditType` if it is not one of the known kinds
    pub fn kind(&self) -> ProgsnapResult<EditKind> {
        EditKind::parse(self.props.get_str("type")?)
    }

    /// Start position of an insert or delete
    ///
    /// # Errors
    ///
    /// Returns `MissingProperty` if the edit has no `start`
    pub fn start(&self) -> ProgsnapResult<Position> {
        self.start.ok_or_else(|| ProgsnapError::MissingProperty {
            name: "start".to_string(),
        })
    }

    /// Inserted, deleted, or full text
    ///
    /// # Errors
    ///
    /// Returns error if `text` is missing or not a string
    pub fn text(&self) -> ProgsnapResult<&str> {
        self.props.get_str("text")
    }

    /// Snapshot ids this edit is associated with
    #[must_use]
    pub fn snapids(&self) -> &[SnapshotId] {
        &self.snapids
    }

    /// Whether `snapid` is among this edit's snapshot ids
    #[must_use]
    pub fn has_snapid(&self, snapid: &SnapshotId) -> bool {
        self.snapids.contains(snapid)
    }

    /// All raw properties, with `ts` normalized
    #[must_use]
    pub fn props(&self) -> &Props {
        &self.props
    }
}

macro_rules! snapshot_event {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name {
            ts: EpochMillis,
            editid: Option<i64>,
            props: Props,
        }

        impl $name {
            /// Build the event from its record value
            ///
            /// # Errors
            ///
            /// Returns error if `ts` is missing or malformed
            pub fn from_value(value: Value) -> ProgsnapResult<Self> {
                let mut props = Props::from_value(value)?;
                let ts = normalize_ts(&mut props)?;
                let editid = props.get_opt_i64("editid")?;
                Ok(Self { ts, editid, props })
            }

            /// Normalized timestamp
            #[must_use]
            pub fn ts(&self) -> EpochMillis {
                self.ts
            }

            /// Edit sequence number, if logged
            #[must_use]
            pub fn editid(&self) -> Option<i64> {
                self.editid
            }

            /// Snapshot this event describes
            ///
            /// # Errors
            ///
            /// Returns error if `snapid` is missing or malformed
            pub fn snapid(&self) -> ProgsnapResult<SnapshotId> {
                SnapshotId::from_value(self.props.get("snapid")?)
            }

            /// All raw properties, with `ts` normalized
            #[must_use]
            pub fn props(&self) -> &Props {
                &self.props
            }
        }
    };
}

snapshot_event!(
    /// Code submitted for grading
    Submission
);
snapshot_event!(
    /// Result of compiling a snapshot
    Compilation
);
snapshot_event!(
    /// Outcome of running the assignment's tests on a snapshot
    TestResults
);

fn normalize_ts(props: &mut Props) -> ProgsnapResult<EpochMillis> {
    let ts = EpochMillis::from_value(props.get("ts")?)?;
    props.set("ts", Value::from(ts.as_i64()));
    Ok(ts)
}

/// Any record of a work history
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// `edit` record
    Edit(Edit),
    /// `submission` record
    Submission(Submission),
    /// `compilation` record
    Compilation(Compilation),
    /// `testresults` record
    TestResults(TestResults),
}

impl Event {
    /// Tags that produce work-history events
    pub const TAGS: [&'static str; 4] = ["edit", "submission", "compilation", "testresults"];

    /// Build the event for a work-history record; other tags yield `None`
    ///
    /// # Errors
    ///
    /// Returns error if the record value is malformed for its tag
    pub fn from_record(tag: &str, value: Value) -> ProgsnapResult<Option<Self>> {
        let event = match tag {
            "edit" => Self::Edit(Edit::from_value(value)?),
            "submission" => Self::Submission(Submission::from_value(value)?),
            "compilation" => Self::Compilation(Compilation::from_value(value)?),
            "testresults" => Self::TestResults(TestResults::from_value(value)?),
            _ => return Ok(None),
        };
        Ok(Some(event))
    }

    /// Tag the record was logged under
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Edit(_) => "edit",
            Self::Submission(_) => "submission",
            Self::Compilation(_) => "compilation",
            Self::TestResults(_) => "testresults",
        }
    }

    /// Normalized timestamp
    #[must_use]
    pub fn ts(&self) -> EpochMillis {
        match self {
            Self::Edit(e) => e.ts(),
            Self::Submission(e) => e.ts(),
            Self::Compilation(e) => e.ts(),
            Self::TestResults(e) => e.ts(),
        }
    }

    /// Edit sequence number, if the record carries one
    #[must_use]
    pub fn editid(&self) -> Option<i64> {
        match self {
            Self::Edit(e) => e.editid(),
            Self::Submission(e) => e.editid(),
            Self::Compilation(e) => e.editid(),
            Self::TestResults(e) => e.editid(),
        }
    }

    /// The edit, if this is one
    #[must_use]
    pub fn as_edit(&self) -> Option<&Edit> {
        match self {
            Self::Edit(e) => Some(e),
            _ => None,
        }
    }

    /// All raw properties
    #[must_use]
    pub fn props(&self) -> &Props {
        match self {
            Self::Edit(e) => e.props(),
            Self::Submission(e) => e.props(),
            Self::Compilation(e) => e.props(),
            Self::TestResults(e) => e.props(),
        }
    }
}
