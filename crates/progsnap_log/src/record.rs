//! One line of a progsnap data file.

use progsnap_core::{ProgsnapError, ProgsnapResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A `{"tag": ..., "value": ...}` line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Kind of record
    pub tag: String,
    /// Payload, shaped according to `tag`
    pub value: Value,
}

impl Record {
    /// Parse one line; `line_no` is 1-based and only used for errors
    ///
    /// # Errors
    ///
    /// Returns `MalformedRecord` if the line is not JSON, is not an object,
    /// lacks `tag` or `value`, or has a non-string `tag`
    pub fn parse_line(line: &str, line_no: usize) -> ProgsnapResult<Self> {
        let parsed: Value = serde_json::from_str(line).map_err(|e| malformed(line_no, e))?;
        let Value::Object(mut obj) = parsed else {
            return Err(malformed(line_no, "record is not an object"));
        };
        let value = obj
            .remove("value")
            .ok_or_else(|| malformed(line_no, "missing value"))?;
        match obj.remove("tag") {
            Some(Value::String(tag)) => Ok(Self { tag, value }),
            Some(_) => Err(malformed(line_no, "tag is not a string")),
            None => Err(malformed(line_no, "missing tag")),
        }
    }
}

fn malformed(line: usize, reason: impl std::fmt::Display) -> ProgsnapError {
    ProgsnapError::MalformedRecord {
        line,
        reason: reason.to_string(),
    }
}
