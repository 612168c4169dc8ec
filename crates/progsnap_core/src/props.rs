//! Property bag backing every progsnap entity.
//!
//! Records arrive as loosely-typed JSON objects. `Props` keeps the whole
//! object (unknown keys pass through untouched) and offers typed accessors
//! that fail with [`ProgsnapError::MissingProperty`] or
//! [`ProgsnapError::WrongType`] rather than returning a default.

use crate::error::{ProgsnapError, ProgsnapResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Mapping from field name to decoded JSON value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Props(Map<String, Value>);

impl Props {
    /// Create an empty property bag
    #[must_use]
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Wrap a decoded record value, which must be a JSON object
    ///
    /// # Errors
    ///
    /// Returns `WrongType` if the value is not an object
    pub fn from_value(value: Value) -> ProgsnapResult<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            _ => Err(ProgsnapError::WrongType {
                name: "value".to_string(),
                expected: "an object",
            }),
        }
    }

    /// Check whether a property is present
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Get a required property
    ///
    /// # Errors
    ///
    /// Returns `MissingProperty` if absent
    pub fn get(&self, name: &str) -> ProgsnapResult<&Value> {
        self.0.get(name).ok_or_else(|| ProgsnapError::MissingProperty {
            name: name.to_string(),
        })
    }

    /// Get an optional property
    #[must_use]
    pub fn get_opt(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Get a required integer property
    ///
    /// # Errors
    ///
    /// Returns error if absent or not an integer
    pub fn get_i64(&self, name: &str) -> ProgsnapResult<i64> {
        self.get(name)?.as_i64().ok_or_else(|| wrong_type(name, "an integer"))
    }

    /// Get an optional integer property
    ///
    /// # Errors
    ///
    /// Returns error if present but not an integer
    pub fn get_opt_i64(&self, name: &str) -> ProgsnapResult<Option<i64>> {
        match self.0.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(v) => v.as_i64().map(Some).ok_or_else(|| wrong_type(name, "an integer")),
        }
    }

    /// Get a required string property
    ///
    /// # Errors
    ///
    /// Returns error if absent or not a string
    pub fn get_str(&self, name: &str) -> ProgsnapResult<&str> {
        self.get(name)?.as_str().ok_or_else(|| wrong_type(name, "a string"))
    }

    /// Get a required boolean property
    ///
    /// # Errors
    ///
    /// Returns error if absent or not a boolean
    pub fn get_bool(&self, name: &str) -> ProgsnapResult<bool> {
        self.get(name)?.as_bool().ok_or_else(|| wrong_type(name, "a boolean"))
    }

    /// Get a boolean property, storing `default` if it is absent
    ///
    /// # Errors
    ///
    /// Returns error if present but not a boolean
    pub fn bool_or_insert(&mut self, name: &str, default: bool) -> ProgsnapResult<bool> {
        self.0
            .entry(name.to_string())
            .or_insert(Value::Bool(default))
            .as_bool()
            .ok_or_else(|| wrong_type(name, "a boolean"))
    }

    /// Get a required sub-object as its own property bag
    ///
    /// # Errors
    ///
    /// Returns error if absent or not an object
    pub fn get_props(&self, name: &str) -> ProgsnapResult<Props> {
        match self.get(name)? {
            Value::Object(map) => Ok(Props(map.clone())),
            _ => Err(wrong_type(name, "an object")),
        }
    }

    /// Set a property, replacing any previous value
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.0.insert(name.into(), value);
    }

    /// Number of properties
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the bag is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the underlying map
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for Props {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

fn wrong_type(name: &str, expected: &'static str) -> ProgsnapError {
    ProgsnapError::WrongType {
        name: name.to_string(),
        expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props(value: Value) -> Props {
        Props::from_value(value).unwrap()
    }

    #[test]
    fn test_from_value_rejects_non_object() {
        assert!(Props::from_value(json!([1, 2])).is_err());
        assert!(Props::from_value(json!("text")).is_err());
    }

    #[test]
    fn test_missing_property() {
        let p = props(json!({"number": 3}));
        assert_eq!(
            p.get("name"),
            Err(ProgsnapError::MissingProperty {
                name: "name".to_string()
            })
        );
    }

    #[test]
    fn test_typed_access() {
        let p = props(json!({"number": 3, "name": "lab", "instructor": true}));
        assert_eq!(p.get_i64("number").unwrap(), 3);
        assert_eq!(p.get_str("name").unwrap(), "lab");
        assert!(p.get_bool("instructor").unwrap());
    }

    #[test]
    fn test_wrong_type_is_not_silent() {
        let p = props(json!({"number": "three"}));
        assert!(matches!(
            p.get_i64("number"),
            Err(ProgsnapError::WrongType { .. })
        ));
    }

    #[test]
    fn test_bool_or_insert_persists_default() {
        let mut p = props(json!({}));
        assert!(!p.bool_or_insert("opaque", false).unwrap());
        assert!(p.has("opaque"));
        assert!(!p.get_bool("opaque").unwrap());

        let mut p = props(json!({"opaque": true}));
        assert!(p.bool_or_insert("opaque", false).unwrap());
    }

    #[test]
    fn test_get_opt_i64() {
        let p = props(json!({"editid": 4, "other": null}));
        assert_eq!(p.get_opt_i64("editid").unwrap(), Some(4));
        assert_eq!(p.get_opt_i64("other").unwrap(), None);
        assert_eq!(p.get_opt_i64("absent").unwrap(), None);
    }

    #[test]
    fn test_get_props_promotes_object() {
        let p = props(json!({"start": {"row": 1, "col": 2}}));
        let start = p.get_props("start").unwrap();
        assert_eq!(start.get_i64("row").unwrap(), 1);
    }

    #[test]
    fn test_unknown_keys_pass_through() {
        let p = props(json!({"number": 1, "extra": [1, 2, 3]}));
        assert_eq!(p.len(), 2);
        assert_eq!(p.get("extra").unwrap(), &json!([1, 2, 3]));
    }
}
