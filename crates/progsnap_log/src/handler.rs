//! Tag handler registry.
//!
//! Maps tag names to callbacks. Several tags may share one callback, and
//! tags without a callback go to the `unknown` handler, which ignores the
//! record unless overridden.

use progsnap_core::ProgsnapResult;
use serde_json::Value;
use std::collections::HashMap;

/// Tag name whose handler receives every unregistered tag
pub const UNKNOWN_TAG: &str = "unknown";

/// Callback invoked with `(tag, value)` for each dispatched record
pub type TagCallback<'a> = Box<dyn FnMut(&str, Value) -> ProgsnapResult<()> + 'a>;

/// Registry of tag callbacks
pub struct TagHandler<'a> {
    callbacks: Vec<TagCallback<'a>>,
    routes: HashMap<String, usize>,
}

impl<'a> TagHandler<'a> {
    /// Create a handler that ignores every tag
    #[must_use]
    pub fn new() -> Self {
        let mut handler = Self {
            callbacks: Vec::new(),
            routes: HashMap::new(),
        };
        handler.register(UNKNOWN_TAG, |_, _| Ok(()));
        handler
    }

    /// Register a callback for one tag, replacing any earlier one
    pub fn register<F>(&mut self, tag: &str, callback: F) -> &mut Self
    where
        F: FnMut(&str, Value) -> ProgsnapResult<()> + 'a,
    {
        self.register_many(&[tag], callback)
    }

    /// Register one callback for several tags
    pub fn register_many<F>(&mut self, tags: &[&str], callback: F) -> &mut Self
    where
        F: FnMut(&str, Value) -> ProgsnapResult<()> + 'a,
    {
        let index = self.callbacks.len();
        self.callbacks.push(Box::new(callback));
        for tag in tags {
            self.routes.insert((*tag).to_string(), index);
        }
        self
    }

    /// Whether a tag has its own callback
    #[must_use]
    pub fn handles(&self, tag: &str) -> bool {
        tag != UNKNOWN_TAG && self.routes.contains_key(tag)
    }

    /// Route one record to its callback, falling back to `unknown`
    ///
    /// # Errors
    ///
    /// Returns whatever the callback returns
    pub fn dispatch(&mut self, tag: &str, value: Value) -> ProgsnapResult<()> {
        let index = self
            .routes
            .get(tag)
            .or_else(|| self.routes.get(UNKNOWN_TAG))
            .copied()
            .unwrap_or_default();
        match self.callbacks.get_mut(index) {
            Some(callback) => callback(tag, value),
            None => Ok(()),
        }
    }
}

impl Default for TagHandler<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TagHandler<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut tags: Vec<&str> = self.routes.keys().map(String::as_str).collect();
        tags.sort_unstable();
        f.debug_struct("TagHandler").field("tags", &tags).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use progsnap_core::ProgsnapError;
    use serde_json::json;

    #[test]
    fn test_unknown_ignored_by_default() {
        let mut handler = TagHandler::new();
        assert!(handler.dispatch("mystery", json!(1)).is_ok());
        assert!(!handler.handles("mystery"));
    }

    #[test]
    fn test_register_and_dispatch() {
        let mut seen = Vec::new();
        {
            let mut handler = TagHandler::new();
            handler.register("name", |tag, value| {
                seen.push((tag.to_string(), value));
                Ok(())
            });
            handler.dispatch("name", json!("x")).unwrap();
            handler.dispatch("other", json!("y")).unwrap();
        }
        assert_eq!(seen, vec![("name".to_string(), json!("x"))]);
    }

    #[test]
    fn test_register_many_shares_callback() {
        let mut count = 0;
        {
            let mut handler = TagHandler::new();
            handler.register_many(&["name", "url", "due"], |_, _| {
                count += 1;
                Ok(())
            });
            assert!(handler.handles("url"));
            for tag in ["name", "url", "due", "test"] {
                handler.dispatch(tag, Value::Null).unwrap();
            }
        }
        assert_eq!(count, 3);
    }

    #[test]
    fn test_unknown_override() {
        let mut unknown = Vec::new();
        {
            let mut handler = TagHandler::new();
            handler.register(UNKNOWN_TAG, |tag, _| {
                unknown.push(tag.to_string());
                Ok(())
            });
            handler.dispatch("mystery", Value::Null).unwrap();
        }
        assert_eq!(unknown, vec!["mystery".to_string()]);
    }

    #[test]
    fn test_callback_error_propagates() {
        let mut handler = TagHandler::new();
        handler.register("bad", |_, _| {
            Err(ProgsnapError::MissingProperty {
                name: "number".to_string(),
            })
        });
        assert!(handler.dispatch("bad", Value::Null).is_err());
    }
}
