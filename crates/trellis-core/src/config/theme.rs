use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Style document handed to nodes when they paint.
///
/// A theme is an arbitrary nested key/value document. The kernel never
/// validates it; it only merges user overrides over [`Theme::builtin`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Theme(Map<String, Value>);

impl Theme {
    /// The default palette
    pub fn builtin() -> Self {
        let value = json!({
            "foreground": "white",
            "background": "black",
            "primary": "cyan",
            "secondary": "magenta",
            "border": "gray",
            "focus": "yellow",
            "selection": { "fg": "black", "bg": "cyan" },
            "error": "red",
            "warning": "yellow",
            "success": "green",
        });
        match value {
            Value::Object(map) => Self(map),
            _ => Self(Map::new()),
        }
    }

    /// The built-in theme with `overrides` laid over it.
    ///
    /// Only top-level keys are merged; a nested override replaces the whole
    /// built-in value under that key.
    pub fn merged(overrides: &Map<String, Value>) -> Self {
        let mut theme = Self::builtin();
        for (key, value) in overrides {
            theme.0.insert(key.clone(), value.clone());
        }
        theme
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Convenience lookup for string-valued keys
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::builtin()
    }
}
