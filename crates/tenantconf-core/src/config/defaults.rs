//! Compiled-in defaults
//!
//! Defaults are stored under their full `DEFAULT_<NAME>` key so that the
//! naming convention is visible wherever a default is declared.

use serde_json::Value;
use std::collections::HashMap;

use crate::constants::DEFAULT_PREFIX;

/// Table of compiled-in default values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Defaults {
    values: HashMap<String, Value>,
}

impl Defaults {
    /// An empty table.
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// The defaults shipped with the platform.
    pub fn builtin() -> Self {
        let mut defaults = Self::new();
        defaults.insert("VERSION", Value::from(env!("CARGO_PKG_VERSION")));
        defaults.insert("LANGUAGE", Value::from("en"));
        defaults.insert("CLIENT_DEBUG", Value::from(false));
        defaults.insert("SERVER_DEBUG", Value::from(false));
        defaults.insert("DATA_PATH", Value::from("data"));
        defaults.insert("CACHE_DIR", Value::from("data/cache"));
        defaults
    }

    /// Full key of the default for `name`.
    pub fn key_for(name: &str) -> String {
        format!("{DEFAULT_PREFIX}{name}")
    }

    /// Declare or replace the default for `name` (without the prefix).
    pub fn insert(&mut self, name: &str, value: Value) {
        self.values.insert(Self::key_for(name), value);
    }

    /// Default for `name` (without the prefix).
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(&Self::key_for(name))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
