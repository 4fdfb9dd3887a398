//! Named configuration variables with compiled-in defaults
//!
//! The `ConfigResolver` answers `get_conf(name)` from two layers, later
//! layers winning:
//!
//! 1. **Compiled-in defaults** - `DEFAULT_<NAME>` entries of [`Defaults`]
//! 2. **Override map** - values set on this instance through `set_conf`
//!
//! Nothing is persisted; the override map lives as long as the resolver.

use serde_json::Value;
use std::collections::HashMap;

use super::boot::BootConfig;
use super::defaults::Defaults;
use crate::Result;

/// Resolves named variables from an instance-local override map.
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    overrides: HashMap<String, Value>,
    defaults: Defaults,
}

impl ConfigResolver {
    /// Create a resolver over the built-in defaults with no overrides.
    pub fn new() -> Self {
        Self::with_defaults(Defaults::builtin())
    }

    /// Create a resolver over a custom defaults table.
    pub fn with_defaults(defaults: Defaults) -> Self {
        Self {
            overrides: HashMap::new(),
            defaults,
        }
    }

    /// Apply a boot configuration.
    ///
    /// `[defaults]` entries extend or replace the defaults table; the server
    /// flags and `[conf]` entries are written to the override map.
    pub fn init(&mut self, boot: &BootConfig) -> Result<()> {
        for (name, value) in boot.default_entries()? {
            tracing::debug!(%name, "Boot config declares default");
            self.defaults.insert(&name, value);
        }
        for (name, value) in boot.override_entries()? {
            tracing::debug!(%name, "Boot config sets override");
            self.overrides.insert(name, value);
        }
        Ok(())
    }

    /// Look up `name` in the override map, then in the defaults.
    ///
    /// Returns `None` when neither layer knows the name.
    pub fn get_conf(&self, name: &str) -> Option<&Value> {
        if let Some(value) = self.overrides.get(name) {
            return Some(value);
        }
        self.defaults.get(name)
    }

    /// Write `value` to the override map.
    pub fn set_conf(&mut self, name: impl Into<String>, value: Value) {
        self.overrides.insert(name.into(), value);
    }

    /// Check whether `name` has an explicit override.
    pub fn has_override(&self, name: &str) -> bool {
        self.overrides.contains_key(name)
    }

    pub fn defaults(&self) -> &Defaults {
        &self.defaults
    }
}
