//! Bootstrap configuration parsed from `boot.toml`
//!
//! The boot file seeds the instance-local override map and the defaults
//! table when a [`ConfService`](crate::ConfService) is built.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Server flags section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerSection {
    /// Requests are served over HTTPS
    #[serde(default)]
    pub https: bool,

    /// Client-side debugging
    #[serde(default)]
    pub client_debug: bool,

    /// Server-side debugging
    #[serde(default)]
    pub server_debug: bool,
}

/// Bootstrap configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BootConfig {
    #[serde(default)]
    pub server: ServerSection,

    /// Additional or replacement compiled-in defaults, without the `DEFAULT_` prefix
    #[serde(default)]
    pub defaults: HashMap<String, toml::Value>,

    /// Initial entries of the override map
    #[serde(default)]
    pub conf: HashMap<String, toml::Value>,
}

impl BootConfig {
    /// Parse a boot configuration from TOML content
    ///
    /// # Example
    ///
    /// ```
    /// use tenantconf_core::config::BootConfig;
    ///
    /// let boot = BootConfig::parse(r#"
    /// [server]
    /// https = true
    ///
    /// [conf]
    /// MAX_SESSIONS = 4
    /// "#).unwrap();
    ///
    /// assert!(boot.server.https);
    /// ```
    pub fn parse(content: &str) -> Result<Self> {
        let boot: BootConfig = toml::from_str(content)?;
        Ok(boot)
    }

    /// Load a boot configuration file.
    ///
    /// A missing file is an error; use [`BootConfig::load_default`] for the
    /// optional per-host file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }
        tracing::debug!(?path, "Loading boot config");
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Load `<config_dir>/tenantconf/boot.toml` if it exists, else defaults.
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load(&path),
            path => {
                tracing::debug!(?path, "No boot config found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Platform-appropriate location of the boot file.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("tenantconf").join("boot.toml"))
    }

    /// Override entries seeded by the server flags and the `[conf]` table.
    pub fn override_entries(&self) -> Result<Vec<(String, Value)>> {
        let mut entries = Vec::new();
        if self.server.https {
            entries.push(("USE_HTTPS".to_string(), Value::Bool(true)));
        }
        entries.push(("JS_DEBUG".to_string(), Value::Bool(self.server.client_debug)));
        entries.push((
            "SERVER_DEBUG".to_string(),
            Value::Bool(self.server.server_debug),
        ));
        for (name, value) in &self.conf {
            entries.push((name.clone(), toml_to_json_value(value)?));
        }
        Ok(entries)
    }

    /// Default entries declared by the `[defaults]` table.
    pub fn default_entries(&self) -> Result<Vec<(String, Value)>> {
        self.defaults
            .iter()
            .map(|(name, value)| Ok((name.clone(), toml_to_json_value(value)?)))
            .collect()
    }
}

/// Convert a TOML value into the JSON value model used for configuration.
pub fn toml_to_json_value(value: &toml::Value) -> Result<Value> {
    match value {
        toml::Value::Datetime(dt) => Ok(Value::String(dt.to_string())),
        other => Ok(serde_json::to_value(other)?),
    }
}
