//! Domain types shared by every component
//!
//! Identifiers are thin newtypes over strings so that repository ids, user
//! ids and plugin ids cannot be mixed up at call sites.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::collaborators::Role;
use crate::constants::CHARSET_OPTION;
use crate::error::Error;

/// Raw configuration of one plugin, keyed by parameter name.
pub type PluginConfigSet = HashMap<String, Value>;

/// Identifier of a repository (tenant/workspace).
///
/// The "no repository" sentinel is modelled as `Option::<RepositoryId>::None`
/// rather than a magic value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepositoryId(String);

impl RepositoryId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RepositoryId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for RepositoryId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Identifier of a user account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Plugin identifier made of a type and a name, written `type.name`.
///
/// # Example
///
/// ```
/// use tenantconf_core::PluginId;
///
/// let id: PluginId = "core.conf".parse().unwrap();
/// assert_eq!(id.plugin_type(), "core");
/// assert_eq!(id.name(), "conf");
/// assert_eq!(id.to_string(), "core.conf");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PluginId {
    plugin_type: String,
    name: String,
}

impl PluginId {
    pub fn new(plugin_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            plugin_type: plugin_type.into(),
            name: name.into(),
        }
    }

    /// The configuration plugin, owner of personal parameters by default.
    pub fn core_conf() -> Self {
        Self::new("core", "conf")
    }

    pub fn plugin_type(&self) -> &str {
        &self.plugin_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for PluginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.plugin_type, self.name)
    }
}

impl FromStr for PluginId {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.split_once('.') {
            Some((plugin_type, name)) if !plugin_type.is_empty() && !name.is_empty() => {
                Ok(Self::new(plugin_type, name))
            }
            _ => Err(Error::InvalidConfig {
                message: format!("plugin id must be written type.name, got '{s}'"),
            }),
        }
    }
}

/// Repository scope a role override applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RoleScope {
    /// Overrides valid in every repository
    AllRepositories,
    /// Overrides valid in one repository only
    Repository(RepositoryId),
}

impl RoleScope {
    /// Scope for the given active repository, falling back to all repositories.
    pub fn for_repository(id: Option<&RepositoryId>) -> Self {
        match id {
            Some(id) => Self::Repository(id.clone()),
            None => Self::AllRepositories,
        }
    }
}

/// A tenant/workspace unit with its own access type and options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub id: RepositoryId,

    /// Name of the access driver plugin serving this repository (e.g. `fs`)
    pub access_type: String,

    /// Options that are safe to expose to the context (e.g. `CHARSET`)
    #[serde(default)]
    pub safe_options: HashMap<String, String>,
}

impl Repository {
    pub fn new(id: impl Into<RepositoryId>, access_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            access_type: access_type.into(),
            safe_options: HashMap::new(),
        }
    }

    /// Builder-style helper to attach a safe option.
    pub fn with_option(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.safe_options.insert(name.into(), value.into());
        self
    }

    pub fn safe_option(&self, name: &str) -> Option<&str> {
        self.safe_options.get(name).map(String::as_str)
    }

    /// The declared charset, if any. Empty values count as undeclared.
    pub fn charset(&self) -> Option<&str> {
        self.safe_option(CHARSET_OPTION).filter(|c| !c.is_empty())
    }
}

/// A hydrated user object.
#[derive(Debug, Clone)]
pub struct User {
    id: UserId,
    personal_role: Arc<dyn Role>,
}

impl User {
    pub fn new(id: impl Into<UserId>, personal_role: Arc<dyn Role>) -> Self {
        Self {
            id: id.into(),
            personal_role,
        }
    }

    pub fn id(&self) -> &UserId {
        &self.id
    }

    /// The role attached to this user only; highest-precedence override source.
    pub fn personal_role(&self) -> &Arc<dyn Role> {
        &self.personal_role
    }
}

/// Either a loaded user object or a bare identifier.
#[derive(Debug, Clone, Copy)]
pub enum UserRef<'a> {
    Loaded(&'a User),
    Id(&'a UserId),
}

impl UserRef<'_> {
    pub fn id(&self) -> &UserId {
        match self {
            UserRef::Loaded(user) => user.id(),
            UserRef::Id(id) => id,
        }
    }
}

impl<'a> From<&'a User> for UserRef<'a> {
    fn from(user: &'a User) -> Self {
        UserRef::Loaded(user)
    }
}

impl<'a> From<&'a UserId> for UserRef<'a> {
    fn from(id: &'a UserId) -> Self {
        UserRef::Id(id)
    }
}

/// PHP-style emptiness used when deciding whether a default should win.
///
/// `null`, `""`, `"0"`, `false`, numeric zero and empty arrays or objects
/// are all empty.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty() || s == "0",
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}
