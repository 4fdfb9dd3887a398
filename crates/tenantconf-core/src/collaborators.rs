//! Narrow interfaces to the external collaborators
//!
//! Plugin discovery, authentication, persistence and session transport are
//! owned by other subsystems. This crate only sees them through the traits
//! below. Every call is synchronous; latency and failure modes belong to the
//! implementor, and errors are propagated unchanged.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::Result;
use crate::model::{PluginConfigSet, PluginId, Repository, RepositoryId, RoleScope, User, UserId};

/// A named bundle of parameter overrides.
pub trait Role: fmt::Debug + Send + Sync {
    /// Resolve one parameter of `plugin_id` for `scope`, falling back to `default`.
    fn filter_parameter_value(
        &self,
        plugin_id: &PluginId,
        name: &str,
        scope: &RoleScope,
        default: Option<&Value>,
    ) -> Result<Option<Value>>;

    /// Apply this role's overrides to a whole plugin configuration set.
    fn filter_plugin_configs(
        &self,
        plugin_id: &PluginId,
        configs: PluginConfigSet,
        scope: &RoleScope,
    ) -> Result<PluginConfigSet>;
}

/// A loaded plugin.
pub trait Plugin: fmt::Debug + Send + Sync {
    fn id(&self) -> &PluginId;

    fn configs(&self) -> PluginConfigSet;
}

/// Registry of loaded plugins and their manifests.
pub trait PluginRegistry: Send + Sync {
    fn find_plugin(&self, plugin_type: &str, name: &str) -> Result<Option<Arc<dyn Plugin>>>;

    /// Drop cached plugin manifests.
    fn clear_manifest_cache(&self) -> Result<()>;

    /// Drop registry caches derived from the loaded repositories.
    fn clear_registry_caches(&self) -> Result<()>;
}

/// Role and user storage.
pub trait RoleStore: Send + Sync {
    /// The user's merged role: group roles overridden by the personal role.
    fn merged_role(&self, user: &User) -> Result<Arc<dyn Role>>;

    /// A role that is already loaded in memory, without hitting storage.
    fn loaded_role(&self, role_id: &str) -> Result<Option<Arc<dyn Role>>>;

    /// Build a user object from storage.
    fn create_user_object(&self, id: &UserId) -> Result<Option<User>>;

    /// Persist a user preference entry.
    fn save_preference(&self, user: &User, preference: &str, key: &str, value: &Value)
    -> Result<()>;

    /// Drop cached users and repositories lists.
    fn invalidate_cache(&self) -> Result<()>;
}

/// Repository storage.
pub trait RepositoryStore: Send + Sync {
    fn repository_by_id(&self, id: &RepositoryId) -> Result<Option<Repository>>;

    fn is_accessible(&self, repository: &Repository, user: Option<&User>) -> Result<bool>;
}

/// Session storage; only used by session-backed contexts.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn clear(&self, key: &str) -> Result<()>;
}

/// Cache service, possibly shared between processes.
pub trait CacheService: Send + Sync {
    fn delete_all(&self, namespace: &str) -> Result<()>;
}

/// Authentication state of the current request.
pub trait AuthProvider: Send + Sync {
    fn logged_user(&self) -> Result<Option<User>>;

    /// Whether the platform runs with user accounts at all.
    fn users_enabled(&self) -> bool;
}

/// Localized message catalog.
pub trait MessageCatalog: Send + Sync {
    fn clear_messages_cache(&self) -> Result<()>;
}

/// Host bytecode/compilation cache, when the host has one.
pub trait CompilationCache: Send + Sync {
    fn reset(&self) -> Result<()>;
}

/// The set of collaborators a [`ConfService`](crate::ConfService) works with.
#[derive(Clone)]
pub struct Collaborators {
    pub plugins: Arc<dyn PluginRegistry>,
    pub roles: Arc<dyn RoleStore>,
    pub repositories: Arc<dyn RepositoryStore>,
    pub auth: Arc<dyn AuthProvider>,
    pub cache: Arc<dyn CacheService>,
    pub messages: Arc<dyn MessageCatalog>,
    pub compilation_cache: Option<Arc<dyn CompilationCache>>,
    pub session: Option<Arc<dyn SessionStore>>,
}
