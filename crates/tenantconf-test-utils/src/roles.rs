//! Role and user storage fakes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tenantconf_core::{
    Error, PluginConfigSet, PluginId, Result, Role, RoleScope, RoleStore, User, UserId,
};

/// A role with fixed overrides per plugin and scope.
///
/// Repository-scoped overrides win over overrides declared for all
/// repositories.
#[derive(Debug, Clone, Default)]
pub struct StaticRole {
    overrides: HashMap<(String, RoleScope), PluginConfigSet>,
}

impl StaticRole {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style helper to declare an override.
    pub fn with_override(
        mut self,
        plugin_id: &str,
        scope: RoleScope,
        name: &str,
        value: impl Into<Value>,
    ) -> Self {
        self.overrides
            .entry((plugin_id.to_string(), scope))
            .or_default()
            .insert(name.to_string(), value.into());
        self
    }

    pub fn into_arc(self) -> Arc<dyn Role> {
        Arc::new(self)
    }

    fn layer(&self, plugin_id: &PluginId, scope: &RoleScope) -> Option<&PluginConfigSet> {
        self.overrides.get(&(plugin_id.to_string(), scope.clone()))
    }
}

impl Role for StaticRole {
    fn filter_parameter_value(
        &self,
        plugin_id: &PluginId,
        name: &str,
        scope: &RoleScope,
        default: Option<&Value>,
    ) -> Result<Option<Value>> {
        let scoped = self.layer(plugin_id, scope).and_then(|set| set.get(name));
        let global = self
            .layer(plugin_id, &RoleScope::AllRepositories)
            .and_then(|set| set.get(name));
        Ok(scoped.or(global).or(default).cloned())
    }

    fn filter_plugin_configs(
        &self,
        plugin_id: &PluginId,
        mut configs: PluginConfigSet,
        scope: &RoleScope,
    ) -> Result<PluginConfigSet> {
        if let Some(global) = self.layer(plugin_id, &RoleScope::AllRepositories) {
            configs.extend(global.clone());
        }
        if *scope != RoleScope::AllRepositories {
            if let Some(scoped) = self.layer(plugin_id, scope) {
                configs.extend(scoped.clone());
            }
        }
        Ok(configs)
    }
}

/// A preference write recorded by [`InMemoryRoleStore`].
#[derive(Debug, Clone, PartialEq)]
pub struct SavedPreference {
    pub user: UserId,
    pub preference: String,
    pub key: String,
    pub value: Value,
}

/// Role store over in-memory users and roles, counting calls.
#[derive(Debug, Default)]
pub struct InMemoryRoleStore {
    merged: Mutex<HashMap<UserId, Arc<dyn Role>>>,
    loaded: Mutex<HashMap<String, Arc<dyn Role>>>,
    stored_users: Mutex<HashMap<UserId, User>>,
    preferences: Mutex<Vec<SavedPreference>>,
    fail_preferences: AtomicBool,
    fail_lookups: AtomicBool,
    loaded_role_calls: AtomicUsize,
    create_user_calls: AtomicUsize,
    invalidations: AtomicUsize,
}

impl InMemoryRoleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the merged role of a user. Without one, the personal role is used.
    pub fn set_merged_role(&self, user: &UserId, role: Arc<dyn Role>) {
        self.merged.lock().unwrap().insert(user.clone(), role);
    }

    /// Declare a role as already loaded under `role_id`.
    pub fn add_loaded_role(&self, role_id: &str, role: Arc<dyn Role>) {
        self.loaded.lock().unwrap().insert(role_id.to_string(), role);
    }

    /// Declare a user that `create_user_object` can build.
    pub fn add_stored_user(&self, user: User) {
        self.stored_users
            .lock()
            .unwrap()
            .insert(user.id().clone(), user);
    }

    /// Make `save_preference` fail.
    pub fn fail_preferences(&self, fail: bool) {
        self.fail_preferences.store(fail, Ordering::SeqCst);
    }

    /// Make role and user lookups fail.
    pub fn fail_lookups(&self, fail: bool) {
        self.fail_lookups.store(fail, Ordering::SeqCst);
    }

    pub fn preferences(&self) -> Vec<SavedPreference> {
        self.preferences.lock().unwrap().clone()
    }

    /// Number of `loaded_role` plus `create_user_object` calls.
    pub fn lookups(&self) -> usize {
        self.loaded_role_calls.load(Ordering::SeqCst) + self.create_user_calls.load(Ordering::SeqCst)
    }

    pub fn create_user_calls(&self) -> usize {
        self.create_user_calls.load(Ordering::SeqCst)
    }

    pub fn invalidations(&self) -> usize {
        self.invalidations.load(Ordering::SeqCst)
    }

    fn check_lookups(&self) -> Result<()> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(Error::collaborator("RoleStore", "lookup failed"));
        }
        Ok(())
    }
}

impl RoleStore for InMemoryRoleStore {
    fn merged_role(&self, user: &User) -> Result<Arc<dyn Role>> {
        self.check_lookups()?;
        let merged = self.merged.lock().unwrap();
        Ok(merged
            .get(user.id())
            .cloned()
            .unwrap_or_else(|| user.personal_role().clone()))
    }

    fn loaded_role(&self, role_id: &str) -> Result<Option<Arc<dyn Role>>> {
        self.loaded_role_calls.fetch_add(1, Ordering::SeqCst);
        self.check_lookups()?;
        Ok(self.loaded.lock().unwrap().get(role_id).cloned())
    }

    fn create_user_object(&self, id: &UserId) -> Result<Option<User>> {
        self.create_user_calls.fetch_add(1, Ordering::SeqCst);
        self.check_lookups()?;
        Ok(self.stored_users.lock().unwrap().get(id).cloned())
    }

    fn save_preference(
        &self,
        user: &User,
        preference: &str,
        key: &str,
        value: &Value,
    ) -> Result<()> {
        if self.fail_preferences.load(Ordering::SeqCst) {
            return Err(Error::collaborator("RoleStore", "preference store offline"));
        }
        self.preferences.lock().unwrap().push(SavedPreference {
            user: user.id().clone(),
            preference: preference.to_string(),
            key: key.to_string(),
            value: value.clone(),
        });
        Ok(())
    }

    fn invalidate_cache(&self) -> Result<()> {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
