//! Per-user personal parameters and their memoization
//!
//! A personal parameter is a plugin parameter as overridden by one user's
//! personal role, independent of the active repository. Resolved values are
//! memoized per `(plugin, parameter)` and user id for the lifetime of the
//! cache: entries are only ever added, and removed by an explicit
//! [`invalidate`](PersonalParameterCache::invalidate) of one key or a full
//! [`clear`](PersonalParameterCache::clear).

use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::Result;
use crate::collaborators::{Role, RoleStore};
use crate::constants::personal_role_id;
use crate::model::{PluginId, RoleScope, UserId, UserRef, is_empty_value};

/// Cache shared between the request contexts of one worker process.
pub type SharedParameterCache = Arc<Mutex<PersonalParameterCache>>;

/// What replaces an empty personal value when the caller supplied a default.
///
/// Resolving from a loaded user object has always returned the caller's
/// default. Resolving from a bare identifier historically returned the
/// identifier itself (and cached it); `Identifier` keeps that behaviour for
/// callers that depend on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyValueFallback {
    /// Return the caller's default in both paths
    #[default]
    CallerDefault,
    /// Return and cache the user identifier when resolving by identifier
    Identifier,
}

/// Memoized personal parameter values.
#[derive(Debug, Clone, Default)]
pub struct PersonalParameterCache {
    entries: HashMap<String, HashMap<UserId, Value>>,
}

impl PersonalParameterCache {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn shared() -> SharedParameterCache {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Cache key of a parameter: `<plugin id>-<parameter>`.
    pub fn cache_key(plugin_id: &PluginId, name: &str) -> String {
        format!("{plugin_id}-{name}")
    }

    pub fn get(&self, key: &str, user: &UserId) -> Option<&Value> {
        self.entries.get(key).and_then(|users| users.get(user))
    }

    pub fn insert(&mut self, key: &str, user: UserId, value: Value) {
        self.entries
            .entry(key.to_string())
            .or_default()
            .insert(user, value);
    }

    /// Return the cached value or compute, cache and return it.
    ///
    /// `compute` returning `Ok(None)` means there is nothing to cache; the
    /// call then returns `Ok(None)` and the cache is left untouched, so the
    /// next call computes again.
    pub fn get_or_compute<F>(
        &mut self,
        key: &str,
        user: &UserId,
        compute: F,
    ) -> Result<Option<Value>>
    where
        F: FnOnce() -> Result<Option<Value>>,
    {
        if let Some(value) = self.get(key, user) {
            tracing::debug!(key, %user, "Personal parameter cache hit");
            return Ok(Some(value.clone()));
        }
        let Some(value) = compute()? else {
            return Ok(None);
        };
        self.insert(key, user.clone(), value.clone());
        Ok(Some(value))
    }

    /// Drop every user's value for one key. Returns whether the key existed.
    pub fn invalidate(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of cached (key, user) values.
    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Resolves personal parameters through the role store and the cache.
pub struct PersonalParameters<'a> {
    roles: &'a dyn RoleStore,
    cache: &'a Mutex<PersonalParameterCache>,
    fallback: EmptyValueFallback,
}

impl<'a> PersonalParameters<'a> {
    pub fn new(
        roles: &'a dyn RoleStore,
        cache: &'a Mutex<PersonalParameterCache>,
        fallback: EmptyValueFallback,
    ) -> Self {
        Self {
            roles,
            cache,
            fallback,
        }
    }

    /// Resolve `name` of `plugin_id` for `user`.
    ///
    /// A loaded user is resolved through its personal role and the result
    /// is cached under its id. A bare identifier is served from the cache
    /// when possible; otherwise its personal role is looked up among loaded
    /// roles, then built from storage. When no role can be found the
    /// caller's default is returned and nothing is cached.
    pub fn resolve(
        &self,
        name: &str,
        user: UserRef<'_>,
        plugin_id: &PluginId,
        default: Option<&Value>,
    ) -> Result<Option<Value>> {
        let key = PersonalParameterCache::cache_key(plugin_id, name);

        let user_id = match user {
            UserRef::Loaded(user) => {
                let value = filter(user.personal_role().as_ref(), plugin_id, name, default)?;
                self.lock().insert(&key, user.id().clone(), value.clone());
                return Ok(with_default(value, default));
            }
            UserRef::Id(id) => id,
        };

        let fallback = self.fallback;
        let cached = self.lock().get(&key, user_id).cloned();
        let computed = match cached {
            Some(value) => {
                tracing::debug!(key = %key, %user_id, "Personal parameter cache hit");
                Some(value)
            }
            // Computed without holding the lock so the role store may
            // resolve other personal parameters.
            None => {
                let value = self.compute(name, user_id, plugin_id, default)?;
                if let Some(value) = &value {
                    self.lock().insert(&key, user_id.clone(), value.clone());
                }
                value
            }
        };

        match computed {
            None => Ok(default.cloned()),
            Some(value) => match fallback {
                EmptyValueFallback::CallerDefault => Ok(with_default(value, default)),
                EmptyValueFallback::Identifier => Ok(non_null(value)),
            },
        }
    }

    fn compute(
        &self,
        name: &str,
        user_id: &UserId,
        plugin_id: &PluginId,
        default: Option<&Value>,
    ) -> Result<Option<Value>> {
        let Some(role) = self.personal_role(user_id)? else {
            tracing::debug!(%user_id, "No personal role found");
            return Ok(None);
        };
        let value = filter(role.as_ref(), plugin_id, name, default)?;
        if self.fallback == EmptyValueFallback::Identifier
            && is_empty_value(&value)
            && default.is_some_and(|d| !is_empty_value(d))
        {
            return Ok(Some(Value::String(user_id.to_string())));
        }
        Ok(Some(value))
    }

    fn personal_role(&self, user_id: &UserId) -> Result<Option<Arc<dyn Role>>> {
        if let Some(role) = self.roles.loaded_role(&personal_role_id(user_id.as_str()))? {
            return Ok(Some(role));
        }
        let user = self.roles.create_user_object(user_id)?;
        Ok(user.map(|u| u.personal_role().clone()))
    }

    fn lock(&self) -> MutexGuard<'_, PersonalParameterCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn filter(
    role: &dyn Role,
    plugin_id: &PluginId,
    name: &str,
    default: Option<&Value>,
) -> Result<Value> {
    let value = role.filter_parameter_value(plugin_id, name, &RoleScope::AllRepositories, default)?;
    Ok(value.unwrap_or(Value::Null))
}

fn with_default(value: Value, default: Option<&Value>) -> Option<Value> {
    match default {
        Some(default) if is_empty_value(&value) && !is_empty_value(default) => Some(default.clone()),
        _ => non_null(value),
    }
}

fn non_null(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        value => Some(value),
    }
}
