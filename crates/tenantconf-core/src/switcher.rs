//! Switching the active repository
//!
//! A switch resolves the target repository, checks access when the switch
//! is temporary, then updates the context: active repository id, current
//! repository, charset, and the cached access driver. Trusted internal
//! callers use non-temporary switches, which skip the access check.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::collaborators::{Collaborators, Plugin, PluginRegistry};
use crate::constants::{ACCESS_PLUGIN_TYPE, HISTORY_PREFERENCE, LAST_REPOSITORY_KEY};
use crate::context::ContextState;
use crate::error::{Error, Result};
use crate::model::{Repository, RepositoryId, User};

/// Current repository, registered overrides and the cached access driver.
#[derive(Debug, Default)]
pub struct RepositorySwitcher {
    overrides: HashMap<RepositoryId, Repository>,
    current: Option<Repository>,
    access_driver: Option<Arc<dyn Plugin>>,
}

impl RepositorySwitcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an ad-hoc repository, preferred over the store on switch.
    pub fn register(&mut self, repository: Repository) {
        self.overrides.insert(repository.id.clone(), repository);
    }

    /// Repository selected by the last switch.
    pub fn current(&self) -> Option<&Repository> {
        self.current.as_ref()
    }

    /// Switch the active repository to `target` (`None` for no repository).
    ///
    /// A temporary switch fails with [`Error::Unauthorized`] when the
    /// repository does not exist or the logged user cannot access it; the
    /// context is left untouched in that case. A failing context write is
    /// propagated and also leaves the active id, charset and current
    /// repository as they were.
    pub fn switch(
        &mut self,
        collaborators: &Collaborators,
        state: &mut dyn ContextState,
        target: Option<&RepositoryId>,
        temporary: bool,
    ) -> Result<Option<Repository>> {
        let user = collaborators.auth.logged_user()?;

        let stored = match target {
            Some(id) => collaborators.repositories.repository_by_id(id)?,
            None => None,
        };

        if temporary {
            let authorized = match &stored {
                Some(repository) => collaborators
                    .repositories
                    .is_accessible(repository, user.as_ref())?,
                None => false,
            };
            if !authorized {
                tracing::warn!(repository = ?target, "Refusing temporary switch");
                return Err(Error::Unauthorized {
                    repository: target.cloned(),
                });
            }
        }

        let resolved = target
            .and_then(|id| self.overrides.get(id).cloned())
            .or(stored);

        let charset = resolved.as_ref().and_then(Repository::charset);
        apply_context(state, target, charset)?;
        self.current = resolved.clone();
        self.access_driver = None;

        if let (Some(id), Some(user)) = (target, user.as_ref()) {
            if collaborators.auth.users_enabled() {
                remember_last_repository(collaborators, user, id);
            }
        }

        tracing::info!(repository = ?target, temporary, "Switched repository");
        Ok(resolved)
    }

    /// Access driver of the current repository, resolved lazily.
    ///
    /// The driver is the `access.<access type>` plugin; it is cached until
    /// the next switch. `None` without a current repository or when no
    /// such plugin is loaded.
    pub fn access_driver(
        &mut self,
        plugins: &dyn PluginRegistry,
    ) -> Result<Option<Arc<dyn Plugin>>> {
        if let Some(driver) = &self.access_driver {
            return Ok(Some(driver.clone()));
        }
        let Some(repository) = &self.current else {
            return Ok(None);
        };
        let driver = plugins.find_plugin(ACCESS_PLUGIN_TYPE, &repository.access_type)?;
        if driver.is_none() {
            tracing::debug!(access_type = %repository.access_type, "No access driver loaded");
        }
        self.access_driver = driver.clone();
        Ok(driver)
    }
}

/// Write the active id and charset, or neither.
///
/// When a write fails the previous id and charset are written back before
/// the error is returned.
fn apply_context(
    state: &mut dyn ContextState,
    target: Option<&RepositoryId>,
    charset: Option<&str>,
) -> Result<()> {
    let previous_id = state.active_repository_id()?;
    let previous_charset = state.charset()?;

    let written = write_context(state, target, charset);
    if written.is_err() {
        let restored = write_context(state, previous_id.as_ref(), previous_charset.as_deref());
        if let Err(error) = restored {
            tracing::warn!(%error, "Could not restore context after a failed switch");
        }
    }
    written
}

fn write_context(
    state: &mut dyn ContextState,
    id: Option<&RepositoryId>,
    charset: Option<&str>,
) -> Result<()> {
    state.set_active_repository_id(id)?;
    match charset {
        Some(charset) => state.set_charset(charset),
        None => state.clear_charset(),
    }
}

/// Best-effort write of the "last used repository" preference.
fn remember_last_repository(collaborators: &Collaborators, user: &User, id: &RepositoryId) {
    let value = Value::String(id.to_string());
    let saved = collaborators.roles.save_preference(
        user,
        HISTORY_PREFERENCE,
        LAST_REPOSITORY_KEY,
        &value,
    );
    if let Err(error) = saved {
        tracing::warn!(user = %user.id(), %error, "Could not record last repository");
    }
}
