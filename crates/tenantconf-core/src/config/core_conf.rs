//! Role-filtered resolution of core plugin configuration
//!
//! Reading a core setting goes through four steps, each usable on its own:
//! find the plugin, read its raw configuration set, filter the set through
//! the logged user's merged role, then expand `${NAME}` tokens in the value.
//! Anonymous contexts skip the role filter and see the plugin's own values.

use serde_json::Value;

use super::resolver::ConfigResolver;
use super::tokens::{TokenExpander, value_as_token};
use crate::Result;
use crate::collaborators::{PluginRegistry, RoleStore};
use crate::constants::CORE_PLUGIN_TYPE;
use crate::model::{PluginConfigSet, RepositoryId, RoleScope, User};

/// The (user, repository, charset) triple a resolution runs against.
#[derive(Debug, Clone, Default)]
pub struct ResolutionContext {
    pub user: Option<User>,
    pub repository_id: Option<RepositoryId>,
    pub charset: Option<String>,
}

impl ResolutionContext {
    pub fn anonymous(repository_id: Option<RepositoryId>) -> Self {
        Self {
            user: None,
            repository_id,
            charset: None,
        }
    }

    pub fn has_user(&self) -> bool {
        self.user.is_some()
    }

    /// Role scope of the active repository.
    pub fn scope(&self) -> RoleScope {
        RoleScope::for_repository(self.repository_id.as_ref())
    }

    /// Value of a context token (`USER`, `REPO_ID`, `CHARSET`).
    pub fn token(&self, name: &str) -> Option<String> {
        match name {
            "USER" => self.user.as_ref().map(|u| u.id().to_string()),
            "REPO_ID" => self.repository_id.as_ref().map(|id| id.to_string()),
            "CHARSET" => self.charset.clone(),
            _ => None,
        }
    }
}

/// Resolves settings of `core.*` plugins for a context.
pub struct CoreConfResolver<'a> {
    plugins: &'a dyn PluginRegistry,
    roles: &'a dyn RoleStore,
    config: &'a ConfigResolver,
}

impl<'a> CoreConfResolver<'a> {
    pub fn new(
        plugins: &'a dyn PluginRegistry,
        roles: &'a dyn RoleStore,
        config: &'a ConfigResolver,
    ) -> Self {
        Self {
            plugins,
            roles,
            config,
        }
    }

    /// Resolve `var_name` from plugin `core.<core_type>`.
    ///
    /// Returns `Ok(None)` when the plugin is not loaded or the key is absent
    /// or null.
    /// Collaborator failures are propagated.
    pub fn resolve(
        &self,
        ctx: &ResolutionContext,
        var_name: &str,
        core_type: &str,
    ) -> Result<Option<Value>> {
        let Some(configs) = self.filtered_configs(ctx, core_type)? else {
            return Ok(None);
        };
        let Some(raw) = configs.get(var_name).filter(|v| !v.is_null()) else {
            tracing::debug!(var_name, core_type, "Core setting not declared");
            return Ok(None);
        };

        let expander = TokenExpander::new(|name: &str| {
            ctx.token(name)
                .or_else(|| configs.get(name).and_then(value_as_token))
                .or_else(|| self.config.get_conf(name).and_then(value_as_token))
        });
        Ok(Some(expander.expand_value(raw)))
    }

    /// The configuration set of `core.<core_type>` as seen by `ctx`.
    ///
    /// `None` when the plugin is not loaded.
    pub fn filtered_configs(
        &self,
        ctx: &ResolutionContext,
        core_type: &str,
    ) -> Result<Option<PluginConfigSet>> {
        let Some(plugin) = self.plugins.find_plugin(CORE_PLUGIN_TYPE, core_type)? else {
            tracing::debug!(core_type, "Core plugin not loaded");
            return Ok(None);
        };

        let configs = plugin.configs();
        let Some(user) = &ctx.user else {
            return Ok(Some(configs));
        };

        let role = self.roles.merged_role(user)?;
        let filtered = role.filter_plugin_configs(plugin.id(), configs, &ctx.scope())?;
        Ok(Some(filtered))
    }
}
