//! Request-scoped configuration service
//!
//! A `ConfService` is built at the start of a request (or when a worker
//! starts), used from that single execution context, and dropped at the end.
//! It owns the active context and the override map; the personal parameter
//! cache may be shared with later contexts of the same process.

use serde_json::Value;
use std::sync::Arc;

use crate::Result;
use crate::collaborators::{Collaborators, Plugin};
use crate::config::{BootConfig, ConfigResolver, CoreConfResolver, Defaults, ResolutionContext};
use crate::constants::DEFAULT_CORE_TYPE;
use crate::context::{ContextMode, ContextState};
use crate::invalidate::CacheInvalidator;
use crate::model::{PluginId, Repository, RepositoryId, UserRef, is_empty_value};
use crate::personal::{
    EmptyValueFallback, PersonalParameterCache, PersonalParameters, SharedParameterCache,
};
use crate::switcher::RepositorySwitcher;

/// Builder for [`ConfService`].
///
/// # Example
///
/// ```ignore
/// use tenantconf_core::{ConfService, ContextMode};
///
/// let mut conf = ConfService::builder(collaborators)
///     .mode(ContextMode::detect(Some("/api/v2")))
///     .boot_config(BootConfig::load_default()?)
///     .build()?;
///
/// conf.switch_repository(Some(&"1".into()), true)?;
/// let limit = conf.get_core_conf("MAX_UPLOAD")?;
/// ```
pub struct ConfServiceBuilder {
    collaborators: Collaborators,
    mode: ContextMode,
    defaults: Option<Defaults>,
    boot: Option<BootConfig>,
    parameters: Option<SharedParameterCache>,
    fallback: EmptyValueFallback,
}

impl ConfServiceBuilder {
    /// Storage mode of the active context; session-backed by default.
    pub fn mode(mut self, mode: ContextMode) -> Self {
        self.mode = mode;
        self
    }

    /// Replace the built-in defaults table.
    pub fn defaults(mut self, defaults: Defaults) -> Self {
        self.defaults = Some(defaults);
        self
    }

    pub fn boot_config(mut self, boot: BootConfig) -> Self {
        self.boot = Some(boot);
        self
    }

    /// Reuse a personal parameter cache from an earlier context.
    pub fn parameter_cache(mut self, cache: SharedParameterCache) -> Self {
        self.parameters = Some(cache);
        self
    }

    pub fn empty_value_fallback(mut self, fallback: EmptyValueFallback) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn build(self) -> Result<ConfService> {
        let state = self.mode.into_state(self.collaborators.session.clone())?;

        let defaults = self.defaults.unwrap_or_else(Defaults::builtin);
        let mut config = ConfigResolver::with_defaults(defaults);
        if let Some(boot) = &self.boot {
            config.init(boot)?;
        }

        tracing::debug!(mode = ?self.mode, "Configuration context started");
        Ok(ConfService {
            collaborators: self.collaborators,
            state,
            config,
            switcher: RepositorySwitcher::new(),
            parameters: self.parameters.unwrap_or_else(PersonalParameterCache::shared),
            fallback: self.fallback,
        })
    }
}

/// Effective configuration and active context of one request.
pub struct ConfService {
    collaborators: Collaborators,
    state: Box<dyn ContextState>,
    config: ConfigResolver,
    switcher: RepositorySwitcher,
    parameters: SharedParameterCache,
    fallback: EmptyValueFallback,
}

impl ConfService {
    pub fn builder(collaborators: Collaborators) -> ConfServiceBuilder {
        ConfServiceBuilder {
            collaborators,
            mode: ContextMode::default(),
            defaults: None,
            boot: None,
            parameters: None,
            fallback: EmptyValueFallback::default(),
        }
    }

    pub fn mode(&self) -> ContextMode {
        self.state.mode()
    }

    pub fn collaborators(&self) -> &Collaborators {
        &self.collaborators
    }

    // Context state

    pub fn charset(&self) -> Result<Option<String>> {
        self.state.charset()
    }

    pub fn set_charset(&mut self, charset: &str) -> Result<()> {
        self.state.set_charset(charset)
    }

    pub fn clear_charset(&mut self) -> Result<()> {
        self.state.clear_charset()
    }

    pub fn active_repository_id(&self) -> Result<Option<RepositoryId>> {
        self.state.active_repository_id()
    }

    // Named variables

    /// Override map first, then the `DEFAULT_<name>` default.
    pub fn get_conf(&self, name: &str) -> Option<Value> {
        self.config.get_conf(name).cloned()
    }

    pub fn set_conf(&mut self, name: impl Into<String>, value: Value) {
        self.config.set_conf(name, value);
    }

    // Core plugin settings

    /// The current (user, repository, charset) triple.
    pub fn resolution_context(&self) -> Result<ResolutionContext> {
        Ok(ResolutionContext {
            user: self.collaborators.auth.logged_user()?,
            repository_id: self.state.active_repository_id()?,
            charset: self.state.charset()?,
        })
    }

    /// Setting of the main core plugin (`core.ajaxplorer`).
    pub fn get_core_conf(&self, var_name: &str) -> Result<Option<Value>> {
        self.get_core_conf_for(var_name, DEFAULT_CORE_TYPE)
    }

    /// Setting of plugin `core.<core_type>`, filtered for the current context.
    pub fn get_core_conf_for(&self, var_name: &str, core_type: &str) -> Result<Option<Value>> {
        let ctx = self.resolution_context()?;
        CoreConfResolver::new(
            self.collaborators.plugins.as_ref(),
            self.collaborators.roles.as_ref(),
            &self.config,
        )
        .resolve(&ctx, var_name, core_type)
    }

    /// Whether background command-line actions are enabled.
    pub fn command_line_enabled(&self) -> Result<bool> {
        Ok(self
            .get_core_conf("CMDLINE_ACTIVE")?
            .is_some_and(|v| !is_empty_value(&v)))
    }

    // Personal parameters

    /// Personal value of `name` of `plugin_id` for a user or user id.
    pub fn get_user_personal_parameter<'u>(
        &self,
        name: &str,
        user: impl Into<UserRef<'u>>,
        plugin_id: &PluginId,
        default: Option<&Value>,
    ) -> Result<Option<Value>> {
        PersonalParameters::new(
            self.collaborators.roles.as_ref(),
            &self.parameters,
            self.fallback,
        )
        .resolve(name, user.into(), plugin_id, default)
    }

    /// Handle on the personal parameter cache, to reuse in a later context.
    pub fn parameter_cache(&self) -> SharedParameterCache {
        Arc::clone(&self.parameters)
    }

    // Repositories

    /// Register an ad-hoc repository that is not known to the store.
    pub fn register_repository(&mut self, repository: Repository) {
        self.switcher.register(repository);
    }

    /// Switch the active repository; see [`RepositorySwitcher::switch`].
    pub fn switch_repository(
        &mut self,
        target: Option<&RepositoryId>,
        temporary: bool,
    ) -> Result<Option<Repository>> {
        self.switcher
            .switch(&self.collaborators, self.state.as_mut(), target, temporary)
    }

    pub fn current_repository(&self) -> Option<&Repository> {
        self.switcher.current()
    }

    /// Access driver plugin of the current repository, cached until the next switch.
    pub fn load_access_driver(&mut self) -> Result<Option<Arc<dyn Plugin>>> {
        self.switcher.access_driver(self.collaborators.plugins.as_ref())
    }

    // Caches

    pub fn clear_all_caches(&self) -> Result<()> {
        CacheInvalidator::new(&self.collaborators).clear_all(&self.parameters)
    }

    pub fn invalidate_loaded_repositories(&self) -> Result<()> {
        CacheInvalidator::new(&self.collaborators).invalidate_loaded_repositories()
    }
}
