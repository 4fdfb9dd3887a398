//! Layered configuration resolution for a multi-tenant file-access platform
//!
//! This crate resolves *effective* configuration values and manages the
//! active context (repository, charset, user) of one request:
//!
//! - **Context state**: active repository and charset, session-backed or process-local
//! - **Named variables**: instance-local overrides over compiled-in `DEFAULT_*` values
//! - **Core settings**: plugin configuration filtered through the user's merged role
//! - **Personal parameters**: per-user values from the personal role, memoized
//! - **Repository switching**: authorization-checked, with charset propagation
//! - **Cache invalidation**: plugin, message, shared and personal caches
//!
//! # Architecture
//!
//! Plugin discovery, authentication and storage are external; they are
//! reached only through the traits in [`collaborators`]:
//!
//! ```text
//!                  request handler
//!                        |
//!                   ConfService
//!                        |
//!   +--------+-------+---+-----+---------+--------+
//!   |        |       |         |         |        |
//! plugins  roles  repositories auth   session   caches
//! ```
//!
//! # Example
//!
//! ```ignore
//! use tenantconf_core::{ConfService, ContextMode, RepositoryId};
//!
//! tenantconf_core::logging::init()?;
//!
//! let mut conf = ConfService::builder(collaborators)
//!     .mode(ContextMode::ProcessLocal)
//!     .build()?;
//!
//! conf.switch_repository(Some(&RepositoryId::new("1")), true)?;
//! let max_upload = conf.get_core_conf("MAX_UPLOAD")?;
//! ```

pub mod collaborators;
pub mod config;
pub mod constants;
pub mod context;
pub mod error;
pub mod invalidate;
pub mod logging;
pub mod model;
pub mod personal;
pub mod service;
pub mod switcher;

pub use collaborators::{
    AuthProvider, CacheService, Collaborators, CompilationCache, MessageCatalog, Plugin,
    PluginRegistry, RepositoryStore, Role, RoleStore, SessionStore,
};
pub use config::{BootConfig, ConfigResolver, CoreConfResolver, Defaults, ResolutionContext};
pub use context::{ContextMode, ContextState, ProcessLocalState, SessionBackedState};
pub use error::{Error, Result};
pub use invalidate::CacheInvalidator;
pub use model::{
    PluginConfigSet, PluginId, Repository, RepositoryId, RoleScope, User, UserId, UserRef,
    is_empty_value,
};
pub use personal::{EmptyValueFallback, PersonalParameterCache, SharedParameterCache};
pub use service::{ConfService, ConfServiceBuilder};
pub use switcher::RepositorySwitcher;
