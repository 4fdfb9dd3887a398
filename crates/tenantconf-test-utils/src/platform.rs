//! [`TestPlatform`] wiring every fake into a [`ConfService`].

use std::sync::Arc;

use tenantconf_core::{Collaborators, ConfService, ContextMode, Repository, User, UserId};

use crate::plugins::{InMemoryPluginRegistry, StaticPlugin};
use crate::roles::{InMemoryRoleStore, StaticRole};
use crate::stores::{
    CountingCompilationCache, CountingMessageCatalog, FixedAuth, InMemoryRepositoryStore,
    InMemorySessionStore, RecordingCacheService,
};

/// A set of in-memory collaborators with handles kept for assertions.
///
/// # Example
///
/// ```rust,no_run
/// use tenantconf_core::{ContextMode, Repository, RepositoryId};
/// use tenantconf_test_utils::TestPlatform;
///
/// let platform = TestPlatform::new();
/// platform.add_repository(Repository::new("1", "fs"), true);
/// platform.login("alice");
///
/// let mut conf = platform.service(ContextMode::ProcessLocal);
/// conf.switch_repository(Some(&RepositoryId::new("1")), true).unwrap();
/// ```
#[derive(Debug, Clone, Default)]
pub struct TestPlatform {
    pub plugins: Arc<InMemoryPluginRegistry>,
    pub roles: Arc<InMemoryRoleStore>,
    pub repositories: Arc<InMemoryRepositoryStore>,
    pub auth: Arc<FixedAuth>,
    pub session: Arc<InMemorySessionStore>,
    pub cache: Arc<RecordingCacheService>,
    pub messages: Arc<CountingMessageCatalog>,
    pub compilation_cache: Arc<CountingCompilationCache>,
}

impl TestPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_plugin(&self, plugin: StaticPlugin) {
        self.plugins.register(plugin);
    }

    pub fn add_repository(&self, repository: Repository, accessible: bool) {
        self.repositories.add(repository, accessible);
    }

    /// Log in a user whose personal role has no overrides.
    pub fn login(&self, id: &str) -> User {
        self.login_with_role(id, StaticRole::new())
    }

    pub fn login_with_role(&self, id: &str, personal_role: StaticRole) -> User {
        let user = User::new(UserId::new(id), personal_role.into_arc());
        self.auth.login(user.clone());
        user
    }

    /// Collaborators backed by this platform's fakes.
    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            plugins: self.plugins.clone(),
            roles: self.roles.clone(),
            repositories: self.repositories.clone(),
            auth: self.auth.clone(),
            cache: self.cache.clone(),
            messages: self.messages.clone(),
            compilation_cache: Some(self.compilation_cache.clone()),
            session: Some(self.session.clone()),
        }
    }

    /// A service with default settings in the given mode.
    pub fn service(&self, mode: ContextMode) -> ConfService {
        ConfService::builder(self.collaborators())
            .mode(mode)
            .build()
            .expect("TestPlatform::service: failed to build service")
    }
}
