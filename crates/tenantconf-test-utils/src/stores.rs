//! Repository, session, auth and cache fakes.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use tenantconf_core::{
    AuthProvider, CacheService, CompilationCache, Error, MessageCatalog, Repository,
    RepositoryId, RepositoryStore, Result, SessionStore, User,
};

/// Repository store with a per-repository access flag.
#[derive(Debug, Default)]
pub struct InMemoryRepositoryStore {
    repositories: Mutex<HashMap<RepositoryId, Repository>>,
    accessible: Mutex<HashSet<RepositoryId>>,
    failing: AtomicBool,
    lookups: AtomicUsize,
}

impl InMemoryRepositoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a repository and whether users may access it.
    pub fn add(&self, repository: Repository, accessible: bool) {
        if accessible {
            self.accessible
                .lock()
                .unwrap()
                .insert(repository.id.clone());
        }
        self.repositories
            .lock()
            .unwrap()
            .insert(repository.id.clone(), repository);
    }

    /// Make every call fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::collaborator("RepositoryStore", "store unavailable"));
        }
        Ok(())
    }
}

impl RepositoryStore for InMemoryRepositoryStore {
    fn repository_by_id(&self, id: &RepositoryId) -> Result<Option<Repository>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.repositories.lock().unwrap().get(id).cloned())
    }

    fn is_accessible(&self, repository: &Repository, _user: Option<&User>) -> Result<bool> {
        self.check()?;
        Ok(self.accessible.lock().unwrap().contains(&repository.id))
    }
}

/// Session store over a map.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    values: Mutex<HashMap<String, String>>,
    failing_writes: Mutex<HashSet<String>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `set` fail for `key`. Reads and clears keep working.
    pub fn fail_writes_to(&self, key: &str) {
        self.failing_writes.lock().unwrap().insert(key.to_string());
    }

    pub fn snapshot(&self) -> HashMap<String, String> {
        self.values.lock().unwrap().clone()
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        if self.failing_writes.lock().unwrap().contains(key) {
            return Err(Error::collaborator("SessionStore", "write failed"));
        }
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<()> {
        self.values.lock().unwrap().remove(key);
        Ok(())
    }
}

/// Auth provider with a settable logged user.
#[derive(Debug)]
pub struct FixedAuth {
    user: Mutex<Option<User>>,
    users_enabled: AtomicBool,
}

impl Default for FixedAuth {
    fn default() -> Self {
        Self {
            user: Mutex::new(None),
            users_enabled: AtomicBool::new(true),
        }
    }
}

impl FixedAuth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn login(&self, user: User) {
        *self.user.lock().unwrap() = Some(user);
    }

    pub fn logout(&self) {
        *self.user.lock().unwrap() = None;
    }

    pub fn set_users_enabled(&self, enabled: bool) {
        self.users_enabled.store(enabled, Ordering::SeqCst);
    }
}

impl AuthProvider for FixedAuth {
    fn logged_user(&self) -> Result<Option<User>> {
        Ok(self.user.lock().unwrap().clone())
    }

    fn users_enabled(&self) -> bool {
        self.users_enabled.load(Ordering::SeqCst)
    }
}

/// Cache service recording every cleared namespace.
#[derive(Debug, Default)]
pub struct RecordingCacheService {
    deleted: Mutex<Vec<String>>,
}

impl RecordingCacheService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deleted_namespaces(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

impl CacheService for RecordingCacheService {
    fn delete_all(&self, namespace: &str) -> Result<()> {
        self.deleted.lock().unwrap().push(namespace.to_string());
        Ok(())
    }
}

/// Message catalog counting cache clears.
#[derive(Debug, Default)]
pub struct CountingMessageCatalog {
    clears: AtomicUsize,
}

impl CountingMessageCatalog {
    pub fn clears(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }
}

impl MessageCatalog for CountingMessageCatalog {
    fn clear_messages_cache(&self) -> Result<()> {
        self.clears.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Compilation cache counting resets.
#[derive(Debug, Default)]
pub struct CountingCompilationCache {
    resets: AtomicUsize,
}

impl CountingCompilationCache {
    pub fn resets(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }
}

impl CompilationCache for CountingCompilationCache {
    fn reset(&self) -> Result<()> {
        self.resets.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
