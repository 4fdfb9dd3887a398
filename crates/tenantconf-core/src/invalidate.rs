//! Cache invalidation
//!
//! Every step is a plain "drop everything" on the target cache, so running
//! the invalidation twice leaves the same state as running it once. When the
//! cache service is shared between processes, clearing its shared namespace
//! propagates to all of them; the other caches are process-local.

use std::sync::Mutex;

use crate::Result;
use crate::collaborators::Collaborators;
use crate::constants::SHARED_CACHE_NAMESPACE;
use crate::personal::PersonalParameterCache;

/// Clears the caches reachable from a set of collaborators.
pub struct CacheInvalidator<'a> {
    collaborators: &'a Collaborators,
}

impl<'a> CacheInvalidator<'a> {
    pub fn new(collaborators: &'a Collaborators) -> Self {
        Self { collaborators }
    }

    /// Clear plugin manifests, localized messages, the shared cache
    /// namespace, the host compilation cache (when present) and the
    /// personal parameter cache.
    pub fn clear_all(&self, parameters: &Mutex<PersonalParameterCache>) -> Result<()> {
        self.collaborators.plugins.clear_manifest_cache()?;
        self.collaborators.messages.clear_messages_cache()?;
        self.collaborators.cache.delete_all(SHARED_CACHE_NAMESPACE)?;
        if let Some(compilation_cache) = &self.collaborators.compilation_cache {
            compilation_cache.reset()?;
        }
        parameters
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clear();
        tracing::info!("Cleared all caches");
        Ok(())
    }

    /// Drop cached users, repositories and registry data derived from them.
    pub fn invalidate_loaded_repositories(&self) -> Result<()> {
        self.collaborators.roles.invalidate_cache()?;
        self.collaborators.plugins.clear_registry_caches()?;
        tracing::debug!("Invalidated loaded repositories");
        Ok(())
    }
}
