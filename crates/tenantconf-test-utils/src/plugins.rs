//! Plugin fakes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tenantconf_core::{Plugin, PluginConfigSet, PluginId, PluginRegistry, Result};

/// A plugin with a fixed configuration set.
#[derive(Debug, Clone)]
pub struct StaticPlugin {
    id: PluginId,
    configs: PluginConfigSet,
}

impl StaticPlugin {
    pub fn new(plugin_type: &str, name: &str) -> Self {
        Self {
            id: PluginId::new(plugin_type, name),
            configs: PluginConfigSet::new(),
        }
    }

    /// Builder-style helper to declare a configuration entry.
    pub fn with_config(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.configs.insert(name.to_string(), value.into());
        self
    }
}

impl Plugin for StaticPlugin {
    fn id(&self) -> &PluginId {
        &self.id
    }

    fn configs(&self) -> PluginConfigSet {
        self.configs.clone()
    }
}

/// Registry over a fixed set of plugins, counting calls.
#[derive(Debug, Default)]
pub struct InMemoryPluginRegistry {
    plugins: Mutex<HashMap<(String, String), Arc<StaticPlugin>>>,
    lookups: AtomicUsize,
    manifest_clears: AtomicUsize,
    registry_clears: AtomicUsize,
}

impl InMemoryPluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, plugin: StaticPlugin) {
        let key = (
            plugin.id().plugin_type().to_string(),
            plugin.id().name().to_string(),
        );
        self.plugins.lock().unwrap().insert(key, Arc::new(plugin));
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn manifest_clears(&self) -> usize {
        self.manifest_clears.load(Ordering::SeqCst)
    }

    pub fn registry_clears(&self) -> usize {
        self.registry_clears.load(Ordering::SeqCst)
    }
}

impl PluginRegistry for InMemoryPluginRegistry {
    fn find_plugin(&self, plugin_type: &str, name: &str) -> Result<Option<Arc<dyn Plugin>>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let plugins = self.plugins.lock().unwrap();
        Ok(plugins
            .get(&(plugin_type.to_string(), name.to_string()))
            .map(|p| p.clone() as Arc<dyn Plugin>))
    }

    fn clear_manifest_cache(&self) -> Result<()> {
        self.manifest_clears.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn clear_registry_caches(&self) -> Result<()> {
        self.registry_clears.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
