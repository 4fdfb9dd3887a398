//! Shared test utilities for the tenantconf workspace.
//!
//! This crate provides in-memory implementations of every collaborator
//! trait so that tests can drive a real `ConfService` without a plugin
//! framework, user storage or session transport. It is a dev-dependency
//! only, never published.
//!
//! # Modules
//!
//! - [`plugins`]: [`StaticPlugin`] and [`InMemoryPluginRegistry`]
//! - [`roles`]: [`StaticRole`] and [`InMemoryRoleStore`]
//! - [`stores`]: repositories, session, auth and cache fakes
//! - [`platform`]: [`TestPlatform`] wiring everything together

pub mod platform;
pub mod plugins;
pub mod roles;
pub mod stores;

pub use platform::TestPlatform;
pub use plugins::{InMemoryPluginRegistry, StaticPlugin};
pub use roles::{InMemoryRoleStore, SavedPreference, StaticRole};
pub use stores::{
    CountingCompilationCache, CountingMessageCatalog, FixedAuth, InMemoryRepositoryStore,
    InMemorySessionStore, RecordingCacheService,
};
