//! Tracing subscriber setup for hosts embedding tenantconf
//!
//! The library itself only emits `tracing` events: resolution steps at
//! debug, switches and cache clears at info, swallowed best-effort failures
//! at warn. Hosts without their own subscriber can install one here.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::{Error, Result};

/// Directives used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "warn,tenantconf_core=info";

/// Install a compact stdout subscriber filtered by `RUST_LOG`, falling back
/// to [`DEFAULT_FILTER`].
pub fn init() -> Result<()> {
    init_with_filter(DEFAULT_FILTER)
}

/// Install the subscriber with `default_directives` as the fallback filter.
///
/// Fails when the directives do not parse or when a global subscriber is
/// already installed.
pub fn init_with_filter(default_directives: &str) -> Result<()> {
    let filter = env_filter(default_directives)?;
    let fmt_layer = fmt::layer().with_target(true).compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| Error::Logging {
            message: e.to_string(),
        })?;

    tracing::debug!(default_directives, "Logging initialized");
    Ok(())
}

fn env_filter(default_directives: &str) -> Result<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directives))
        .map_err(|e| Error::Logging {
            message: format!("invalid filter '{default_directives}': {e}"),
        })
}
