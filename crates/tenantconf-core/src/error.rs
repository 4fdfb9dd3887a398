//! Error types for tenantconf-core

use std::path::PathBuf;

use crate::model::RepositoryId;

/// Result type for tenantconf-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in tenantconf-core operations
///
/// Lookups that miss (unknown plugin, key or role) are not errors; they
/// resolve to `None` or to the caller's default. Only a refused temporary
/// repository switch is raised by this crate itself; everything else comes
/// from a collaborator or from bootstrap configuration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A temporary switch targeted a missing or inaccessible repository
    #[error("Unauthorized switch to repository {}", display_target(.repository))]
    Unauthorized { repository: Option<RepositoryId> },

    /// Bootstrap configuration file not found at expected path
    #[error("Configuration not found at {path}")]
    ConfigNotFound { path: PathBuf },

    /// Bootstrap configuration could not be interpreted
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// A collaborator required by the selected mode was not supplied
    #[error("Missing collaborator: {name}")]
    MissingCollaborator { name: &'static str },

    /// A collaborator reported a failure
    #[error("{collaborator} failed: {message}")]
    Collaborator {
        collaborator: &'static str,
        message: String,
    },

    /// The tracing subscriber could not be installed
    #[error("Logging setup failed: {message}")]
    Logging { message: String },

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON conversion error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// TOML deserialization error
    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),
}

impl Error {
    pub fn collaborator(collaborator: &'static str, message: impl Into<String>) -> Self {
        Self::Collaborator {
            collaborator,
            message: message.into(),
        }
    }
}

fn display_target(repository: &Option<RepositoryId>) -> String {
    match repository {
        Some(id) => id.to_string(),
        None => "<none>".to_string(),
    }
}
