//! Active context state: repository and charset
//!
//! Two storage paths exist. Requests that carry a session keep the active
//! repository and charset in the session store, so they survive across
//! requests of the same session; REST requests and workers keep them in
//! process memory. The path is selected once through [`ContextMode`] when the
//! context is built and never changes afterwards, so the two stores are never
//! read or written interchangeably.

use std::fmt;
use std::sync::Arc;

use crate::collaborators::SessionStore;
use crate::constants::{CHARSET_SESSION_KEY, REPOSITORY_SESSION_KEY};
use crate::error::{Error, Result};
use crate::model::RepositoryId;

/// Where the active repository and charset live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContextMode {
    /// Delegated to the session store
    #[default]
    Session,
    /// Kept in the context object itself
    ProcessLocal,
}

impl ContextMode {
    /// Select the mode for a request.
    ///
    /// A REST base path means the request is stateless, so the context is
    /// kept in-process.
    pub fn detect(rest_base: Option<&str>) -> Self {
        match rest_base {
            Some(base) if !base.is_empty() => ContextMode::ProcessLocal,
            _ => ContextMode::Session,
        }
    }

    /// Build the state implementation for this mode.
    pub fn into_state(
        self,
        session: Option<Arc<dyn SessionStore>>,
    ) -> Result<Box<dyn ContextState>> {
        match self {
            ContextMode::Session => {
                let session = session.ok_or(Error::MissingCollaborator {
                    name: "SessionStore",
                })?;
                Ok(Box::new(SessionBackedState::new(session)))
            }
            ContextMode::ProcessLocal => Ok(Box::new(ProcessLocalState::default())),
        }
    }
}

/// Storage of the active repository id and charset.
pub trait ContextState: fmt::Debug + Send {
    fn mode(&self) -> ContextMode;

    fn charset(&self) -> Result<Option<String>>;

    fn set_charset(&mut self, charset: &str) -> Result<()>;

    fn clear_charset(&mut self) -> Result<()>;

    fn active_repository_id(&self) -> Result<Option<RepositoryId>>;

    /// Set the active repository; `None` clears it.
    fn set_active_repository_id(&mut self, id: Option<&RepositoryId>) -> Result<()>;
}

/// Context kept in the process.
#[derive(Debug, Clone, Default)]
pub struct ProcessLocalState {
    repository_id: Option<RepositoryId>,
    charset: Option<String>,
}

impl ContextState for ProcessLocalState {
    fn mode(&self) -> ContextMode {
        ContextMode::ProcessLocal
    }

    fn charset(&self) -> Result<Option<String>> {
        Ok(self.charset.clone())
    }

    fn set_charset(&mut self, charset: &str) -> Result<()> {
        self.charset = Some(charset.to_string());
        Ok(())
    }

    fn clear_charset(&mut self) -> Result<()> {
        self.charset = None;
        Ok(())
    }

    fn active_repository_id(&self) -> Result<Option<RepositoryId>> {
        Ok(self.repository_id.clone())
    }

    fn set_active_repository_id(&mut self, id: Option<&RepositoryId>) -> Result<()> {
        self.repository_id = id.cloned();
        Ok(())
    }
}

/// Context delegated to the session store.
pub struct SessionBackedState {
    session: Arc<dyn SessionStore>,
}

impl SessionBackedState {
    pub fn new(session: Arc<dyn SessionStore>) -> Self {
        Self { session }
    }
}

impl fmt::Debug for SessionBackedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionBackedState").finish_non_exhaustive()
    }
}

impl ContextState for SessionBackedState {
    fn mode(&self) -> ContextMode {
        ContextMode::Session
    }

    fn charset(&self) -> Result<Option<String>> {
        self.session.get(CHARSET_SESSION_KEY)
    }

    fn set_charset(&mut self, charset: &str) -> Result<()> {
        self.session.set(CHARSET_SESSION_KEY, charset)
    }

    fn clear_charset(&mut self) -> Result<()> {
        self.session.clear(CHARSET_SESSION_KEY)
    }

    fn active_repository_id(&self) -> Result<Option<RepositoryId>> {
        Ok(self.session.get(REPOSITORY_SESSION_KEY)?.map(RepositoryId::from))
    }

    fn set_active_repository_id(&mut self, id: Option<&RepositoryId>) -> Result<()> {
        match id {
            Some(id) => self.session.set(REPOSITORY_SESSION_KEY, id.as_str()),
            None => self.session.clear(REPOSITORY_SESSION_KEY),
        }
    }
}
