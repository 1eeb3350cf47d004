use std::sync::Arc;

use uuid::Uuid;

use crate::backend::OpportunityBackend;
use crate::codeset::CodesetResolver;
use crate::config::Config;
use crate::sessions::{Session, SessionRegistry};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Upstream client behind a trait so tests can swap in a fake.
    pub backend: Arc<dyn OpportunityBackend>,
    pub codesets: Arc<CodesetResolver>,
    pub sessions: Arc<SessionRegistry>,
    pub config: Config,
}

impl AppState {
    /// Resolves (or creates) the session for a request.
    pub fn session(&self, id: Option<Uuid>) -> Arc<Session> {
        self.sessions.get_or_create(id, &self.backend, &self.codesets)
    }
}
