//! Per-session store registry.
//!
//! A session owns one instance of each opportunity store; the session id
//! doubles as the profile id on the upstream backend. Sessions are created
//! on first use and live for the process lifetime; nothing is persisted.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use uuid::Uuid;

use crate::backend::{BackendError, OpportunityBackend};
use crate::codeset::CodesetResolver;
use crate::models::plan::{Favorite, FavoriteTarget, Goal, GoalInput};
use crate::stores::phases::PhaseSuggestionStore;
use crate::stores::plan::PlanStore;
use crate::stores::search::SearchStore;
use crate::stores::tool::ToolStore;
use crate::stores::StoreHandle;

pub struct Session {
    pub id: Uuid,
    pub tool: StoreHandle<ToolStore>,
    pub plan: StoreHandle<PlanStore>,
    pub search: StoreHandle<SearchStore>,
    pub phases: StoreHandle<PhaseSuggestionStore>,
    favorite_busy: AtomicBool,
    goal_busy: AtomicBool,
}

impl Session {
    fn new(
        id: Uuid,
        backend: Arc<dyn OpportunityBackend>,
        codesets: Arc<CodesetResolver>,
    ) -> Self {
        Self {
            id,
            tool: StoreHandle::new(ToolStore::new(
                Arc::clone(&backend),
                Arc::clone(&codesets),
            )),
            plan: StoreHandle::new(PlanStore::new(
                Arc::clone(&backend),
                Arc::clone(&codesets),
            )),
            search: StoreHandle::new(SearchStore::new(
                Arc::clone(&backend),
                Arc::clone(&codesets),
            )),
            phases: StoreHandle::new(PhaseSuggestionStore::new(backend, codesets)),
            favorite_busy: AtomicBool::new(false),
            goal_busy: AtomicBool::new(false),
        }
    }

    /// Toggles a favorite unless a toggle is already in flight, in which
    /// case the call is a no-op (`Ok(None)`) rather than queued.
    pub async fn toggle_favorite(
        &self,
        target: FavoriteTarget,
    ) -> Result<Option<Vec<Favorite>>, BackendError> {
        if self.favorite_busy.swap(true, Ordering::SeqCst) {
            return Ok(None);
        }
        let result = {
            let mut tool = self.tool.lock().await;
            tool.toggle_favorite(self.id, target).await
        };
        self.favorite_busy.store(false, Ordering::SeqCst);
        result.map(Some)
    }

    /// Upserts a goal with the same in-flight coalescing as favorites.
    pub async fn upsert_goal(&self, input: GoalInput) -> Result<Option<Goal>, BackendError> {
        if self.goal_busy.swap(true, Ordering::SeqCst) {
            return Ok(None);
        }
        let result = {
            let mut plan = self.plan.lock().await;
            plan.upsert_goal(self.id, input).await
        };
        self.goal_busy.store(false, Ordering::SeqCst);
        result.map(Some)
    }
}

#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, Arc<Session>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up an existing session or creates one. An unknown or absent id
    /// gets a fresh session; the caller learns the id from the response.
    pub fn get_or_create(
        &self,
        id: Option<Uuid>,
        backend: &Arc<dyn OpportunityBackend>,
        codesets: &Arc<CodesetResolver>,
    ) -> Arc<Session> {
        if let Some(id) = id {
            let sessions = self.sessions.read().expect("session lock poisoned");
            if let Some(session) = sessions.get(&id) {
                return Arc::clone(session);
            }
        }
        let id = id.unwrap_or_else(Uuid::new_v4);
        let mut sessions = self.sessions.write().expect("session lock poisoned");
        Arc::clone(sessions.entry(id).or_insert_with(|| {
            Arc::new(Session::new(id, Arc::clone(backend), Arc::clone(codesets)))
        }))
    }

    pub fn len(&self) -> usize {
        self.sessions.read().expect("session lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
