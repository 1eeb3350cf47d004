//! The add-plan store: goal-based suggestions while the user assembles a
//! plan, plus write-through goal and plan operations.

use std::sync::Arc;

use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::backend::{BackendError, GoalSuggestionRequest, OpportunityBackend};
use crate::codeset::CodesetResolver;
use crate::matching::filters::FilterSelection;
use crate::matching::SortMode;
use crate::models::localized::Lang;
use crate::models::plan::{Goal, GoalInput, Plan, PlanInput};
use crate::stores::engine::{Outcome, PageSnapshot, SuggestionEngine, SuggestionSource};
use crate::stores::DEFAULT_PAGE_SIZE;

/// Partial state update applied before a refresh.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlanUpdate {
    /// `Some(None)` clears the goal; absent keeps the current one.
    pub goal_id: Option<Option<Uuid>>,
    pub filters: Option<FilterSelection>,
    pub sort: Option<SortMode>,
    pub lang: Option<Lang>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

pub struct PlanStore {
    engine: SuggestionEngine,
    backend: Arc<dyn OpportunityBackend>,
    goal_id: Option<Uuid>,
    filters: FilterSelection,
    sort: SortMode,
    lang: Lang,
    page: usize,
    page_size: usize,
    goals: Vec<Goal>,
    plans: Vec<Plan>,
}

impl PlanStore {
    pub fn new(backend: Arc<dyn OpportunityBackend>, codesets: Arc<CodesetResolver>) -> Self {
        Self {
            engine: SuggestionEngine::new(Arc::clone(&backend), codesets),
            backend,
            goal_id: None,
            filters: FilterSelection::default(),
            sort: SortMode::default(),
            lang: Lang::default(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            goals: Vec::new(),
            plans: Vec::new(),
        }
    }

    pub fn snapshot(&self) -> &PageSnapshot {
        self.engine.snapshot()
    }

    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    pub fn plans(&self) -> &[Plan] {
        &self.plans
    }

    /// Applies the update and refreshes. With no goal set there is nothing
    /// to suggest: the store commits an empty snapshot without touching the
    /// backend.
    pub async fn update(&mut self, update: PlanUpdate, cancel: &CancellationToken) -> Outcome {
        if let Some(goal_id) = update.goal_id {
            if self.goal_id != goal_id {
                self.engine.invalidate();
            }
            self.goal_id = goal_id;
        }
        if let Some(filters) = update.filters {
            self.filters = filters;
        }
        if let Some(sort) = update.sort {
            self.sort = sort;
        }
        if let Some(lang) = update.lang {
            self.lang = lang;
        }
        if let Some(page) = update.page {
            self.page = page;
        }
        if let Some(page_size) = update.page_size {
            self.page_size = page_size.max(1);
        }

        let Some(goal_id) = self.goal_id else {
            return Outcome::Committed(self.engine.clear(self.page_size));
        };
        let source = SuggestionSource::Goal(GoalSuggestionRequest {
            goal_id,
            kind: None,
        });
        self.engine
            .refresh(
                &source,
                self.lang,
                &self.filters,
                self.sort,
                self.page,
                self.page_size,
                cancel,
            )
            .await
    }

    /// Writes the goal through to the backend and re-fetches the
    /// authoritative goal list. Editing a goal invalidates cached
    /// suggestions since the backend scores against goal content.
    pub async fn upsert_goal(
        &mut self,
        user: Uuid,
        input: GoalInput,
    ) -> Result<Goal, BackendError> {
        let cancel = CancellationToken::new();
        let goal = self.backend.upsert_goal(user, &input, &cancel).await?;
        self.goals = self.backend.goals(user, &cancel).await?;
        self.engine.invalidate();
        Ok(goal)
    }

    pub async fn refresh_goals(&mut self, user: Uuid) -> Result<Vec<Goal>, BackendError> {
        let cancel = CancellationToken::new();
        self.goals = self.backend.goals(user, &cancel).await?;
        Ok(self.goals.clone())
    }

    pub async fn delete_goal(&mut self, user: Uuid, goal: Uuid) -> Result<(), BackendError> {
        let cancel = CancellationToken::new();
        self.backend.delete_goal(user, goal, &cancel).await?;
        self.goals = self.backend.goals(user, &cancel).await?;
        if self.goal_id == Some(goal) {
            self.goal_id = None;
            self.engine.invalidate();
        }
        Ok(())
    }

    pub async fn refresh_plans(&mut self, user: Uuid) -> Result<Vec<Plan>, BackendError> {
        let cancel = CancellationToken::new();
        self.plans = self.backend.plans(user, &cancel).await?;
        Ok(self.plans.clone())
    }

    pub async fn create_plan(
        &mut self,
        user: Uuid,
        input: PlanInput,
    ) -> Result<Plan, BackendError> {
        let cancel = CancellationToken::new();
        let plan = self.backend.create_plan(user, &input, &cancel).await?;
        self.plans = self.backend.plans(user, &cancel).await?;
        Ok(plan)
    }

    pub async fn delete_plan(&mut self, user: Uuid, plan: Uuid) -> Result<(), BackendError> {
        let cancel = CancellationToken::new();
        self.backend.delete_plan(user, plan, &cancel).await?;
        self.plans = self.backend.plans(user, &cancel).await?;
        Ok(())
    }
}
